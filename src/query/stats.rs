use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::Reading;

/// Summary of a window of readings.
///
/// Distance aggregates only consider readings with `distance > 0`; a zero
/// distance is the device's "no reading" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_records: usize,
    pub total_alerts: usize,
    /// Centimetres
    pub min_distance: Option<f64>,
    /// Centimetres
    pub max_distance: Option<f64>,
    /// Centimetres, rounded to one decimal
    pub mean_distance: Option<f64>,
    #[serde(rename = "recordsWithGPS")]
    pub records_with_gps: usize,
    /// e.g. `"62.5%"`; `"0%"` for an empty window
    pub gps_percentage: String,
}

impl Statistics {
    pub fn from_window(window: &[Reading]) -> Self {
        let total_records = window.len();
        let total_alerts = window.iter().filter(|r| r.alert).count();
        let records_with_gps = window.iter().filter(|r| r.has_fix()).count();

        let distances: Vec<f64> = window
            .iter()
            .map(|r| r.distance)
            .filter(|d| *d > 0.0)
            .collect();

        let (min_distance, max_distance, mean_distance) = if distances.is_empty() {
            (None, None, None)
        } else {
            let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
            let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = distances.iter().sum::<f64>() / distances.len() as f64;
            (Some(min), Some(max), Some(round1(mean)))
        };

        let gps_percentage = if total_records == 0 {
            "0%".to_owned()
        } else {
            let pct = round1(records_with_gps as f64 / total_records as f64 * 100.0);
            format!("{pct:.1}%")
        };

        Self {
            total_records,
            total_alerts,
            min_distance,
            max_distance,
            mean_distance,
            records_with_gps,
            gps_percentage,
        }
    }
}

/// Round to one decimal on the exact binary value, ties to even.
///
/// `(v * 10.0).round()` is off on both counts: the multiply itself rounds
/// (0.35 is stored just below the tie but `0.35 * 10.0 == 3.5`), and `round`
/// sends ties away from zero.
fn round1(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let bits = v.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    if exponent >= 0 {
        return v;
    }

    // |v| * 10 = (10 * mantissa) / 2^shift exactly; 10 * mantissa < 2^57.
    let shift = exponent.unsigned_abs();
    if shift > 120 {
        return 0.0_f64.copysign(v);
    }
    let numerator = u128::from(mantissa) * 10;
    let whole = numerator >> shift;
    let rest = numerator & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let tenths = match rest.cmp(&half) {
        Ordering::Greater => whole + 1,
        Ordering::Equal => whole + (whole & 1),
        Ordering::Less => whole,
    };
    (tenths as f64 / 10.0).copysign(v)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn reading(distance: f64, alert: bool, gps: bool) -> Reading {
        Reading {
            id: 0,
            distance,
            alert,
            latitude: gps.then_some(-34.6),
            longitude: gps.then_some(-58.4),
            satellites: if gps { 6 } else { 0 },
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn empty_window() {
        let s = Statistics::from_window(&[]);
        assert_eq!(s.total_records, 0);
        assert_eq!(s.total_alerts, 0);
        assert_eq!(s.min_distance, None);
        assert_eq!(s.max_distance, None);
        assert_eq!(s.mean_distance, None);
        assert_eq!(s.records_with_gps, 0);
        assert_eq!(s.gps_percentage, "0%");
    }

    #[test]
    fn zero_distance_is_excluded_from_aggregates() {
        let window = [
            reading(0.0, false, false),
            reading(10.0, false, false),
            reading(20.0, true, false),
        ];
        let s = Statistics::from_window(&window);
        assert_eq!(s.total_records, 3);
        assert_eq!(s.total_alerts, 1);
        assert_eq!(s.min_distance, Some(10.0));
        assert_eq!(s.max_distance, Some(20.0));
        assert_eq!(s.mean_distance, Some(15.0));
    }

    #[test]
    fn only_sentinels_leave_aggregates_absent() {
        let s = Statistics::from_window(&[reading(0.0, true, true), reading(-4.0, false, false)]);
        assert_eq!(s.total_records, 2);
        assert_eq!(s.min_distance, None);
        assert_eq!(s.mean_distance, None);
    }

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        let s = Statistics::from_window(&[
            reading(10.0, false, false),
            reading(10.0, false, false),
            reading(11.0, false, false),
        ]);
        // 31 / 3 = 10.333…
        assert_eq!(s.mean_distance, Some(10.3));
    }

    #[test]
    fn mean_ties_round_to_even() {
        // (10.2 + 10.3) / 2 is exactly 10.25.
        let s = Statistics::from_window(&[reading(10.2, false, false), reading(10.3, false, false)]);
        assert_eq!(s.mean_distance, Some(10.2));

        // (0.3 + 0.4) / 2 is stored just below 0.35.
        let s = Statistics::from_window(&[reading(0.3, false, false), reading(0.4, false, false)]);
        assert_eq!(s.mean_distance, Some(0.3));
    }

    #[test]
    fn gps_percentage_ties_round_to_even() {
        let mut window = vec![reading(5.0, false, true)];
        window.extend((0..15).map(|_| reading(5.0, false, false)));
        // 1 / 16 = 6.25%
        assert_eq!(Statistics::from_window(&window).gps_percentage, "6.2%");

        let mut window = vec![reading(5.0, false, true); 3];
        window.extend((0..13).map(|_| reading(5.0, false, false)));
        // 3 / 16 = 18.75%
        assert_eq!(Statistics::from_window(&window).gps_percentage, "18.8%");
    }

    #[test]
    fn round1_uses_the_stored_value() {
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(0.45), 0.5);
        assert_eq!(round1(-10.25), -10.2);
        assert_eq!(round1(2.675), 2.7);
        assert_eq!(round1(15.0), 15.0);
        assert_eq!(round1(1e-300), 0.0);
    }

    #[test]
    fn gps_percentage_is_formatted_with_one_decimal() {
        let s = Statistics::from_window(&[
            reading(5.0, false, true),
            reading(5.0, false, false),
            reading(5.0, false, false),
        ]);
        assert_eq!(s.records_with_gps, 1);
        assert_eq!(s.gps_percentage, "33.3%");

        let all = Statistics::from_window(&[reading(5.0, false, true)]);
        assert_eq!(all.gps_percentage, "100.0%");

        let none = Statistics::from_window(&[reading(5.0, false, false)]);
        assert_eq!(none.gps_percentage, "0.0%");
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let v = serde_json::to_value(Statistics::from_window(&[reading(12.0, true, true)])).unwrap();
        assert_eq!(v["totalRecords"], 1);
        assert_eq!(v["totalAlerts"], 1);
        assert_eq!(v["minDistance"], 12.0);
        assert_eq!(v["maxDistance"], 12.0);
        assert_eq!(v["meanDistance"], 12.0);
        assert_eq!(v["recordsWithGPS"], 1);
        assert_eq!(v["gpsPercentage"], "100.0%");
    }
}
