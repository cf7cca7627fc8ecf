//! Typed view of the JSON body the sensor node posts to `/data`.
//!
//! The device firmware is deliberately free of error handling, so scalars
//! arrive in whatever shape the microcontroller produced: numbers as strings,
//! booleans as `0`/`1`, and so on. Every field is optional and coerced; only
//! a body that is not a JSON object at all is rejected.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::db::models::{GpsFix, NewReading};

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReadingSubmission {
    #[serde(alias = "distancia", deserialize_with = "coerce_real")]
    pub distance: Option<f64>,
    #[serde(alias = "alerta", deserialize_with = "coerce_flag")]
    pub alert: Option<bool>,
    #[serde(alias = "latitud", deserialize_with = "coerce_real")]
    pub latitude: Option<f64>,
    #[serde(alias = "longitud", deserialize_with = "coerce_real")]
    pub longitude: Option<f64>,
    #[serde(alias = "satelites", deserialize_with = "coerce_count")]
    pub satellites: Option<u32>,
}

impl ReadingSubmission {
    /// Parse a request body. Content type is ignored.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        // Derived struct impls would also accept a positional array.
        if !value.is_object() {
            return Err(serde::de::Error::custom("reading body must be a JSON object"));
        }
        serde_json::from_value(value)
    }

    /// Apply defaults and the GPS pairing rule, stamping `captured_at`.
    ///
    /// A fix is kept only when both coordinates survived coercion; otherwise
    /// both are dropped and the satellite count is zeroed.
    pub fn normalize(self, captured_at: DateTime<Utc>) -> NewReading {
        let fix = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GpsFix {
                latitude,
                longitude,
                satellites: self.satellites.unwrap_or(0),
            }),
            _ => None,
        };

        NewReading {
            distance: self.distance.unwrap_or(0.0),
            alert: self.alert.unwrap_or(false),
            fix,
            captured_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

fn real(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Truthiness of the `alert` field.
///
/// Strings are read by content, not by length: `""`, `"0"`, `"false"`, `"no"`
/// and `"off"` (any case, surrounding whitespace ignored) are false. This
/// departs from the first version of the backend, which treated every
/// non-empty string as true, so `"false"` raised an alert there.
fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            Some(!matches!(s.as_str(), "" | "0" | "false" | "no" | "off"))
        }
        Value::Array(a) => Some(!a.is_empty()),
        Value::Object(o) => Some(!o.is_empty()),
        Value::Null => None,
    }
}

fn count(value: &Value) -> Option<u32> {
    // Saturating cast: negatives become 0, overflow becomes u32::MAX.
    real(value).map(|n| n.trunc() as u32)
}

fn coerce_real<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Value::deserialize(d).map(|v| real(&v))
}

fn coerce_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Value::deserialize(d).map(|v| flag(&v))
}

fn coerce_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Value::deserialize(d).map(|v| count(&v))
}
