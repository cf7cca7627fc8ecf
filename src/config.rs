use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret expected in the `X-API-Key` header of mutating requests.
    pub api_key: String,
    pub database_url: String,
    pub db_pool_max: u32,
    /// Directory holding captured JPEG blobs, also served under `/uploads`.
    pub upload_dir: PathBuf,
    pub server_host: String,
    pub server_port: u16,
    /// Upper bound for any request body, images included.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is the
    /// production entry point; tests feed a map instead.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).with_context(|| format!("missing required env var: {key}"))
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_owned())
        };

        let api_key = required("API_KEY")?;
        if api_key.trim().is_empty() {
            bail!("API_KEY must not be empty");
        }

        Ok(Self {
            api_key,
            database_url: optional("DATABASE_URL", "sqlite://database.db?mode=rwc"),
            db_pool_max: optional("DB_POOL_MAX", "5")
                .parse()
                .context("DB_POOL_MAX must be a positive integer")?,
            upload_dir: PathBuf::from(optional("UPLOAD_DIR", "uploads")),
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "5000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            max_upload_bytes: optional("MAX_UPLOAD_BYTES", "10485760")
                .parse()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
        })
    }

    /// Log the effective configuration with the API key masked.
    pub fn log_summary(&self) {
        info!(
            database_url = %self.database_url,
            db_pool_max = self.db_pool_max,
            upload_dir = %self.upload_dir.display(),
            server_host = %self.server_host,
            server_port = self.server_port,
            max_upload_bytes = self.max_upload_bytes,
            api_key = %mask(&self.api_key),
            "Configuration loaded"
        );
    }
}

/// Keep the first two characters so operators can tell keys apart.
fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(2).collect();
    format!("{visible}****")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_api_key_is_set() {
        let cfg = load(&[("API_KEY", "baston123")]).unwrap();
        assert_eq!(cfg.api_key, "baston123");
        assert_eq!(cfg.database_url, "sqlite://database.db?mode=rwc");
        assert_eq!(cfg.db_pool_max, 5);
        assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
        assert_eq!(cfg.server_host, "0.0.0.0");
        assert_eq!(cfg.server_port, 5000);
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn missing_api_key_errors() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn blank_api_key_errors() {
        let err = load(&[("API_KEY", "   ")]).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn overrides_are_honoured() {
        let cfg = load(&[
            ("API_KEY", "k"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("UPLOAD_DIR", "/var/lib/cane/uploads"),
            ("SERVER_PORT", "8080"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.upload_dir, PathBuf::from("/var/lib/cane/uploads"));
        assert_eq!(cfg.server_port, 8080);
        assert_eq!(cfg.max_upload_bytes, 1024);
    }

    #[test]
    fn invalid_port_errors() {
        let err = load(&[("API_KEY", "k"), ("SERVER_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn mask_hides_all_but_prefix() {
        assert_eq!(mask("baston123"), "ba****");
        assert_eq!(mask("x"), "x****");
    }
}
