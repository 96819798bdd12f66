use std::path::PathBuf;
use std::str::FromStr;

use itemkeeper_core::collection::DEFAULT_BIN_RETENTION_DAYS;
use itemkeeper_sync::debounce::DEFAULT_REFRESH_DELAY;

/// Longest accepted `BIN_RETENTION_DAYS`.
pub const MAX_BIN_RETENTION_DAYS: i64 = 36_500;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running the daemon next to a
/// local UI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory holding the local collections (default: `./data`).
    pub data_dir: PathBuf,
    /// Cloud ledger connection string. Cloud sync is disabled when unset.
    pub database_url: Option<String>,
    /// Days a recycle-bin entry survives before the sweep (default: `30`).
    pub bin_retention_days: i64,
    /// Seconds between recycle-bin sweeps (default: `86400`).
    pub bin_sweep_interval_secs: u64,
    /// Debounce delay for sync-status refresh in milliseconds (default: `1000`).
    pub status_refresh_delay_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `127.0.0.1`             |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `ITEMKEEPER_DATA_DIR`     | `./data`                |
    /// | `DATABASE_URL`            | unset                   |
    /// | `BIN_RETENTION_DAYS`      | `30`                    |
    /// | `BIN_SWEEP_INTERVAL_SECS` | `86400`                 |
    /// | `STATUS_REFRESH_DELAY_MS` | `1000`                  |
    ///
    /// Panics on unparseable or out-of-range values so misconfiguration
    /// fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let data_dir = std::env::var("ITEMKEEPER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let config = Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            data_dir,
            database_url,
            bin_retention_days: env_or("BIN_RETENTION_DAYS", DEFAULT_BIN_RETENTION_DAYS),
            bin_sweep_interval_secs: env_or("BIN_SWEEP_INTERVAL_SECS", 86_400),
            status_refresh_delay_ms: env_or(
                "STATUS_REFRESH_DELAY_MS",
                DEFAULT_REFRESH_DELAY.as_millis() as u64,
            ),
        };
        config.validate();
        config
    }

    /// Panic if any value is outside its accepted range.
    pub fn validate(&self) {
        if self.request_timeout_secs == 0 {
            panic!("REQUEST_TIMEOUT_SECS must be greater than 0");
        }
        if self.bin_sweep_interval_secs == 0 {
            panic!("BIN_SWEEP_INTERVAL_SECS must be greater than 0");
        }
        if !(1..=MAX_BIN_RETENTION_DAYS).contains(&self.bin_retention_days) {
            panic!(
                "BIN_RETENTION_DAYS must be between 1 and {MAX_BIN_RETENTION_DAYS}, got {}",
                self.bin_retention_days
            );
        }
    }

    pub fn cloud_sync_enabled(&self) -> bool {
        self.database_url.is_some()
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
