use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Store settings.
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection URL. The scheme selects the driver.
    pub url: Option<String>,

    /// Maximum number of pooled connections. Defaults to the pool's own
    /// default.
    pub pool_max_size: Option<usize>,

    /// Parent rows fetched per round trip by the batching runner when a
    /// query does not set its own batch size.
    pub batch_size: u64,

    /// Upper bound on the duration of [`Store::transaction`](crate::Store::transaction).
    pub transaction_timeout: Duration,
}

impl Config {
    pub const DEFAULT_BATCH_SIZE: u64 = 50;
    pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);

    /// Reads settings from `STRATA_DATABASE_URL`, `STRATA_POOL_MAX_SIZE`,
    /// `STRATA_BATCH_SIZE` and `STRATA_TRANSACTION_TIMEOUT_MS`. Unset
    /// variables keep their defaults.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = Config::default();

        if let Some(url) = lookup("STRATA_DATABASE_URL") {
            config.url = Some(url);
        }

        if let Some(size) = lookup("STRATA_POOL_MAX_SIZE") {
            config.pool_max_size = Some(size.trim().parse()?);
        }

        if let Some(size) = lookup("STRATA_BATCH_SIZE") {
            config.batch_size = size.trim().parse()?;
        }

        if let Some(ms) = lookup("STRATA_TRANSACTION_TIMEOUT_MS") {
            config.transaction_timeout = Duration::from_millis(ms.trim().parse()?);
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            pool_max_size: None,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            transaction_timeout: Self::DEFAULT_TRANSACTION_TIMEOUT,
        }
    }
}
