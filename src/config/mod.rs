use std::collections::HashMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::types::COMPOSITE_CURRENCY;

pub mod loader;

pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpdaterConfig {
    /// Base asset every pair is quoted against.
    pub denom: String,
    pub currencies: Vec<String>,
    /// Seconds between cycles; zero runs a single cycle.
    #[serde(default)]
    pub interval_secs: u64,
}

impl UpdaterConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        UpdaterConfig {
            denom: "LUNA".to_string(),
            currencies: vec!["KRW".to_string(), "USD".to_string()],
            interval_secs: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Candidate sources; empty means every registered source.
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub weight: HashMap<String, f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub listing_timeout_ms: u64,
    pub max_concurrency: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_millis(self.listing_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_ms: 10_000,
            listing_timeout_ms: 30_000,
            max_concurrency: 16,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReferenceRateConfig {
    pub currency: String,
    pub rate: f64,
}

/// Static quote table exposed as a source.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FixedSourceConfig {
    pub id: String,
    #[serde(default)]
    pub quotes: Vec<FixedQuoteConfig>,
}

impl FixedSourceConfig {
    pub fn quote_table(&self) -> HashMap<String, f64> {
        self.quotes.iter().map(|q| (q.pair.clone(), q.last)).collect()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FixedQuoteConfig {
    pub pair: String,
    pub last: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

pub fn is_reserved_currency(currency: &str) -> bool {
    currency.eq_ignore_ascii_case(COMPOSITE_CURRENCY)
}
