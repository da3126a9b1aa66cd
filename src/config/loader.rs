use std::collections::{HashMap, HashSet};
use crate::config::*;
use crate::error::{Error, Result};
use crate::price_infra::connectors::SourceRegistry;
use crate::price_infra::{ReferenceRates, WeightTable};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub updater: UpdaterConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub reference_rates: Vec<ReferenceRateConfig>,
    #[serde(default)]
    pub fixed_sources: Vec<FixedSourceConfig>,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FEEDER").separator("__"))
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        if self.updater.denom.trim().is_empty() {
            return Err(Error::ConfigError("updater.denom must not be empty".to_string()));
        }
        if self.updater.currencies.is_empty() {
            return Err(Error::ConfigError("updater.currencies must not be empty".to_string()));
        }
        if let Some(reserved) = self.updater.currencies.iter().find(|c| is_reserved_currency(c)) {
            return Err(Error::ConfigError(format!(
                "currency {} collides with the composite entry",
                reserved
            )));
        }
        if self.fetch.max_concurrency == 0 {
            return Err(Error::ConfigError("fetch.max_concurrency must be at least 1".to_string()));
        }
        if self.fetch.timeout_ms == 0 || self.fetch.listing_timeout_ms == 0 {
            return Err(Error::ConfigError("fetch timeouts must be positive".to_string()));
        }
        if let Some(rate) = self.reference_rates.iter().find(|r| !r.rate.is_finite() || r.rate < 0.0) {
            return Err(Error::ConfigError(format!(
                "reference rate for {} must be finite and non-negative",
                rate.currency
            )));
        }

        let mut fixed_ids = HashSet::new();
        if let Some(dup) = self.fixed_sources.iter().find(|s| !fixed_ids.insert(s.id.as_str())) {
            return Err(Error::DuplicateSource(dup.id.clone()));
        }

        self.weights().map(|_| ())
    }

    pub fn weights(&self) -> Result<WeightTable> {
        WeightTable::new(self.exchange.weight.clone())
    }

    pub fn reference_rates(&self) -> ReferenceRates {
        let rates: HashMap<String, f64> = self.reference_rates
            .iter()
            .map(|r| (r.currency.clone(), r.rate))
            .collect();
        ReferenceRates::new(rates)
    }

    /// Whitelisted sources, or every registered source when the whitelist is empty.
    pub fn candidates(&self, registry: &SourceRegistry) -> Vec<String> {
        if self.exchange.whitelist.is_empty() {
            registry.source_ids()
        } else {
            self.exchange.whitelist.clone()
        }
    }
}
