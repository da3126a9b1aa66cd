pub mod connectors;
pub mod aggregator;
pub mod diagnostics;
pub mod filter;
pub mod observer;
pub mod weighted_median;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::{Error, Result};
use crate::price_infra::connectors::SourceHandle;

pub use aggregator::{AggregationOutcome, PriceAggregator};
pub use diagnostics::Diagnostics;
pub use filter::{FilterOutcome, SourceFilter};

/// Source weights keyed by source id; absent sources weigh 1.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "HashMap<String, f64>")]
pub struct WeightTable(HashMap<String, f64>);

impl WeightTable {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    /// Rejects weights that are not finite and strictly positive.
    pub fn new(weights: HashMap<String, f64>) -> Result<Self> {
        if let Some(&weight) = weights.values().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(Error::InvalidWeight { weight });
        }
        Ok(WeightTable(weights))
    }

    pub fn weight(&self, source_id: &str) -> f64 {
        self.0.get(source_id).copied().unwrap_or(Self::DEFAULT_WEIGHT)
    }
}

impl TryFrom<HashMap<String, f64>> for WeightTable {
    type Error = Error;

    fn try_from(weights: HashMap<String, f64>) -> Result<Self> {
        WeightTable::new(weights)
    }
}

/// Reference-denomination units per unit of each currency.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ReferenceRates(HashMap<String, f64>);

impl ReferenceRates {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        ReferenceRates(rates)
    }

    /// Known, non-zero rate for `currency`.
    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.0.get(currency).copied().filter(|rate| *rate != 0.0 && rate.is_finite())
    }
}

/// Pair symbol to the sources that can quote it, in candidate order.
///
/// Every target pair has an entry, possibly empty.
#[derive(Clone, Default)]
pub struct CapabilityMap {
    pairs: HashMap<String, Vec<SourceHandle>>,
}

impl CapabilityMap {
    pub fn seeded<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Self {
        CapabilityMap {
            pairs: symbols.into_iter().map(|s| (s.to_string(), Vec::new())).collect(),
        }
    }

    pub fn sources(&self, symbol: &str) -> &[SourceHandle] {
        self.pairs.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_pair(&self, symbol: &str) -> bool {
        self.pairs.contains_key(symbol)
    }

    /// Appends `source` to an already seeded pair; unknown pairs are ignored.
    pub fn push(&mut self, symbol: &str, source: SourceHandle) -> bool {
        match self.pairs.get_mut(symbol) {
            Some(sources) => {
                sources.push(source);
                true
            }
            None => false,
        }
    }

    pub fn source_ids(&self, symbol: &str) -> Vec<String> {
        self.sources(symbol).iter().map(|s| s.source_id().to_string()).collect()
    }

    pub fn pair_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.pairs.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl std::fmt::Debug for CapabilityMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for symbol in self.pair_symbols() {
            map.entry(&symbol, &self.source_ids(symbol));
        }
        map.finish()
    }
}
