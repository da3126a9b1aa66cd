use futures_util::stream::{self, StreamExt};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::Instrument;
use crate::error::{Error, ListingFault, ListingFaultKind};
use crate::observability::metrics::{LISTING_FAULTS, SOURCES_CHECKED};
use crate::observability::tracing::trace_filter_run;
use crate::price_infra::connectors::{SourceHandle, SourceRegistry};
use crate::price_infra::observer::{NoopObserver, ProgressObserver};
use crate::price_infra::CapabilityMap;
use crate::types::Pair;

/// Result of one filter pass.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub capabilities: CapabilityMap,
    pub listing_faults: Vec<ListingFault>,
    pub blacklisted: Vec<String>,
    pub unavailable: Vec<String>,
}

enum Probe {
    Blacklisted,
    Unavailable(Error),
    Fault(ListingFault),
    Listed {
        source: SourceHandle,
        symbols: Vec<String>,
    },
}

/// Works out which sources can quote which `base/currency` pairs.
pub struct SourceFilter {
    registry: Arc<SourceRegistry>,
    base: String,
    blacklist: HashSet<String>,
    listing_timeout: Duration,
    max_concurrency: usize,
    observer: Arc<dyn ProgressObserver>,
}

impl SourceFilter {
    pub fn new(registry: Arc<SourceRegistry>, base: impl Into<String>) -> Self {
        SourceFilter {
            registry,
            base: base.into(),
            blacklist: HashSet::new(),
            listing_timeout: Duration::from_secs(30),
            max_concurrency: 16,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_blacklist(mut self, blacklist: impl IntoIterator<Item = String>) -> Self {
        self.blacklist = blacklist.into_iter().collect();
        self
    }

    pub fn with_listing_timeout(mut self, listing_timeout: Duration) -> Self {
        self.listing_timeout = listing_timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Probes every candidate and maps each target pair to its capable sources.
    ///
    /// Listings are requested concurrently but consumed in candidate order, so
    /// the order of sources within a pair is deterministic. Failures of any
    /// kind only remove the failing source.
    pub async fn filter(&self, candidates: &[String], currencies: &[String]) -> FilterOutcome {
        let symbols: Vec<String> = currencies.iter()
            .map(|currency| Pair::new(self.base.as_str(), currency.as_str()).symbol())
            .collect();

        let span = trace_filter_run(candidates.len());
        async move {
            let mut outcome = FilterOutcome {
                capabilities: CapabilityMap::seeded(symbols.iter().map(String::as_str)),
                ..Default::default()
            };

            let probe_futures: Vec<BoxFuture<'_, (String, Probe)>> = candidates.iter().cloned()
                .map(|source_id| {
                    async move {
                        let probe = self.probe(&source_id).await;
                        (source_id, probe)
                    }
                    .boxed()
                })
                .collect();
            let probes: Vec<(String, Probe)> = stream::iter(probe_futures)
                .buffered(self.max_concurrency)
                .collect()
                .await;

            for (source_id, probe) in probes {
                match probe {
                    Probe::Blacklisted => {
                        outcome.blacklisted.push(source_id);
                    }
                    Probe::Unavailable(e) => {
                        tracing::debug!(source = %source_id, "Source excluded: {}", e);
                        outcome.unavailable.push(source_id);
                    }
                    Probe::Fault(fault) => {
                        LISTING_FAULTS.inc();
                        tracing::warn!(source = %source_id, "Markets type mismatched: {}", fault);
                        self.observer.listing_fault(&fault);
                        outcome.listing_faults.push(fault);
                    }
                    Probe::Listed { source, symbols } => {
                        let mut accepted = 0;
                        if source.supports_last_price() {
                            for symbol in &symbols {
                                let already_listed = outcome.capabilities
                                    .sources(symbol)
                                    .iter()
                                    .any(|s| Arc::ptr_eq(s, &source));
                                if !already_listed && outcome.capabilities.push(symbol, source.clone()) {
                                    accepted += 1;
                                }
                            }
                        }
                        self.observer.source_checked(&source_id, accepted);
                    }
                }
            }

            tracing::info!(
                candidates = candidates.len(),
                listing_faults = outcome.listing_faults.len(),
                unavailable = outcome.unavailable.len(),
                "Checked available sources"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    async fn probe(&self, source_id: &str) -> Probe {
        if self.blacklist.contains(source_id) {
            return Probe::Blacklisted;
        }
        SOURCES_CHECKED.inc();

        let source = match self.registry.instantiate(source_id) {
            Ok(source) => source,
            Err(e) => return Probe::Unavailable(e),
        };

        let listing = match timeout(self.listing_timeout, source.list_markets()).await {
            Ok(Ok(listing)) => listing,
            Ok(Err(Error::Listing(fault))) => return Probe::Fault(fault),
            Ok(Err(e)) => return Probe::Unavailable(e),
            Err(_) => return Probe::Unavailable(Error::Timeout(self.listing_timeout)),
        };

        match market_symbols(source_id, listing) {
            Ok(symbols) => Probe::Listed { source, symbols },
            Err(fault) => Probe::Fault(fault),
        }
    }
}

/// Normalizes a raw market listing and extracts every market's symbol.
///
/// A keyed object is treated as the list of its values. The listing must be
/// non-empty, start with a record, and every entry must carry a `symbol`.
/// Markets whose symbol is not a string are skipped.
pub fn market_symbols(source_id: &str, listing: Value) -> Result<Vec<String>, ListingFault> {
    let fault = |kind| ListingFault {
        source_id: source_id.to_string(),
        kind,
    };

    let markets: Vec<Value> = match listing {
        Value::Array(markets) => markets,
        Value::Object(keyed) => keyed.into_iter().map(|(_, market)| market).collect(),
        _ => return Err(fault(ListingFaultKind::NotAList)),
    };

    match markets.first() {
        None => return Err(fault(ListingFaultKind::Empty)),
        Some(first) if !first.is_object() => return Err(fault(ListingFaultKind::NotARecord)),
        Some(_) => {}
    }

    let mut symbols = Vec::with_capacity(markets.len());
    for (index, market) in markets.iter().enumerate() {
        match market.get("symbol") {
            None => return Err(fault(ListingFaultKind::MissingSymbol { index })),
            Some(Value::String(symbol)) => symbols.push(symbol.clone()),
            // Present but unusable: the market simply never matches a pair.
            Some(_) => {}
        }
    }
    Ok(symbols)
}
