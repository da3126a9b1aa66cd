use futures_util::stream::{self, StreamExt};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use crate::error::{QuoteFault, QuoteFaultKind, Result};
use crate::observability::metrics::{CURRENCIES_BACKFILLED, CURRENCIES_OMITTED, QUOTES_FAILED, QUOTES_FETCHED};
use crate::price_infra::connectors::{SourceHandle, Ticker};
use crate::price_infra::diagnostics::Diagnostics;
use crate::price_infra::observer::{NoopObserver, ProgressObserver};
use crate::price_infra::weighted_median::{weighted_mad, weighted_median};
use crate::price_infra::{CapabilityMap, ReferenceRates, WeightTable};
use crate::types::{Pair, Price, COMPOSITE_CURRENCY};

/// Prices and diagnostics of one aggregation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AggregationOutcome {
    pub prices: Vec<Price>,
    pub diagnostics: Diagnostics,
}

impl AggregationOutcome {
    pub fn price(&self, currency: &str) -> Option<&Price> {
        self.prices.iter().find(|p| p.currency == currency)
    }

    pub fn composite(&self) -> Option<&Price> {
        self.price(COMPOSITE_CURRENCY)
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Values with their parallel weights.
#[derive(Default)]
struct Sample {
    values: Vec<f64>,
    weights: Vec<f64>,
}

impl Sample {
    fn push(&mut self, value: f64, weight: f64) {
        self.values.push(value);
        self.weights.push(weight);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn median(&self) -> Result<f64> {
        weighted_median(&self.values, &self.weights)
    }

    fn dispersion(&self, center: f64) -> Result<f64> {
        weighted_mad(&self.values, &self.weights, center)
    }
}

struct FetchResult {
    job: usize,
    currency: usize,
    source_id: String,
    pair: String,
    quote: std::result::Result<f64, QuoteFaultKind>,
}

/// Queries every capable source per currency and combines the quotes.
pub struct PriceAggregator {
    base: String,
    weights: WeightTable,
    fetch_timeout: Duration,
    max_concurrency: usize,
    observer: Arc<dyn ProgressObserver>,
}

impl PriceAggregator {
    pub fn new(base: impl Into<String>, weights: WeightTable) -> Self {
        PriceAggregator {
            base: base.into(),
            weights,
            fetch_timeout: Duration::from_secs(10),
            max_concurrency: 16,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
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

    /// Runs one aggregation pass.
    ///
    /// Every `(source, pair)` fetch runs on a bounded pool; all fetches finish
    /// before any median is taken. Currencies without a direct quote are
    /// backfilled from the composite price when their reference rate is
    /// known. An empty price list means no usable data this cycle.
    pub async fn aggregate(
        &self,
        capabilities: &CapabilityMap,
        rates: &ReferenceRates,
        currencies: &[String],
    ) -> AggregationOutcome {
        let currencies = unique_currencies(currencies);

        // Step 1: Fetch every capable source for every currency
        let jobs: Vec<(usize, String, SourceHandle)> = currencies.iter()
            .enumerate()
            .flat_map(|(index, currency)| {
                let pair = Pair::new(self.base.as_str(), *currency).symbol();
                capabilities.sources(&pair)
                    .iter()
                    .map(move |source| (index, pair.clone(), source.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        let fetches: Vec<BoxFuture<'_, FetchResult>> = jobs.into_iter().enumerate()
            .map(|(job, (currency, pair, source))| {
                async move {
                    let quote = self.fetch(&source, &pair).await;
                    FetchResult {
                        job,
                        currency,
                        source_id: source.source_id().to_string(),
                        pair,
                        quote,
                    }
                }
                .boxed()
            })
            .collect();
        let mut results: Vec<FetchResult> = stream::iter(fetches)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        results.sort_by_key(|r| r.job);

        // Step 2: Collect samples per currency and for the composite pool
        let mut diagnostics = Diagnostics::default();
        let mut samples: Vec<Sample> = currencies.iter().map(|_| Sample::default()).collect();
        let mut composite_sample = Sample::default();

        for result in results {
            match result.quote {
                Ok(value) => {
                    let currency = currencies[result.currency];
                    let weight = self.weights.weight(&result.source_id);
                    samples[result.currency].push(value, weight);
                    if let Some(rate) = rates.rate(currency) {
                        composite_sample.push(value * rate, weight);
                    }

                    diagnostics.success_count += 1;
                    QUOTES_FETCHED.inc();
                    self.observer.quote_fetched(&result.source_id, &result.pair, value);
                }
                Err(kind) => {
                    let fault = QuoteFault {
                        source_id: result.source_id,
                        pair: result.pair,
                        kind,
                    };
                    QUOTES_FAILED.inc();
                    tracing::debug!("Quote failed: {}", fault);
                    self.observer.quote_failed(&fault);
                    diagnostics.failed.push(fault);
                }
            }
        }

        // Step 3: Weighted median per currency
        let mut prices = Vec::new();
        let mut unresolved = Vec::new();
        for (currency, sample) in currencies.iter().zip(&samples) {
            self.observer.currency_completed(currency, sample.len());
            match self.resolve(currency, sample) {
                Some(price) => {
                    diagnostics.resolved.push(currency.to_string());
                    prices.push(price);
                }
                None => unresolved.push(*currency),
            }
        }

        // Step 4: Composite price over every quote with a reference rate
        let composite = if composite_sample.is_empty() {
            None
        } else {
            match composite_sample.median() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Composite price calculation failed: {}", e);
                    None
                }
            }
        };

        tracing::info!("{}", diagnostics.summary());

        let composite = match composite {
            // A composite that is not positive cannot back any currency.
            Some(value) if value > 0.0 && !prices.is_empty() => value,
            _ => {
                tracing::warn!("No usable data this cycle: no composite price could be derived");
                CURRENCIES_OMITTED.inc_by(currencies.len() as f64);
                diagnostics.resolved.clear();
                diagnostics.omitted = currencies.iter().map(|c| c.to_string()).collect();
                return AggregationOutcome {
                    prices: Vec::new(),
                    diagnostics,
                };
            }
        };
        prices.push(Price::new(COMPOSITE_CURRENCY, composite));

        // Step 5: Backfill unresolved currencies from the composite price
        for currency in unresolved {
            match rates.rate(currency) {
                Some(rate) => {
                    CURRENCIES_BACKFILLED.inc();
                    diagnostics.backfilled.push(currency.to_string());
                    prices.push(Price::new(currency, composite / rate));
                }
                None => {
                    CURRENCIES_OMITTED.inc();
                    tracing::warn!(currency, "No quote and no reference rate; currency omitted");
                    diagnostics.omitted.push(currency.to_string());
                }
            }
        }

        AggregationOutcome {
            prices,
            diagnostics,
        }
    }

    fn resolve(&self, currency: &str, sample: &Sample) -> Option<Price> {
        if sample.is_empty() {
            return None;
        }

        let value = match sample.median() {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(currency, "Weighted median failed: {}", e);
                return None;
            }
        };
        let dispersion = sample.dispersion(value).unwrap_or(0.0);
        Some(Price::with_dispersion(currency, value, dispersion))
    }

    async fn fetch(&self, source: &SourceHandle, pair: &str) -> std::result::Result<f64, QuoteFaultKind> {
        let ticker = match timeout(self.fetch_timeout, source.fetch_last_price(pair)).await {
            Ok(Ok(ticker)) => ticker,
            Ok(Err(e)) => return Err(QuoteFaultKind::Source(e.to_string())),
            Err(_) => return Err(QuoteFaultKind::Timeout(self.fetch_timeout)),
        };
        parse_last(ticker)
    }
}

/// Parses a ticker's `last` field, accepting numbers and numeric strings.
pub fn parse_last(ticker: Ticker) -> std::result::Result<f64, QuoteFaultKind> {
    let value = match ticker.last {
        None | Some(Value::Null) => return Err(QuoteFaultKind::MissingLast),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| QuoteFaultKind::Unparseable(n.to_string()))?,
        Some(Value::String(s)) => s.trim()
            .parse::<f64>()
            .map_err(|_| QuoteFaultKind::Unparseable(s.clone()))?,
        Some(other) => return Err(QuoteFaultKind::Unparseable(other.to_string())),
    };

    if !value.is_finite() {
        return Err(QuoteFaultKind::NonFinite);
    }
    Ok(value)
}

/// Drops duplicates and the reserved composite name, keeping first-seen order.
fn unique_currencies(currencies: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    currencies.iter()
        .map(String::as_str)
        .filter(|currency| {
            if *currency == COMPOSITE_CURRENCY {
                tracing::warn!(currency, "Reserved currency name ignored");
                return false;
            }
            seen.insert(*currency)
        })
        .collect()
}
