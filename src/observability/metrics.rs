use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, HistogramOpts, Registry};
use crate::error::Result;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Filter metrics
    pub static ref SOURCES_CHECKED: Counter = Counter::new(
        "sources_checked_total",
        "Total number of candidate sources probed for markets"
    ).unwrap();

    pub static ref LISTING_FAULTS: Counter = Counter::new(
        "listing_faults_total",
        "Total number of sources skipped for malformed market listings"
    ).unwrap();

    // Quote metrics
    pub static ref QUOTES_FETCHED: Counter = Counter::new(
        "quotes_fetched_total",
        "Total number of usable last prices fetched"
    ).unwrap();

    pub static ref QUOTES_FAILED: Counter = Counter::new(
        "quotes_failed_total",
        "Total number of failed last price fetches"
    ).unwrap();

    // Resolution metrics
    pub static ref CURRENCIES_BACKFILLED: Counter = Counter::new(
        "currencies_backfilled_total",
        "Total number of currencies priced from the composite rate"
    ).unwrap();

    pub static ref CURRENCIES_OMITTED: Counter = Counter::new(
        "currencies_omitted_total",
        "Total number of currencies left without a price"
    ).unwrap();

    // Latency metrics
    pub static ref AGGREGATION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "aggregation_latency_seconds",
            "Duration of one filter and aggregation cycle"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0])
    ).unwrap();
}

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SOURCES_CHECKED.clone()))?;
    REGISTRY.register(Box::new(LISTING_FAULTS.clone()))?;
    REGISTRY.register(Box::new(QUOTES_FETCHED.clone()))?;
    REGISTRY.register(Box::new(QUOTES_FAILED.clone()))?;
    REGISTRY.register(Box::new(CURRENCIES_BACKFILLED.clone()))?;
    REGISTRY.register(Box::new(CURRENCIES_OMITTED.clone()))?;
    REGISTRY.register(Box::new(AGGREGATION_LATENCY.clone()))?;
    Ok(())
}
