use crate::error::{ListingFault, QuoteFault};

/// Progress hook for filter and aggregation runs.
///
/// All methods default to no-ops; the core never depends on an observer for
/// control flow.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressObserver: Send + Sync {
    fn source_checked(&self, _source_id: &str, _pairs: usize) {}

    fn listing_fault(&self, _fault: &ListingFault) {}

    fn quote_fetched(&self, _source_id: &str, _pair: &str, _value: f64) {}

    fn quote_failed(&self, _fault: &QuoteFault) {}

    fn currency_completed(&self, _currency: &str, _quotes: usize) {}
}

pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Reports progress through `tracing` at debug level.
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn source_checked(&self, source_id: &str, pairs: usize) {
        tracing::debug!(source = source_id, pairs, "Checked source");
    }

    fn listing_fault(&self, fault: &ListingFault) {
        tracing::debug!(source = %fault.source_id, "Listing fault: {}", fault);
    }

    fn quote_fetched(&self, source_id: &str, pair: &str, value: f64) {
        tracing::debug!(source = source_id, pair, value, "Fetched quote");
    }

    fn quote_failed(&self, fault: &QuoteFault) {
        tracing::debug!(source = %fault.source_id, pair = %fault.pair, "Quote failed: {}", fault);
    }

    fn currency_completed(&self, currency: &str, quotes: usize) {
        tracing::debug!(currency, quotes, "Currency completed");
    }
}
