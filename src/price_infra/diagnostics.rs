use serde::Serialize;
use crate::error::{ListingFault, QuoteFault};

/// Operational summary of one aggregation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    pub success_count: usize,
    #[serde(serialize_with = "serialize_quote_faults")]
    pub failed: Vec<QuoteFault>,
    #[serde(serialize_with = "serialize_listing_faults")]
    pub listing_faults: Vec<ListingFault>,
    pub resolved: Vec<String>,
    pub backfilled: Vec<String>,
    pub omitted: Vec<String>,
}

impl Diagnostics {
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Failed combinations rendered as `source(pair)`.
    pub fn failed_labels(&self) -> Vec<String> {
        self.failed.iter()
            .map(|f| format!("{}({})", f.source_id, f.pair))
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Success: {}, Fail: {} [{}]",
            self.success_count,
            self.failure_count(),
            self.failed_labels().join(", ")
        )
    }
}

fn serialize_quote_faults<S>(faults: &[QuoteFault], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(faults.iter().map(|f| f.to_string()))
}

fn serialize_listing_faults<S>(faults: &[ListingFault], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(faults.iter().map(|f| f.to_string()))
}
