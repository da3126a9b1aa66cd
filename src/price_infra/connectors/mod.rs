pub mod fixed;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use crate::error::Result;

pub use fixed::FixedQuoteSource;
pub use registry::{SourceConstructor, SourceRegistry};

pub type SourceHandle = Arc<dyn MarketSource>;

/// Capability contract of one external market source.
///
/// Implementations wrap a third-party exchange client. The core only lists
/// markets and fetches last-trade prices through this trait.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Stable identifier used for weight and blacklist lookups.
    fn source_id(&self) -> &str;

    /// Raw market catalog: either a sequence of market records or an object
    /// keyed by market id. Every record should carry a `symbol` field.
    async fn list_markets(&self) -> Result<Value>;

    /// Latest ticker for a pair symbol such as `LUNA/KRW`.
    async fn fetch_last_price(&self, pair: &str) -> Result<Ticker>;

    fn supports_last_price(&self) -> bool {
        true
    }
}

/// Ticker as returned by a source; `last` is parsed by the aggregator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: Option<Value>,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>, last: f64) -> Self {
        Ticker {
            symbol: symbol.into(),
            last: Some(Value::from(last)),
        }
    }
}
