use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use crate::error::{Error, Result};
use crate::price_infra::connectors::{MarketSource, Ticker};

/// Source backed by a static `pair -> last price` table.
///
/// Used for dry runs and for currencies pegged by an operator.
pub struct FixedQuoteSource {
    source_id: String,
    quotes: HashMap<String, f64>,
}

impl FixedQuoteSource {
    pub fn new(source_id: &str, quotes: HashMap<String, f64>) -> Self {
        FixedQuoteSource {
            source_id: source_id.to_string(),
            quotes,
        }
    }
}

#[async_trait]
impl MarketSource for FixedQuoteSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn list_markets(&self) -> Result<Value> {
        let mut symbols: Vec<&String> = self.quotes.keys().collect();
        symbols.sort();

        Ok(Value::Array(
            symbols.into_iter()
                .map(|symbol| json!({ "id": symbol, "symbol": symbol }))
                .collect(),
        ))
    }

    async fn fetch_last_price(&self, pair: &str) -> Result<Ticker> {
        let last = self.quotes
            .get(pair)
            .ok_or_else(|| Error::Unsupported(format!("{} does not quote {}", self.source_id, pair)))?;
        Ok(Ticker::new(pair, *last))
    }
}
