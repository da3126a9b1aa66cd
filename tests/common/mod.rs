#![allow(dead_code)]

use async_trait::async_trait;
use price_feeder::error::{Error, Result};
use price_feeder::price_infra::connectors::{MarketSource, SourceHandle, Ticker};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub enum Listing {
    Markets(Value),
    Fail,
    Hang,
    Delayed(Duration, Value),
}

pub enum Quote {
    Last(f64),
    Raw(Option<Value>),
    Fail,
    Hang,
}

/// Source whose listing and quotes are fixed up front.
pub struct ScriptedSource {
    id: String,
    listing: Listing,
    quotes: HashMap<String, Quote>,
    supports_last: bool,
}

impl ScriptedSource {
    pub fn new(id: &str) -> Self {
        ScriptedSource {
            id: id.to_string(),
            listing: Listing::Markets(json!([])),
            quotes: HashMap::new(),
            supports_last: true,
        }
    }

    /// Lists `symbols` as market records.
    pub fn lists(mut self, symbols: &[&str]) -> Self {
        let markets: Vec<Value> = symbols.iter().map(|s| json!({ "id": s, "symbol": s })).collect();
        self.listing = Listing::Markets(Value::Array(markets));
        self
    }

    pub fn listing(mut self, listing: Listing) -> Self {
        self.listing = listing;
        self
    }

    pub fn quote(mut self, pair: &str, quote: Quote) -> Self {
        self.quotes.insert(pair.to_string(), quote);
        self
    }

    pub fn without_last_price(mut self) -> Self {
        self.supports_last = false;
        self
    }

    pub fn handle(self) -> SourceHandle {
        Arc::new(self)
    }
}

#[async_trait]
impl MarketSource for ScriptedSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn list_markets(&self) -> Result<Value> {
        match &self.listing {
            Listing::Markets(markets) => Ok(markets.clone()),
            Listing::Fail => Err(Error::Network("connection refused".to_string())),
            Listing::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::Timeout(Duration::from_secs(3600)))
            }
            Listing::Delayed(delay, markets) => {
                tokio::time::sleep(*delay).await;
                Ok(markets.clone())
            }
        }
    }

    async fn fetch_last_price(&self, pair: &str) -> Result<Ticker> {
        match self.quotes.get(pair) {
            Some(Quote::Last(last)) => Ok(Ticker::new(pair, *last)),
            Some(Quote::Raw(last)) => Ok(Ticker {
                symbol: pair.to_string(),
                last: last.clone(),
            }),
            Some(Quote::Fail) => Err(Error::Network("502 Bad Gateway".to_string())),
            Some(Quote::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::Timeout(Duration::from_secs(3600)))
            }
            None => Err(Error::Unsupported(format!("{} does not quote {}", self.id, pair))),
        }
    }

    fn supports_last_price(&self) -> bool {
        self.supports_last
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
