//! Weighted-median price feeder.
//!
//! Discovers which market sources can quote `DENOM/CURRENCY` pairs, queries
//! them with per-source fault isolation, and reduces the surviving quotes to
//! one price per currency plus a composite `SDR` reference price used to
//! backfill currencies nobody quoted.

pub mod types;
pub mod price_infra;
pub mod core;
pub mod error;
pub mod config;
pub mod observability;
pub mod utils;

pub use error::{Error, Result};
pub use price_infra::{AggregationOutcome, CapabilityMap, PriceAggregator, SourceFilter};
pub use types::{Price, COMPOSITE_CURRENCY};
