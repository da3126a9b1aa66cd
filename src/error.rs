use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Source Errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Operation not supported by source: {0}")]
    Unsupported(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Listing fault: {0}")]
    Listing(ListingFault),

    // Registry Errors
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source already registered: {0}")]
    DuplicateSource(String),

    // Weighted Median Errors
    #[error("Weighted median of an empty sample")]
    EmptySample,

    #[error("Values and weights differ in length: values={values}, weights={weights}")]
    LengthMismatch {
        values: usize,
        weights: usize,
    },

    #[error("Invalid weight {weight}: weights must be finite and strictly positive")]
    InvalidWeight { weight: f64 },

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Task error: {0}")]
    TaskError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A source's market catalog was absent or malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFault {
    pub source_id: String,
    pub kind: ListingFaultKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingFaultKind {
    Empty,
    NotAList,
    NotARecord,
    MissingSymbol { index: usize },
}

impl fmt::Display for ListingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ListingFaultKind::Empty => write!(f, "{}: empty market listing", self.source_id),
            ListingFaultKind::NotAList => write!(f, "{}: market listing is not a list", self.source_id),
            ListingFaultKind::NotARecord => {
                write!(f, "{}: market listing entries are not records", self.source_id)
            }
            ListingFaultKind::MissingSymbol { index } => {
                write!(f, "{}: market #{} has no symbol", self.source_id, index)
            }
        }
    }
}

/// A source failed to return a usable last price for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteFault {
    pub source_id: String,
    pub pair: String,
    pub kind: QuoteFaultKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteFaultKind {
    Source(String),
    Timeout(Duration),
    MissingLast,
    Unparseable(String),
    NonFinite,
}

impl fmt::Display for QuoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.source_id, self.pair)?;
        match &self.kind {
            QuoteFaultKind::Source(reason) => write!(f, ": {}", reason),
            QuoteFaultKind::Timeout(after) => write!(f, ": timed out after {:?}", after),
            QuoteFaultKind::MissingLast => write!(f, ": ticker has no last price"),
            QuoteFaultKind::Unparseable(raw) => write!(f, ": cannot parse last price {:?}", raw),
            QuoteFaultKind::NonFinite => write!(f, ": last price is not finite"),
        }
    }
}

impl From<ListingFault> for Error {
    fn from(fault: ListingFault) -> Self {
        Error::Listing(fault)
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(e: prometheus::Error) -> Self {
        Error::MetricsError(e.to_string())
    }
}
