use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved currency name of the composite reference entry.
pub const COMPOSITE_CURRENCY: &str = "SDR";

/// One aggregated price: amount of `currency` per unit of the base asset.
///
/// For the composite entry the value is expressed per reference unit instead.
/// `dispersion` is zero when it was not computed (composite and backfilled
/// entries).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub value: f64,
    pub dispersion: f64,
}

impl Price {
    pub fn new(currency: impl Into<String>, value: f64) -> Self {
        Price {
            currency: currency.into(),
            value,
            dispersion: 0.0,
        }
    }

    pub fn with_dispersion(currency: impl Into<String>, value: f64, dispersion: f64) -> Self {
        Price {
            currency: currency.into(),
            value,
            dispersion,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.currency == COMPOSITE_CURRENCY
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.currency, self.value)
    }
}
