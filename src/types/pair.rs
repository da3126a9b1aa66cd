use serde::{Deserialize, Serialize};
use std::fmt;

/// Base-asset/currency combination, rendered as `BASE/CURRENCY`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub currency: String,
}

impl Pair {
    pub fn new(base: impl Into<String>, currency: impl Into<String>) -> Self {
        Pair {
            base: base.into(),
            currency: currency.into(),
        }
    }

    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.currency)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_joins_base_and_currency() {
        let pair = Pair::new("LUNA", "KRW");
        assert_eq!(pair.symbol(), "LUNA/KRW");
        assert_eq!(pair.to_string(), pair.symbol());
    }
}
