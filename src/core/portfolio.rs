//! Portfolio holdings and their live market attributes.

use crate::core::error::CycleError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    #[serde(rename = "NSE", alias = "nse")]
    Nse,
    #[serde(rename = "BSE", alias = "bse")]
    Bse,
}

impl Exchange {
    /// Suffix market data providers use to qualify a symbol on this exchange.
    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Nse => "NS",
            Exchange::Bse => "BO",
        }
    }
}

impl Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Exchange::Nse => "NSE",
                Exchange::Bse => "BSE",
            }
        )
    }
}

/// A value obtained from a market data source during the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveField<T> {
    Unknown,
    Known(T),
}

impl<T> Default for LiveField<T> {
    fn default() -> Self {
        LiveField::Unknown
    }
}

impl<T> LiveField<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, LiveField::Known(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            LiveField::Known(value) => Some(value),
            LiveField::Unknown => None,
        }
    }
}

impl<T: Copy> LiveField<T> {
    /// Returns the known value, or `fallback` when nothing was fetched.
    pub fn or(&self, fallback: T) -> T {
        match self {
            LiveField::Known(value) => *value,
            LiveField::Unknown => fallback,
        }
    }
}

impl<T> From<Option<T>> for LiveField<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(LiveField::Unknown, LiveField::Known)
    }
}

/// One portfolio position.
///
/// The static attributes come from configuration. The live attributes start
/// out `Unknown` and are filled in by the fetcher on every refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    /// Display name ("particulars").
    pub name: String,
    pub purchase_price: f64,
    pub quantity: f64,
    pub sector: String,
    pub exchange: Exchange,
    #[serde(skip)]
    pub current_price: LiveField<f64>,
    #[serde(skip)]
    pub pe_ratio: LiveField<f64>,
    #[serde(skip)]
    pub latest_earnings: LiveField<String>,
}

impl Holding {
    pub fn new(symbol: &str, purchase_price: f64, quantity: f64, sector: &str) -> Self {
        Self {
            id: symbol.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            purchase_price,
            quantity,
            sector: sector.to_string(),
            exchange: Exchange::Nse,
            current_price: LiveField::Unknown,
            pe_ratio: LiveField::Unknown,
            latest_earnings: LiveField::Unknown,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn with_current_price(mut self, price: f64) -> Self {
        self.current_price = LiveField::Known(price);
        self
    }

    /// Exchange-qualified symbol, e.g. `RELIANCE.NS`.
    pub fn ticker(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange.suffix())
    }

    /// Price used for valuation: the live price when one was fetched,
    /// otherwise the purchase price.
    pub fn effective_price(&self) -> f64 {
        self.current_price.or(self.purchase_price)
    }

    pub fn validate(&self) -> Result<(), CycleError> {
        let invalid = |reason: &str| CycleError::InvalidHolding {
            symbol: self.symbol.clone(),
            reason: reason.to_string(),
        };

        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol is empty"));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(invalid("quantity must be a non-negative number"));
        }
        if !self.purchase_price.is_finite() || self.purchase_price < 0.0 {
            return Err(invalid("purchase price must be a non-negative number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_price_falls_back_to_purchase_price() {
        let holding = Holding::new("TCS", 3200.0, 5.0, "Technology");
        assert_eq!(holding.effective_price(), 3200.0);

        let holding = holding.with_current_price(3350.5);
        assert_eq!(holding.effective_price(), 3350.5);
    }

    #[test]
    fn test_ticker_uses_exchange_suffix() {
        let holding = Holding::new("INFY", 1500.0, 1.0, "Technology");
        assert_eq!(holding.ticker(), "INFY.NS");

        let holding = holding.with_exchange(Exchange::Bse);
        assert_eq!(holding.ticker(), "INFY.BO");
    }

    #[test]
    fn test_validate_rejects_negative_and_non_finite_values() {
        assert!(Holding::new("OK", 10.0, 0.0, "X").validate().is_ok());

        let err = Holding::new("NEG", 10.0, -1.0, "X").validate().unwrap_err();
        assert!(matches!(err, CycleError::InvalidHolding { ref symbol, .. } if symbol == "NEG"));

        assert!(Holding::new("NAN", f64::NAN, 1.0, "X").validate().is_err());
        assert!(Holding::new("  ", 10.0, 1.0, "X").validate().is_err());
    }

    #[test]
    fn test_live_field_from_option() {
        assert_eq!(LiveField::from(Some(12.5)), LiveField::Known(12.5));
        assert_eq!(LiveField::<f64>::from(None), LiveField::Unknown);
        assert!(!LiveField::<String>::default().is_known());
    }

    #[test]
    fn test_holding_deserialization_leaves_live_fields_unknown() {
        let yaml = r#"
id: "7"
symbol: "HDFCBANK"
name: "HDFC Bank"
purchase_price: 1490.0
quantity: 50
sector: "Financials"
exchange: BSE
"#;
        let holding: Holding = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(holding.id, "7");
        assert_eq!(holding.exchange, Exchange::Bse);
        assert_eq!(holding.quantity, 50.0);
        assert_eq!(holding.current_price, LiveField::Unknown);
        assert_eq!(holding.latest_earnings, LiveField::Unknown);
    }
}
