//! Market data source abstractions and their payloads

use crate::core::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub pe_ratio: f64,
    pub latest_earnings: String,
}

/// Source of current market prices, keyed by exchange-qualified symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short identifier, used to qualify cache keys.
    fn name(&self) -> &str;

    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, FetchError>;
}

/// Source of valuation fundamentals (P/E ratio, latest earnings).
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals, FetchError>;
}
