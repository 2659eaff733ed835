//! Simulated market data, standing in for live providers.

use crate::core::error::FetchError;
use crate::core::market::{Fundamentals, FundamentalsSource, PriceQuote, PriceSource};
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const EARNINGS: [&str; 5] = [
    "₹45.2 per share (Q3 2024)",
    "₹67.8 per share (Q3 2024)",
    "₹23.4 per share (Q3 2024)",
    "₹89.1 per share (Q3 2024)",
    "₹12.6 per share (Q3 2024)",
];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    rand::thread_rng().gen_range(min..max)
}

fn should_fail(failure_rate: f64) -> bool {
    failure_rate > 0.0 && rand::thread_rng().gen_bool(failure_rate.min(1.0))
}

/// Price within ±5% of `base`, rounded to paise.
fn vary_price(base: f64) -> f64 {
    let variation = rand::thread_rng().gen_range(-0.05..0.05);
    round2(base * (1.0 + variation))
}

fn random_base_price() -> f64 {
    rand::thread_rng().gen_range(100.0..4100.0)
}

/// P/E ratios for most listed stocks fall between 10 and 40.
fn random_pe_ratio() -> f64 {
    round2(rand::thread_rng().gen_range(10.0..40.0))
}

fn random_earnings() -> String {
    EARNINGS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(EARNINGS[0])
        .to_string()
}

/// Simulates a price feed. Prices wander around a per-symbol anchor; symbols
/// without an anchor get a random base price on every call.
pub struct SimulatedPriceSource {
    anchors: HashMap<String, f64>,
    min_latency: Duration,
    max_latency: Duration,
    failure_rate: f64,
}

impl SimulatedPriceSource {
    pub fn new() -> Self {
        Self {
            anchors: HashMap::new(),
            min_latency: Duration::from_millis(200),
            max_latency: Duration::from_millis(700),
            failure_rate: 0.0,
        }
    }

    pub fn with_anchors(mut self, anchors: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.anchors.extend(anchors);
        self
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }
}

impl Default for SimulatedPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for SimulatedPriceSource {
    fn name(&self) -> &str {
        "sim-price"
    }

    #[instrument(name = "SimulatedPriceFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, FetchError> {
        tokio::time::sleep(jitter(self.min_latency, self.max_latency)).await;

        if should_fail(self.failure_rate) {
            return Err(FetchError::upstream(
                self.name(),
                symbol,
                "simulated upstream failure",
            ));
        }

        let base = self
            .anchors
            .get(symbol)
            .copied()
            .unwrap_or_else(random_base_price);
        let price = vary_price(base);
        debug!(price, "Simulated price");
        Ok(PriceQuote { price })
    }
}

/// Simulates a fundamentals feed with plausible P/E ratios and earnings.
pub struct SimulatedFundamentalsSource {
    min_latency: Duration,
    max_latency: Duration,
    failure_rate: f64,
}

impl SimulatedFundamentalsSource {
    pub fn new() -> Self {
        Self {
            min_latency: Duration::from_millis(300),
            max_latency: Duration::from_millis(800),
            failure_rate: 0.0,
        }
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }
}

impl Default for SimulatedFundamentalsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FundamentalsSource for SimulatedFundamentalsSource {
    fn name(&self) -> &str {
        "sim-fundamentals"
    }

    #[instrument(name = "SimulatedFundamentalsFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals, FetchError> {
        tokio::time::sleep(jitter(self.min_latency, self.max_latency)).await;

        if should_fail(self.failure_rate) {
            return Err(FetchError::upstream(
                self.name(),
                symbol,
                "simulated upstream failure",
            ));
        }

        Ok(Fundamentals {
            pe_ratio: random_pe_ratio(),
            latest_earnings: random_earnings(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_price_source() -> SimulatedPriceSource {
        SimulatedPriceSource::new().with_latency(Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_price_stays_near_anchor() {
        let source =
            instant_price_source().with_anchors([("RELIANCE.NS".to_string(), 2450.0)]);

        for _ in 0..50 {
            let quote = source.fetch_price("RELIANCE.NS").await.unwrap();
            assert!(
                (2450.0 * 0.95 - 0.01..=2450.0 * 1.05 + 0.01).contains(&quote.price),
                "price {} out of range",
                quote.price
            );
        }
    }

    #[tokio::test]
    async fn test_unanchored_price_in_plausible_range() {
        let source = instant_price_source();
        for _ in 0..50 {
            let quote = source.fetch_price("UNKNOWN.NS").await.unwrap();
            assert!(quote.price >= 94.99 && quote.price <= 4305.01);
            assert_eq!(quote.price, round2(quote.price));
        }
    }

    #[tokio::test]
    async fn test_failure_rate_extremes() {
        let always = instant_price_source().with_failure_rate(1.0);
        let err = always.fetch_price("TCS.NS").await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream { ref provider, .. } if provider == "sim-price"));

        let never = instant_price_source().with_failure_rate(0.0);
        for _ in 0..20 {
            assert!(never.fetch_price("TCS.NS").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_fundamentals_shape() {
        let source =
            SimulatedFundamentalsSource::new().with_latency(Duration::ZERO, Duration::ZERO);
        for _ in 0..50 {
            let data = source.fetch_fundamentals("INFY.NS").await.unwrap();
            assert!((10.0..=40.0).contains(&data.pe_ratio));
            assert!(EARNINGS.contains(&data.latest_earnings.as_str()));
        }

        let failing = SimulatedFundamentalsSource::new()
            .with_latency(Duration::ZERO, Duration::ZERO)
            .with_failure_rate(1.0);
        assert!(failing.fetch_fundamentals("INFY.NS").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_within_bounds() {
        let source = SimulatedPriceSource::new();
        let start = tokio::time::Instant::now();
        source.fetch_price("X.NS").await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed <= Duration::from_millis(701));
    }
}
