//! Fetches live market data for holdings through a TTL cache, in rate-limited
//! batches.

use crate::core::cache::TtlCache;
use crate::core::error::FetchError;
use crate::core::market::{Fundamentals, FundamentalsSource, PriceQuote, PriceSource};
use crate::core::portfolio::{Holding, LiveField};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetcherSettings {
    /// Holdings fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay: Duration,
    /// Upper bound on a single source call.
    pub fetch_timeout: Duration,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

pub type PriceCache = TtlCache<String, PriceQuote>;
pub type FundamentalsCache = TtlCache<String, Fundamentals>;

pub struct MarketDataFetcher {
    price_source: Arc<dyn PriceSource>,
    fundamentals_source: Arc<dyn FundamentalsSource>,
    price_cache: Arc<PriceCache>,
    fundamentals_cache: Arc<FundamentalsCache>,
    settings: FetcherSettings,
}

fn cache_key(source: &str, symbol: &str) -> String {
    format!("{source}-{symbol}")
}

async fn with_timeout<T>(
    source: &str,
    symbol: &str,
    after: Duration,
    call: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| FetchError::Timeout {
            provider: source.to_string(),
            symbol: symbol.to_string(),
            after,
        })?
}

impl MarketDataFetcher {
    pub fn new(
        price_source: Arc<dyn PriceSource>,
        fundamentals_source: Arc<dyn FundamentalsSource>,
        price_cache: Arc<PriceCache>,
        fundamentals_cache: Arc<FundamentalsCache>,
        settings: FetcherSettings,
    ) -> Self {
        Self {
            price_source,
            fundamentals_source,
            price_cache,
            fundamentals_cache,
            settings,
        }
    }

    pub async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, FetchError> {
        let source = self.price_source.name();
        let key = cache_key(source, symbol);
        if let Some(cached) = self.price_cache.get(&key).await {
            return Ok(cached);
        }

        let quote = with_timeout(
            source,
            symbol,
            self.settings.fetch_timeout,
            self.price_source.fetch_price(symbol),
        )
        .await?;

        self.price_cache.put(key, quote.clone()).await;
        Ok(quote)
    }

    pub async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals, FetchError> {
        let source = self.fundamentals_source.name();
        let key = cache_key(source, symbol);
        if let Some(cached) = self.fundamentals_cache.get(&key).await {
            return Ok(cached);
        }

        let fundamentals = with_timeout(
            source,
            symbol,
            self.settings.fetch_timeout,
            self.fundamentals_source.fetch_fundamentals(symbol),
        )
        .await?;

        self.fundamentals_cache
            .put(key, fundamentals.clone())
            .await;
        Ok(fundamentals)
    }

    /// Fetches price and fundamentals for one holding concurrently.
    ///
    /// Failures never propagate: a missing price leaves `current_price`
    /// unknown (valued at purchase price downstream) and missing fundamentals
    /// leave `pe_ratio` and `latest_earnings` unknown.
    pub async fn fetch_holding(&self, holding: &Holding) -> Holding {
        let ticker = holding.ticker();
        let (price, fundamentals) =
            tokio::join!(self.fetch_price(&ticker), self.fetch_fundamentals(&ticker));

        let mut updated = holding.clone();
        match price {
            Ok(quote) => updated.current_price = LiveField::Known(quote.price),
            Err(e) => {
                warn!(symbol = %ticker, error = %e, "Price unavailable, using purchase price");
                updated.current_price = LiveField::Unknown;
            }
        }
        match fundamentals {
            Ok(data) => {
                updated.pe_ratio = LiveField::Known(data.pe_ratio);
                updated.latest_earnings = LiveField::Known(data.latest_earnings);
            }
            Err(e) => {
                warn!(symbol = %ticker, error = %e, "Fundamentals unavailable");
                updated.pe_ratio = LiveField::Unknown;
                updated.latest_earnings = LiveField::Unknown;
            }
        }
        updated
    }

    pub async fn fetch_all(&self, holdings: &[Holding]) -> Vec<Holding> {
        self.fetch_all_with_progress(holdings, &|| ()).await
    }

    /// Fetches all holdings in sequential batches of `batch_size`, pausing
    /// `batch_delay` between batches. Every member of a batch settles before
    /// the next batch starts. Output order matches input order.
    pub async fn fetch_all_with_progress(
        &self,
        holdings: &[Holding],
        on_settled: &(dyn Fn() + Send + Sync),
    ) -> Vec<Holding> {
        let batch_size = self.settings.batch_size.max(1);
        let batch_count = holdings.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(holdings.len());

        for (index, batch) in holdings.chunks(batch_size).enumerate() {
            debug!(
                batch = index + 1,
                of = batch_count,
                size = batch.len(),
                "Fetching batch"
            );
            let batch_futures = batch.iter().map(|holding| async move {
                let updated = self.fetch_holding(holding).await;
                on_settled();
                updated
            });
            results.extend(join_all(batch_futures).await);

            if index + 1 < batch_count {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        results
    }
}
