pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::TtlCache;
use crate::core::config::AppConfig;
use crate::core::fetcher::MarketDataFetcher;
use crate::core::market::PriceSource;
use crate::core::refresh::{RefreshPipeline, RefreshScheduler};
use crate::providers::simulated::{SimulatedFundamentalsSource, SimulatedPriceSource};
use crate::providers::yahoo_finance::YahooPriceSource;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Summary,
    Sectors,
    Watch,
}

/// Wires the configured sources and shared caches into a fetcher.
pub fn build_fetcher(config: &AppConfig) -> MarketDataFetcher {
    let ttl = config.refresh.cache_ttl();
    let price_cache = Arc::new(TtlCache::new(ttl));
    let fundamentals_cache = Arc::new(TtlCache::new(ttl));
    let failure_rate = config.providers.simulated.failure_rate;

    let price_source: Arc<dyn PriceSource> = match &config.providers.yahoo {
        Some(yahoo) => {
            debug!(base_url = %yahoo.base_url, "Using Yahoo Finance prices");
            Arc::new(YahooPriceSource::new(&yahoo.base_url))
        }
        None => {
            debug!("Using simulated prices");
            let anchors = config
                .holdings
                .iter()
                .map(|h| (h.ticker(), h.purchase_price));
            Arc::new(
                SimulatedPriceSource::new()
                    .with_anchors(anchors)
                    .with_failure_rate(failure_rate),
            )
        }
    };
    let fundamentals_source =
        Arc::new(SimulatedFundamentalsSource::new().with_failure_rate(failure_rate));

    MarketDataFetcher::new(
        price_source,
        fundamentals_source,
        price_cache,
        fundamentals_cache,
        config.refresh.fetcher_settings(),
    )
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Portfolio dashboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let fetcher = build_fetcher(&config);
    let currency = config.currency_symbol.as_str();

    match command {
        AppCommand::Summary => cli::summary::run(&fetcher, &config.holdings, currency).await,
        AppCommand::Sectors => cli::sectors::run(&fetcher, &config.holdings, currency).await,
        AppCommand::Watch => {
            let pipeline = Arc::new(RefreshPipeline::new(
                Arc::new(fetcher),
                config.holdings.clone(),
            ));
            let scheduler = Arc::new(RefreshScheduler::new(pipeline, config.refresh.interval()));
            cli::watch::run(scheduler, currency).await
        }
    }
}
