use crate::core::fetcher::FetcherSettings;
use crate::core::portfolio::Holding;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::PathBuf, time::Duration};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub cache_ttl_secs: u64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_secs: 15,
            cache_ttl_secs: 30,
            batch_size: 3,
            batch_delay_ms: 1000,
            fetch_timeout_secs: 10,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetcher_settings(&self) -> FetcherSettings {
        FetcherSettings {
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimulatedProviderConfig {
    /// Probability in `[0, 1]` that a simulated call fails.
    pub failure_rate: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    /// Live prices from Yahoo Finance. Prices are simulated when absent.
    pub yahoo: Option<YahooProviderConfig>,
    #[serde(default)]
    pub simulated: SimulatedProviderConfig,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!(holdings = config.holdings.len(), "Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for holding in &self.holdings {
            holding.validate()?;
            if !ids.insert(holding.id.as_str()) {
                bail!("Duplicate holding id: {}", holding.id);
            }
        }

        let failure_rate = self.providers.simulated.failure_rate;
        if !(0.0..=1.0).contains(&failure_rate) {
            bail!("providers.simulated.failure_rate must be between 0 and 1, got {failure_rate}");
        }
        if self.refresh.interval_secs == 0 {
            bail!("refresh.interval_secs must be greater than 0");
        }
        if self.refresh.batch_size == 0 {
            bail!("refresh.batch_size must be greater than 0");
        }
        Ok(())
    }
}
