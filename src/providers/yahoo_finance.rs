use crate::core::error::FetchError;
use crate::core::market::{PriceQuote, PriceSource};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

// YahooPriceSource implementation for PriceSource
pub struct YahooPriceSource {
    base_url: String,
}

impl YahooPriceSource {
    pub fn new(base_url: &str) -> Self {
        YahooPriceSource {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
    error: Option<PriceChartError>,
}

#[derive(Deserialize, Debug)]
struct PriceChartError {
    description: String,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    #[instrument(
        name = "YahooPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting price data from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("folio/0.1")
            .build()
            .map_err(|e| FetchError::upstream(self.name(), symbol, e.to_string()))?;
        let response = client.get(&url).send().await.map_err(|e| {
            FetchError::upstream(self.name(), symbol, format!("Request error: {e} URL: {url}"))
        })?;

        let status = response.status();
        debug!(%status, "Received Yahoo response");

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::upstream(self.name(), symbol, e.to_string()))?;
        let data: YahooPriceResponse = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) if status.is_success() => {
                return Err(FetchError::invalid_payload(self.name(), symbol, e.to_string()));
            }
            Err(_) => {
                return Err(FetchError::upstream(
                    self.name(),
                    symbol,
                    format!("HTTP {status}"),
                ));
            }
        };

        if let Some(error) = data.chart.error {
            return Err(FetchError::upstream(self.name(), symbol, error.description));
        }
        if !status.is_success() {
            return Err(FetchError::upstream(
                self.name(),
                symbol,
                format!("HTTP {status}"),
            ));
        }

        let price = data
            .chart
            .result
            .as_ref()
            .and_then(|items| items.first())
            .and_then(|item| item.meta.regular_market_price)
            .ok_or_else(|| {
                FetchError::invalid_payload(self.name(), symbol, "No price data found")
            })?;

        Ok(PriceQuote { price })
    }
}
