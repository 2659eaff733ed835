use folio::core::analytics;
use folio::core::config::AppConfig;
use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(prices: &[(&str, f64)]) -> MockServer {
        let mock_server = MockServer::start().await;

        for (ticker, price) in prices {
            let body = format!(
                r#"{{"chart": {{"result": [{{"meta": {{"regularMarketPrice": {price}}}}}], "error": null}}}}"#
            );
            Mock::given(method("GET"))
                .and(path(format!("/v8/finance/chart/{ticker}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&mock_server)
                .await;
        }

        mock_server
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(config_file.path(), content).expect("Failed to write config file");
    config_file
}

fn mock_config(base_url: &str) -> String {
    format!(
        r#"
        holdings:
          - id: "1"
            name: "Tata Consultancy Services"
            symbol: "TCS"
            purchase_price: 3200.0
            quantity: 15
            sector: "Technology"
            exchange: NSE
          - id: "2"
            name: "Tata Power"
            symbol: "TATAPOWER"
            purchase_price: 224.0
            quantity: 225
            sector: "Energy"
            exchange: BSE
        refresh:
          batch_size: 2
          batch_delay_ms: 0
        providers:
          yahoo:
            base_url: {base_url}
        "#
    )
}

#[test_log::test(tokio::test)]
async fn test_summary_flow_with_mock() {
    let mock_server =
        test_utils::create_mock_server(&[("TCS.NS", 3010.0), ("TATAPOWER.BO", 246.5)]).await;
    let config_file = write_config(&mock_config(&mock_server.uri()));

    let result = folio::run_command(
        folio::AppCommand::Summary,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Summary command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_sectors_flow_with_mock() {
    let mock_server =
        test_utils::create_mock_server(&[("TCS.NS", 3010.0), ("TATAPOWER.BO", 246.5)]).await;
    let config_file = write_config(&mock_config(&mock_server.uri()));

    let result = folio::run_command(
        folio::AppCommand::Sectors,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Sectors command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_mock_prices_flow_into_metrics() {
    let mock_server =
        test_utils::create_mock_server(&[("TCS.NS", 3010.0), ("TATAPOWER.BO", 246.5)]).await;
    let config_file = write_config(&mock_config(&mock_server.uri()));
    let config = AppConfig::load_from_path(config_file.path()).expect("config should load");

    let fetcher = folio::build_fetcher(&config);
    let updated = fetcher.fetch_all(&config.holdings).await;
    let enriched = analytics::compute_metrics(&updated);
    info!(?enriched, "Computed metrics from mocked prices");

    assert_eq!(enriched[0].market_price, 3010.0);
    assert_eq!(enriched[0].present_value, 45150.0);
    assert_eq!(enriched[1].market_price, 246.5);
    assert_eq!(enriched[1].gain_loss, 5062.5);
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let result = folio::run_command(
        folio::AppCommand::Summary,
        Some("/nonexistent/folio/config.yaml"),
    )
    .await;
    let err = result.expect_err("missing config should fail");
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_simulated_failures_fall_back_to_purchase_price() {
    let config_file = write_config(
        r#"
        holdings:
          - id: "1"
            name: "Infosys"
            symbol: "INFY"
            purchase_price: 1450.0
            quantity: 20
            sector: "Technology"
            exchange: NSE
        providers:
          simulated:
            failure_rate: 1.0
        "#,
    );
    let config = AppConfig::load_from_path(config_file.path()).expect("config should load");

    let fetcher = folio::build_fetcher(&config);
    let updated = fetcher.fetch_all(&config.holdings).await;
    let enriched = analytics::compute_metrics(&updated);

    assert!(!updated[0].current_price.is_known());
    assert!(!updated[0].pe_ratio.is_known());
    assert_eq!(enriched[0].present_value, enriched[0].investment);
    assert_eq!(enriched[0].gain_loss, 0.0);
}
