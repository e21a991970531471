use chrono::NaiveDate;
use ledgerfx::cli::fetch::{FetchOptions, Outcome, SourceKind};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const USD_PAYLOAD: &str = "Měna: USD|Množství: 1\n\
        Datum|Kurz\n\
        02.01.2020|22,627\n\
        03.01.2020|22,743\n\
        03.02.2020|23,106\n";

    pub const HUF_PAYLOAD: &str = "Měna: HUF|Množství: 100\n\
        Datum|Kurz\n\
        02.01.2020|7,695\n";

    pub const AAPL_CSV: &str = "Date,Open,High,Low,Close,Volume\n\
        2020-01-02,74.06,75.15,73.80,75.09,135480400\n\
        2020-01-03,74.29,75.14,74.13,74.36,146322800\n\
        2020-01-06,73.45,74.99,73.19,74.95,118387200\n";

    pub const CEZ_JSON: &str = r#"{
        "data": {
            "additional": {"currency": "CZK"},
            "value": [[1577923200000, 494.5], [1580601600000, 480.0]]
        }
    }"#;

    pub async fn create_mock_server() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vybrane.txt"))
            .and(query_param("mena", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(USD_PAYLOAD))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vybrane.txt"))
            .and(query_param("mena", "HUF"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HUF_PAYLOAD))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vybrane.txt"))
            .and(query_param("mena", "XXX"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/q/d/l/"))
            .and(query_param("s", "AAPL.us"))
            .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_CSV))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/instrument-chart"))
            .and(query_param("isin", "CZ0005112300"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CEZ_JSON))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn config_yaml(base_url: &str, output_dir: &str) -> String {
        format!(
            r#"
output_dir: "{output_dir}"
cnb:
  base_url: "{base_url}/vybrane.txt"
  start_date: 2020-01-01
  currencies: ["USD", "HUF", "XXX"]
stooq:
  base_url: "{base_url}/q/d/l/"
  start_date: 2020-01-01
  tickers: ["AAPL"]
  convert_to: "CZK"
  converted: ["AAPL"]
pse:
  base_url: "{base_url}"
  stocks:
    - isin: "CZ0005112300"
      name: "BAACEZ"
"#
        )
    }
}

fn write_config(dir: &Path, base_url: &str, output_dir: &Path) -> String {
    let config_path = dir.join("config.yaml");
    fs::write(
        &config_path,
        test_utils::config_yaml(base_url, &output_dir.display().to_string()),
    )
    .unwrap();
    config_path.display().to_string()
}

fn options() -> FetchOptions {
    FetchOptions {
        end_date: NaiveDate::from_ymd_opt(2020, 2, 28),
        ..FetchOptions::default()
    }
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap_or_else(|e| panic!("{name}: {e}"))
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("prices");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), &output_dir);

    let entries = ledgerfx::fetch(&options(), Some(config_path.as_str()))
        .await
        .unwrap();
    info!(count = entries.len(), "Fetch finished");

    assert_eq!(
        read(&output_dir, "USDCZK.ledger"),
        "P 2020/01/02 USD 22.627 CZK\nP 2020/01/03 USD 22.743 CZK\nP 2020/02/03 USD 23.106 CZK\n"
    );
    assert_eq!(
        read(&output_dir, "USDCZK-monthly.ledger"),
        "P 2020/01/02 USD 22.627 CZK\nP 2020/02/03 USD 23.106 CZK\n"
    );
    // Quoted per 100 units.
    assert_eq!(
        read(&output_dir, "HUFCZK.ledger"),
        "P 2020/01/02 HUF 0.07695 CZK\n"
    );

    assert_eq!(
        read(&output_dir, "AAPL.ledger"),
        "P 2020/01/02 AAPL 75.09 USD\nP 2020/01/03 AAPL 74.36 USD\nP 2020/01/06 AAPL 74.95 USD\n"
    );
    // Converted with the USDCZK table written earlier in the same run; the
    // date without a rate is left out.
    assert_eq!(
        read(&output_dir, "AAPLCZK.ledger"),
        "P 2020/01/02 AAPL 1699.06 CZK\nP 2020/01/03 AAPL 1691.17 CZK\n"
    );
    assert_eq!(
        read(&output_dir, "AAPLCZK-monthly.ledger"),
        "P 2020/01/02 AAPL 1699.06 CZK\n"
    );

    assert_eq!(
        read(&output_dir, "BAACEZ.ledger"),
        "P 2020/01/02 BAACEZ 494.50 CZK\nP 2020/02/02 BAACEZ 480.00 CZK\n"
    );

    // The failing currency is reported without touching the others.
    let failed: Vec<_> = entries.iter().filter(|e| !e.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].instrument.id, "XXX");
    match &failed[0].outcome {
        Outcome::Failed(error) => assert!(error.contains("500"), "{error}"),
        Outcome::Written(_) => panic!("XXX should have failed"),
    }
    assert!(!output_dir.join("XXXCZK.ledger").exists());
    assert!(!output_dir.join("XXXCZK-monthly.ledger").exists());
}

#[test_log::test(tokio::test)]
async fn test_rerun_is_byte_identical() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("prices");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), &output_dir);

    ledgerfx::fetch(&options(), Some(config_path.as_str())).await.unwrap();
    let first = read(&output_dir, "AAPLCZK.ledger");
    let first_monthly = read(&output_dir, "USDCZK-monthly.ledger");

    ledgerfx::fetch(&options(), Some(config_path.as_str())).await.unwrap();
    assert_eq!(read(&output_dir, "AAPLCZK.ledger"), first);
    assert_eq!(read(&output_dir, "USDCZK-monthly.ledger"), first_monthly);
}

#[test_log::test(tokio::test)]
async fn test_single_source_and_ticker_filter() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("prices");
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), &output_dir);

    let options = FetchOptions {
        sources: vec![SourceKind::Cnb],
        ticker: Some("USD".to_string()),
        ..options()
    };
    let entries = ledgerfx::fetch(&options, Some(config_path.as_str())).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_ok());
    assert!(output_dir.join("USDCZK.ledger").exists());
    assert!(!output_dir.join("HUFCZK.ledger").exists());
    assert!(!output_dir.join("AAPL.ledger").exists());
}

#[test_log::test(tokio::test)]
async fn test_corrupt_rate_table_aborts_run() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("prices");
    fs::create_dir_all(&output_dir).unwrap();
    fs::write(
        output_dir.join("USDCZK.ledger"),
        "P 2020/01/02 USD not-a-rate CZK\n",
    )
    .unwrap();
    let config_path = write_config(temp_dir.path(), &mock_server.uri(), &output_dir);

    let options = FetchOptions {
        sources: vec![SourceKind::Stooq],
        ..options()
    };
    let error = ledgerfx::fetch(&options, Some(config_path.as_str()))
        .await
        .unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains("Cannot convert AAPL into CZK"), "{message}");
    assert!(message.contains("invalid rate record"), "{message}");
}

#[test_log::test(tokio::test)]
async fn test_run_command_with_missing_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("missing.yaml");

    let result = ledgerfx::run_command(
        ledgerfx::AppCommand::Fetch(options()),
        Some(&config_path.display().to_string()),
    )
    .await;
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file")
    );
}
