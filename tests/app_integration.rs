use chrono::{Duration, Utc};
use serde_json::json;
use std::fs;
use stockdash::AppCommand;
use stockdash::cli::show::RenderOptions;
use tempfile::TempDir;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const CRUMB: &str = "integration-crumb";

    /// Serves the session cookie and crumb, and answers quoteSummary calls
    /// without that crumb with 401 like the live service.
    pub async fn create_mock_server(
        symbol: &str,
        chart_status: u16,
        chart_response: &str,
        info_response: &str,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(chart_status).set_body_string(chart_response))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(404).insert_header("set-cookie", "A3=abc; Path=/"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/test/getcrumb"))
            .and(header("cookie", "A3=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CRUMB))
            .mount(&mock_server)
            .await;

        let summary_path = format!("/v10/finance/quoteSummary/{symbol}");
        Mock::given(method("GET"))
            .and(path(summary_path.as_str()))
            .and(query_param("modules", "summaryDetail,defaultKeyStatistics"))
            .and(query_param("crumb", CRUMB))
            .respond_with(ResponseTemplate::new(200).set_body_string(info_response))
            .with_priority(1)
            .mount(&mock_server)
            .await;

        // Statement modules have no data for these symbols.
        Mock::given(method("GET"))
            .and(path(summary_path.as_str()))
            .and(query_param("crumb", CRUMB))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(summary_path.as_str()))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"finance":{"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#,
            ))
            .with_priority(3)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
        let config_content = format!(
            r#"
providers:
  yahoo:
    base_url: "{base_url}"
    cookie_url: "{base_url}/session"
"#
        );
        let config_path = dir.join("config.yaml");
        std::fs::write(&config_path, config_content).unwrap();
        config_path
    }
}

/// Daily bars ending two days ago, so they land inside the trailing year in
/// any local timezone.
fn chart_response(days: i64) -> String {
    let today = Utc::now().date_naive();
    let timestamps: Vec<i64> = (0..days)
        .map(|i| {
            let date = today - Duration::days(days + 1 - i);
            date.and_hms_opt(14, 30, 0).unwrap().and_utc().timestamp()
        })
        .collect();
    let closes: Vec<f64> = (0..days).map(|i| 150.0 + i as f64).collect();
    let opens: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
    let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
    let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
    let volumes: Vec<u64> = (0..days as u64).map(|i| 40_000_000 + i * 10_000).collect();

    json!({
        "chart": {
            "result": [{
                "meta": { "currency": "USD", "gmtoffset": 0 },
                "timestamp": timestamps,
                "indicators": {
                    "quote": [{
                        "open": opens,
                        "high": highs,
                        "low": lows,
                        "close": closes,
                        "volume": volumes
                    }]
                }
            }],
            "error": null
        }
    })
    .to_string()
}

fn info_response() -> String {
    json!({
        "quoteSummary": {
            "result": [{
                "summaryDetail": {
                    "maxAge": 1,
                    "trailingPE": { "raw": 31.2, "fmt": "31.20" },
                    "dividendYield": { "raw": 0.0044, "fmt": "0.44%" }
                },
                "defaultKeyStatistics": {
                    "trailingEps": { "raw": 6.08, "fmt": "6.08" }
                }
            }],
            "error": null
        }
    })
    .to_string()
}

#[test_log::test(tokio::test)]
async fn test_show_with_mock_and_export() {
    let mock_server =
        test_utils::create_mock_server("MSFT", 200, &chart_response(60), &info_response()).await;

    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());
    let export_dir = temp_dir.path().join("out");

    info!("Running show with mock Yahoo server at {}", mock_server.uri());
    let result = stockdash::run_command(
        AppCommand::Show {
            ticker: "msft".to_string(),
            options: RenderOptions {
                export_dir: Some(export_dir.clone()),
                show_fundamentals: true,
            },
        },
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Show command failed: {:?}", result.err());

    let mut files: Vec<String> = fs::read_dir(&export_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "candlestick_chart.json",
            "correlation_heatmap.json",
            "dashboard.html",
            "fundamentals.json",
            "line_chart.json",
            "volume_histogram.json"
        ]
    );

    let candles = fs::read_to_string(export_dir.join("candlestick_chart.json")).unwrap();
    let candles: serde_json::Value = serde_json::from_str(&candles).unwrap();
    assert_eq!(candles["data"][0]["close"].as_array().unwrap().len(), 60);

    let html = fs::read_to_string(export_dir.join("dashboard.html")).unwrap();
    assert!(html.contains("MSFT Stock Data"));
    assert!(html.contains("<td>P/E Ratio</td><td>31.20</td>"));
    assert!(html.contains("<td>Dividend Yield</td><td>0.44</td>"));
}

#[test_log::test(tokio::test)]
async fn test_unknown_ticker_is_not_a_failure() {
    let mock_server = test_utils::create_mock_server(
        "ZZZZZZ",
        404,
        r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#,
        r#"{"quoteSummary":{"result":null,"error":null}}"#,
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());

    let result = stockdash::run_command(
        AppCommand::Show {
            ticker: "ZZZZZZ".to_string(),
            options: RenderOptions::default(),
        },
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Unknown ticker failed: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_short_history_fails() {
    let mock_server =
        test_utils::create_mock_server("NEWCO", 200, &chart_response(10), &info_response()).await;

    let temp_dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());

    let result = stockdash::run_command(
        AppCommand::Show {
            ticker: "NEWCO".to_string(),
            options: RenderOptions::default(),
        },
        config_path.to_str(),
    )
    .await;
    let err = result.unwrap_err().to_string();
    assert_eq!(
        err,
        "Insufficient history for 30-day return: 10 rows available"
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.yaml");

    let result = stockdash::run_command(
        AppCommand::Show {
            ticker: "AAPL".to_string(),
            options: RenderOptions::default(),
        },
        missing.to_str(),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_show_without_session_cookie_fails() {
    let mock_server =
        test_utils::create_mock_server("MSFT", 200, &chart_response(60), &info_response()).await;

    // The cookie page is missing, so the crumb endpoint refuses the request.
    let temp_dir = TempDir::new().unwrap();
    let config_content = format!(
        "providers:\n  yahoo:\n    base_url: \"{0}\"\n    cookie_url: \"{0}/elsewhere\"\n",
        mock_server.uri()
    );
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, config_content).unwrap();

    let result = stockdash::run_command(
        AppCommand::Show {
            ticker: "MSFT".to_string(),
            options: RenderOptions::default(),
        },
        config_path.to_str(),
    )
    .await;
    assert_eq!(
        result.unwrap_err().to_string(),
        "HTTP error: 404 Not Found while fetching Yahoo crumb"
    );
}
