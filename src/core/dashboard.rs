//! Builds every panel of the dashboard for one ticker request.
use super::charts::{
    self, CandlestickChart, CorrelationHeatmap, LineChart, PlotlyFigure, VolumeHistogram,
};
use super::error::{DashboardError, Result};
use super::fundamentals::FundamentalTables;
use super::metrics::{self, SummaryMetrics};
use super::provider::{self, MarketDataProvider};
use super::ratios::{self, RatioSet};
use super::series::{PREVIEW_ROWS, PriceBar};
use chrono::{Duration, NaiveDate};
use tracing::{debug, info, instrument};

pub const DEFAULT_TICKER: &str = "AAPL";

/// Length of the fetched price window, ending today.
pub const LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DashboardRequest {
    /// A request for the year ending on `today`.
    pub fn trailing_year(ticker: &str, today: NaiveDate) -> Self {
        DashboardRequest {
            ticker: normalize_ticker(ticker),
            start: today - Duration::days(LOOKBACK_DAYS),
            end: today,
        }
    }
}

pub fn normalize_ticker(input: &str) -> String {
    input.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub ticker: String,
    /// Most recent rows, newest first.
    pub preview: Vec<PriceBar>,
    pub metrics: SummaryMetrics,
    pub line: LineChart,
    pub ratios: RatioSet,
    pub candlestick: CandlestickChart,
    pub volume: VolumeHistogram,
    pub heatmap: CorrelationHeatmap,
    pub fundamentals: FundamentalTables,
}

/// One rendered section, in the order the dashboard shows them.
#[derive(Debug, Clone, Copy)]
pub enum Panel<'a> {
    Title(&'a str),
    Preview(&'a [PriceBar]),
    Metrics(&'a SummaryMetrics),
    Line(&'a LineChart),
    Ratios(&'a RatioSet),
    Candlestick(&'a CandlestickChart),
    VolumeHistogram(&'a VolumeHistogram),
    Heatmap(&'a CorrelationHeatmap),
}

impl Dashboard {
    pub fn panels(&self) -> Vec<Panel<'_>> {
        vec![
            Panel::Title(&self.ticker),
            Panel::Preview(&self.preview),
            Panel::Metrics(&self.metrics),
            Panel::Line(&self.line),
            Panel::Ratios(&self.ratios),
            Panel::Candlestick(&self.candlestick),
            Panel::VolumeHistogram(&self.volume),
            Panel::Heatmap(&self.heatmap),
        ]
    }

    pub fn charts(&self) -> [&dyn PlotlyFigure; 4] {
        [&self.line, &self.candlestick, &self.volume, &self.heatmap]
    }
}

/// Fetches data for `request` and derives every panel.
///
/// An empty price history ends the request with `EmptyResult`; any other
/// failure along the way aborts it with that error.
#[instrument(name = "BuildDashboard", skip(provider), fields(ticker = %request.ticker))]
pub async fn build_dashboard(
    provider: &(dyn MarketDataProvider + Send + Sync),
    request: &DashboardRequest,
) -> Result<Dashboard> {
    info!("Fetching data...");
    let (series, fundamentals) =
        provider::fetch(provider, &request.ticker, request.start, request.end).await?;

    if series.is_empty() {
        debug!("Provider returned no price rows");
        return Err(DashboardError::EmptyResult {
            ticker: request.ticker.clone(),
        });
    }

    let preview = series.tail_newest_first(PREVIEW_ROWS);
    let metrics = metrics::summarize(&series)?;
    let line = charts::line_chart(&series);

    let info = provider.fetch_company_info(&request.ticker).await?;
    let ratios = ratios::extract_ratios(&info);

    let candlestick = charts::candlestick_chart(&series);
    let volume = charts::volume_histogram(&series)?;
    let heatmap = charts::correlation_heatmap(&series.numeric_table())?;

    debug!(rows = series.len(), "Dashboard built");
    Ok(Dashboard {
        ticker: request.ticker.clone(),
        preview,
        metrics,
        line,
        ratios,
        candlestick,
        volume,
        heatmap,
        fundamentals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::test_support::{FailingProvider, StaticProvider};
    use crate::core::ratios::RatioValue;
    use crate::core::series::PriceSeries;
    use crate::core::series::test_support::synthetic_series;
    use serde_json::json;

    fn request() -> DashboardRequest {
        DashboardRequest::trailing_year("aapl", NaiveDate::from_ymd_opt(2025, 6, 30).unwrap())
    }

    #[test]
    fn test_trailing_year_request() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let req = DashboardRequest::trailing_year("  msft ", today);
        assert_eq!(req.ticker, "MSFT");
        assert_eq!(req.start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(req.end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[tokio::test]
    async fn test_end_to_end_four_hundred_rows() {
        let series = synthetic_series(400, |i| 100.0 + (i as f64 / 10.0).sin() * 5.0);
        let mut provider = StaticProvider::new(series.clone());
        provider.info.insert("dividendYield".to_string(), json!(0.005));

        let dashboard = build_dashboard(&provider, &request()).await.unwrap();

        let last = series.last().unwrap();
        assert_eq!(dashboard.ticker, "AAPL");
        assert_eq!(dashboard.metrics.latest_close, last.close);
        assert_eq!(dashboard.line.points.len(), 400);
        for (point, bar) in dashboard.line.points.iter().zip(series.bars()) {
            assert_eq!(point.date, bar.date);
            assert_eq!(point.close, bar.close);
        }
        assert_eq!(dashboard.preview.len(), 5);
        assert_eq!(dashboard.preview[0], *last);
        assert_eq!(dashboard.candlestick.candles.len(), 400);
        assert_eq!(dashboard.volume.total_count(), 400);
        assert_eq!(dashboard.heatmap.columns.len(), 5);
        assert_eq!(dashboard.ratios.dividend_yield, RatioValue::Value(0.5));
        assert_eq!(dashboard.ratios.pe_ratio, RatioValue::NotAvailable);

        assert_eq!(
            *provider.requests.lock().unwrap(),
            vec![
                "history AAPL 2024-06-30 2025-06-30".to_string(),
                "fundamentals AAPL".to_string(),
                "info AAPL".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_panels_in_render_order() {
        let provider = StaticProvider::new(synthetic_series(35, |i| 10.0 + i as f64));
        let dashboard = build_dashboard(&provider, &request()).await.unwrap();

        let names: Vec<&str> = dashboard
            .panels()
            .iter()
            .map(|p| match p {
                Panel::Title(_) => "title",
                Panel::Preview(_) => "preview",
                Panel::Metrics(_) => "metrics",
                Panel::Line(_) => "line",
                Panel::Ratios(_) => "ratios",
                Panel::Candlestick(_) => "candlestick",
                Panel::VolumeHistogram(_) => "volume",
                Panel::Heatmap(_) => "heatmap",
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "title",
                "preview",
                "metrics",
                "line",
                "ratios",
                "candlestick",
                "volume",
                "heatmap"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_series_is_empty_result() {
        let provider = StaticProvider::new(PriceSeries::empty());
        let result = build_dashboard(&provider, &request()).await;

        match result {
            Err(DashboardError::EmptyResult { ticker }) => assert_eq!(ticker, "AAPL"),
            other => panic!("Expected empty result, got {other:?}"),
        }
        // Nothing past the fetch runs.
        assert!(
            !provider
                .requests
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.starts_with("info"))
        );
    }

    #[tokio::test]
    async fn test_short_history_aborts_request() {
        let provider = StaticProvider::new(synthetic_series(10, |i| 10.0 + i as f64));
        let result = build_dashboard(&provider, &request()).await;
        assert!(matches!(
            result,
            Err(DashboardError::InsufficientHistory {
                required: 30,
                available: 10
            })
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_request() {
        let result = build_dashboard(&FailingProvider("timed out"), &request()).await;
        assert!(matches!(result, Err(DashboardError::Provider(_))));
    }
}
