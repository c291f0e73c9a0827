use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::header::REFERER;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::core::config::YahooProviderConfig;
use crate::core::fundamentals::{CompanyInfo, FundamentalTable, FundamentalTables};
use crate::core::provider::MarketDataProvider;
use crate::core::series::{PriceBar, PriceSeries};

/// quoteSummary modules holding company metadata.
const INFO_MODULES: &str = "summaryDetail,defaultKeyStatistics";

const FINANCE_REFERER: &str = "https://finance.yahoo.com/";

/// Statement modules and the key of the per-period list inside each.
const INCOME_STATEMENT: (&str, &str) = ("incomeStatementHistory", "incomeStatementHistory");
const BALANCE_SHEET: (&str, &str) = ("balanceSheetHistory", "balanceSheetStatements");
const CASH_FLOW: (&str, &str) = ("cashflowStatementHistory", "cashflowStatements");

pub struct YahooFinanceProvider {
    base_url: String,
    cookie_url: String,
    client: reqwest::Client,
    /// Crumb bound to the session cookie held in `client`'s cookie store.
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceProvider {
    pub fn new(config: &YahooProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(YahooFinanceProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            client,
            crumb: Mutex::new(None),
        })
    }

    async fn send(&self, url: &str, symbol: &str) -> Result<Response> {
        debug!("Requesting {}", url);
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))
    }

    /// Decodes a JSON body. `Ok(None)` means the provider has no data for
    /// the symbol (HTTP 404).
    async fn decode<T: DeserializeOwned>(response: Response, symbol: &str) -> Result<Option<T>> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("No data for symbol {}", symbol);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("HTTP error: {} for symbol: {}", status, symbol));
        }

        let text = response.text().await?;
        let data = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;
        Ok(Some(data))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<Option<T>> {
        let response = self.send(url, symbol).await?;
        Self::decode(response, symbol).await
    }

    /// Returns the cached crumb, running the cookie and crumb handshake on
    /// first use.
    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }
        let crumb = self.fetch_crumb().await?;
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<String> {
        // Only the Set-Cookie header matters here; the page itself often 404s.
        debug!("Requesting session cookie from {}", self.cookie_url);
        let response = self
            .client
            .get(&self.cookie_url)
            .header(REFERER, FINANCE_REFERER)
            .send()
            .await
            .with_context(|| {
                format!("Failed to fetch Yahoo session cookie from {}", self.cookie_url)
            })?;
        debug!(status = %response.status(), "Session cookie response");

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        debug!("Requesting {}", url);
        let response = self
            .client
            .get(&url)
            .header(REFERER, FINANCE_REFERER)
            .send()
            .await
            .context("Failed to fetch Yahoo crumb")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP error: {} while fetching Yahoo crumb", status));
        }

        let body = response.text().await?;
        let crumb = body.trim();
        if crumb.is_empty()
            || crumb.len() >= 100
            || crumb.contains(char::is_whitespace)
            || crumb.contains('<')
        {
            return Err(anyhow!("Invalid Yahoo crumb response: {:?}", crumb));
        }
        debug!("Obtained Yahoo crumb");
        Ok(crumb.to_string())
    }

    async fn quote_summary_url(&self, symbol: &str, modules: &str) -> Result<String> {
        let crumb = self.crumb().await?;
        let url = Url::parse_with_params(
            &format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol),
            &[("modules", modules), ("crumb", crumb.as_str())],
        )
        .context("Failed to build quoteSummary URL")?;
        Ok(url.into())
    }

    /// Fetches the quoteSummary `modules` for `symbol` and returns the first
    /// result object, if any. A rejected crumb is refreshed once.
    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Option<Value>> {
        let url = self.quote_summary_url(symbol, modules).await?;
        let mut response = self.send(&url, symbol).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Crumb rejected for {}, refreshing", symbol);
            self.crumb.lock().await.take();
            let url = self.quote_summary_url(symbol, modules).await?;
            response = self.send(&url, symbol).await?;
        }

        let response: Option<QuoteSummaryResponse> = Self::decode(response, symbol).await?;
        Ok(response
            .and_then(|r| r.quote_summary.result)
            .and_then(|results| results.into_iter().next()))
    }

    async fn fetch_statement(
        &self,
        symbol: &str,
        statement: (&str, &str),
    ) -> Result<FundamentalTable> {
        let (module, list_key) = statement;
        let result = self.quote_summary(symbol, module).await?;
        let rows = result
            .as_ref()
            .and_then(|r| r.get(module))
            .and_then(|m| m.get(list_key))
            .and_then(Value::as_array);

        let mut table = FundamentalTable::default();
        for row in rows.into_iter().flatten() {
            match statement_period(row) {
                Some((period, items)) => {
                    table.periods.insert(period, items);
                }
                None => warn!(module, "Skipping statement row without an end date"),
            }
        }
        Ok(table)
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug, Default)]
struct ChartMeta {
    #[serde(alias = "gmtoffset", default)]
    gmt_offset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryResponse {
    #[serde(alias = "quoteSummary")]
    quote_summary: QuoteSummaryResult,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryResult {
    result: Option<Vec<Value>>,
}

/// Converts a chart payload into bars dated in the exchange's local calendar,
/// keeping only dates in `[start, end)`.
fn bars_from_chart(item: &ChartItem, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    let (Some(timestamps), Some(quote)) = (
        item.timestamp.as_ref(),
        item.indicators.as_ref().and_then(|i| i.quote.first()),
    ) else {
        return Vec::new();
    };

    let mut rows: Vec<(i64, PriceBar)> = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            field(&quote.open[..]),
            field(&quote.high[..]),
            field(&quote.low[..]),
            field(&quote.close[..]),
            quote.volume.get(i).copied().flatten(),
        ) else {
            debug!(timestamp = ts, "Dropping bar with missing fields");
            continue;
        };
        let Some(date) =
            DateTime::from_timestamp(ts + item.meta.gmt_offset, 0).map(|dt| dt.date_naive())
        else {
            warn!(timestamp = ts, "Dropping bar with out-of-range timestamp");
            continue;
        };
        if date < start || date >= end {
            continue;
        }
        rows.push((
            *ts,
            PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            },
        ));
    }

    rows.sort_by_key(|(ts, _)| *ts);
    let mut bars: Vec<PriceBar> = Vec::with_capacity(rows.len());
    for (_, bar) in rows {
        // Intraday refreshes can repeat a date; the later bar wins.
        match bars.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => bars.push(bar),
        }
    }
    bars
}

/// Unwraps Yahoo's `{"raw": .., "fmt": ..}` wrapper. Empty objects mean the
/// field is absent.
fn raw_value(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => map.get("raw").cloned(),
        Value::Array(_) | Value::Null => None,
        scalar => Some(scalar.clone()),
    }
}

fn statement_period(row: &Value) -> Option<(NaiveDate, BTreeMap<String, f64>)> {
    let end_date = row.get("endDate").and_then(raw_value)?.as_i64()?;
    let period = DateTime::from_timestamp(end_date, 0)?.date_naive();

    let items = row
        .as_object()?
        .iter()
        .filter(|(key, _)| key.as_str() != "endDate" && key.as_str() != "maxAge")
        .filter_map(|(key, value)| {
            raw_value(value)
                .and_then(|v| v.as_f64())
                .map(|v| (key.clone(), v))
        })
        .collect();
    Some((period, items))
}

fn flatten_info(result: &Value) -> CompanyInfo {
    let mut info = CompanyInfo::new();
    for module in INFO_MODULES.split(',') {
        let Some(fields) = result.get(module).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in fields {
            if key == "maxAge" {
                continue;
            }
            if let Some(v) = raw_value(value) {
                info.insert(key.clone(), v);
            }
        }
    }
    info
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    #[instrument(name = "YahooHistoryFetch", skip(self), fields(symbol = %ticker))]
    async fn fetch_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            ticker,
            unix_midnight(start),
            unix_midnight(end)
        );

        let Some(data) = self.get_json::<YahooChartResponse>(&url, ticker).await? else {
            return Ok(PriceSeries::empty());
        };
        let Some(item) = data.chart.result.as_ref().and_then(|r| r.first()) else {
            debug!("Chart response had no result for {}", ticker);
            return Ok(PriceSeries::empty());
        };

        let bars = bars_from_chart(item, start, end);
        debug!(rows = bars.len(), "Parsed price bars");
        PriceSeries::new(bars).with_context(|| format!("Invalid price data for symbol: {ticker}"))
    }

    #[instrument(name = "YahooFundamentalsFetch", skip(self), fields(symbol = %ticker))]
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<FundamentalTables> {
        Ok(FundamentalTables {
            income_statement: self.fetch_statement(ticker, INCOME_STATEMENT).await?,
            balance_sheet: self.fetch_statement(ticker, BALANCE_SHEET).await?,
            cash_flow: self.fetch_statement(ticker, CASH_FLOW).await?,
        })
    }

    #[instrument(name = "YahooInfoFetch", skip(self), fields(symbol = %ticker))]
    async fn fetch_company_info(&self, ticker: &str) -> Result<CompanyInfo> {
        let result = self.quote_summary(ticker, INFO_MODULES).await?;
        Ok(result.as_ref().map(flatten_info).unwrap_or_default())
    }
}
