//! Market data abstractions

use super::error::{DashboardError, Result};
use super::fundamentals::{CompanyInfo, FundamentalTables};
use super::series::PriceSeries;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument};

/// A source of price history, fundamentals and company metadata.
///
/// An unknown ticker yields an empty `PriceSeries` rather than an error;
/// transport and decoding failures are errors.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars with dates in `[start, end)`.
    async fn fetch_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<PriceSeries>;

    async fn fetch_fundamentals(&self, ticker: &str) -> anyhow::Result<FundamentalTables>;

    async fn fetch_company_info(&self, ticker: &str) -> anyhow::Result<CompanyInfo>;
}

/// Fetches the price history and fundamentals for one request.
#[instrument(name = "DataFetch", skip(provider))]
pub async fn fetch(
    provider: &(dyn MarketDataProvider + Send + Sync),
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(PriceSeries, FundamentalTables)> {
    if ticker.trim().is_empty() {
        return Err(DashboardError::InvalidRequest(
            "ticker must not be empty".to_string(),
        ));
    }
    if start > end {
        return Err(DashboardError::InvalidRequest(format!(
            "start date {start} is after end date {end}"
        )));
    }

    let series = provider.fetch_price_history(ticker, start, end).await?;
    debug!(rows = series.len(), "Fetched price history");

    let fundamentals = provider.fetch_fundamentals(ticker).await?;
    debug!(
        income_periods = fundamentals.income_statement.periods.len(),
        balance_periods = fundamentals.balance_sheet.periods.len(),
        cash_flow_periods = fundamentals.cash_flow.periods.len(),
        "Fetched fundamentals"
    );

    Ok((series, fundamentals))
}
