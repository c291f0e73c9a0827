//! Daily price bars and the tabular views derived from them.

use super::error::{DashboardError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rows shown in the recent-data preview.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars for one ticker, strictly ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series, rejecting out-of-order or duplicate dates and
    /// negative or non-finite prices.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DashboardError::InvalidSeries(format!(
                    "dates must be strictly increasing, found {} after {}",
                    pair[1].date, pair[0].date
                )));
            }
        }
        for bar in &bars {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(DashboardError::InvalidSeries(format!(
                    "negative or non-finite price on {}",
                    bar.date
                )));
            }
        }
        Ok(Self { bars })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// The last `n` bars, newest first.
    pub fn tail_newest_first(&self, n: usize) -> Vec<PriceBar> {
        self.bars.iter().rev().take(n).copied().collect()
    }

    /// Every numeric column of the series, in display order.
    pub fn numeric_table(&self) -> NumericTable {
        let bars = &self.bars;
        NumericTable {
            columns: vec![
                ("Open".to_string(), column(bars, |b| b.open)),
                ("High".to_string(), column(bars, |b| b.high)),
                ("Low".to_string(), column(bars, |b| b.low)),
                ("Close".to_string(), column(bars, |b| b.close)),
                ("Volume".to_string(), column(bars, |b| b.volume as f64)),
            ],
        }
    }
}

fn column(bars: &[PriceBar], f: impl Fn(&PriceBar) -> f64) -> Vec<f64> {
    bars.iter().map(f).collect()
}

/// Named numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericTable {
    columns: Vec<(String, Vec<f64>)>,
}

impl NumericTable {
    pub fn new(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if let Some((_, first)) = columns.first() {
            let rows = first.len();
            if let Some((name, _)) = columns.iter().find(|(_, values)| values.len() != rows) {
                return Err(DashboardError::InvalidSeries(format!(
                    "column {name} does not have {rows} rows"
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, values)| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
