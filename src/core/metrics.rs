//! Scalar summary statistics over a price series.
use super::error::{DashboardError, Result};
use super::series::PriceSeries;
use serde::Serialize;

/// Lookback, in rows, of the headline return.
pub const RETURN_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub latest_close: f64,
    pub period_high: f64,
    pub period_low: f64,
    pub average_volume: f64,
    /// Percentage change from the close `return_window` rows back to the latest close.
    pub period_return: f64,
    pub return_window: usize,
}

/// Summarizes `series` with the default 30-row return.
pub fn summarize(series: &PriceSeries) -> Result<SummaryMetrics> {
    summarize_with_window(series, RETURN_WINDOW)
}

/// Summarizes `series`, computing the return against the close `window` rows
/// from the end (the last row counts as the first of them).
///
/// Fails with `InsufficientHistory` when the series has fewer than `window`
/// rows. No fallback to a shorter window is attempted.
pub fn summarize_with_window(series: &PriceSeries, window: usize) -> Result<SummaryMetrics> {
    let bars = series.bars();
    if window == 0 || bars.len() < window {
        return Err(DashboardError::InsufficientHistory {
            required: window,
            available: bars.len(),
        });
    }

    let latest_close = bars[bars.len() - 1].close;
    let reference_close = bars[bars.len() - window].close;

    let period_high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let period_low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let average_volume = bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;
    let period_return = (latest_close / reference_close - 1.0) * 100.0;

    Ok(SummaryMetrics {
        latest_close,
        period_high,
        period_low,
        average_volume,
        period_return,
        return_window: window,
    })
}
