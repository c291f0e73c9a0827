//! Failure kinds a dashboard request can end with.

use std::fmt::Display;
use thiserror::Error;

/// The chart builders that reject empty input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    VolumeHistogram,
    CorrelationHeatmap,
}

impl Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChartKind::VolumeHistogram => "volume histogram",
                ChartKind::CorrelationHeatmap => "correlation heatmap",
            }
        )
    }
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("No data found for ticker {ticker}")]
    EmptyResult { ticker: String },

    #[error("Insufficient history for {required}-day return: {available} rows available")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Cannot build {0} from an empty table")]
    EmptyChartInput(ChartKind),

    #[error("Invalid price series: {0}")]
    InvalidSeries(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
