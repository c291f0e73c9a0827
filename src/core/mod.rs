//! Core business logic abstractions

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fundamentals;
pub mod log;
pub mod metrics;
pub mod provider;
pub mod ratios;
pub mod series;

// Re-export main types for cleaner imports
pub use dashboard::{Dashboard, DashboardRequest, Panel, build_dashboard};
pub use error::{ChartKind, DashboardError};
pub use fundamentals::{CompanyInfo, FundamentalTable, FundamentalTables};
pub use provider::MarketDataProvider;
pub use series::{NumericTable, PriceBar, PriceSeries};
