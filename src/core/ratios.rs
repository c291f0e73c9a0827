//! Financial ratios read from provider company metadata.

use super::fundamentals::CompanyInfo;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RatioValue {
    Value(f64),
    NotAvailable,
}

impl RatioValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RatioValue::Value(v) => Some(*v),
            RatioValue::NotAvailable => None,
        }
    }
}

impl Display for RatioValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatioValue::Value(v) => write!(f, "{v:.2}"),
            RatioValue::NotAvailable => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioSet {
    pub pe_ratio: RatioValue,
    pub eps: RatioValue,
    /// Dividend yield in percent.
    pub dividend_yield: RatioValue,
}

impl RatioSet {
    /// Rows in display order.
    pub fn rows(&self) -> [(&'static str, RatioValue); 3] {
        [
            ("P/E Ratio", self.pe_ratio),
            ("EPS (TTM)", self.eps),
            ("Dividend Yield", self.dividend_yield),
        ]
    }
}

fn numeric(info: &CompanyInfo, key: &str) -> Option<f64> {
    info.get(key).and_then(|v| v.as_f64())
}

pub fn extract_ratios(info: &CompanyInfo) -> RatioSet {
    let value_or_na = |key| numeric(info, key).map_or(RatioValue::NotAvailable, RatioValue::Value);

    // A zero yield is reported as unavailable, same as a missing one.
    let dividend_yield = match numeric(info, "dividendYield") {
        Some(y) if y != 0.0 => RatioValue::Value(y * 100.0),
        _ => RatioValue::NotAvailable,
    };

    RatioSet {
        pe_ratio: value_or_na("trailingPE"),
        eps: value_or_na("trailingEps"),
        dividend_yield,
    }
}
