//! Fundamental statements and company metadata as returned by a provider.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One statement with a row per reporting period, keyed by period end date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FundamentalTable {
    pub periods: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl FundamentalTable {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// The most recent reporting period and its line items.
    pub fn latest(&self) -> Option<(&NaiveDate, &BTreeMap<String, f64>)> {
        self.periods.iter().next_back()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FundamentalTables {
    pub income_statement: FundamentalTable,
    pub balance_sheet: FundamentalTable,
    pub cash_flow: FundamentalTable,
}

impl FundamentalTables {
    /// Statements paired with their display names.
    pub fn named(&self) -> [(&'static str, &FundamentalTable); 3] {
        [
            ("Income Statement", &self.income_statement),
            ("Balance Sheet", &self.balance_sheet),
            ("Cash Flow", &self.cash_flow),
        ]
    }
}

/// Provider company metadata, flattened to key/value pairs.
pub type CompanyInfo = BTreeMap<String, serde_json::Value>;
