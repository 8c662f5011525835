use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::filing_status::FilingStatusCode;
use crate::money::format_currency;

/// Standard deduction amounts for one tax year, keyed by filing status.
///
/// A status with no entry is unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardDeductionTable {
    pub tax_year: i32,
    pub amounts: BTreeMap<FilingStatusCode, Decimal>,
}

impl StandardDeductionTable {
    pub fn new(tax_year: i32) -> Self {
        Self {
            tax_year,
            amounts: BTreeMap::new(),
        }
    }

    /// Builds a table from the API's `status -> amount` mapping.
    ///
    /// Keys that are not known filing statuses are skipped.
    pub fn from_wire<I, K>(
        tax_year: i32,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let mut table = Self::new(tax_year);
        for (key, amount) in entries {
            match FilingStatusCode::parse(key.as_ref()) {
                Some(code) => {
                    table.amounts.insert(code, amount);
                }
                None => {
                    warn!(tax_year, key = key.as_ref(), "skipping deduction for unknown filing status");
                }
            }
        }
        table
    }

    pub fn insert(
        &mut self,
        code: FilingStatusCode,
        amount: Decimal,
    ) {
        self.amounts.insert(code, amount);
    }

    pub fn get(
        &self,
        code: FilingStatusCode,
    ) -> DeductionAmount {
        self.amounts
            .get(&code)
            .copied()
            .map_or(DeductionAmount::Unknown, DeductionAmount::Known)
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Result of a standard deduction lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "amount")]
pub enum DeductionAmount {
    Known(Decimal),
    /// No data for this status and year. Render "not available", never `$0`.
    Unknown,
}

impl DeductionAmount {
    pub fn known(self) -> Option<Decimal> {
        match self {
            Self::Known(amount) => Some(amount),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for DeductionAmount {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Known(amount) => f.write_str(&format_currency(*amount)),
            Self::Unknown => f.write_str("not available"),
        }
    }
}
