use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::selection::FilingStatusRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    #[default]
    Draft,
    Submitted,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxReturn {
    pub id: i64,
    pub tax_year: i32,

    #[serde(flatten)]
    pub filing: FilingStatusRecord,

    // User-provided money fields
    #[serde(default)]
    pub total_income: Option<Decimal>,
    #[serde(default)]
    pub federal_withholding: Option<Decimal>,

    // Server-owned values; the client never computes these
    #[serde(default)]
    pub refund_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_owed: Option<Decimal>,

    #[serde(default)]
    pub status: ReturnStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new returns (no id, server values or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxReturn {
    pub tax_year: i32,

    #[serde(flatten)]
    pub filing: FilingStatusRecord,

    pub total_income: Option<Decimal>,
    pub federal_withholding: Option<Decimal>,
}

impl TaxReturn {
    /// Replaces the editable parts of this return with `update`.
    pub fn apply(
        &mut self,
        update: NewTaxReturn,
    ) {
        self.tax_year = update.tax_year;
        self.filing = update.filing;
        self.total_income = update.total_income;
        self.federal_withholding = update.federal_withholding;
    }
}
