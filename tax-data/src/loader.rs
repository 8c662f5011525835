use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{FilingStatusCode, StandardDeductionTable};
use thiserror::Error;

/// Errors that can occur when loading standard deduction data.
#[derive(Debug, Error)]
pub enum DeductionLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("cannot read '{path}': {message}")]
    Io { path: String, message: String },

    /// `row` is 1-based (header = row 0).
    #[error("unrecognised filing status '{status}' on row {row}")]
    InvalidFilingStatus { status: String, row: usize },

    #[error("negative amount {amount} on row {row}")]
    NegativeAmount { amount: Decimal, row: usize },

    #[error("duplicate entry for {tax_year} / {status} on row {row}")]
    Duplicate {
        tax_year: i32,
        status: String,
        row: usize,
    },
}

impl From<csv::Error> for DeductionLoaderError {
    fn from(err: csv::Error) -> Self {
        DeductionLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the standard deductions CSV file.
///
/// - `tax_year`: The tax year (e.g., 2024)
/// - `filing_status`: Wire value (`single`, `married_jointly`, ...)
/// - `amount`: The standard deduction in dollars
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StandardDeductionRecord {
    pub tax_year: i32,
    pub filing_status: String,
    pub amount: Decimal,
}

/// Loader for standard deduction tables from CSV.
///
/// Statuses missing from the file simply have no entry in the resulting
/// table, so lookups report them as unknown.
pub struct StandardDeductionLoader;

impl StandardDeductionLoader {
    /// Parse standard deduction records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<StandardDeductionRecord>, DeductionLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: StandardDeductionRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into one table per tax year.
    pub fn into_tables(
        records: &[StandardDeductionRecord]
    ) -> Result<BTreeMap<i32, StandardDeductionTable>, DeductionLoaderError> {
        let mut tables: BTreeMap<i32, StandardDeductionTable> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let code = FilingStatusCode::parse(&record.filing_status).ok_or_else(|| {
                DeductionLoaderError::InvalidFilingStatus {
                    status: record.filing_status.clone(),
                    row,
                }
            })?;

            if record.amount.is_sign_negative() {
                return Err(DeductionLoaderError::NegativeAmount {
                    amount: record.amount,
                    row,
                });
            }

            let table = tables
                .entry(record.tax_year)
                .or_insert_with(|| StandardDeductionTable::new(record.tax_year));

            if table.amounts.contains_key(&code) {
                return Err(DeductionLoaderError::Duplicate {
                    tax_year: record.tax_year,
                    status: record.filing_status.clone(),
                    row,
                });
            }
            table.insert(code, record.amount);
        }

        Ok(tables)
    }

    /// Parse and group in one step.
    pub fn load<R: Read>(reader: R) -> Result<BTreeMap<i32, StandardDeductionTable>, DeductionLoaderError> {
        let records = Self::parse(reader)?;
        Self::into_tables(&records)
    }

    /// Convenience wrapper: read a file from disk and delegate to [`load`](Self::load).
    pub fn load_file(path: &Path) -> Result<BTreeMap<i32, StandardDeductionTable>, DeductionLoaderError> {
        let file = std::fs::File::open(path).map_err(|e| DeductionLoaderError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::load(file)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::DeductionAmount;

    use super::*;
    use crate::BUNDLED_STANDARD_DEDUCTIONS;

    #[test]
    fn test_parse_csv_single_record() {
        let csv = "tax_year,filing_status,amount\n2024,single,14600";

        let records = StandardDeductionLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![StandardDeductionRecord {
                tax_year: 2024,
                filing_status: "single".to_string(),
                amount: dec!(14600),
            }]
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let csv = "tax_year, filing_status, amount\n2024 , head_of_household , 21900.00 ";

        let tables = StandardDeductionLoader::load(csv.as_bytes()).expect("Failed to load CSV");

        assert_eq!(
            tables[&2024].get(FilingStatusCode::HeadOfHousehold),
            DeductionAmount::Known(dec!(21900))
        );
    }

    #[test]
    fn test_bundled_data_covers_2022_through_2024() {
        let tables = StandardDeductionLoader::load(BUNDLED_STANDARD_DEDUCTIONS.as_bytes())
            .expect("bundled data should load");

        assert_eq!(tables.keys().copied().collect::<Vec<_>>(), vec![2022, 2023, 2024]);
        for table in tables.values() {
            assert_eq!(table.amounts.len(), 5, "year {}", table.tax_year);
        }
        assert_eq!(
            tables[&2023].get(FilingStatusCode::MarriedJointly),
            DeductionAmount::Known(dec!(27700))
        );
    }

    #[test]
    fn test_missing_status_stays_unknown() {
        let csv = "tax_year,filing_status,amount\n2022,single,12950\n2022,married_jointly,25900";

        let tables = StandardDeductionLoader::load(csv.as_bytes()).unwrap();

        assert_eq!(tables[&2022].get(FilingStatusCode::QualifyingWidow), DeductionAmount::Unknown);
    }

    #[test]
    fn test_invalid_filing_status_reports_row() {
        let csv = "tax_year,filing_status,amount\n2024,single,14600\n2024,MFJ,29200";

        let err = StandardDeductionLoader::load(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            DeductionLoaderError::InvalidFilingStatus { ref status, row: 2 } if status == "MFJ"
        ));
    }

    #[test]
    fn test_duplicate_entry_is_rejected() {
        let csv = "tax_year,filing_status,amount\n2024,single,14600\n2024,single,14700";

        let err = StandardDeductionLoader::load(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, DeductionLoaderError::Duplicate { tax_year: 2024, row: 2, .. }));
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let csv = "tax_year,filing_status,amount\n2024,single,-1";

        let err = StandardDeductionLoader::load(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, DeductionLoaderError::NegativeAmount { row: 1, .. }));
    }

    #[test]
    fn test_non_numeric_amount_is_parse_error() {
        let csv = "tax_year,filing_status,amount\n2024,single,lots";

        let err = StandardDeductionLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, DeductionLoaderError::CsvParse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = StandardDeductionLoader::load_file(Path::new("/nonexistent/deductions.csv"))
            .unwrap_err();

        assert!(matches!(err, DeductionLoaderError::Io { .. }));
    }
}
