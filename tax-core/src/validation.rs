//! Filing status validation and normalization.
//!
//! Every function here is pure: it reads a selection (or a raw string) and
//! returns a new value. Field errors are keyed by the wire field names of
//! [`FilingStatusRecord`](crate::models::FilingStatusRecord) so a form can
//! show each message next to its input.
//!
//! # Example
//!
//! ```
//! use tax_core::validation::{format_ssn, select_status, validate};
//! use tax_core::FilingStatusSelection;
//!
//! let mut selection = select_status(&FilingStatusSelection::Single, "married_jointly").unwrap();
//! if let Some(spouse) = selection.spouse_mut() {
//!     spouse.name = "Alex Doe".to_string();
//!     spouse.ssn = format_ssn("123456789");
//! }
//!
//! assert!(validate(&selection).is_empty());
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    DeductionAmount, FilingStatusCode, FilingStatusSelection, InvalidStatusValue,
    StandardDeductionTable,
};

pub const SPOUSE_NAME: &str = "spouse_name";
pub const SPOUSE_SSN: &str = "spouse_ssn";
pub const QUALIFYING_PERSON_NAME: &str = "qualifying_person_name";
pub const QUALIFYING_PERSON_RELATIONSHIP: &str = "qualifying_person_relationship";

const SSN_DIGITS: usize = 9;

/// Field name to error message. Empty means the selection is valid.
pub type ValidationErrors = BTreeMap<&'static str, String>;

/// Switches `current` to the status named by `new_status`.
///
/// Spouse details survive only a switch between the two married statuses;
/// qualifying person details survive only when staying head of household.
/// Everything else starts from defaults. `current` is never modified, so a
/// failed switch leaves the caller's selection as it was.
///
/// # Errors
///
/// [`InvalidStatusValue`] when `new_status` is not one of the five wire values.
pub fn select_status(
    current: &FilingStatusSelection,
    new_status: &str,
) -> Result<FilingStatusSelection, InvalidStatusValue> {
    let code: FilingStatusCode = new_status.parse()?;

    let next = match code {
        FilingStatusCode::Single => FilingStatusSelection::Single,
        FilingStatusCode::MarriedJointly => {
            FilingStatusSelection::MarriedJointly(current.spouse().cloned().unwrap_or_default())
        }
        FilingStatusCode::MarriedSeparately => {
            FilingStatusSelection::MarriedSeparately(current.spouse().cloned().unwrap_or_default())
        }
        FilingStatusCode::HeadOfHousehold => FilingStatusSelection::HeadOfHousehold(
            current.qualifying_person().cloned().unwrap_or_default(),
        ),
        FilingStatusCode::QualifyingWidow => FilingStatusSelection::QualifyingWidow,
    };

    debug!(from = %current.code(), to = %code, "filing status selected");
    Ok(next)
}

/// Formats raw input as an SSN (`XXX-XX-XXXX`).
///
/// Non-digits are stripped and separators are inserted as soon as enough
/// digits exist, so partial input formats progressively (`"12345"` becomes
/// `"123-45"`). Digits past the ninth are dropped.
pub fn format_ssn(raw: &str) -> String {
    let digits: Vec<char> = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(SSN_DIGITS)
        .collect();

    let mut formatted = String::with_capacity(SSN_DIGITS + 2);
    for (i, digit) in digits.into_iter().enumerate() {
        if i == 3 || i == 5 {
            formatted.push('-');
        }
        formatted.push(digit);
    }
    formatted
}

/// Counts the ASCII digits in `raw`.
fn digit_count(raw: &str) -> usize {
    raw.chars().filter(char::is_ascii_digit).count()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Checks the fields required by the selected status.
///
/// All violations are reported together.
pub fn validate(selection: &FilingStatusSelection) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if let Some(spouse) = selection.spouse() {
        if is_blank(&spouse.name) {
            errors.insert(SPOUSE_NAME, "Spouse name is required".to_string());
        }

        if is_blank(&spouse.ssn) {
            errors.insert(SPOUSE_SSN, "Spouse SSN is required".to_string());
        } else if digit_count(&spouse.ssn) != SSN_DIGITS {
            errors.insert(SPOUSE_SSN, "Spouse SSN must have exactly 9 digits".to_string());
        }
    }

    if let Some(person) = selection.qualifying_person() {
        if is_blank(&person.name) {
            errors.insert(
                QUALIFYING_PERSON_NAME,
                "Qualifying person name is required".to_string(),
            );
        }

        if is_blank(&person.relationship) {
            errors.insert(
                QUALIFYING_PERSON_RELATIONSHIP,
                "Relationship to qualifying person is required".to_string(),
            );
        }
    }

    if !errors.is_empty() {
        debug!(status = %selection.code(), fields = ?errors.keys().collect::<Vec<_>>(), "filing status invalid");
    }

    errors
}

/// Returns the submission form of `selection`: text trimmed and the spouse
/// SSN in `XXX-XX-XXXX` form.
pub fn normalize(selection: &FilingStatusSelection) -> FilingStatusSelection {
    let mut normalized = selection.clone();

    if let Some(spouse) = normalized.spouse_mut() {
        spouse.name = spouse.name.trim().to_string();
        spouse.ssn = format_ssn(&spouse.ssn);
    }

    if let Some(person) = normalized.qualifying_person_mut() {
        person.name = person.name.trim().to_string();
        person.relationship = person.relationship.trim().to_string();
    }

    normalized
}

/// Looks up the standard deduction for `status` in a year's table.
///
/// A missing entry yields [`DeductionAmount::Unknown`], never zero.
pub fn lookup_standard_deduction(
    table: &StandardDeductionTable,
    status: FilingStatusCode,
) -> DeductionAmount {
    table.get(status)
}
