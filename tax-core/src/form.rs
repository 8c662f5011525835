//! Editing session for a single filing status selection.
//!
//! A [`FilingStatusForm`] owns one selection for the lifetime of an edit:
//! it is created empty or hydrated from a stored record, mutated one field at
//! a time, and handed over as an immutable [`FilingStatusRecord`] on submit.

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{FilingStatusRecord, FilingStatusSelection, InvalidStatusValue};
use crate::validation::{
    self, QUALIFYING_PERSON_NAME, QUALIFYING_PERSON_RELATIONSHIP, SPOUSE_NAME, SPOUSE_SSN,
    ValidationErrors,
};

pub const SPOUSE_HAS_INCOME: &str = "spouse_has_income";
pub const SPOUSE_ITEMIZES: &str = "spouse_itemizes";
pub const LIVED_WITH_TAXPAYER: &str = "lived_with_taxpayer";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusValue),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// The field exists but belongs to a status other than the current one.
    #[error("field '{field}' does not apply to filing status '{status}'")]
    FieldNotApplicable { field: String, status: String },
}

/// Which optional sub-forms are shown for the current status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibleGroups {
    pub spouse: bool,
    pub qualifying_person: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FilingStatusForm {
    selection: FilingStatusSelection,
    errors: ValidationErrors,
}

impl FilingStatusForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrates a form from an existing record.
    pub fn from_record(record: FilingStatusRecord) -> Result<Self, InvalidStatusValue> {
        Ok(Self {
            selection: FilingStatusSelection::try_from(record)?,
            errors: ValidationErrors::new(),
        })
    }

    pub fn selection(&self) -> &FilingStatusSelection {
        &self.selection
    }

    /// Errors from the last [`validate`](Self::validate) or
    /// [`submit`](Self::submit).
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_for(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn visible_groups(&self) -> VisibleGroups {
        VisibleGroups {
            spouse: self.selection.spouse().is_some(),
            qualifying_person: self.selection.qualifying_person().is_some(),
        }
    }

    /// Changes the filing status. On error the form is left untouched.
    pub fn select_status(
        &mut self,
        new_status: &str,
    ) -> Result<(), FormError> {
        let next = validation::select_status(&self.selection, new_status)?;
        self.selection = next;
        self.errors.clear();
        Ok(())
    }

    /// Sets a text field by its wire name. SSN input is formatted as typed.
    pub fn set_text(
        &mut self,
        field: &str,
        value: &str,
    ) -> Result<(), FormError> {
        let not_applicable = self.not_applicable(field);

        match field {
            SPOUSE_NAME | SPOUSE_SSN => {
                let spouse = self.selection.spouse_mut().ok_or(not_applicable)?;
                if field == SPOUSE_SSN {
                    spouse.ssn = validation::format_ssn(value);
                } else {
                    spouse.name = value.to_string();
                }
            }
            QUALIFYING_PERSON_NAME | QUALIFYING_PERSON_RELATIONSHIP => {
                let person = self.selection.qualifying_person_mut().ok_or(not_applicable)?;
                if field == QUALIFYING_PERSON_NAME {
                    person.name = value.to_string();
                } else {
                    person.relationship = value.to_string();
                }
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        }

        self.errors.remove(field);
        Ok(())
    }

    /// Sets a boolean field by its wire name.
    pub fn set_flag(
        &mut self,
        field: &str,
        value: bool,
    ) -> Result<(), FormError> {
        let not_applicable = self.not_applicable(field);

        match field {
            SPOUSE_HAS_INCOME => {
                self.selection.spouse_mut().ok_or(not_applicable)?.has_income = value;
            }
            SPOUSE_ITEMIZES => {
                self.selection.spouse_mut().ok_or(not_applicable)?.itemizes = value;
            }
            LIVED_WITH_TAXPAYER => {
                self.selection
                    .qualifying_person_mut()
                    .ok_or(not_applicable)?
                    .lived_with_taxpayer = value;
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        }

        Ok(())
    }

    /// Re-runs validation and stores the result for inline display.
    pub fn validate(&mut self) -> &ValidationErrors {
        self.errors = validation::validate(&self.selection);
        &self.errors
    }

    /// Validates and, when valid, returns the normalized record to send.
    ///
    /// An invalid form keeps its state so the user can keep editing.
    pub fn submit(&mut self) -> Result<FilingStatusRecord, ValidationErrors> {
        if !self.validate().is_empty() {
            info!(
                status = %self.selection.code(),
                errors = self.errors.len(),
                "submission blocked by validation"
            );
            return Err(self.errors.clone());
        }

        let record = FilingStatusRecord::from(validation::normalize(&self.selection));
        debug!(status = %record.filing_status, "filing status ready for submission");
        Ok(record)
    }

    fn not_applicable(
        &self,
        field: &str,
    ) -> FormError {
        FormError::FieldNotApplicable {
            field: field.to_string(),
            status: self.selection.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{FilingStatusCode, SpouseDetails};

    fn married_form() -> FilingStatusForm {
        let mut form = FilingStatusForm::new();
        form.select_status("married_jointly").unwrap();
        form
    }

    #[test]
    fn new_form_defaults_to_single_with_no_groups() {
        let form = FilingStatusForm::new();

        assert_eq!(form.selection().code(), FilingStatusCode::Single);
        assert_eq!(form.visible_groups(), VisibleGroups::default());
    }

    #[test]
    fn visible_groups_follow_status() {
        let mut form = FilingStatusForm::new();

        form.select_status("married_separately").unwrap();
        assert_eq!(
            form.visible_groups(),
            VisibleGroups {
                spouse: true,
                qualifying_person: false
            }
        );

        form.select_status("head_of_household").unwrap();
        assert_eq!(
            form.visible_groups(),
            VisibleGroups {
                spouse: false,
                qualifying_person: true
            }
        );
    }

    #[test]
    fn invalid_status_leaves_form_unchanged() {
        let mut form = married_form();
        form.set_text(SPOUSE_NAME, "Alex Doe").unwrap();
        let before = form.selection().clone();

        let result = form.select_status("common_law");

        assert_eq!(
            result,
            Err(FormError::InvalidStatus(InvalidStatusValue(
                "common_law".to_string()
            )))
        );
        assert_eq!(form.selection(), &before);
    }

    #[test]
    fn ssn_is_formatted_as_typed() {
        let mut form = married_form();

        form.set_text(SPOUSE_SSN, "12345").unwrap();
        assert_eq!(form.selection().spouse().unwrap().ssn, "123-45");

        form.set_text(SPOUSE_SSN, "123-45-67891").unwrap();
        assert_eq!(form.selection().spouse().unwrap().ssn, "123-45-6789");
    }

    #[test]
    fn editing_field_of_other_status_is_rejected() {
        let mut form = FilingStatusForm::new();

        let result = form.set_text(SPOUSE_NAME, "Alex");

        assert_eq!(
            result,
            Err(FormError::FieldNotApplicable {
                field: SPOUSE_NAME.to_string(),
                status: "single".to_string(),
            })
        );
        assert_eq!(form.set_flag(LIVED_WITH_TAXPAYER, true), Err(FormError::FieldNotApplicable {
            field: LIVED_WITH_TAXPAYER.to_string(),
            status: "single".to_string(),
        }));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut form = married_form();

        assert_eq!(
            form.set_text("spouse_dob", "1990-01-01"),
            Err(FormError::UnknownField("spouse_dob".to_string()))
        );
        assert_eq!(
            form.set_flag("spouse_name", true),
            Err(FormError::UnknownField("spouse_name".to_string()))
        );
    }

    #[test]
    fn submit_blocked_keeps_errors_and_state() {
        let mut form = married_form();
        form.set_flag(SPOUSE_HAS_INCOME, true).unwrap();

        let errors = form.submit().unwrap_err();

        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![SPOUSE_NAME, SPOUSE_SSN]);
        assert_eq!(form.error_for(SPOUSE_SSN), Some("Spouse SSN is required"));
        assert!(form.selection().spouse().unwrap().has_income);
    }

    #[test]
    fn editing_a_field_clears_its_inline_error() {
        let mut form = married_form();
        form.validate();

        form.set_text(SPOUSE_NAME, "Alex Doe").unwrap();

        assert_eq!(form.error_for(SPOUSE_NAME), None);
        assert!(form.error_for(SPOUSE_SSN).is_some());
    }

    #[test]
    fn submit_returns_normalized_record() {
        let mut form = married_form();
        form.set_text(SPOUSE_NAME, " Alex Doe ").unwrap();
        form.set_text(SPOUSE_SSN, "123456789").unwrap();
        form.set_flag(SPOUSE_ITEMIZES, true).unwrap();

        let record = form.submit().unwrap();

        assert_eq!(
            record,
            FilingStatusRecord {
                filing_status: "married_jointly".to_string(),
                spouse_name: "Alex Doe".to_string(),
                spouse_ssn: "123-45-6789".to_string(),
                spouse_itemizes: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn from_record_hydrates_selection() {
        let record = FilingStatusRecord {
            filing_status: "married_separately".to_string(),
            spouse_name: "Alex Doe".to_string(),
            spouse_ssn: "123-45-6789".to_string(),
            ..Default::default()
        };

        let form = FilingStatusForm::from_record(record).unwrap();

        assert_eq!(
            form.selection(),
            &FilingStatusSelection::MarriedSeparately(SpouseDetails {
                name: "Alex Doe".to_string(),
                ssn: "123-45-6789".to_string(),
                ..Default::default()
            })
        );
    }
}
