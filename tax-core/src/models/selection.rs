//! Filing status selection and its flat wire record.
//!
//! The selection is a tagged union: each status carries only the fields that
//! apply to it, so stale spouse or qualifying-person data cannot survive a
//! status change. [`FilingStatusRecord`] is the flat shape the API persists.

use serde::{Deserialize, Serialize};

use super::filing_status::{FilingStatusCode, InvalidStatusValue};

/// Spouse details, present only for the married statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpouseDetails {
    pub name: String,
    pub ssn: String,
    pub has_income: bool,
    pub itemizes: bool,
}

/// Qualifying person details, present only for head of household.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingPerson {
    pub name: String,
    pub relationship: String,
    pub lived_with_taxpayer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilingStatusSelection {
    #[default]
    Single,
    MarriedJointly(SpouseDetails),
    MarriedSeparately(SpouseDetails),
    HeadOfHousehold(QualifyingPerson),
    QualifyingWidow,
}

impl FilingStatusSelection {
    pub fn code(&self) -> FilingStatusCode {
        match self {
            Self::Single => FilingStatusCode::Single,
            Self::MarriedJointly(_) => FilingStatusCode::MarriedJointly,
            Self::MarriedSeparately(_) => FilingStatusCode::MarriedSeparately,
            Self::HeadOfHousehold(_) => FilingStatusCode::HeadOfHousehold,
            Self::QualifyingWidow => FilingStatusCode::QualifyingWidow,
        }
    }

    pub fn spouse(&self) -> Option<&SpouseDetails> {
        match self {
            Self::MarriedJointly(spouse) | Self::MarriedSeparately(spouse) => Some(spouse),
            _ => None,
        }
    }

    pub fn spouse_mut(&mut self) -> Option<&mut SpouseDetails> {
        match self {
            Self::MarriedJointly(spouse) | Self::MarriedSeparately(spouse) => Some(spouse),
            _ => None,
        }
    }

    pub fn qualifying_person(&self) -> Option<&QualifyingPerson> {
        match self {
            Self::HeadOfHousehold(person) => Some(person),
            _ => None,
        }
    }

    pub fn qualifying_person_mut(&mut self) -> Option<&mut QualifyingPerson> {
        match self {
            Self::HeadOfHousehold(person) => Some(person),
            _ => None,
        }
    }

    /// Builds the variant for `code` with default dependent fields.
    pub fn empty(code: FilingStatusCode) -> Self {
        match code {
            FilingStatusCode::Single => Self::Single,
            FilingStatusCode::MarriedJointly => Self::MarriedJointly(SpouseDetails::default()),
            FilingStatusCode::MarriedSeparately => {
                Self::MarriedSeparately(SpouseDetails::default())
            }
            FilingStatusCode::HeadOfHousehold => {
                Self::HeadOfHousehold(QualifyingPerson::default())
            }
            FilingStatusCode::QualifyingWidow => Self::QualifyingWidow,
        }
    }
}

/// Flat filing status record as exchanged with the API.
///
/// Field names are the persisted names; fields that do not apply to the
/// current status are sent as `""` / `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingStatusRecord {
    pub filing_status: String,
    pub spouse_name: String,
    pub spouse_ssn: String,
    pub spouse_has_income: bool,
    pub spouse_itemizes: bool,
    pub qualifying_person_name: String,
    pub qualifying_person_relationship: String,
    pub lived_with_taxpayer: bool,
}

impl From<&FilingStatusSelection> for FilingStatusRecord {
    fn from(selection: &FilingStatusSelection) -> Self {
        let mut record = FilingStatusRecord {
            filing_status: selection.code().as_str().to_string(),
            ..Default::default()
        };

        if let Some(spouse) = selection.spouse() {
            record.spouse_name = spouse.name.clone();
            record.spouse_ssn = spouse.ssn.clone();
            record.spouse_has_income = spouse.has_income;
            record.spouse_itemizes = spouse.itemizes;
        }

        if let Some(person) = selection.qualifying_person() {
            record.qualifying_person_name = person.name.clone();
            record.qualifying_person_relationship = person.relationship.clone();
            record.lived_with_taxpayer = person.lived_with_taxpayer;
        }

        record
    }
}

impl From<FilingStatusSelection> for FilingStatusRecord {
    fn from(selection: FilingStatusSelection) -> Self {
        Self::from(&selection)
    }
}

/// Hydrates a selection from a stored record. Fields that do not apply to
/// the stored status are dropped.
impl TryFrom<FilingStatusRecord> for FilingStatusSelection {
    type Error = InvalidStatusValue;

    fn try_from(record: FilingStatusRecord) -> Result<Self, Self::Error> {
        let code: FilingStatusCode = record.filing_status.parse()?;

        let spouse = || SpouseDetails {
            name: record.spouse_name.clone(),
            ssn: record.spouse_ssn.clone(),
            has_income: record.spouse_has_income,
            itemizes: record.spouse_itemizes,
        };

        Ok(match code {
            FilingStatusCode::Single => Self::Single,
            FilingStatusCode::MarriedJointly => Self::MarriedJointly(spouse()),
            FilingStatusCode::MarriedSeparately => Self::MarriedSeparately(spouse()),
            FilingStatusCode::HeadOfHousehold => Self::HeadOfHousehold(QualifyingPerson {
                name: record.qualifying_person_name.clone(),
                relationship: record.qualifying_person_relationship.clone(),
                lived_with_taxpayer: record.lived_with_taxpayer,
            }),
            FilingStatusCode::QualifyingWidow => Self::QualifyingWidow,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spouse() -> SpouseDetails {
        SpouseDetails {
            name: "Alex Doe".to_string(),
            ssn: "123-45-6789".to_string(),
            has_income: true,
            itemizes: false,
        }
    }

    #[test]
    fn default_selection_is_single() {
        assert_eq!(FilingStatusSelection::default().code(), FilingStatusCode::Single);
    }

    #[test]
    fn record_from_married_selection_carries_spouse_fields_only() {
        let record = FilingStatusRecord::from(FilingStatusSelection::MarriedJointly(spouse()));

        assert_eq!(
            record,
            FilingStatusRecord {
                filing_status: "married_jointly".to_string(),
                spouse_name: "Alex Doe".to_string(),
                spouse_ssn: "123-45-6789".to_string(),
                spouse_has_income: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn record_serializes_every_field_name() {
        let record = FilingStatusRecord::from(FilingStatusSelection::Single);
        let value = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();

        assert_eq!(
            keys,
            vec![
                "filing_status",
                "lived_with_taxpayer",
                "qualifying_person_name",
                "qualifying_person_relationship",
                "spouse_has_income",
                "spouse_itemizes",
                "spouse_name",
                "spouse_ssn",
            ]
        );
    }

    #[test]
    fn hydration_drops_fields_that_do_not_apply() {
        let record = FilingStatusRecord {
            filing_status: "single".to_string(),
            spouse_name: "Stale".to_string(),
            qualifying_person_name: "Stale".to_string(),
            ..Default::default()
        };

        let selection = FilingStatusSelection::try_from(record).unwrap();

        assert_eq!(selection, FilingStatusSelection::Single);
    }

    #[test]
    fn hydration_keeps_head_of_household_fields() {
        let record = FilingStatusRecord {
            filing_status: "head_of_household".to_string(),
            qualifying_person_name: "Jane".to_string(),
            qualifying_person_relationship: "daughter".to_string(),
            lived_with_taxpayer: true,
            ..Default::default()
        };

        let selection = FilingStatusSelection::try_from(record).unwrap();

        assert_eq!(
            selection,
            FilingStatusSelection::HeadOfHousehold(QualifyingPerson {
                name: "Jane".to_string(),
                relationship: "daughter".to_string(),
                lived_with_taxpayer: true,
            })
        );
    }

    #[test]
    fn hydration_rejects_unknown_status() {
        let record = FilingStatusRecord {
            filing_status: "divorced".to_string(),
            ..Default::default()
        };

        assert_eq!(
            FilingStatusSelection::try_from(record),
            Err(InvalidStatusValue("divorced".to_string()))
        );
    }

    #[test]
    fn record_with_missing_fields_deserializes_to_defaults() {
        let record: FilingStatusRecord =
            serde_json::from_str(r#"{"filing_status":"qualifying_widow"}"#).unwrap();

        assert_eq!(
            FilingStatusSelection::try_from(record),
            Ok(FilingStatusSelection::QualifyingWidow)
        );
    }
}
