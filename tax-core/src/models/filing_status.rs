use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a filing status value is not one of the five known statuses.
///
/// This points at an integration problem upstream (e.g. a malformed option
/// list), so callers treat it as fatal to the operation that received it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filing status value '{0}'")]
pub struct InvalidStatusValue(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatusCode {
    #[default]
    Single,
    MarriedJointly,
    MarriedSeparately,
    HeadOfHousehold,
    QualifyingWidow,
}

impl FilingStatusCode {
    pub const ALL: [FilingStatusCode; 5] = [
        Self::Single,
        Self::MarriedJointly,
        Self::MarriedSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingWidow,
    ];

    /// Wire value, as exchanged with the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MarriedJointly => "married_jointly",
            Self::MarriedSeparately => "married_separately",
            Self::HeadOfHousehold => "head_of_household",
            Self::QualifyingWidow => "qualifying_widow",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedJointly => "Married Filing Jointly",
            Self::MarriedSeparately => "Married Filing Separately",
            Self::HeadOfHousehold => "Head of Household",
            Self::QualifyingWidow => "Qualifying Widow(er)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "married_jointly" => Some(Self::MarriedJointly),
            "married_separately" => Some(Self::MarriedSeparately),
            "head_of_household" => Some(Self::HeadOfHousehold),
            "qualifying_widow" => Some(Self::QualifyingWidow),
            _ => None,
        }
    }

    pub fn is_married(&self) -> bool {
        matches!(self, Self::MarriedJointly | Self::MarriedSeparately)
    }

    pub fn is_head_of_household(&self) -> bool {
        matches!(self, Self::HeadOfHousehold)
    }
}

impl FromStr for FilingStatusCode {
    type Err = InvalidStatusValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidStatusValue(s.to_string()))
    }
}

impl fmt::Display for FilingStatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selectable filing status as supplied by the API.
///
/// `value` stays a raw string: an unrecognised value only fails once the
/// user actually selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingStatusOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl FilingStatusOption {
    /// The built-in option record for a known status.
    pub fn for_code(code: FilingStatusCode) -> Self {
        let description = match code {
            FilingStatusCode::Single => "Unmarried, divorced, or legally separated",
            FilingStatusCode::MarriedJointly => "Married couples combining income on one return",
            FilingStatusCode::MarriedSeparately => "Married couples filing individual returns",
            FilingStatusCode::HeadOfHousehold => {
                "Unmarried and paying more than half the cost of keeping up a home for a qualifying person"
            }
            FilingStatusCode::QualifyingWidow => {
                "Spouse died in one of the two prior years and you have a dependent child"
            }
        };

        Self {
            value: code.as_str().to_string(),
            label: code.label().to_string(),
            description: description.to_string(),
        }
    }

    pub fn code(&self) -> Result<FilingStatusCode, InvalidStatusValue> {
        self.value.parse()
    }
}
