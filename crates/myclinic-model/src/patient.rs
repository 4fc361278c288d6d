// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const PATIENT_NAME_MAX_LEN: usize = 100;
pub const CONTACT_INFO_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    TooLong(&'static str, usize),
    InvalidId(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidId(name) => write!(f, "{name} must be a positive integer id"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Store-assigned patient identifier (SQLite rowid domain: positive i64).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(i64);

impl PatientId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let raw = input
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidId("patient id"))?;
        if raw <= 0 {
            return Err(ParseError::InvalidId("patient id"));
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl Display for PatientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored patient row. `verified_by_admin` is writable only through the
/// administrative surface, never through the standard handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub contact_info: Option<String>,
    pub basic_medical_history: Option<String>,
    pub verified_by_admin: bool,
}

/// The non-privileged field set accepted by the standard create/update paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPatient {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub contact_info: Option<String>,
    pub basic_medical_history: Option<String>,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.name.trim().is_empty() {
            return Err(ParseError::Empty("name"));
        }
        if self.name.chars().count() > PATIENT_NAME_MAX_LEN {
            return Err(ParseError::TooLong("name", PATIENT_NAME_MAX_LEN));
        }
        if let Some(contact) = &self.contact_info {
            if contact.chars().count() > CONTACT_INFO_MAX_LEN {
                return Err(ParseError::TooLong("contact_info", CONTACT_INFO_MAX_LEN));
            }
        }
        Ok(())
    }
}
