//! Patient record types
//!
//! The registry keeps two parallel records per patient: a sensitive record
//! holding personal identifiers and a de-identified statistical mirror. They
//! share the same key and are created, updated, and destroyed together.

use crate::domain::ids::{LinkageToken, PatientId, PersonalId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::conditions::OcularConditionGroup;
use super::entries::RepeatableEntries;

/// Patient sex as recorded in the statistical mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Single-letter storage/export encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    /// Parses the storage encoding
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            other => Err(format!("invalid sex: {other:?}")),
        }
    }
}

/// Examined eye for the sample this record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
    NoData,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eye::Left => "L",
            Eye::Right => "R",
            Eye::NoData => "ND",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "L" => Ok(Eye::Left),
            "R" => Ok(Eye::Right),
            "ND" => Ok(Eye::NoData),
            other => Err(format!("invalid eye: {other:?}")),
        }
    }
}

/// Identity-bearing patient record
///
/// Never leaves the sensitive table except through a Sensitive-level export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveRecord {
    pub id: PatientId,
    pub name: String,
    pub personal_id: PersonalId,
    pub birth_date: Option<NaiveDate>,
    pub collection_date: Option<NaiveDate>,
}

/// De-identified mirror of a [`SensitiveRecord`]
///
/// One-to-one with the sensitive record, same key. Carries the linkage token
/// in place of the personal identifier and the age computed at collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalRecord {
    pub id: PatientId,
    pub linkage_token: LinkageToken,
    pub age: Option<i32>,
    pub sex: Sex,
    pub eye: Eye,
}

/// Everything the store commits for one patient in one atomic unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientBundle {
    pub sensitive: SensitiveRecord,
    pub statistical: StatisticalRecord,
    pub conditions: OcularConditionGroup,
    pub entries: RepeatableEntries,
}

impl PatientBundle {
    /// The shared key of all four parts
    pub fn id(&self) -> PatientId {
        self.sensitive.id
    }
}

/// Age in whole years at sample collection
///
/// Returns `None` when either date is missing. The year difference is
/// decremented when the collection anniversary has not yet been reached.
pub fn age_at_collection(birth: Option<NaiveDate>, collection: Option<NaiveDate>) -> Option<i32> {
    let birth = birth?;
    let collection = collection?;
    let mut age = collection.year() - birth.year();
    if (collection.month(), collection.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    Some(age)
}
