//! Repeatable clinical entries
//!
//! Five zero-or-more categories hang off each patient: other ocular
//! conditions, previous surgeries, systemic conditions, ocular medications,
//! and systemic medications. Edits replace a patient's whole set per
//! category, so an entry omitted from a save simply vanishes.

use serde::{Deserialize, Serialize};

/// Eye affected by a repeatable entry (wider than the sample eye: both eyes
/// is a valid answer here)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EntryEye {
    Right,
    Left,
    Both,
    #[default]
    NoData,
}

impl EntryEye {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryEye::Right => "R",
            EntryEye::Left => "L",
            EntryEye::Both => "R+L",
            EntryEye::NoData => "ND",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "R" => Ok(EntryEye::Right),
            "L" => Ok(EntryEye::Left),
            "R+L" => Ok(EntryEye::Both),
            "ND" => Ok(EntryEye::NoData),
            other => Err(format!("invalid entry eye: {other:?}")),
        }
    }
}

/// Additional ocular condition by ICD-10 code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherConditionEntry {
    pub code: String,
    pub eye: EntryEye,
}

/// Previous ocular surgery by surgery code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryEntry {
    pub code: String,
    pub eye: EntryEye,
}

/// Systemic condition by ICD-10 code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemicConditionEntry {
    pub code: String,
}

/// Topical/ocular medication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcularMedicationEntry {
    pub trade_name: String,
    pub generic_name: String,
    pub eye: EntryEye,
    pub last_application_days: Option<i32>,
}

/// Systemic medication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemicMedicationEntry {
    pub trade_name: String,
    pub generic_name: String,
    pub last_application_days: Option<i32>,
}

/// All five repeatable-entry sets for one patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RepeatableEntries {
    pub other_conditions: Vec<OtherConditionEntry>,
    pub surgeries: Vec<SurgeryEntry>,
    pub systemic_conditions: Vec<SystemicConditionEntry>,
    pub ocular_medications: Vec<OcularMedicationEntry>,
    pub systemic_medications: Vec<SystemicMedicationEntry>,
}

impl RepeatableEntries {
    /// Total number of rows across all five categories
    pub fn row_count(&self) -> usize {
        self.other_conditions.len()
            + self.surgeries.len()
            + self.systemic_conditions.len()
            + self.ocular_medications.len()
            + self.systemic_medications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_eye_round_trip() {
        for eye in [EntryEye::Right, EntryEye::Left, EntryEye::Both, EntryEye::NoData] {
            assert_eq!(EntryEye::parse(eye.as_str()).unwrap(), eye);
        }
        assert!(EntryEye::parse("both").is_err());
    }

    #[test]
    fn test_row_count() {
        let mut entries = RepeatableEntries::default();
        assert!(entries.is_empty());
        entries.surgeries.push(SurgeryEntry {
            code: "PPV".to_string(),
            eye: EntryEye::Left,
        });
        entries.systemic_conditions.push(SystemicConditionEntry {
            code: "E11".to_string(),
        });
        assert_eq!(entries.row_count(), 2);
    }
}
