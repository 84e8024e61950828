//! Export column planning
//!
//! Exports are built in two passes. The first pass scans every matching
//! patient and collects the distinct codes and substances present, so the
//! dynamic column set is a function of the data. The second pass
//! materializes one row per patient against that fixed plan. Dynamic columns
//! are sorted lexicographically, so the same data always yields the same
//! header in the same order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::conditions::CONDITION_COLUMNS;
use crate::domain::patient::PatientBundle;

/// Leading columns of a Sensitive export
const SENSITIVE_LEADING: [&str; 9] = [
    "patient_id",
    "patient_name",
    "personal_id",
    "sex",
    "date_of_birth",
    "date_of_sample_collection",
    "eye",
    "linkage_token",
    "age",
];

/// Leading columns of an Anonymized export
const ANONYMIZED_LEADING: [&str; 5] = ["patient_id", "linkage_token", "sex", "eye", "age"];

/// Privacy level of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    /// De-identified columns only
    Anonymized,
    /// Includes name, personal identifier, and exact dates
    Sensitive,
}

/// Which dataset sections appear in the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSelection {
    pub conditions: bool,
    pub other_conditions: bool,
    pub surgeries: bool,
    pub systemic_conditions: bool,
    pub medications: bool,
}

impl Default for DatasetSelection {
    fn default() -> Self {
        Self {
            conditions: true,
            other_conditions: true,
            surgeries: true,
            systemic_conditions: true,
            medications: true,
        }
    }
}

/// Turns an arbitrary label into a safe column name.
///
/// Lowercases, maps separators to underscores, strips everything that is not
/// alphanumeric or underscore, collapses runs, and prefixes `x_` when the
/// result would start with a digit.
pub fn sanitize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if matches!(c, ' ' | '-' | '.' | '(' | ')' | '+' | '/') {
            if !out.ends_with('_') {
                out.push('_');
            }
        }
        // anything else is dropped
    }
    let trimmed = out.trim_matches('_').to_string();
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("x_{trimmed}")
    } else {
        trimmed
    }
}

/// Splits a combination product's generic name into its substances.
///
/// Combination drugs list substances joined by `+` or `/`; each substance
/// gets its own export column so the same substance folds together across
/// products.
pub fn split_substances(generic_name: &str) -> Vec<String> {
    generic_name
        .split(['+', '/'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The fixed header and per-patient materialization rules of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    privacy: PrivacyLevel,
    selection: DatasetSelection,
    header: Vec<String>,
    other_codes: Vec<String>,
    surgery_codes: Vec<String>,
    systemic_codes: Vec<String>,
    ocular_substances: Vec<String>,
    systemic_substances: Vec<String>,
}

impl ColumnPlan {
    /// First pass: derive the header from the matching patients
    pub fn build(
        privacy: PrivacyLevel,
        selection: DatasetSelection,
        patients: &[PatientBundle],
    ) -> Self {
        let mut other_codes = BTreeSet::new();
        let mut surgery_codes = BTreeSet::new();
        let mut systemic_codes = BTreeSet::new();
        let mut ocular_substances = BTreeSet::new();
        let mut systemic_substances = BTreeSet::new();

        for patient in patients {
            let entries = &patient.entries;
            if selection.other_conditions {
                for e in &entries.other_conditions {
                    other_codes.insert(e.code.clone());
                }
            }
            if selection.surgeries {
                for e in &entries.surgeries {
                    surgery_codes.insert(e.code.clone());
                }
            }
            if selection.systemic_conditions {
                for e in &entries.systemic_conditions {
                    systemic_codes.insert(e.code.clone());
                }
            }
            if selection.medications {
                for e in &entries.ocular_medications {
                    for substance in split_substances(&e.generic_name) {
                        ocular_substances.insert(substance);
                    }
                }
                for e in &entries.systemic_medications {
                    for substance in split_substances(&e.generic_name) {
                        systemic_substances.insert(substance);
                    }
                }
            }
        }

        let other_codes: Vec<String> = other_codes.into_iter().collect();
        let surgery_codes: Vec<String> = surgery_codes.into_iter().collect();
        let systemic_codes: Vec<String> = systemic_codes.into_iter().collect();
        let ocular_substances: Vec<String> = ocular_substances.into_iter().collect();
        let systemic_substances: Vec<String> = systemic_substances.into_iter().collect();

        let mut header: Vec<String> = match privacy {
            PrivacyLevel::Sensitive => SENSITIVE_LEADING.iter().map(|s| s.to_string()).collect(),
            PrivacyLevel::Anonymized => {
                ANONYMIZED_LEADING.iter().map(|s| s.to_string()).collect()
            }
        };

        if selection.conditions {
            header.extend(CONDITION_COLUMNS.iter().map(|s| s.to_string()));
        }
        for code in &other_codes {
            let base = sanitize(code);
            header.push(format!("other_ocular_{base}"));
            header.push(format!("other_ocular_{base}_eye"));
        }
        for code in &surgery_codes {
            let base = sanitize(code);
            header.push(format!("surgery_{base}"));
            header.push(format!("surgery_{base}_eye"));
        }
        for code in &systemic_codes {
            header.push(format!("systemic_{}", sanitize(code)));
        }
        for substance in &ocular_substances {
            let base = sanitize(substance);
            header.push(format!("ocular_med_{base}"));
            header.push(format!("ocular_med_{base}_eye"));
            header.push(format!("ocular_med_{base}_days"));
        }
        for substance in &systemic_substances {
            let base = sanitize(substance);
            header.push(format!("systemic_med_{base}"));
            header.push(format!("systemic_med_{base}_days"));
        }

        Self {
            privacy,
            selection,
            header,
            other_codes,
            surgery_codes,
            systemic_codes,
            ocular_substances,
            systemic_substances,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Second pass: one row for one patient, aligned with the header
    pub fn materialize(&self, patient: &PatientBundle) -> Vec<String> {
        let mut row = Vec::with_capacity(self.header.len());
        let sensitive = &patient.sensitive;
        let statistical = &patient.statistical;

        let fmt_date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "ND".to_string())
        };
        let fmt_age = |a: Option<i32>| a.map(|a| a.to_string()).unwrap_or_else(|| "ND".to_string());

        match self.privacy {
            PrivacyLevel::Sensitive => {
                row.push(sensitive.id.to_string());
                row.push(sensitive.name.clone());
                row.push(sensitive.personal_id.to_string());
                row.push(statistical.sex.as_str().to_string());
                row.push(fmt_date(sensitive.birth_date));
                row.push(fmt_date(sensitive.collection_date));
                row.push(statistical.eye.as_str().to_string());
                row.push(statistical.linkage_token.to_string());
                row.push(fmt_age(statistical.age));
            }
            PrivacyLevel::Anonymized => {
                row.push(statistical.id.to_string());
                row.push(statistical.linkage_token.to_string());
                row.push(statistical.sex.as_str().to_string());
                row.push(statistical.eye.as_str().to_string());
                row.push(fmt_age(statistical.age));
            }
        }

        if self.selection.conditions {
            row.extend(patient.conditions.column_values());
        }

        let entries = &patient.entries;
        for code in &self.other_codes {
            match entries.other_conditions.iter().find(|e| &e.code == code) {
                Some(e) => {
                    row.push("1".to_string());
                    row.push(e.eye.as_str().to_string());
                }
                None => {
                    row.push("0".to_string());
                    row.push("ND".to_string());
                }
            }
        }
        for code in &self.surgery_codes {
            match entries.surgeries.iter().find(|e| &e.code == code) {
                Some(e) => {
                    row.push("1".to_string());
                    row.push(e.eye.as_str().to_string());
                }
                None => {
                    row.push("0".to_string());
                    row.push("ND".to_string());
                }
            }
        }
        for code in &self.systemic_codes {
            let present = entries.systemic_conditions.iter().any(|e| &e.code == code);
            row.push(if present { "1" } else { "0" }.to_string());
        }
        for substance in &self.ocular_substances {
            match entries
                .ocular_medications
                .iter()
                .find(|e| split_substances(&e.generic_name).contains(substance))
            {
                Some(e) => {
                    row.push("1".to_string());
                    row.push(e.eye.as_str().to_string());
                    row.push(
                        e.last_application_days
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "ND".to_string()),
                    );
                }
                None => {
                    row.push("0".to_string());
                    row.push("ND".to_string());
                    row.push("ND".to_string());
                }
            }
        }
        for substance in &self.systemic_substances {
            match entries
                .systemic_medications
                .iter()
                .find(|e| split_substances(&e.generic_name).contains(substance))
            {
                Some(e) => {
                    row.push("1".to_string());
                    row.push(
                        e.last_application_days
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "ND".to_string()),
                    );
                }
                None => {
                    row.push("0".to_string());
                    row.push("ND".to_string());
                }
            }
        }

        row
    }
}
