//! Reference data consumed read-only by the registry
//!
//! Condition codes, surgery codes, and medication names each carry an
//! active flag. The coordinator validates referenced codes against this
//! catalog; managing the catalog itself is out of scope here.

use serde::{Deserialize, Serialize};

/// A coded reference entry (ICD-10 code, surgery code)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCode {
    pub code: String,
    pub description: String,
    pub active: bool,
}

/// A medication reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRef {
    pub trade_name: String,
    pub generic_name: String,
    pub active: bool,
}

/// The full read-only reference catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReferenceCatalog {
    pub ocular_codes: Vec<ReferenceCode>,
    pub systemic_codes: Vec<ReferenceCode>,
    pub surgery_codes: Vec<ReferenceCode>,
    pub medications: Vec<MedicationRef>,
}

impl ReferenceCatalog {
    pub fn is_active_ocular_code(&self, code: &str) -> bool {
        self.ocular_codes.iter().any(|c| c.code == code && c.active)
    }

    pub fn is_active_systemic_code(&self, code: &str) -> bool {
        self.systemic_codes.iter().any(|c| c.code == code && c.active)
    }

    pub fn is_active_surgery_code(&self, code: &str) -> bool {
        self.surgery_codes.iter().any(|c| c.code == code && c.active)
    }

    pub fn is_active_medication(&self, generic_name: &str) -> bool {
        self.medications
            .iter()
            .any(|m| m.generic_name == generic_name && m.active)
    }

    /// Description for a known code, searching all three coded lists
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.ocular_codes
            .iter()
            .chain(&self.systemic_codes)
            .chain(&self.surgery_codes)
            .find(|c| c.code == code)
            .map(|c| c.description.as_str())
    }
}
