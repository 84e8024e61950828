//! Caller capability levels
//!
//! The surrounding application authenticates users; Iris only needs to know
//! whether the caller carries the elevated capability required for
//! identity-revealing operations (Sensitive exports, deletes).

use serde::{Deserialize, Serialize};

/// Capability level of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    /// Regular data-entry user; anonymized reads only
    Staff,
    /// Elevated capability: sensitive exports and deletes
    Administrator,
}

impl AccessRole {
    pub fn is_administrator(&self) -> bool {
        matches!(self, AccessRole::Administrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_administrator() {
        assert!(AccessRole::Administrator.is_administrator());
        assert!(!AccessRole::Staff.is_administrator());
    }
}
