//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for the registry's identifiers.
//! Each type ensures type safety and validates its format on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest valid patient id.
pub const MIN_PATIENT_ID: u32 = 1;

/// Largest valid patient id. The human-facing id pool is bounded.
pub const MAX_PATIENT_ID: u32 = 99_999;

/// Human-facing patient identifier
///
/// An integer in `[1, 99999]`, displayed zero-padded to five digits.
/// A patient id is either Free, Reserved (an in-flight creation holds it),
/// or Assigned (a live sensitive record carries it).
///
/// # Examples
///
/// ```
/// use iris::domain::ids::PatientId;
///
/// let id = PatientId::new(1500).unwrap();
/// assert_eq!(id.to_string(), "01500");
/// assert_eq!(id.value(), 1500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(u32);

impl PatientId {
    /// Creates a new PatientId, validating the bounded range
    pub fn new(id: u32) -> Result<Self, String> {
        if !(MIN_PATIENT_ID..=MAX_PATIENT_ID).contains(&id) {
            return Err(format!(
                "patient id must be in [{MIN_PATIENT_ID}, {MAX_PATIENT_ID}], got {id}"
            ));
        }
        Ok(Self(id))
    }

    /// Returns the raw integer value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid patient id: {s}"))?;
        Self::new(value)
    }
}

/// Personal identifier newtype wrapper
///
/// The 9-digit national identifier that links a patient's identity to their
/// clinical data. Stored only in the sensitive record; the statistical mirror
/// carries its [`LinkageToken`] digest instead.
///
/// # Examples
///
/// ```
/// use iris::domain::ids::PersonalId;
///
/// let pid = PersonalId::new("123456789").unwrap();
/// assert_eq!(pid.as_str(), "123456789");
/// assert!(PersonalId::new("12345678").is_err());
/// assert!(PersonalId::new("12345678x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalId(String);

impl PersonalId {
    /// Creates a new PersonalId, validating exactly 9 numeric digits
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.len() != 9 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!(
                "personal identifier must be exactly 9 digits, got {:?}",
                id.len()
            ));
        }
        Ok(Self(id))
    }

    /// Returns the personal identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PersonalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// De-identified linkage token
///
/// A deterministic one-way digest of a [`PersonalId`] (64 lowercase hex
/// characters). Equal personal identifiers always produce equal tokens, so
/// de-identified records of the same real person correlate across patient ids
/// without re-exposing the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkageToken(String);

impl LinkageToken {
    /// Creates a LinkageToken from an already-computed digest string
    ///
    /// Use [`crate::core::anonymize::linkage_token`] to derive one from a
    /// personal identifier.
    pub fn new(token: impl Into<String>) -> Result<Self, String> {
        let token = token.into();
        if token.len() != 64 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("linkage token must be 64 hex characters".to_string());
        }
        Ok(Self(token.to_lowercase()))
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LinkageToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
