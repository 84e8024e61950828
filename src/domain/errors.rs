//! Domain error types
//!
//! This module defines the error hierarchy for Iris. All errors are
//! domain-specific and don't expose third-party types; adapters translate
//! driver errors into these variants at the boundary.

use thiserror::Error;

/// Main Iris error type
///
/// This is the primary error type used throughout the application.
/// The variants map directly onto the failure classes of the registry:
/// bad input, lost races, missing privilege, and storage faults.
#[derive(Debug, Error)]
pub enum IrisError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or out-of-range field; reported before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Id-allocation race or a held edit lock; the caller retries or waits
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Insufficient privilege for the requested operation
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Referenced patient does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying store unavailable or a transaction aborted
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for IrisError {
    fn from(err: std::io::Error) -> Self {
        IrisError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for IrisError {
    fn from(err: serde_json::Error) -> Self {
        IrisError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for IrisError {
    fn from(err: toml::de::Error) -> Self {
        IrisError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IrisError::Validation("personal id must be 9 digits".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: personal id must be 9 digits"
        );

        let err = IrisError::Conflict("patient id 2000 already assigned".to_string());
        assert_eq!(err.to_string(), "Conflict: patient id 2000 already assigned");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: IrisError = io_err.into();
        assert!(matches!(err, IrisError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: IrisError = json_err.into();
        assert!(matches!(err, IrisError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: IrisError = toml_err.into();
        assert!(matches!(err, IrisError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = IrisError::Persistence("transaction aborted".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
