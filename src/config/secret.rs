//! Secure credential handling using the secrecy crate
//!
//! Database credentials are wrapped in `Secret<T>` so they are zeroed on
//! drop and redacted from Debug output. Access requires an explicit
//! `expose_secret()` call at the point of use.

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
///
/// Zeroed on drop, redacted in Debug, explicit `expose_secret()` to read.
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("postgresql://u:p@localhost/iris".to_string());
        assert!(secret.expose_secret().starts_with("postgresql://"));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-credential".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-credential"));
    }

    #[test]
    fn test_secret_serde_round_trip() {
        #[derive(Serialize, Deserialize)]
        struct TestConfig {
            connection_string: SecretString,
        }

        let config = TestConfig {
            connection_string: secret_string("postgres://test".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: TestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.connection_string.expose_secret().as_ref(), "postgres://test");
    }
}
