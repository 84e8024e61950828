//! Linkage token derivation
//!
//! The statistical half of a patient record never stores the personal
//! identifier directly. Instead it carries a deterministic SHA-256 digest of
//! the 9-digit identifier, so equal inputs always map to the same token and
//! mirrored datasets can be joined without revealing identity.

use sha2::{Digest, Sha256};

use crate::domain::{IrisError, LinkageToken, PersonalId, Result};

/// Derive the linkage token for a personal identifier.
///
/// The input must be exactly 9 ASCII digits; anything else is rejected
/// before hashing so malformed identifiers never produce a token.
pub fn linkage_token(personal_id: &str) -> Result<LinkageToken> {
    let validated = PersonalId::new(personal_id).map_err(IrisError::Validation)?;

    let mut hasher = Sha256::new();
    hasher.update(validated.as_str().as_bytes());
    let digest = hasher.finalize();

    let hex = digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>();

    LinkageToken::new(&hex).map_err(IrisError::Validation)
}
