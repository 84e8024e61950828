//! Domain models and types for Iris.
//!
//! This module contains the core domain models, types, and business rules of
//! the registry.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientId`], [`PersonalId`],
//!   [`LinkageToken`])
//! - **The dual patient record** ([`SensitiveRecord`], [`StatisticalRecord`],
//!   bundled as [`PatientBundle`])
//! - **Structured conditions** ([`OcularConditionGroup`] with its tagged
//!   lens-status variant)
//! - **Repeatable entries** ([`RepeatableEntries`], five categories)
//! - **Error types** ([`IrisError`]) and the [`Result`] alias
//!
//! # Type Safety
//!
//! Iris uses the newtype pattern for identifiers to prevent mixing different
//! kinds of values:
//!
//! ```
//! use iris::domain::{PatientId, PersonalId};
//!
//! # fn example() -> Result<(), String> {
//! let patient_id = PatientId::new(1500)?;
//! let personal_id = PersonalId::new("123456789")?;
//!
//! // This won't compile - type safety prevents mixing identifiers
//! // let wrong: PatientId = personal_id;  // Compile error!
//! # Ok(())
//! # }
//! ```
//!
//! Mutual exclusivity of lens-status variants is likewise structural: the
//! [`conditions::LensStatus`] enum can only hold the active variant's
//! sub-fields, so contradictory states are unrepresentable.

pub mod access;
pub mod conditions;
pub mod entries;
pub mod errors;
pub mod ids;
pub mod patient;
pub mod reference;
pub mod result;

// Re-export commonly used types for convenience
pub use access::AccessRole;
pub use conditions::{ConditionFlag, ConditionRow, LensStatus, OcularConditionGroup};
pub use entries::{EntryEye, RepeatableEntries};
pub use errors::IrisError;
pub use ids::{LinkageToken, PatientId, PersonalId, MAX_PATIENT_ID, MIN_PATIENT_ID};
pub use patient::{age_at_collection, Eye, PatientBundle, SensitiveRecord, Sex, StatisticalRecord};
pub use reference::{MedicationRef, ReferenceCatalog, ReferenceCode};
pub use result::Result;
