//! Core registry logic
//!
//! This module contains the business logic of the registry, independent of
//! any particular storage backend:
//! - **allocator**: two-phase patient id allocation
//! - **anonymize**: linkage token derivation
//! - **locks**: per-patient edit locks
//! - **registry**: the patient write coordinator
//! - **export**: the export projection engine

pub mod allocator;
pub mod anonymize;
pub mod export;
pub mod locks;
pub mod registry;

pub use allocator::IdAllocator;
pub use locks::EditLockRegistry;
pub use registry::{PatientCoordinator, PatientDraft};
