//! Patient store abstraction
//!
//! The coordinator, allocator, and projector talk to storage through this
//! trait only. The PostgreSQL adapter is the production implementation; the
//! in-memory store backs tests.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::core::export::filters::DateRange;
use crate::domain::{PatientBundle, PatientId, ReferenceCatalog, Result};

/// Storage operations over the dual patient tables and their child rows
///
/// Implementations must keep the sensitive record, statistical mirror,
/// condition row, and repeatable entries of one patient in a single atomic
/// unit per call: a write either lands all parts or none.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// All currently assigned patient ids, ascending
    async fn assigned_patient_ids(&self) -> Result<BTreeSet<u32>>;

    /// Whether a patient row exists for the id
    async fn patient_exists(&self, id: PatientId) -> Result<bool>;

    /// Inserts a new patient atomically.
    ///
    /// Returns `Conflict` if the id is already assigned. The existence check
    /// and insert must be one atomic step so two concurrent inserts of the
    /// same id cannot both succeed.
    async fn insert_patient(&self, bundle: &PatientBundle) -> Result<()>;

    /// Replaces an existing patient's data atomically.
    ///
    /// All repeatable-entry rows are replaced wholesale. Returns `Conflict`
    /// if the patient vanished between the caller's existence check and the
    /// write.
    async fn replace_patient(&self, bundle: &PatientBundle) -> Result<()>;

    /// Removes a patient and every dependent row.
    ///
    /// Returns `NotFound` if no such patient exists.
    async fn delete_patient(&self, id: PatientId) -> Result<()>;

    /// Loads one patient's full bundle, or `None` if absent
    async fn load_patient(&self, id: PatientId) -> Result<Option<PatientBundle>>;

    /// Loads every patient whose collection date falls in the range,
    /// ascending by patient id
    async fn scan_patients(&self, range: &DateRange) -> Result<Vec<PatientBundle>>;

    /// Loads the read-only reference catalog
    async fn load_reference_catalog(&self) -> Result<ReferenceCatalog>;
}
