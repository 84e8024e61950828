//! Patient id allocation
//!
//! Ids are handed out in two phases. `suggest` is advisory: it proposes the
//! smallest free id at or above the configured floor, skipping ids reserved
//! by in-flight creations in this process. `reserve` plus the store's atomic
//! insert are authoritative; a suggestion never guarantees the id will still
//! be free at commit time. Deleted ids return to the pool and the smallest
//! one is suggested again.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::adapters::store::PatientStore;
use crate::domain::{IrisError, PatientId, Result, MAX_PATIENT_ID};

/// Two-phase patient id allocator
pub struct IdAllocator {
    store: Arc<dyn PatientStore>,
    floor: u32,
    reserved: Mutex<HashSet<u32>>,
}

impl IdAllocator {
    /// Creates an allocator over a store with the given suggestion floor.
    ///
    /// The floor must itself be a valid patient id; ids below it stay
    /// manually assignable but are never suggested.
    pub fn new(store: Arc<dyn PatientStore>, floor: u32) -> Result<Self> {
        PatientId::new(floor).map_err(IrisError::Configuration)?;
        Ok(Self {
            store,
            floor,
            reserved: Mutex::new(HashSet::new()),
        })
    }

    /// Proposes the smallest unassigned, unreserved id at or above the floor.
    ///
    /// Advisory only; the proposal can be stale by the time the caller
    /// commits. Returns `Conflict` when the pool above the floor is
    /// exhausted.
    pub async fn suggest(&self) -> Result<PatientId> {
        let assigned = self.store.assigned_patient_ids().await?;
        let reserved = self.reserved();

        for candidate in self.floor..=MAX_PATIENT_ID {
            if !assigned.contains(&candidate) && !reserved.contains(&candidate) {
                debug!(patient_id = candidate, "Suggested patient id");
                return Ok(PatientId::new(candidate).map_err(IrisError::Validation)?);
            }
        }

        Err(IrisError::Conflict(format!(
            "patient id pool exhausted: no free id in [{}, {MAX_PATIENT_ID}]",
            self.floor
        )))
    }

    /// Marks an id as held by an in-flight creation.
    ///
    /// Fails with `Conflict` if the id is already assigned in the store or
    /// reserved by another in-flight creation in this process. The store's
    /// atomic insert remains the final arbiter across processes.
    pub async fn reserve(&self, id: PatientId) -> Result<()> {
        if self.store.patient_exists(id).await? {
            return Err(IrisError::Conflict(format!(
                "patient id {id} already assigned"
            )));
        }
        let mut reserved = self.reserved();
        if !reserved.insert(id.value()) {
            return Err(IrisError::Conflict(format!(
                "patient id {id} is reserved by another creation in progress"
            )));
        }
        debug!(patient_id = id.value(), "Reserved patient id");
        Ok(())
    }

    /// Releases a reservation, whether the creation committed or failed
    pub fn release(&self, id: PatientId) {
        self.reserved().remove(&id.value());
    }

    /// Returns a deleted id to the pool.
    ///
    /// With assignment state read from the store this is a reservation
    /// cleanup; the next `suggest` picks the freed id up on its own.
    pub fn recycle(&self, id: PatientId) {
        self.release(id);
        debug!(patient_id = id.value(), "Recycled patient id");
    }

    /// Whether a manually chosen id is currently free
    pub async fn validate_available(&self, id: PatientId) -> Result<bool> {
        if self.reserved().contains(&id.value()) {
            return Ok(false);
        }
        Ok(!self.store.patient_exists(id).await?)
    }

    /// Lowest id `suggest` will propose
    pub fn floor(&self) -> u32 {
        self.floor
    }

    fn reserved(&self) -> std::sync::MutexGuard<'_, HashSet<u32>> {
        self.reserved.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Default suggestion floor when configuration does not override it
pub const DEFAULT_STARTING_ID: u32 = 1500;
