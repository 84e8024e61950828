//! Patient registry coordinator
//!
//! Single write path for the dual patient tables. Every save goes through
//! `create_or_replace`: the coordinator validates the draft, derives the
//! statistical mirror (linkage token, age at collection), and routes to the
//! store's atomic insert or replace depending on whether the id already has
//! a row. Deletes require the elevated role and return the id to the
//! allocator's pool.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::adapters::store::PatientStore;
use crate::core::allocator::IdAllocator;
use crate::core::anonymize::linkage_token;
use crate::core::locks::{EditGuard, EditLockRegistry};
use crate::domain::conditions::OcularConditionGroup;
use crate::domain::entries::RepeatableEntries;
use crate::domain::patient::{
    age_at_collection, Eye, PatientBundle, SensitiveRecord, Sex, StatisticalRecord,
};
use crate::domain::{IrisError, PatientId, PersonalId, ReferenceCatalog, Result};

/// Caller-supplied patient data before derivation
///
/// The draft carries everything the caller may set directly. The linkage
/// token and the age are derived by the coordinator and never accepted from
/// outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: String,
    pub personal_id: String,
    pub birth_date: Option<NaiveDate>,
    pub collection_date: Option<NaiveDate>,
    pub sex: Sex,
    pub eye: Eye,
    pub conditions: OcularConditionGroup,
    pub entries: RepeatableEntries,
}

/// A held edit lock plus the patient state loaded under it
pub struct EditSession {
    guard: EditGuard,
    current: PatientBundle,
}

impl EditSession {
    pub fn patient_id(&self) -> PatientId {
        self.guard.patient_id()
    }

    /// The bundle as it was when the session began
    pub fn current(&self) -> &PatientBundle {
        &self.current
    }
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("patient_id", &self.patient_id())
            .finish()
    }
}

/// Coordinates validation, derivation, locking, and storage for patient writes
pub struct PatientCoordinator {
    store: Arc<dyn PatientStore>,
    allocator: Arc<IdAllocator>,
    locks: Arc<EditLockRegistry>,
}

impl PatientCoordinator {
    pub fn new(
        store: Arc<dyn PatientStore>,
        allocator: Arc<IdAllocator>,
        locks: Arc<EditLockRegistry>,
    ) -> Self {
        Self {
            store,
            allocator,
            locks,
        }
    }

    pub fn allocator(&self) -> &Arc<IdAllocator> {
        &self.allocator
    }

    /// Opens an editing session: takes the patient's edit lock and loads the
    /// current bundle under it.
    ///
    /// Returns `Conflict` while another session holds the lock and
    /// `NotFound` if the patient does not exist.
    #[instrument(skip(self))]
    pub async fn begin_edit(&self, id: PatientId) -> Result<EditSession> {
        let guard = self.locks.acquire(id)?;
        let current = self
            .store
            .load_patient(id)
            .await?
            .ok_or_else(|| IrisError::NotFound(format!("patient {id} does not exist")))?;
        Ok(EditSession { guard, current })
    }

    /// Saves a patient under the given id, creating or replacing as needed.
    ///
    /// Creation is detected by the absence of a stored row. A create runs
    /// reserve -> atomic insert -> release, so two concurrent creations of
    /// the same id resolve to exactly one success and one `Conflict`. A
    /// replace requires a session holding the patient's edit lock; the
    /// store rejects it with `Conflict` if the row vanished underneath.
    #[instrument(skip(self, draft, session), fields(patient_id = id.value()))]
    pub async fn create_or_replace(
        &self,
        id: PatientId,
        draft: PatientDraft,
        session: Option<&EditSession>,
    ) -> Result<PatientBundle> {
        let catalog = self.store.load_reference_catalog().await?;
        let bundle = self.derive_bundle(id, draft, &catalog)?;

        let exists = match session {
            Some(session) => {
                self.check_session(id, session)?;
                true
            }
            None => self.store.patient_exists(id).await?,
        };

        if exists {
            if session.is_none() {
                // Replacing without a session would bypass the one-writer
                // guarantee; take a short-lived lock for the write itself.
                let _guard = self.locks.acquire(id)?;
                self.store.replace_patient(&bundle).await?;
            } else {
                self.store.replace_patient(&bundle).await?;
            }
            info!(patient_id = id.value(), "Replaced patient record");
        } else {
            self.allocator.reserve(id).await?;
            let inserted = self.store.insert_patient(&bundle).await;
            self.allocator.release(id);
            match inserted {
                Ok(()) => info!(patient_id = id.value(), "Created patient record"),
                Err(err) => {
                    warn!(patient_id = id.value(), error = %err, "Patient creation failed");
                    return Err(err);
                }
            }
        }

        Ok(bundle)
    }

    /// Removes a patient and all dependent rows.
    ///
    /// Requires the elevated role. The freed id returns to the allocator's
    /// pool immediately.
    #[instrument(skip(self, session), fields(patient_id = id.value()))]
    pub async fn delete(
        &self,
        id: PatientId,
        role: crate::domain::AccessRole,
        session: Option<&EditSession>,
    ) -> Result<()> {
        if !role.is_administrator() {
            return Err(IrisError::Authorization(
                "deleting a patient requires the administrator role".to_string(),
            ));
        }
        if let Some(session) = session {
            self.check_session(id, session)?;
            self.store.delete_patient(id).await?;
        } else {
            let _guard = self.locks.acquire(id)?;
            self.store.delete_patient(id).await?;
        }
        self.allocator.recycle(id);
        info!(patient_id = id.value(), "Deleted patient record");
        Ok(())
    }

    /// Checks that a session belongs to the patient and still owns the lock.
    ///
    /// A session whose lock was reclaimed by timeout takeover must not
    /// commit; letting it through would silently overwrite whatever the new
    /// holder saved.
    fn check_session(&self, id: PatientId, session: &EditSession) -> Result<()> {
        if session.patient_id() != id {
            return Err(IrisError::Validation(format!(
                "edit session is for patient {}, not {id}",
                session.patient_id()
            )));
        }
        if !self.locks.holds(&session.guard) {
            return Err(IrisError::Conflict(format!(
                "edit session for patient {id} timed out and was taken over"
            )));
        }
        Ok(())
    }

    /// Validates a draft and derives the full bundle for storage
    fn derive_bundle(
        &self,
        id: PatientId,
        draft: PatientDraft,
        catalog: &ReferenceCatalog,
    ) -> Result<PatientBundle> {
        if draft.name.trim().is_empty() {
            return Err(IrisError::Validation(
                "patient name must not be empty".to_string(),
            ));
        }
        let personal_id =
            PersonalId::new(draft.personal_id.trim()).map_err(IrisError::Validation)?;

        if let (Some(birth), Some(collection)) = (draft.birth_date, draft.collection_date) {
            if collection < birth {
                return Err(IrisError::Validation(format!(
                    "collection date {collection} precedes birth date {birth}"
                )));
            }
        }

        validate_entries(&draft.entries, catalog)?;

        let token = linkage_token(personal_id.as_str())?;
        let age = age_at_collection(draft.birth_date, draft.collection_date);

        Ok(PatientBundle {
            sensitive: SensitiveRecord {
                id,
                name: draft.name.trim().to_string(),
                personal_id,
                birth_date: draft.birth_date,
                collection_date: draft.collection_date,
            },
            statistical: StatisticalRecord {
                id,
                linkage_token: token,
                age,
                sex: draft.sex,
                eye: draft.eye,
            },
            conditions: draft.conditions,
            entries: draft.entries,
        })
    }
}

fn validate_entries(entries: &RepeatableEntries, catalog: &ReferenceCatalog) -> Result<()> {
    for entry in &entries.other_conditions {
        if !catalog.is_active_ocular_code(&entry.code) {
            return Err(IrisError::Validation(format!(
                "unknown or inactive ocular condition code: {}",
                entry.code
            )));
        }
    }
    for entry in &entries.surgeries {
        if !catalog.is_active_surgery_code(&entry.code) {
            return Err(IrisError::Validation(format!(
                "unknown or inactive surgery code: {}",
                entry.code
            )));
        }
    }
    for entry in &entries.systemic_conditions {
        if !catalog.is_active_systemic_code(&entry.code) {
            return Err(IrisError::Validation(format!(
                "unknown or inactive systemic condition code: {}",
                entry.code
            )));
        }
    }
    for entry in &entries.ocular_medications {
        if !catalog.is_active_medication(&entry.generic_name) {
            return Err(IrisError::Validation(format!(
                "unknown or inactive medication: {}",
                entry.generic_name
            )));
        }
        if entry.last_application_days.is_some_and(|d| d < 0) {
            return Err(IrisError::Validation(
                "days since last application must not be negative".to_string(),
            ));
        }
    }
    for entry in &entries.systemic_medications {
        if !catalog.is_active_medication(&entry.generic_name) {
            return Err(IrisError::Validation(format!(
                "unknown or inactive medication: {}",
                entry.generic_name
            )));
        }
        if entry.last_application_days.is_some_and(|d| d < 0) {
            return Err(IrisError::Validation(
                "days since last application must not be negative".to_string(),
            ));
        }
    }
    Ok(())
}
