//! In-memory patient store
//!
//! Mutex-guarded maps with the same conflict semantics as the PostgreSQL
//! adapter. Used by tests and by dry-run tooling; data does not survive the
//! process.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::export::filters::DateRange;
use crate::domain::{IrisError, PatientBundle, PatientId, ReferenceCatalog, Result};

use super::traits::PatientStore;

/// Process-local [`PatientStore`] implementation
#[derive(Default)]
pub struct MemoryStore {
    patients: Mutex<HashMap<u32, PatientBundle>>,
    catalog: Mutex<ReferenceCatalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the reference catalog served by this store
    pub fn set_reference_catalog(&self, catalog: ReferenceCatalog) {
        *self.catalog.lock().unwrap_or_else(|e| e.into_inner()) = catalog;
    }

    fn patients(&self) -> std::sync::MutexGuard<'_, HashMap<u32, PatientBundle>> {
        self.patients.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn assigned_patient_ids(&self) -> Result<BTreeSet<u32>> {
        Ok(self.patients().keys().copied().collect())
    }

    async fn patient_exists(&self, id: PatientId) -> Result<bool> {
        Ok(self.patients().contains_key(&id.value()))
    }

    async fn insert_patient(&self, bundle: &PatientBundle) -> Result<()> {
        let mut patients = self.patients();
        let key = bundle.id().value();
        if patients.contains_key(&key) {
            return Err(IrisError::Conflict(format!(
                "patient id {} already assigned",
                bundle.id()
            )));
        }
        patients.insert(key, bundle.clone());
        Ok(())
    }

    async fn replace_patient(&self, bundle: &PatientBundle) -> Result<()> {
        let mut patients = self.patients();
        let key = bundle.id().value();
        if !patients.contains_key(&key) {
            return Err(IrisError::Conflict(format!(
                "patient {} no longer exists",
                bundle.id()
            )));
        }
        patients.insert(key, bundle.clone());
        Ok(())
    }

    async fn delete_patient(&self, id: PatientId) -> Result<()> {
        let mut patients = self.patients();
        if patients.remove(&id.value()).is_none() {
            return Err(IrisError::NotFound(format!("patient {id} does not exist")));
        }
        Ok(())
    }

    async fn load_patient(&self, id: PatientId) -> Result<Option<PatientBundle>> {
        Ok(self.patients().get(&id.value()).cloned())
    }

    async fn scan_patients(&self, range: &DateRange) -> Result<Vec<PatientBundle>> {
        let patients = self.patients();
        let mut matching: Vec<PatientBundle> = patients
            .values()
            .filter(|b| range.contains(b.sensitive.collection_date))
            .cloned()
            .collect();
        matching.sort_by_key(|b| b.id());
        Ok(matching)
    }

    async fn load_reference_catalog(&self) -> Result<ReferenceCatalog> {
        Ok(self
            .catalog
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conditions::OcularConditionGroup;
    use crate::domain::entries::RepeatableEntries;
    use crate::domain::patient::{Eye, SensitiveRecord, Sex, StatisticalRecord};
    use crate::domain::{LinkageToken, PersonalId};

    fn bundle(id: u32) -> PatientBundle {
        let pid = PatientId::new(id).unwrap();
        PatientBundle {
            sensitive: SensitiveRecord {
                id: pid,
                name: "Test Patient".to_string(),
                personal_id: PersonalId::new("123456789").unwrap(),
                birth_date: None,
                collection_date: None,
            },
            statistical: StatisticalRecord {
                id: pid,
                linkage_token: LinkageToken::new("a".repeat(64)).unwrap(),
                age: None,
                sex: Sex::Female,
                eye: Eye::Left,
            },
            conditions: OcularConditionGroup::default(),
            entries: RepeatableEntries::default(),
        }
    }

    #[tokio::test]
    async fn test_insert_conflicts_on_occupied_id() {
        let store = MemoryStore::new();
        store.insert_patient(&bundle(1500)).await.unwrap();
        let err = store.insert_patient(&bundle(1500)).await.unwrap_err();
        assert!(matches!(err, IrisError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_replace_requires_existing_row() {
        let store = MemoryStore::new();
        let err = store.replace_patient(&bundle(1500)).await.unwrap_err();
        assert!(matches!(err, IrisError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete_patient(PatientId::new(42).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, IrisError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scan_is_sorted_by_id() {
        let store = MemoryStore::new();
        for id in [1502, 1500, 1501] {
            store.insert_patient(&bundle(id)).await.unwrap();
        }
        let all = store.scan_patients(&DateRange::unbounded()).await.unwrap();
        let ids: Vec<u32> = all.iter().map(|b| b.id().value()).collect();
        assert_eq!(ids, vec![1500, 1501, 1502]);
    }
}
