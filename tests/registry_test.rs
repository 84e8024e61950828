//! Integration tests for the patient registry coordinator

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use iris::adapters::store::{MemoryStore, PatientStore};
use iris::core::allocator::IdAllocator;
use iris::core::locks::EditLockRegistry;
use iris::core::registry::{PatientCoordinator, PatientDraft};
use iris::domain::conditions::{ConditionFlag, GlaucomaDetail, LensStatus, OcularConditionGroup};
use iris::domain::entries::RepeatableEntries;
use iris::domain::patient::{Eye, Sex};
use iris::domain::reference::{MedicationRef, ReferenceCatalog, ReferenceCode};
use iris::domain::{AccessRole, IrisError, PatientId};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn id(v: u32) -> PatientId {
    PatientId::new(v).unwrap()
}

fn catalog() -> ReferenceCatalog {
    ReferenceCatalog {
        ocular_codes: vec![ReferenceCode {
            code: "H40.1".to_string(),
            description: "Open-angle glaucoma".to_string(),
            active: true,
        }],
        systemic_codes: vec![ReferenceCode {
            code: "E11".to_string(),
            description: "Type 2 diabetes mellitus".to_string(),
            active: true,
        }],
        surgery_codes: vec![ReferenceCode {
            code: "PHACO".to_string(),
            description: "Phacoemulsification with IOL implantation".to_string(),
            active: true,
        }],
        medications: vec![MedicationRef {
            trade_name: "Xalatan".to_string(),
            generic_name: "Latanoprost".to_string(),
            active: true,
        }],
    }
}

fn draft(personal_id: &str) -> PatientDraft {
    PatientDraft {
        name: "Test Patient".to_string(),
        personal_id: personal_id.to_string(),
        birth_date: Some(date(1955, 11, 2)),
        collection_date: Some(date(2024, 6, 1)),
        sex: Sex::Female,
        eye: Eye::Right,
        conditions: OcularConditionGroup::default(),
        entries: RepeatableEntries::default(),
    }
}

fn setup() -> (Arc<MemoryStore>, PatientCoordinator) {
    let store = Arc::new(MemoryStore::new());
    store.set_reference_catalog(catalog());
    let allocator = Arc::new(IdAllocator::new(store.clone(), 1500).unwrap());
    let locks = Arc::new(EditLockRegistry::new(Duration::from_secs(900)));
    let coordinator = PatientCoordinator::new(store.clone(), allocator, locks);
    (store, coordinator)
}

#[tokio::test]
async fn created_patient_has_consistent_mirror() {
    let (store, coord) = setup();
    let bundle = coord
        .create_or_replace(id(1500), draft("123456789"), None)
        .await
        .unwrap();

    assert_eq!(bundle.sensitive.id, bundle.statistical.id);
    // Age at collection: birthday already passed in the collection year
    assert_eq!(bundle.statistical.age, Some(68));

    let stored = store.load_patient(id(1500)).await.unwrap().unwrap();
    assert_eq!(stored, bundle);
}

#[tokio::test]
async fn equal_personal_ids_produce_equal_tokens() {
    let (_store, coord) = setup();
    let first = coord
        .create_or_replace(id(1500), draft("123456789"), None)
        .await
        .unwrap();
    let second = coord
        .create_or_replace(id(1501), draft("123456789"), None)
        .await
        .unwrap();
    let third = coord
        .create_or_replace(id(1502), draft("987654321"), None)
        .await
        .unwrap();

    assert_eq!(
        first.statistical.linkage_token,
        second.statistical.linkage_token
    );
    assert_ne!(
        first.statistical.linkage_token,
        third.statistical.linkage_token
    );
}

#[tokio::test]
async fn concurrent_creations_of_same_id_resolve_to_one_winner() {
    let (_store, coord) = setup();
    let coord = Arc::new(coord);
    let target = id(2000);

    let a = {
        let coord = coord.clone();
        tokio::spawn(async move {
            coord
                .create_or_replace(target, draft("111111111"), None)
                .await
        })
    };
    let b = {
        let coord = coord.clone();
        tokio::spawn(async move {
            coord
                .create_or_replace(target, draft("222222222"), None)
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(IrisError::Conflict(_))))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);
}

#[tokio::test]
async fn delete_cascades_and_frees_the_id() {
    let (store, coord) = setup();
    let mut rich = draft("123456789");
    rich.conditions.glaucoma = ConditionFlag::Present(GlaucomaDetail {
        etiology: Some("POAG".to_string()),
        steroid_responder: None,
    });
    rich.entries
        .other_conditions
        .push(iris::domain::entries::OtherConditionEntry {
            code: "H40.1".to_string(),
            eye: iris::domain::EntryEye::Both,
        });
    coord.create_or_replace(id(1500), rich, None).await.unwrap();

    coord
        .delete(id(1500), AccessRole::Administrator, None)
        .await
        .unwrap();

    assert!(store.load_patient(id(1500)).await.unwrap().is_none());
    // The freed id is the next suggestion again
    assert_eq!(coord.allocator().suggest().await.unwrap().value(), 1500);
}

#[tokio::test]
async fn lens_variant_switch_drops_previous_sub_fields_on_save() {
    let (store, coord) = setup();
    let mut phakic = draft("123456789");
    phakic.conditions.lens_status = LensStatus::Phakic {
        locs_no: Some("NO4".to_string()),
        locs_nc: Some("NC3".to_string()),
        locs_c: None,
        locs_p: None,
    };
    coord
        .create_or_replace(id(1500), phakic, None)
        .await
        .unwrap();

    let session = coord.begin_edit(id(1500)).await.unwrap();
    let mut pseudophakic = draft("123456789");
    pseudophakic.conditions.lens_status = LensStatus::Pseudophakic {
        iol_type: Some("toric".to_string()),
    };
    coord
        .create_or_replace(id(1500), pseudophakic, Some(&session))
        .await
        .unwrap();

    let stored = store.load_patient(id(1500)).await.unwrap().unwrap();
    let row = stored.conditions.to_row();
    assert_eq!(row.lens_status, "Pseudophakic");
    assert_eq!(row.iol_type.as_deref(), Some("toric"));
    assert_eq!(row.locs_iii_no, None);
    assert_eq!(row.locs_iii_nc, None);
}

#[tokio::test]
async fn replacement_swaps_repeatable_entries_wholesale() {
    let (store, coord) = setup();
    let mut with_med = draft("123456789");
    with_med
        .entries
        .ocular_medications
        .push(iris::domain::entries::OcularMedicationEntry {
            trade_name: "Xalatan".to_string(),
            generic_name: "Latanoprost".to_string(),
            eye: iris::domain::EntryEye::Left,
            last_application_days: Some(1),
        });
    coord
        .create_or_replace(id(1500), with_med, None)
        .await
        .unwrap();

    // Saving again without the medication removes it
    let session = coord.begin_edit(id(1500)).await.unwrap();
    coord
        .create_or_replace(id(1500), draft("123456789"), Some(&session))
        .await
        .unwrap();

    let stored = store.load_patient(id(1500)).await.unwrap().unwrap();
    assert!(stored.entries.is_empty());
}

#[tokio::test]
async fn validation_failures_leave_no_trace() {
    let (store, coord) = setup();

    // Personal id too short
    let err = coord
        .create_or_replace(id(1500), draft("12345"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, IrisError::Validation(_)));

    // Unknown systemic code
    let mut bad_code = draft("123456789");
    bad_code
        .entries
        .systemic_conditions
        .push(iris::domain::entries::SystemicConditionEntry {
            code: "Z99".to_string(),
        });
    let err = coord
        .create_or_replace(id(1500), bad_code, None)
        .await
        .unwrap_err();
    assert!(matches!(err, IrisError::Validation(_)));

    assert!(store.load_patient(id(1500)).await.unwrap().is_none());
    // The id was released and is still the next suggestion
    assert_eq!(coord.allocator().suggest().await.unwrap().value(), 1500);
}

#[tokio::test]
async fn edit_session_is_exclusive_until_dropped() {
    let (_store, coord) = setup();
    coord
        .create_or_replace(id(1500), draft("123456789"), None)
        .await
        .unwrap();

    let session = coord.begin_edit(id(1500)).await.unwrap();
    assert!(matches!(
        coord.begin_edit(id(1500)).await.unwrap_err(),
        IrisError::Conflict(_)
    ));

    drop(session);
    assert!(coord.begin_edit(id(1500)).await.is_ok());
}

#[tokio::test]
async fn stale_session_loses_to_the_takeover_on_save_and_delete() {
    let store = Arc::new(MemoryStore::new());
    store.set_reference_catalog(catalog());
    let allocator = Arc::new(IdAllocator::new(store.clone(), 1500).unwrap());
    let locks = Arc::new(EditLockRegistry::new(Duration::ZERO));
    let coord = PatientCoordinator::new(store.clone(), allocator, locks);

    coord
        .create_or_replace(id(1500), draft("123456789"), None)
        .await
        .unwrap();

    // Zero timeout: the first session counts as abandoned immediately
    let stale = coord.begin_edit(id(1500)).await.unwrap();
    let fresh = coord.begin_edit(id(1500)).await.unwrap();

    let mut current = draft("123456789");
    current.name = "Fresh Edit".to_string();
    coord
        .create_or_replace(id(1500), current, Some(&fresh))
        .await
        .unwrap();

    let mut overwrite = draft("123456789");
    overwrite.name = "Stale Edit".to_string();
    let err = coord
        .create_or_replace(id(1500), overwrite, Some(&stale))
        .await
        .unwrap_err();
    assert!(matches!(err, IrisError::Conflict(_)));

    // The takeover's save survives
    let stored = store.load_patient(id(1500)).await.unwrap().unwrap();
    assert_eq!(stored.sensitive.name, "Fresh Edit");

    let err = coord
        .delete(id(1500), AccessRole::Administrator, Some(&stale))
        .await
        .unwrap_err();
    assert!(matches!(err, IrisError::Conflict(_)));
    assert!(store.load_patient(id(1500)).await.unwrap().is_some());
}

#[tokio::test]
async fn staff_cannot_delete() {
    let (store, coord) = setup();
    coord
        .create_or_replace(id(1500), draft("123456789"), None)
        .await
        .unwrap();

    let err = coord
        .delete(id(1500), AccessRole::Staff, None)
        .await
        .unwrap_err();
    assert!(matches!(err, IrisError::Authorization(_)));
    assert!(store.load_patient(id(1500)).await.unwrap().is_some());
}
