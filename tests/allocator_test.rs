//! Integration tests for patient id allocation

use std::sync::Arc;

use iris::adapters::store::{MemoryStore, PatientStore};
use iris::core::allocator::IdAllocator;
use iris::domain::conditions::OcularConditionGroup;
use iris::domain::entries::RepeatableEntries;
use iris::domain::patient::{Eye, PatientBundle, SensitiveRecord, Sex, StatisticalRecord};
use iris::domain::{IrisError, LinkageToken, PatientId, PersonalId};

fn bundle(id: u32) -> PatientBundle {
    let pid = PatientId::new(id).unwrap();
    PatientBundle {
        sensitive: SensitiveRecord {
            id: pid,
            name: format!("Patient {id}"),
            personal_id: PersonalId::new("123456789").unwrap(),
            birth_date: None,
            collection_date: None,
        },
        statistical: StatisticalRecord {
            id: pid,
            linkage_token: LinkageToken::new("a".repeat(64)).unwrap(),
            age: None,
            sex: Sex::Male,
            eye: Eye::Right,
        },
        conditions: OcularConditionGroup::default(),
        entries: RepeatableEntries::default(),
    }
}

#[tokio::test]
async fn empty_registry_suggests_the_floor() {
    let store = Arc::new(MemoryStore::new());
    let allocator = IdAllocator::new(store, 1500).unwrap();
    assert_eq!(allocator.suggest().await.unwrap().value(), 1500);
}

#[tokio::test]
async fn manual_low_ids_do_not_move_the_floor() {
    let store = Arc::new(MemoryStore::new());
    // Legacy patients entered manually below the floor
    for id in [3, 17, 250] {
        store.insert_patient(&bundle(id)).await.unwrap();
    }
    let allocator = IdAllocator::new(store, 1500).unwrap();
    assert_eq!(allocator.suggest().await.unwrap().value(), 1500);
}

#[tokio::test]
async fn deleted_id_is_recycled_as_smallest_free() {
    let store = Arc::new(MemoryStore::new());
    for id in [1500, 1501, 1502] {
        store.insert_patient(&bundle(id)).await.unwrap();
    }
    let allocator = IdAllocator::new(store.clone(), 1500).unwrap();
    assert_eq!(allocator.suggest().await.unwrap().value(), 1503);

    store
        .delete_patient(PatientId::new(1501).unwrap())
        .await
        .unwrap();
    allocator.recycle(PatientId::new(1501).unwrap());

    assert_eq!(allocator.suggest().await.unwrap().value(), 1501);
}

#[tokio::test]
async fn reservation_is_visible_to_other_suggestions() {
    let store = Arc::new(MemoryStore::new());
    let allocator = Arc::new(IdAllocator::new(store, 1500).unwrap());

    let first = allocator.suggest().await.unwrap();
    allocator.reserve(first).await.unwrap();

    // A second caller asking before the first commits gets a fresh id
    let second = allocator.suggest().await.unwrap();
    assert_ne!(first, second);
    assert_eq!(second.value(), 1501);
}

#[tokio::test]
async fn concurrent_reserves_of_the_same_id_yield_one_winner() {
    let store = Arc::new(MemoryStore::new());
    let allocator = Arc::new(IdAllocator::new(store, 1500).unwrap());
    let id = PatientId::new(2000).unwrap();

    let a = {
        let allocator = allocator.clone();
        tokio::spawn(async move { allocator.reserve(id).await })
    };
    let b = {
        let allocator = allocator.clone();
        tokio::spawn(async move { allocator.reserve(id).await })
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
async fn validate_available_reflects_assignment_and_reservation() {
    let store = Arc::new(MemoryStore::new());
    store.insert_patient(&bundle(42)).await.unwrap();
    let allocator = IdAllocator::new(store, 1500).unwrap();

    assert!(!allocator
        .validate_available(PatientId::new(42).unwrap())
        .await
        .unwrap());
    assert!(allocator
        .validate_available(PatientId::new(43).unwrap())
        .await
        .unwrap());
}
