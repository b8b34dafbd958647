//! Entry storage and the newest-first index, end to end.
//!
//! Runs against both engines; the redb store lives in a [`TestDir`].

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use feedarchive_state::{
    FeedStore, IndexManager, Key, ScanControl, StoreError, TableTag, owner_index_prefix,
    table_prefix,
};
use feedarchive_store::{InMemoryEngine, KvEngine, RedbEngine};
use feedarchive_test_utils::{Fault, FaultyEngine, TestDir, strategies};
use feedarchive_types::{Entry, ErrorCode, FlakeGenerator};
use proptest::prelude::*;
use uuid::Uuid;

const OWNER: &str = "6f1b2f6c-1111-4a4a-8c8c-000000000001";
const ABC: &str = "abc00000-0000-4000-8000-000000000001";
const DEF: &str = "def00000-0000-4000-8000-000000000002";

fn entry(id: &str, date: &str) -> Entry {
    Entry {
        id: id.to_string(),
        profile_uuid: OWNER.to_string(),
        date: date.to_string(),
        body: format!("body of {id}"),
        ..Entry::default()
    }
}

fn stores(dir: &TestDir) -> Vec<(&'static str, FeedStore)> {
    let redb = RedbEngine::open(&dir.join("store.redb"), 2).unwrap();
    vec![
        ("memory", FeedStore::new(Arc::new(InMemoryEngine::new()))),
        ("redb", FeedStore::new(Arc::new(redb))),
    ]
}

#[test]
fn newer_entries_are_listed_first() {
    let dir = TestDir::new();
    for (name, store) in stores(&dir) {
        store.put_entry(&mut entry(ABC, "2024-01-01T00:00:00Z"), false).unwrap();
        store.put_entry(&mut entry(DEF, "2024-06-01T00:00:00Z"), false).unwrap();

        let ids: Vec<_> =
            store.list_entries(OWNER, 10).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![DEF.to_string(), ABC.to_string()], "{name}");
    }
}

#[test]
fn double_create_is_rejected_and_value_kept() {
    let dir = TestDir::new();
    for (name, store) in stores(&dir) {
        let mut first = entry(ABC, "2024-01-01T00:00:00Z");
        let key = store.put_entry(&mut first, false).unwrap();

        let mut second = entry(ABC, "2024-01-01T00:00:00Z");
        second.body = "different".to_string();
        let err = store.put_entry(&mut second, false).unwrap_err();
        assert!(matches!(&err, StoreError::AlreadyExists { key: k } if *k == key), "{name}");
        assert_eq!(err.code(), ErrorCode::AlreadyExists);

        assert_eq!(store.get_entry(ABC).unwrap(), first, "{name}");
    }
}

#[test]
fn update_overwrites_with_stable_key_and_no_new_index() {
    let dir = TestDir::new();
    for (name, store) in stores(&dir) {
        let mut e = entry(ABC, "2024-01-01T00:00:00Z");
        let key = store.put_entry(&mut e, false).unwrap();

        e.body = "edited".to_string();
        assert_eq!(store.put_entry(&mut e, true).unwrap(), key, "{name}");
        assert_eq!(store.get_entry(ABC).unwrap().body, "edited", "{name}");

        let owner = Uuid::parse_str(OWNER).unwrap();
        assert_eq!(store.count(&owner_index_prefix(owner)).unwrap(), 1, "{name}");
        assert_eq!(store.count(&table_prefix(TableTag::Entry)).unwrap(), 1, "{name}");
    }
}

#[test]
fn update_of_missing_entry_creates_it() {
    let store = FeedStore::new(Arc::new(InMemoryEngine::new()));
    store.put_entry(&mut entry(ABC, "2024-01-01T00:00:00Z"), true).unwrap();
    assert_eq!(store.list_entries(OWNER, 10).unwrap().len(), 1);
}

#[test]
fn failed_index_write_reports_partially_stored_entry() {
    let faulty = FaultyEngine::new(Arc::new(InMemoryEngine::new()));
    let ids = Arc::new(FlakeGenerator::new(3));
    let store = FeedStore::with_id_generator(faulty.clone(), Arc::clone(&ids));
    faulty.arm(Fault::PutWithPrefix(table_prefix(TableTag::ReverseEntryIndex).to_vec()));

    let mut e = entry(ABC, "2024-01-01T00:00:00Z");
    let err = store.put_entry(&mut e, false).unwrap_err();
    let StoreError::IndexWrite { key, .. } = &err else { panic!("unexpected error: {err}") };
    assert_eq!(err.code(), ErrorCode::IndexIncomplete);
    assert!(err.code().is_retryable());
    assert_eq!(faulty.failed_put_count(), 1);

    // The entry itself is readable but not listed.
    assert_eq!(store.get_entry(ABC).unwrap(), e);
    assert!(store.list_entries(OWNER, 10).unwrap().is_empty());

    faulty.disarm();
    let owner = Uuid::parse_str(OWNER).unwrap();
    IndexManager::add_entry(&*faulty, &ids, owner, e.created_at().unwrap(), &key.encode())
        .unwrap();
    assert_eq!(store.list_entries(OWNER, 10).unwrap(), vec![e]);
}

#[test]
fn scan_stop_and_errors_carry_counts() {
    let faulty = FaultyEngine::new(Arc::new(InMemoryEngine::new()));
    let store = FeedStore::new(faulty.clone());
    for day in 1..=4 {
        let id = Uuid::new_v4().to_string();
        store.put_entry(&mut entry(&id, &format!("2024-02-0{day}T00:00:00Z")), false).unwrap();
    }
    let prefix = table_prefix(TableTag::Entry);

    let stopped = store
        .scan(&prefix, |i, _, _| {
            Ok::<_, StoreError>(if i == 2 { ScanControl::Stop } else { ScanControl::Continue })
        })
        .unwrap();
    assert_eq!(stopped, 2);

    let err = store
        .scan(&prefix, |i, _, _| {
            if i == 3 {
                return Err(StoreError::NotFound { kind: "entry", id: "x".to_string() });
            }
            Ok(ScanControl::Continue)
        })
        .unwrap_err();
    assert_eq!(err.scanned(), 3);

    faulty.arm(Fault::IterNextAfter(1));
    let err = store
        .scan(&prefix, |_, _, _| Ok::<_, StoreError>(ScanControl::Continue))
        .unwrap_err();
    assert_eq!(err.scanned(), 2);
    assert_eq!(faulty.live_iterators(), 0);
}

#[test]
fn listing_releases_iterators() {
    let faulty = FaultyEngine::new(Arc::new(InMemoryEngine::new()));
    let store = FeedStore::new(faulty.clone());
    store.put_entry(&mut entry(ABC, "2024-01-01T00:00:00Z"), false).unwrap();
    store.list_entries(OWNER, 1).unwrap();
    assert_eq!(faulty.live_iterators(), 0);
}

#[test]
fn entries_survive_reopen() {
    let dir = TestDir::new();
    let path = dir.join("store.redb");
    {
        let store = FeedStore::new(Arc::new(RedbEngine::open(&path, 8).unwrap()));
        store.put_entry(&mut entry(ABC, "2024-01-01T00:00:00Z"), false).unwrap();
    }
    let engine: Arc<dyn KvEngine> = Arc::new(RedbEngine::open(&path, 8).unwrap());
    let store = FeedStore::new(engine);
    assert_eq!(store.list_entries(OWNER, 10).unwrap()[0].id, ABC);
    assert!(matches!(
        store.put_entry(&mut entry(ABC, "2024-01-01T00:00:00Z"), false),
        Err(StoreError::AlreadyExists { key }) if key == Key::entry(Uuid::parse_str(ABC).unwrap())
    ));
}

#[test]
fn same_second_entries_are_all_listed_after_sequence_wrap() {
    let store = FeedStore::with_id_generator(
        Arc::new(InMemoryEngine::new()),
        Arc::new(FlakeGenerator::new(7)),
    );
    let same = "2009-05-01T12:00:00Z";
    store.put_entry(&mut entry(ABC, same), false).unwrap();

    let other = Uuid::new_v4().to_string();
    for _ in 0..1023 {
        let mut filler = entry(&Uuid::new_v4().to_string(), same);
        filler.profile_uuid = other.clone();
        store.put_entry(&mut filler, false).unwrap();
    }
    store.put_entry(&mut entry(DEF, same), false).unwrap();

    assert_eq!(store.list_entries(OWNER, 100).unwrap().len(), 2);
}

#[test]
fn same_second_entries_are_all_listed_after_restart() {
    let engine: Arc<dyn KvEngine> = Arc::new(InMemoryEngine::new());
    let same = "2009-05-01T12:00:00Z";

    let before =
        FeedStore::with_id_generator(Arc::clone(&engine), Arc::new(FlakeGenerator::new(7)));
    before.put_entry(&mut entry(ABC, same), false).unwrap();

    let after = FeedStore::with_id_generator(engine, Arc::new(FlakeGenerator::new(7)));
    after.put_entry(&mut entry(DEF, same), false).unwrap();

    let ids: Vec<_> =
        after.list_entries(OWNER, 100).unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![ABC.to_string(), DEF.to_string()]);
}

#[test]
fn dangling_index_pairs_do_not_use_up_the_limit() {
    let ids = Arc::new(FlakeGenerator::new(1));
    let store = FeedStore::with_id_generator(Arc::new(InMemoryEngine::new()), Arc::clone(&ids));
    let mut live = entry(ABC, "2024-01-01T00:00:00Z");
    store.put_entry(&mut live, false).unwrap();

    let owner = Uuid::parse_str(OWNER).unwrap();
    let ghost = Key::entry(Uuid::parse_str(DEF).unwrap());
    let newer = live.created_at().unwrap() + chrono::Duration::days(30);
    IndexManager::add_entry(&**store.engine(), &ids, owner, newer, &ghost.encode()).unwrap();

    assert_eq!(store.list_entries(OWNER, 1).unwrap(), vec![live]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn put_then_get_returns_normalized_entry(mut e in strategies::arb_entry()) {
        let store = FeedStore::new(Arc::new(InMemoryEngine::new()));
        let original_id = e.id.clone();
        store.put_entry(&mut e, false).unwrap();

        prop_assert!(!e.id.starts_with("e/"));
        prop_assert_eq!(store.get_entry(&original_id).unwrap(), e.clone());
        prop_assert_eq!(store.get_entry(&e.id).unwrap(), e);
    }

    #[test]
    fn listing_is_newest_first(
        entries in proptest::collection::vec(
            strategies::arb_entry_for(Uuid::parse_str(OWNER).unwrap()),
            1..12,
        )
    ) {
        let store = FeedStore::new(Arc::new(InMemoryEngine::new()));
        let mut stored = 0;
        for mut e in entries {
            if store.put_entry(&mut e, false).is_ok() {
                stored += 1;
            }
        }

        let listed = store.list_entries(OWNER, usize::MAX).unwrap();
        prop_assert_eq!(listed.len(), stored);
        for pair in listed.windows(2) {
            prop_assert!(pair[0].created_at().unwrap() >= pair[1].created_at().unwrap());
        }
    }
}
