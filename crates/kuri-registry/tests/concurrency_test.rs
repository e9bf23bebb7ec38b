//! Concurrency and durability tests for the registry.

use kuri_registry::{
    JsonFileStore, Registry, RegistryError, Storage, TokenCodec, TokenIssuer, UserRecord,
};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 16;
const PER_THREAD: usize = 50;

#[test]
fn test_concurrent_distinct_registrations() {
    let registry = Arc::new(Registry::new());
    let issuer = Arc::new(TokenIssuer::new(&registry, TokenCodec::default()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = registry.clone();
            let issuer = issuer.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let user_id = format!("{}-{}", t, i);
                    let token = issuer.generate_unused_token();
                    registry
                        .register(&user_id, &token, &format!("chat-{}", user_id))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let records = registry.list_all();
    assert_eq!(records.len(), THREADS * PER_THREAD);

    let users: HashSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
    let tokens: HashSet<&str> = records.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(users.len(), records.len());
    assert_eq!(tokens.len(), records.len());

    // Both indices agree on every record
    for record in &records {
        assert_eq!(registry.get_by_user(&record.user_id).as_ref(), Some(record));
        assert_eq!(registry.get_by_token(&record.token).as_ref(), Some(record));
        assert!(registry
            .is_registered(Some(&record.user_id), Some(&record.token))
            .unwrap());
    }
}

#[test]
fn test_concurrent_same_user_has_one_winner() {
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.register("42", &format!("tok-{}", t), "chat-7")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RegistryError::DuplicateUser(_))))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(duplicates, THREADS - 1);
    assert_eq!(registry.count(), 1);
    assert_eq!(registry.tokens().len(), 1);
}

#[test]
fn test_concurrent_same_token_has_one_winner() {
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.register(&format!("user-{}", t), "shared", "chat")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(RegistryError::DuplicateToken))));
    assert_eq!(registry.count(), 1);
}

#[test]
fn test_concurrent_issuance_is_distinct_and_avoids_seeded_tokens() {
    let registry = Registry::new();
    let seeded: Vec<String> = (0..64)
        .map(|i| {
            let token = TokenCodec::new(2).generate();
            // Skip the rare collision among the seeds themselves
            let _ = registry.register(&format!("seed-{}", i), &token, "chat");
            token
        })
        .collect();
    let seeded: HashSet<String> = seeded
        .into_iter()
        .filter(|t| registry.is_registered(None, Some(t)).unwrap())
        .collect();

    // Two bytes keeps the space small enough that collisions actually happen
    let issuer = Arc::new(TokenIssuer::new(&registry, TokenCodec::new(2)));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let issuer = issuer.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|_| issuer.generate_unused_token())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let issued: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let distinct: HashSet<&String> = issued.iter().collect();

    assert_eq!(distinct.len(), THREADS * PER_THREAD);
    assert!(issued.iter().all(|t| !seeded.contains(t)));
}

#[tokio::test]
async fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("users.json"));

    let registry = Registry::new();
    let issuer = TokenIssuer::new(&registry, TokenCodec::default());
    for i in 0..10 {
        registry
            .register(&i.to_string(), &issuer.generate_unused_token(), &format!("chat-{}", i))
            .unwrap();
    }

    registry.flush_to(&store).await.unwrap();
    let restored = Registry::load_from(&store).await.unwrap();

    let before: HashSet<UserRecord> = registry.list_all().into_iter().collect();
    let after: HashSet<UserRecord> = restored.list_all().into_iter().collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_load_rejects_colliding_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("users.json"));
    store
        .write(&[
            UserRecord::new("1", "tok", "chat-1").unwrap(),
            UserRecord::new("2", "tok", "chat-2").unwrap(),
        ])
        .await
        .unwrap();

    let result = Registry::load_from(&store).await;
    assert!(matches!(result, Err(RegistryError::CorruptData(_))));
}

#[tokio::test]
async fn test_load_rejects_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(&path, b"[{\"user_id\": \"1\"}]").unwrap();

    let result = Registry::load_from(&JsonFileStore::new(&path)).await;
    assert!(matches!(result, Err(RegistryError::CorruptData(_))));
}
