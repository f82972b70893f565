//! Unit tests for the local filesystem storage backend.

use linkshelf::storage::{ranking_copy_path, LocalStorage, ObjectStorage, RANKING_NAMESPACE};
use linkshelf::types::errors::StorageError;
use tempfile::TempDir;

/// Helper: storage rooted in a nested directory that does not exist yet.
async fn setup() -> (TempDir, LocalStorage) {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path().join("favicons")).await.unwrap();
    (dir, storage)
}

#[tokio::test]
async fn test_save_writes_file_below_root() {
    let (_dir, storage) = setup().await;

    let path = storage.save(b"icon", "user-1/abc.png").await.unwrap();

    assert_eq!(path, "user-1/abc.png");
    assert_eq!(std::fs::read(storage.root().join("user-1/abc.png")).unwrap(), b"icon");
}

/// Deleting twice is fine.
#[tokio::test]
async fn test_delete_is_idempotent() {
    let (_dir, storage) = setup().await;
    storage.save(b"icon", "user-1/abc.png").await.unwrap();

    storage.delete("user-1/abc.png").await.unwrap();
    storage.delete("user-1/abc.png").await.unwrap();

    assert!(!storage.root().join("user-1/abc.png").exists());
}

#[tokio::test]
async fn test_copy_into_ranking_namespace() {
    let (_dir, storage) = setup().await;
    storage.save(b"icon", "user-1/abc.png").await.unwrap();

    let dst = ranking_copy_path("user-1/abc.png");
    assert_eq!(dst, "ranking/abc.png");
    let copied = storage.copy("user-1/abc.png", &dst).await.unwrap();

    assert_eq!(copied, "ranking/abc.png");
    assert_eq!(std::fs::read(storage.root().join("ranking/abc.png")).unwrap(), b"icon");
    assert!(storage.root().join("user-1/abc.png").exists());
}

#[tokio::test]
async fn test_copy_missing_source() {
    let (_dir, storage) = setup().await;
    assert!(matches!(
        storage.copy("user-1/none.png", "ranking/none.png").await,
        Err(StorageError::NotFound(_))
    ));
}

/// Clearing the ranking namespace leaves user favicons alone.
#[tokio::test]
async fn test_clear_namespace() {
    let (_dir, storage) = setup().await;
    storage.save(b"icon", "user-1/abc.png").await.unwrap();
    storage.copy("user-1/abc.png", "ranking/abc.png").await.unwrap();

    storage.clear_namespace(RANKING_NAMESPACE).await.unwrap();
    storage.clear_namespace(RANKING_NAMESPACE).await.unwrap();

    assert!(!storage.root().join(RANKING_NAMESPACE).exists());
    assert!(storage.root().join("user-1/abc.png").exists());
}

#[tokio::test]
async fn test_rejects_escaping_keys() {
    let (_dir, storage) = setup().await;
    for key in ["../outside.png", "a/../../b.png", "", "a\\b.png"] {
        assert!(
            matches!(storage.save(b"x", key).await, Err(StorageError::InvalidKey(_))),
            "key {:?} accepted",
            key
        );
    }
}

#[tokio::test]
async fn test_url_for() {
    let (_dir, storage) = setup().await;
    assert_eq!(
        storage.url_for("ranking/abc.png").await.unwrap(),
        "/favicons/ranking/abc.png"
    );
}
