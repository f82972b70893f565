//! Unit tests for database open, schema creation and migrations.

use linkshelf::database::migrations::{self, CURRENT_SCHEMA_VERSION};
use linkshelf::database::{Database, SharedDatabase};
use tempfile::TempDir;

fn object_exists(db: &Database, kind: &str, name: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
            rusqlite::params![kind, name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
        > 0
}

/// Every table the managers rely on exists after open.
#[test]
fn test_all_tables_created() {
    let db = Database::open_in_memory().unwrap();
    for table in [
        "users",
        "bookmarks",
        "tags",
        "bookmark_tags",
        "click_logs",
        "ranking_cache",
        "schema_version",
    ] {
        assert!(object_exists(&db, "table", table), "missing table {}", table);
    }
}

#[test]
fn test_indexes_created() {
    let db = Database::open_in_memory().unwrap();
    for index in [
        "idx_bookmarks_url",
        "idx_click_logs_bookmark_user",
        "idx_click_logs_clicked_at",
    ] {
        assert!(object_exists(&db, "index", index), "missing index {}", index);
    }
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(migrations::get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

/// Running migrations again must neither fail nor record versions twice.
#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    migrations::run_all(db.connection()).unwrap();
    migrations::run_all(db.connection()).unwrap();

    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
}

/// A file database keeps its data across reopen.
#[test]
fn test_file_database_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("linkshelf.db");

    {
        let db = Database::open(&path).unwrap();
        db.connection()
            .execute(
                "INSERT INTO users (id, username, created_at) VALUES ('u1', 'alice', 0)",
                [],
            )
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let name: String = db
        .connection()
        .query_row("SELECT username FROM users WHERE id = 'u1'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "alice");
    assert_eq!(migrations::get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

/// Bookmarks reference their owner.
#[test]
fn test_foreign_keys_enforced() {
    let db = Database::open_in_memory().unwrap();
    let result = db.connection().execute(
        "INSERT INTO bookmarks (id, user_id, url, title, created_at, updated_at) \
         VALUES ('b1', 'ghost', 'https://example.com', 'Example', 0, 0)",
        [],
    );
    assert!(result.is_err());
}

/// Clones of a shared handle see the same connection.
#[test]
fn test_shared_database_clones_share_connection() {
    let shared = SharedDatabase::new(Database::open_in_memory().unwrap());
    let other = shared.clone();

    shared
        .lock()
        .connection()
        .execute(
            "INSERT INTO users (id, username, created_at) VALUES ('u1', 'alice', 0)",
            [],
        )
        .unwrap();

    let count: i64 = other
        .lock()
        .connection()
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
