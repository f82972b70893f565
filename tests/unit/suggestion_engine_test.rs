//! Unit tests for similar-URL suggestions.

use linkshelf::database::Database;
use linkshelf::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use linkshelf::managers::user_manager::{UserManager, UserManagerTrait};
use linkshelf::services::suggestion_engine::{ancestor_urls, SuggestionEngine, MAX_SUGGESTIONS};
use linkshelf::services::url_normalizer::normalize_url;
use linkshelf::types::bookmark::NewBookmark;

/// Helper: in-memory database with two users; `public` makes a URL public by
/// bookmarking it for both.
fn setup() -> (Database, (String, String)) {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let mut users = UserManager::new(db.connection());
    let u1 = users.create_user("u1").unwrap().id;
    let u2 = users.create_user("u2").unwrap().id;
    (db, (u1, u2))
}

fn add(db: &Database, user_id: &str, url: &str) {
    BookmarkManager::new(db.connection())
        .add_bookmark(&NewBookmark {
            user_id: user_id.to_string(),
            url: url.to_string(),
            title: url.to_string(),
            favicon_path: None,
            tags: Vec::new(),
        })
        .unwrap();
}

fn public(db: &Database, users: &(String, String), url: &str) {
    add(db, &users.0, url);
    add(db, &users.1, url);
}

#[test]
fn test_ancestor_urls_nearest_first() {
    assert_eq!(
        ancestor_urls("https://example.com/a/b/c?x=1#frag"),
        vec![
            "https://example.com/a/b",
            "https://example.com/a",
            "https://example.com",
        ]
    );
    assert_eq!(ancestor_urls("https://example.com:8080/a"), vec!["https://example.com:8080"]);
    assert!(ancestor_urls("https://example.com").is_empty());
    assert!(ancestor_urls("not a url").is_empty());
}

/// Userinfo is not part of any ancestor.
#[test]
fn test_ancestor_urls_drop_userinfo() {
    assert_eq!(ancestor_urls("https://me@example.com/a"), vec!["https://example.com"]);
    assert_eq!(
        ancestor_urls("https://me:pw@example.com/a/b c/d"),
        vec![
            "https://example.com/a/b c",
            "https://example.com/a",
            "https://example.com",
        ]
    );
}

/// The input itself, then its ancestors, then longer public URLs.
#[test]
fn test_exact_then_ancestors_then_prefix() {
    let (db, users) = setup();
    public(&db, &users, "https://docs.rs");
    public(&db, &users, "https://docs.rs/serde");
    public(&db, &users, "https://docs.rs/serde/latest");
    public(&db, &users, "https://docs.rs/serde/latest/serde/de");

    let engine = SuggestionEngine::new(db.connection());
    let found = engine.suggest("https://docs.rs/serde/latest").unwrap();

    assert_eq!(
        found,
        vec![
            "https://docs.rs/serde/latest",
            "https://docs.rs/serde",
            "https://docs.rs",
            "https://docs.rs/serde/latest/serde/de",
        ]
    );
}

/// Private URLs are never suggested.
#[test]
fn test_private_urls_are_skipped() {
    let (db, users) = setup();
    add(&db, &users.0, "https://example.com");
    public(&db, &users, "https://example.com/shared");

    let engine = SuggestionEngine::new(db.connection());
    assert_eq!(
        engine.suggest("https://example.com/shared/page").unwrap(),
        vec!["https://example.com/shared"]
    );
    assert_eq!(
        engine.suggest("https://example.com").unwrap(),
        vec!["https://example.com/shared"]
    );
    assert!(engine.suggest("https://other.org").unwrap().is_empty());
}

#[test]
fn test_results_are_capped() {
    let (db, users) = setup();
    for i in 0..8 {
        public(&db, &users, &format!("https://blog.example.com/post{}", i));
    }

    let engine = SuggestionEngine::new(db.connection());
    let found = engine.suggest("https://blog.example.com/post").unwrap();
    assert_eq!(found.len(), MAX_SUGGESTIONS);
    assert_eq!(found[0], "https://blog.example.com/post0");
}

#[test]
fn test_blank_input() {
    let (db, _) = setup();
    let engine = SuggestionEngine::new(db.connection());
    assert!(engine.suggest("   ").unwrap().is_empty());
}

/// Stored URLs keep the typed query text, so a raw prefix still finds them.
#[test]
fn test_prefix_matches_unencoded_query() {
    let (db, users) = setup();
    let stored = normalize_url("https://Example.com/search/?q=it's here");
    assert_eq!(stored, "https://example.com/search?q=it's here");
    public(&db, &users, &stored);

    let found = SuggestionEngine::new(db.connection())
        .suggest("https://example.com/search?q=it'")
        .unwrap();

    assert_eq!(found, vec![stored]);
}
