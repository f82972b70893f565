//! Property-based tests for Bookmark Manager operations.
//!
//! Adding a bookmark then searching by its title always finds it, and a
//! second add of the same URL by the same owner is always rejected.

use linkshelf::database::Database;
use linkshelf::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use linkshelf::managers::user_manager::{UserManager, UserManagerTrait};
use linkshelf::types::bookmark::{BookmarkQuery, NewBookmark};
use linkshelf::types::errors::BookmarkError;
use proptest::prelude::*;

/// Strategy for generating valid URL strings.
fn arb_url() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("https"), Just("http")],
        "[a-z][a-z0-9]{2,15}",
        prop_oneof![Just(".com"), Just(".org"), Just(".net"), Just(".io")],
        proptest::option::of("/[a-z0-9]{1,10}"),
    )
        .prop_map(|(scheme, host, tld, path)| {
            format!("{}://{}{}{}", scheme, host, tld, path.unwrap_or_default())
        })
}

/// Strategy for non-empty titles without LIKE wildcards.
fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{1,30}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn bookmark_add_then_search_returns_result(
        url in arb_url(),
        title in arb_title(),
    ) {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let user = UserManager::new(db.connection()).create_user("prop").unwrap();
        let mut manager = BookmarkManager::new(db.connection());

        let added = manager
            .add_bookmark(&NewBookmark {
                user_id: user.id.clone(),
                url: url.clone(),
                title: title.clone(),
                favicon_path: None,
                tags: Vec::new(),
            })
            .unwrap();

        let query = BookmarkQuery {
            keyword: Some(title.trim().to_string()),
            ..BookmarkQuery::default()
        };
        let (found, total) = manager.find_bookmarks(&user.id, &query).unwrap();
        prop_assert!(total >= 1);
        prop_assert!(found.iter().any(|b| b.id == added.id));
    }

    #[test]
    fn bookmark_second_add_is_duplicate(url in arb_url(), title in arb_title()) {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let user = UserManager::new(db.connection()).create_user("prop").unwrap();
        let mut manager = BookmarkManager::new(db.connection());
        let new = NewBookmark {
            user_id: user.id.clone(),
            url,
            title,
            favicon_path: None,
            tags: Vec::new(),
        };

        manager.add_bookmark(&new).unwrap();
        let second = manager.add_bookmark(&new);
        prop_assert!(matches!(second, Err(BookmarkError::DuplicateUrl(_))));
    }
}
