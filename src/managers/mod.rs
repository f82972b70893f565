// linkshelf state managers
// Managers own the SQL: users, bookmarks and tags, click logs, the ranking cache.

pub mod bookmark_manager;
pub mod click_manager;
pub mod ranking_cache;
pub mod user_manager;
