use serde::{Deserialize, Serialize};

/// Owner of bookmarks. Authentication lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: i64,
}
