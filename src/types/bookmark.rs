use serde::{Deserialize, Serialize};

/// A bookmark owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    /// Normalized URL; unique per owner.
    pub url: String,
    pub title: String,
    pub favicon_path: Option<String>,
    pub total_click_count: i64,
    pub is_favorite: bool,
    /// Tag names, sorted.
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields needed to insert a new bookmark row.
#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub user_id: String,
    pub url: String,
    pub title: String,
    pub favicon_path: Option<String>,
    pub tags: Vec<String>,
}

/// Filter for listing a user's bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkQuery {
    /// Free-text keyword matched against title, URL and tag names.
    pub keyword: Option<String>,
    /// Every listed tag must be present on a bookmark for it to match.
    pub tags: Vec<String>,
    pub favorites_only: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl BookmarkQuery {
    /// Splits `#tag` tokens out of a raw search string.
    ///
    /// `"rust #lang #web"` becomes keyword `"rust"` and tags `["lang", "web"]`.
    pub fn from_search(search: &str, limit: i64, offset: i64) -> Self {
        let mut tags = Vec::new();
        let mut words = Vec::new();
        for token in search.split_whitespace() {
            match token.strip_prefix('#') {
                Some(tag) if !tag.is_empty() => tags.push(tag.to_string()),
                _ => words.push(token),
            }
        }
        let keyword = words.join(" ");
        Self {
            keyword: if keyword.is_empty() { None } else { Some(keyword) },
            tags,
            favorites_only: None,
            limit,
            offset,
        }
    }
}

/// Parses a comma-separated tag input into trimmed, deduplicated, sorted names.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
