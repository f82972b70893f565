//! Bookmark Manager for linkshelf.
//!
//! Implements `BookmarkManagerTrait`: per-owner bookmark CRUD, tagging and
//! search, backed by SQLite via `rusqlite`. URLs arrive already normalized.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::bookmark::{Bookmark, BookmarkQuery, NewBookmark};
use crate::types::errors::BookmarkError;

/// Trait defining bookmark management operations.
pub trait BookmarkManagerTrait {
    fn add_bookmark(&mut self, new: &NewBookmark) -> Result<Bookmark, BookmarkError>;
    /// Returns the bookmark only if `user_id` owns it.
    fn get_bookmark(&self, id: &str, user_id: &str) -> Result<Bookmark, BookmarkError>;
    fn update_bookmark(&mut self, id: &str, user_id: &str, title: &str, tags: &[String]) -> Result<Bookmark, BookmarkError>;
    fn set_favicon_path(&mut self, id: &str, favicon_path: Option<&str>) -> Result<(), BookmarkError>;
    /// Deletes the bookmark with its click logs and tag links. Returns the removed row.
    fn remove_bookmark(&mut self, id: &str, user_id: &str) -> Result<Bookmark, BookmarkError>;
    /// Flips the favorite flag and returns the new value.
    fn toggle_favorite(&mut self, id: &str, user_id: &str) -> Result<bool, BookmarkError>;
    /// Filtered, paginated listing. Returns (bookmarks, total_count).
    fn find_bookmarks(&self, user_id: &str, query: &BookmarkQuery) -> Result<(Vec<Bookmark>, i64), BookmarkError>;
    fn list_tags(&self, user_id: &str) -> Result<Vec<String>, BookmarkError>;
    fn is_bookmarked_by_user(&self, user_id: &str, url: &str) -> Result<bool, BookmarkError>;
    /// Deletes tags no bookmark references. Returns how many were removed.
    fn delete_orphan_tags(&mut self) -> Result<usize, BookmarkError>;
    /// Non-blank titles of every bookmark sharing `url`, across owners.
    fn titles_for_url(&self, url: &str) -> Result<Vec<String>, BookmarkError>;
    /// Non-empty favicon paths of bookmarks sharing `url`, oldest bookmark first.
    fn favicon_paths_for_url(&self, url: &str) -> Result<Vec<String>, BookmarkError>;
}

/// Bookmark manager backed by a SQLite connection.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
}

const BOOKMARK_COLUMNS: &str =
    "b.id, b.user_id, b.url, b.title, b.favicon_path, b.total_click_count, b.is_favorite, b.created_at, b.updated_at";

impl<'a> BookmarkManager<'a> {
    /// Creates a new `BookmarkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Reads a single `Bookmark` row into a struct. Tags are filled in separately.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            user_id: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            favicon_path: row.get(4)?,
            total_click_count: row.get(5)?,
            is_favorite: row.get::<_, i64>(6)? != 0,
            tags: Vec::new(),
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn tags_of(&self, bookmark_id: &str) -> Result<Vec<String>, BookmarkError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT t.name FROM tags t JOIN bookmark_tags bt ON bt.tag_id = t.id \
                 WHERE bt.bookmark_id = ?1 ORDER BY t.name",
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map(params![bookmark_id], |row| row.get::<_, String>(0))
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?);
        }
        Ok(tags)
    }

    fn with_tags(&self, mut bookmark: Bookmark) -> Result<Bookmark, BookmarkError> {
        bookmark.tags = self.tags_of(&bookmark.id)?;
        Ok(bookmark)
    }

    /// Replaces the tag links of a bookmark, creating missing tags by name.
    fn replace_tags(&self, bookmark_id: &str, tags: &[String]) -> Result<(), BookmarkError> {
        self.conn
            .execute("DELETE FROM bookmark_tags WHERE bookmark_id = ?1", params![bookmark_id])
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        for name in tags {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO tags (id, name) VALUES (?1, ?2)",
                    params![Uuid::new_v4().to_string(), name],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO bookmark_tags (bookmark_id, tag_id) \
                     SELECT ?1, id FROM tags WHERE name = ?2",
                    params![bookmark_id, name],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    fn collect_strings(&self, sql: &str, arg: &str) -> Result<Vec<String>, BookmarkError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map(params![arg], |row| row.get::<_, String>(0))
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    /// Inserts a bookmark for its owner. The `(user_id, url)` pair must be new.
    fn add_bookmark(&mut self, new: &NewBookmark) -> Result<Bookmark, BookmarkError> {
        if self.is_bookmarked_by_user(&new.user_id, &new.url)? {
            return Err(BookmarkError::DuplicateUrl(new.url.clone()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Self::now();

        self.conn
            .execute(
                "INSERT INTO bookmarks (id, user_id, url, title, favicon_path, total_click_count, is_favorite, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?7)",
                params![id, new.user_id, new.url, new.title, new.favicon_path, now, now],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    BookmarkError::DuplicateUrl(new.url.clone())
                }
                other => BookmarkError::DatabaseError(other.to_string()),
            })?;

        self.replace_tags(&id, &new.tags)?;
        self.get_bookmark(&id, &new.user_id)
    }

    fn get_bookmark(&self, id: &str, user_id: &str) -> Result<Bookmark, BookmarkError> {
        let sql = format!("SELECT {} FROM bookmarks b WHERE b.id = ?1 AND b.user_id = ?2", BOOKMARK_COLUMNS);
        let found = self
            .conn
            .query_row(&sql, params![id, user_id], Self::row_to_bookmark)
            .optional()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        match found {
            Some(bookmark) => self.with_tags(bookmark),
            None => Err(BookmarkError::NotFound(id.to_string())),
        }
    }

    /// Replaces title and tags. The URL of a bookmark never changes.
    fn update_bookmark(
        &mut self,
        id: &str,
        user_id: &str,
        title: &str,
        tags: &[String],
    ) -> Result<Bookmark, BookmarkError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET title = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
                params![title, Self::now(), id, user_id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        self.replace_tags(id, tags)?;
        self.get_bookmark(id, user_id)
    }

    fn set_favicon_path(&mut self, id: &str, favicon_path: Option<&str>) -> Result<(), BookmarkError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET favicon_path = ?1 WHERE id = ?2",
                params![favicon_path, id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn remove_bookmark(&mut self, id: &str, user_id: &str) -> Result<Bookmark, BookmarkError> {
        let bookmark = self.get_bookmark(id, user_id)?;

        self.conn
            .execute("DELETE FROM click_logs WHERE bookmark_id = ?1", params![id])
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        self.conn
            .execute("DELETE FROM bookmark_tags WHERE bookmark_id = ?1", params![id])
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        self.conn
            .execute(
                "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        Ok(bookmark)
    }

    fn toggle_favorite(&mut self, id: &str, user_id: &str) -> Result<bool, BookmarkError> {
        let affected = self
            .conn
            .execute(
                "UPDATE bookmarks SET is_favorite = 1 - is_favorite, updated_at = ?1 \
                 WHERE id = ?2 AND user_id = ?3",
                params![Self::now(), id, user_id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        Ok(self.get_bookmark(id, user_id)?.is_favorite)
    }

    /// Keyword matches title, URL or a tag name (case-insensitive LIKE).
    /// Every requested tag must be present. Newest bookmarks first.
    fn find_bookmarks(
        &self,
        user_id: &str,
        query: &BookmarkQuery,
    ) -> Result<(Vec<Bookmark>, i64), BookmarkError> {
        let mut clauses = vec!["b.user_id = ?".to_string()];
        let mut args: Vec<rusqlite::types::Value> = vec![user_id.to_string().into()];

        if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            let pattern = format!("%{}%", keyword.trim());
            clauses.push(
                "(b.title LIKE ? OR b.url LIKE ? OR EXISTS (SELECT 1 FROM bookmark_tags bt \
                 JOIN tags t ON t.id = bt.tag_id WHERE bt.bookmark_id = b.id AND t.name LIKE ?))"
                    .to_string(),
            );
            for _ in 0..3 {
                args.push(pattern.clone().into());
            }
        }
        for tag in &query.tags {
            clauses.push(
                "EXISTS (SELECT 1 FROM bookmark_tags bt JOIN tags t ON t.id = bt.tag_id \
                 WHERE bt.bookmark_id = b.id AND t.name = ?)"
                    .to_string(),
            );
            args.push(tag.clone().into());
        }
        if let Some(favorite) = query.favorites_only {
            clauses.push("b.is_favorite = ?".to_string());
            args.push(i64::from(favorite).into());
        }

        let where_sql = clauses.join(" AND ");

        let total: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM bookmarks b WHERE {}", where_sql),
                rusqlite::params_from_iter(args.iter()),
                |row| row.get(0),
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let limit = if query.limit > 0 { query.limit } else { -1 };
        let mut page_args = args.clone();
        page_args.push(limit.into());
        page_args.push(query.offset.max(0).into());

        let sql = format!(
            "SELECT {} FROM bookmarks b WHERE {} ORDER BY b.created_at DESC, b.id LIMIT ? OFFSET ?",
            BOOKMARK_COLUMNS, where_sql
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(page_args.iter()), Self::row_to_bookmark)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let bookmark = row.map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            results.push(self.with_tags(bookmark)?);
        }
        Ok((results, total))
    }

    fn list_tags(&self, user_id: &str) -> Result<Vec<String>, BookmarkError> {
        self.collect_strings(
            "SELECT DISTINCT t.name FROM tags t \
             JOIN bookmark_tags bt ON bt.tag_id = t.id \
             JOIN bookmarks b ON b.id = bt.bookmark_id \
             WHERE b.user_id = ?1 ORDER BY t.name",
            user_id,
        )
    }

    fn is_bookmarked_by_user(&self, user_id: &str, url: &str) -> Result<bool, BookmarkError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM bookmarks WHERE user_id = ?1 AND url = ?2",
                params![user_id, url],
                |row| row.get(0),
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }

    fn delete_orphan_tags(&mut self) -> Result<usize, BookmarkError> {
        self.conn
            .execute(
                "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM bookmark_tags)",
                [],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))
    }

    fn titles_for_url(&self, url: &str) -> Result<Vec<String>, BookmarkError> {
        self.collect_strings(
            "SELECT title FROM bookmarks WHERE url = ?1 AND TRIM(title) <> '' ORDER BY created_at, id",
            url,
        )
    }

    fn favicon_paths_for_url(&self, url: &str) -> Result<Vec<String>, BookmarkError> {
        self.collect_strings(
            "SELECT favicon_path FROM bookmarks \
             WHERE url = ?1 AND favicon_path IS NOT NULL AND favicon_path <> '' \
             ORDER BY created_at, id",
            url,
        )
    }
}
