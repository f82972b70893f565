//! Click Manager for linkshelf.
//!
//! Records bookmark clicks with a per-(bookmark, user) dedup window and prunes
//! old click logs. The bookmark's `total_click_count` moves together with the log.

use rusqlite::{params, Connection};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::click::{ClickEvent, ClickOutcome};
use crate::types::errors::ClickError;

/// Repeat clicks by the same user on the same bookmark inside this many seconds are dropped.
pub const CLICK_DEDUP_WINDOW_SECS: i64 = 60;

/// Trait defining click recording operations.
pub trait ClickManagerTrait {
    fn record_click(&mut self, bookmark_id: &str, user_id: &str) -> Result<ClickOutcome, ClickError>;
    fn record_click_at(&mut self, bookmark_id: &str, user_id: &str, now: i64) -> Result<ClickOutcome, ClickError>;
    /// Deletes click logs with `clicked_at < cutoff`. Returns the number removed.
    fn cleanup_before(&mut self, cutoff: i64) -> Result<usize, ClickError>;
    fn count_for_bookmark(&self, bookmark_id: &str) -> Result<i64, ClickError>;
}

/// Click manager backed by a SQLite connection.
pub struct ClickManager<'a> {
    conn: &'a Connection,
}

impl<'a> ClickManager<'a> {
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

    fn bookmark_exists(&self, bookmark_id: &str) -> Result<bool, ClickError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM bookmarks WHERE id = ?1",
                params![bookmark_id],
                |row| row.get(0),
            )
            .map_err(|e| ClickError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }

    fn clicked_within_window(&self, bookmark_id: &str, user_id: &str, now: i64) -> Result<bool, ClickError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM click_logs \
                 WHERE bookmark_id = ?1 AND user_id = ?2 AND clicked_at > ?3",
                params![bookmark_id, user_id, now - CLICK_DEDUP_WINDOW_SECS],
                |row| row.get(0),
            )
            .map_err(|e| ClickError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }
}

impl<'a> ClickManagerTrait for ClickManager<'a> {
    fn record_click(&mut self, bookmark_id: &str, user_id: &str) -> Result<ClickOutcome, ClickError> {
        self.record_click_at(bookmark_id, user_id, Self::now())
    }

    /// Check-then-write: two concurrent clicks can both pass the window check.
    fn record_click_at(
        &mut self,
        bookmark_id: &str,
        user_id: &str,
        now: i64,
    ) -> Result<ClickOutcome, ClickError> {
        if !self.bookmark_exists(bookmark_id)? {
            return Err(ClickError::BookmarkNotFound(bookmark_id.to_string()));
        }
        if self.clicked_within_window(bookmark_id, user_id, now)? {
            tracing::debug!(bookmark_id, user_id, "click suppressed inside dedup window");
            return Ok(ClickOutcome::Suppressed);
        }

        let event = ClickEvent {
            id: Uuid::new_v4().to_string(),
            bookmark_id: bookmark_id.to_string(),
            user_id: user_id.to_string(),
            clicked_at: now,
        };

        // Log and counter commit together or not at all.
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| ClickError::DatabaseError(e.to_string()))?;
        tx.execute(
            "INSERT INTO click_logs (id, bookmark_id, user_id, clicked_at) VALUES (?1, ?2, ?3, ?4)",
            params![event.id, event.bookmark_id, event.user_id, event.clicked_at],
        )
        .map_err(|e| ClickError::DatabaseError(e.to_string()))?;
        tx.execute(
            "UPDATE bookmarks SET total_click_count = total_click_count + 1 WHERE id = ?1",
            params![bookmark_id],
        )
        .map_err(|e| ClickError::DatabaseError(e.to_string()))?;
        tx.commit()
            .map_err(|e| ClickError::DatabaseError(e.to_string()))?;

        Ok(ClickOutcome::Recorded(event))
    }

    fn cleanup_before(&mut self, cutoff: i64) -> Result<usize, ClickError> {
        self.conn
            .execute("DELETE FROM click_logs WHERE clicked_at < ?1", params![cutoff])
            .map_err(|e| ClickError::DatabaseError(e.to_string()))
    }

    fn count_for_bookmark(&self, bookmark_id: &str) -> Result<i64, ClickError> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM click_logs WHERE bookmark_id = ?1",
                params![bookmark_id],
                |row| row.get(0),
            )
            .map_err(|e| ClickError::DatabaseError(e.to_string()))
    }
}
