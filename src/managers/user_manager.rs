//! User Manager for linkshelf.
//!
//! Bookmark owners only. Credentials and sessions are handled elsewhere.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::errors::UserError;
use crate::types::user::User;

/// Trait defining user record operations.
pub trait UserManagerTrait {
    fn create_user(&mut self, username: &str) -> Result<User, UserError>;
    fn get_user(&self, id: &str) -> Result<User, UserError>;
    fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;
    /// Removes the user together with their bookmarks and click logs.
    fn delete_user(&mut self, id: &str) -> Result<(), UserError>;
}

pub struct UserManager<'a> {
    conn: &'a Connection,
}

impl<'a> UserManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl<'a> UserManagerTrait for UserManager<'a> {
    fn create_user(&mut self, username: &str) -> Result<User, UserError> {
        if self.find_by_username(username)?.is_some() {
            return Err(UserError::DuplicateUsername(username.to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: Self::now(),
        };
        self.conn
            .execute(
                "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
                params![user.id, user.username, user.created_at],
            )
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;
        Ok(user)
    }

    fn get_user(&self, id: &str) -> Result<User, UserError> {
        self.conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1",
                params![id],
                Self::row_to_user,
            )
            .optional()
            .map_err(|e| UserError::DatabaseError(e.to_string()))?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        self.conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
                Self::row_to_user,
            )
            .optional()
            .map_err(|e| UserError::DatabaseError(e.to_string()))
    }

    fn delete_user(&mut self, id: &str) -> Result<(), UserError> {
        self.conn
            .execute(
                "DELETE FROM click_logs WHERE user_id = ?1 \
                 OR bookmark_id IN (SELECT id FROM bookmarks WHERE user_id = ?1)",
                params![id],
            )
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;
        self.conn
            .execute(
                "DELETE FROM bookmark_tags WHERE bookmark_id IN (SELECT id FROM bookmarks WHERE user_id = ?1)",
                params![id],
            )
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;
        self.conn
            .execute("DELETE FROM bookmarks WHERE user_id = ?1", params![id])
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;
        if affected == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
