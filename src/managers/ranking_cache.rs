//! Ranking Cache Store for linkshelf.
//!
//! One row per public URL. Each rebuild pass writes only its own metric
//! column, so rows accumulate all four metrics over one rebuild cycle.

use rusqlite::{params, Connection, OptionalExtension};

use crate::types::errors::RankingError;
use crate::types::ranking::{RankingCacheEntry, RankingItem, RankingMetric};

/// Trait defining ranking cache operations.
pub trait RankingCacheStoreTrait {
    /// Deletes every cache row. Returns the number removed.
    fn clear(&mut self) -> Result<usize, RankingError>;
    /// Inserts the URL with itself as placeholder title, or sets only `metric` on the existing row.
    fn upsert_metric(&mut self, url: &str, metric: RankingMetric, value: i64, now: i64) -> Result<(), RankingError>;
    /// All rows ordered by URL.
    fn list_all(&self) -> Result<Vec<RankingCacheEntry>, RankingError>;
    fn find_by_url(&self, url: &str) -> Result<Option<RankingCacheEntry>, RankingError>;
    fn set_enrichment(&mut self, url: &str, title: &str, favicon_path: Option<&str>) -> Result<(), RankingError>;
    /// Rows whose `metric` is set, highest first, ties by URL.
    fn top_by(&self, metric: RankingMetric, offset: i64, limit: i64) -> Result<Vec<RankingItem>, RankingError>;
    /// A random row among those carrying an overall score.
    fn random_entry(&self) -> Result<Option<RankingCacheEntry>, RankingError>;
    fn count(&self) -> Result<i64, RankingError>;
}

pub struct RankingCacheStore<'a> {
    conn: &'a Connection,
}

const ENTRY_COLUMNS: &str = "url, title, favicon_path, unique_user_count, total_click_count, \
                             recent_click_count, overall_score, last_updated";

impl<'a> RankingCacheStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<RankingCacheEntry> {
        Ok(RankingCacheEntry {
            url: row.get(0)?,
            title: row.get(1)?,
            favicon_path: row.get(2)?,
            unique_user_count: row.get(3)?,
            total_click_count: row.get(4)?,
            recent_click_count: row.get(5)?,
            overall_score: row.get(6)?,
            last_updated: row.get(7)?,
        })
    }
}

impl<'a> RankingCacheStoreTrait for RankingCacheStore<'a> {
    fn clear(&mut self) -> Result<usize, RankingError> {
        self.conn
            .execute("DELETE FROM ranking_cache", [])
            .map_err(|e| RankingError::DatabaseError(e.to_string()))
    }

    fn upsert_metric(
        &mut self,
        url: &str,
        metric: RankingMetric,
        value: i64,
        now: i64,
    ) -> Result<(), RankingError> {
        // The column name comes from a closed enum, never from input.
        let column = metric.column();
        let sql = format!(
            "INSERT INTO ranking_cache (url, title, {col}, last_updated) VALUES (?1, ?1, ?2, ?3) \
             ON CONFLICT(url) DO UPDATE SET {col} = excluded.{col}, last_updated = excluded.last_updated",
            col = column
        );
        self.conn
            .execute(&sql, params![url, value, now])
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<RankingCacheEntry>, RankingError> {
        let sql = format!("SELECT {} FROM ranking_cache ORDER BY url", ENTRY_COLUMNS);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_entry)
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| RankingError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    fn find_by_url(&self, url: &str) -> Result<Option<RankingCacheEntry>, RankingError> {
        let sql = format!("SELECT {} FROM ranking_cache WHERE url = ?1", ENTRY_COLUMNS);
        self.conn
            .query_row(&sql, params![url], Self::row_to_entry)
            .optional()
            .map_err(|e| RankingError::DatabaseError(e.to_string()))
    }

    fn set_enrichment(
        &mut self,
        url: &str,
        title: &str,
        favicon_path: Option<&str>,
    ) -> Result<(), RankingError> {
        self.conn
            .execute(
                "UPDATE ranking_cache SET title = ?1, favicon_path = ?2 WHERE url = ?3",
                params![title, favicon_path, url],
            )
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn top_by(
        &self,
        metric: RankingMetric,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<RankingItem>, RankingError> {
        let sql = format!(
            "SELECT {cols} FROM ranking_cache WHERE {col} IS NOT NULL \
             ORDER BY {col} DESC, url ASC LIMIT ?1 OFFSET ?2",
            cols = ENTRY_COLUMNS,
            col = metric.column()
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit, offset.max(0)], Self::row_to_entry)
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let entry = row.map_err(|e| RankingError::DatabaseError(e.to_string()))?;
            results.push(entry.to_item(metric));
        }
        Ok(results)
    }

    fn random_entry(&self) -> Result<Option<RankingCacheEntry>, RankingError> {
        let sql = format!(
            "SELECT {} FROM ranking_cache WHERE overall_score IS NOT NULL ORDER BY RANDOM() LIMIT 1",
            ENTRY_COLUMNS
        );
        self.conn
            .query_row(&sql, [], Self::row_to_entry)
            .optional()
            .map_err(|e| RankingError::DatabaseError(e.to_string()))
    }

    fn count(&self) -> Result<i64, RankingError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM ranking_cache", [], |row| row.get(0))
            .map_err(|e| RankingError::DatabaseError(e.to_string()))
    }
}
