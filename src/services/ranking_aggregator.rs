//! Popularity metrics over the live bookmark and click tables.
//!
//! Every metric only covers public URLs, those bookmarked by at least
//! [`PUBLIC_OWNER_THRESHOLD`] distinct users. Lists are ordered by value
//! descending, then URL ascending.

use chrono::{DateTime, Months, Utc};
use rusqlite::{params, Connection};

use crate::services::score_combiner;
use crate::types::errors::RankingError;
use crate::types::ranking::{RankingItem, RankingMetric, PUBLIC_OWNER_THRESHOLD};

/// Start of the trailing one-month window ending at `now` (UNIX seconds).
pub fn one_month_before(now: i64) -> i64 {
    DateTime::<Utc>::from_timestamp(now, 0)
        .and_then(|t| t.checked_sub_months(Months::new(1)))
        .map(|t| t.timestamp())
        .unwrap_or(now - 30 * 24 * 60 * 60)
}

pub struct RankingAggregator<'a> {
    conn: &'a Connection,
}

impl<'a> RankingAggregator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn sql_limit(limit: Option<usize>) -> i64 {
        limit.map_or(-1, |n| n as i64)
    }

    fn query_items(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<RankingItem>, RankingError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map(params, |row| Ok(RankingItem::new(row.get::<_, String>(0)?, row.get(1)?)))
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| RankingError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    /// Distinct owners per public URL.
    pub fn unique_user_counts(&self, limit: Option<usize>) -> Result<Vec<RankingItem>, RankingError> {
        self.query_items(
            "SELECT url, COUNT(DISTINCT user_id) AS value FROM bookmarks \
             GROUP BY url HAVING COUNT(DISTINCT user_id) >= ?1 \
             ORDER BY value DESC, url ASC LIMIT ?2",
            &[&PUBLIC_OWNER_THRESHOLD, &Self::sql_limit(limit)],
        )
    }

    /// Sum of the click counters of every bookmark sharing a public URL.
    pub fn total_click_counts(&self, limit: Option<usize>) -> Result<Vec<RankingItem>, RankingError> {
        self.query_items(
            "SELECT url, SUM(total_click_count) AS value FROM bookmarks \
             GROUP BY url HAVING COUNT(DISTINCT user_id) >= ?1 \
             ORDER BY value DESC, url ASC LIMIT ?2",
            &[&PUBLIC_OWNER_THRESHOLD, &Self::sql_limit(limit)],
        )
    }

    /// Click events at or after `since`. Public URLs without recent clicks report 0.
    pub fn recent_click_counts(&self, since: i64, limit: Option<usize>) -> Result<Vec<RankingItem>, RankingError> {
        self.query_items(
            "SELECT b.url, COUNT(c.id) AS value FROM bookmarks b \
             LEFT JOIN click_logs c ON c.bookmark_id = b.id AND c.clicked_at >= ?1 \
             GROUP BY b.url HAVING COUNT(DISTINCT b.user_id) >= ?2 \
             ORDER BY value DESC, b.url ASC LIMIT ?3",
            &[&since, &PUBLIC_OWNER_THRESHOLD, &Self::sql_limit(limit)],
        )
    }

    /// Weighted combination of the three other metrics, each taken unlimited.
    pub fn overall_scores(&self, since: i64, limit: Option<usize>) -> Result<Vec<RankingItem>, RankingError> {
        let unique = self.unique_user_counts(None)?;
        let total = self.total_click_counts(None)?;
        let recent = self.recent_click_counts(since, None)?;

        let mut combined = score_combiner::combine(&unique, &total, &recent);
        if let Some(n) = limit {
            combined.truncate(n);
        }
        Ok(combined)
    }

    /// Dispatches to the list computing `metric`.
    pub fn compute(&self, metric: RankingMetric, since: i64, limit: Option<usize>) -> Result<Vec<RankingItem>, RankingError> {
        match metric {
            RankingMetric::OverallScore => self.overall_scores(since, limit),
            RankingMetric::UniqueUserCount => self.unique_user_counts(limit),
            RankingMetric::TotalClickCount => self.total_click_counts(limit),
            RankingMetric::RecentClickCount => self.recent_click_counts(since, limit),
        }
    }

    pub fn is_public(&self, url: &str) -> Result<bool, RankingError> {
        let owners: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(DISTINCT user_id) FROM bookmarks WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        Ok(owners >= PUBLIC_OWNER_THRESHOLD)
    }

    /// Public URLs starting with `prefix` (literal, case-sensitive), shortest first.
    pub fn public_urls_with_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>, RankingError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT url FROM bookmarks WHERE substr(url, 1, length(?1)) = ?1 \
                 GROUP BY url HAVING COUNT(DISTINCT user_id) >= ?2 \
                 ORDER BY length(url) ASC, url ASC LIMIT ?3",
            )
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map(params![prefix, PUBLIC_OWNER_THRESHOLD, limit as i64], |row| row.get::<_, String>(0))
            .map_err(|e| RankingError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| RankingError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }
}
