use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum number of distinct owners for a URL to count as public.
pub const PUBLIC_OWNER_THRESHOLD: i64 = 2;

/// Weights of the overall score terms.
pub const UNIQUE_USER_WEIGHT: i64 = 2;
pub const TOTAL_CLICK_WEIGHT: i64 = 1;
pub const RECENT_CLICK_WEIGHT: i64 = 3;

/// The four ranking metrics kept per cached URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    OverallScore,
    UniqueUserCount,
    TotalClickCount,
    RecentClickCount,
}

impl RankingMetric {
    /// Order in which the rebuild job computes and upserts the metrics.
    pub const REBUILD_ORDER: [RankingMetric; 4] = [
        RankingMetric::OverallScore,
        RankingMetric::UniqueUserCount,
        RankingMetric::TotalClickCount,
        RankingMetric::RecentClickCount,
    ];

    /// Name of the `ranking_cache` column holding this metric.
    pub fn column(&self) -> &'static str {
        match self {
            RankingMetric::OverallScore => "overall_score",
            RankingMetric::UniqueUserCount => "unique_user_count",
            RankingMetric::TotalClickCount => "total_click_count",
            RankingMetric::RecentClickCount => "recent_click_count",
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Transient carrier moving one metric value between pipeline stages and to
/// the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingItem {
    pub url: String,
    pub title: String,
    pub favicon_path: Option<String>,
    pub value: i64,
    pub bookmarked_by_current_user: bool,
}

impl RankingItem {
    pub fn new(url: impl Into<String>, value: i64) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url,
            favicon_path: None,
            value,
            bookmarked_by_current_user: false,
        }
    }
}

/// One row of the materialized ranking cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingCacheEntry {
    pub url: String,
    pub title: String,
    pub favicon_path: Option<String>,
    pub unique_user_count: Option<i64>,
    pub total_click_count: Option<i64>,
    pub recent_click_count: Option<i64>,
    pub overall_score: Option<i64>,
    pub last_updated: i64,
}

impl RankingCacheEntry {
    pub fn metric(&self, metric: RankingMetric) -> Option<i64> {
        match metric {
            RankingMetric::OverallScore => self.overall_score,
            RankingMetric::UniqueUserCount => self.unique_user_count,
            RankingMetric::TotalClickCount => self.total_click_count,
            RankingMetric::RecentClickCount => self.recent_click_count,
        }
    }

    pub fn to_item(&self, metric: RankingMetric) -> RankingItem {
        RankingItem {
            url: self.url.clone(),
            title: self.title.clone(),
            favicon_path: self.favicon_path.clone(),
            value: self.metric(metric).unwrap_or(0),
            bookmarked_by_current_user: false,
        }
    }
}

/// Summary of one cache rebuild run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildReport {
    /// Rows upserted per metric pass, in rebuild order.
    pub rows_per_metric: Vec<(RankingMetric, usize)>,
    pub rows_enriched: usize,
    pub favicons_copied: usize,
    pub elapsed: Duration,
}
