//! Ranking cache rebuild.
//!
//! A run deletes the cache and the ranking favicon namespace, recomputes the
//! four top-N metric lists in [`RankingMetric::REBUILD_ORDER`], fills the
//! metrics a row missed from the unlimited lists and then enriches every row
//! with a display title and a favicon copy. The delete and the
//! repopulation are separate steps, so readers can observe an empty or partial
//! cache while a run is in progress or after it failed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::database::SharedDatabase;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::ranking_cache::{RankingCacheStore, RankingCacheStoreTrait};
use crate::services::page_fetcher::PageFetcher;
use crate::services::ranking_aggregator::{one_month_before, RankingAggregator};
use crate::services::title_resolver::resolve_title;
use crate::storage::{ranking_copy_path, ObjectStorage, RANKING_NAMESPACE};
use crate::types::errors::RankingError;
use crate::types::ranking::{RankingMetric, RebuildReport};
use crate::types::settings::RankingSettings;

pub struct CacheRebuildJob {
    db: SharedDatabase,
    storage: Arc<dyn ObjectStorage>,
    fetcher: Arc<dyn PageFetcher>,
    top_n: usize,
    title_timeout: Duration,
}

impl CacheRebuildJob {
    pub fn new(
        db: SharedDatabase,
        storage: Arc<dyn ObjectStorage>,
        fetcher: Arc<dyn PageFetcher>,
        settings: &RankingSettings,
    ) -> Self {
        Self {
            db,
            storage,
            fetcher,
            top_n: settings.top_n,
            title_timeout: Duration::from_secs(settings.title_timeout_secs),
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    pub async fn run(&self) -> Result<RebuildReport, RankingError> {
        self.run_at(Self::now()).await
    }

    /// Rebuilds the cache as of `now` (UNIX seconds).
    pub async fn run_at(&self, now: i64) -> Result<RebuildReport, RankingError> {
        let started = Instant::now();
        tracing::info!(top_n = self.top_n, "ranking cache rebuild started");

        let cleared = {
            let db = self.db.lock();
            RankingCacheStore::new(db.connection()).clear()?
        };
        tracing::debug!(rows = cleared, "ranking cache cleared");

        self.storage.clear_namespace(RANKING_NAMESPACE).await?;

        let rows_per_metric = self.populate_metrics(now)?;
        let (rows_enriched, favicons_copied) = self.enrich().await?;

        let report = RebuildReport {
            rows_per_metric,
            rows_enriched,
            favicons_copied,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            rows_enriched = report.rows_enriched,
            favicons_copied = report.favicons_copied,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "ranking cache rebuild finished"
        );
        Ok(report)
    }

    fn populate_metrics(&self, now: i64) -> Result<Vec<(RankingMetric, usize)>, RankingError> {
        let since = one_month_before(now);
        let db = self.db.lock();
        let aggregator = RankingAggregator::new(db.connection());
        let mut cache = RankingCacheStore::new(db.connection());

        let mut rows_per_metric = Vec::with_capacity(RankingMetric::REBUILD_ORDER.len());
        for metric in RankingMetric::REBUILD_ORDER {
            let items = aggregator.compute(metric, since, Some(self.top_n))?;
            for item in &items {
                cache.upsert_metric(&item.url, metric, item.value, now)?;
            }
            tracing::debug!(%metric, rows = items.len(), "metric pass stored");
            rows_per_metric.push((metric, items.len()));
        }

        let filled = Self::backfill(&aggregator, &mut cache, since, now)?;
        tracing::debug!(cells = filled, "missing metrics backfilled");
        Ok(rows_per_metric)
    }

    /// Sets every NULL metric of a cached row from the unlimited list, so each
    /// row satisfies `overall = 2*unique + total + 3*recent`. The row set stays
    /// the union of the top-N passes. Returns the number of cells written.
    fn backfill(
        aggregator: &RankingAggregator<'_>,
        cache: &mut RankingCacheStore<'_>,
        since: i64,
        now: i64,
    ) -> Result<usize, RankingError> {
        let entries = cache.list_all()?;
        let mut filled = 0;
        for metric in RankingMetric::REBUILD_ORDER {
            let missing: Vec<&str> = entries
                .iter()
                .filter(|e| e.metric(metric).is_none())
                .map(|e| e.url.as_str())
                .collect();
            if missing.is_empty() {
                continue;
            }

            let values: HashMap<String, i64> = aggregator
                .compute(metric, since, None)?
                .into_iter()
                .map(|item| (item.url, item.value))
                .collect();
            for url in missing {
                let value = values.get(url).copied().unwrap_or(0);
                cache.upsert_metric(url, metric, value, now)?;
                filled += 1;
            }
        }
        Ok(filled)
    }

    /// Fills title and favicon of every cached row. Returns (rows enriched, favicons copied).
    async fn enrich(&self) -> Result<(usize, usize), RankingError> {
        let entries = {
            let db = self.db.lock();
            RankingCacheStore::new(db.connection()).list_all()?
        };

        let mut enriched = 0;
        let mut copied = 0;
        for entry in entries {
            let sources = {
                let db = self.db.lock();
                let bookmarks = BookmarkManager::new(db.connection());
                bookmarks
                    .titles_for_url(&entry.url)
                    .and_then(|titles| Ok((titles, bookmarks.favicon_paths_for_url(&entry.url)?)))
            };
            let (titles, favicon_paths) = match sources {
                Ok(sources) => sources,
                Err(e) => {
                    tracing::warn!(url = %entry.url, error = %e, "skipping enrichment of ranked URL");
                    continue;
                }
            };

            let title = resolve_title(self.fetcher.as_ref(), &entry.url, &titles, self.title_timeout).await;
            let favicon = match favicon_paths.first() {
                Some(src) => self.copy_favicon(&entry.url, src).await,
                None => None,
            };
            if favicon.is_some() {
                copied += 1;
            }

            let stored = {
                let db = self.db.lock();
                RankingCacheStore::new(db.connection()).set_enrichment(&entry.url, &title, favicon.as_deref())
            };
            match stored {
                Ok(()) => enriched += 1,
                Err(e) => tracing::warn!(url = %entry.url, error = %e, "failed to store enrichment"),
            }
        }
        Ok((enriched, copied))
    }

    async fn copy_favicon(&self, url: &str, src: &str) -> Option<String> {
        match self.storage.copy(src, &ranking_copy_path(src)).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(url, src, error = %e, "favicon copy into ranking namespace failed");
                None
            }
        }
    }
}
