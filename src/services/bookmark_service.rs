//! Async façade over the bookmark, click and ranking managers.
//!
//! Owns the shared database, the object storage backend and the page
//! fetcher. Database locks are taken in short scoped blocks and never held
//! across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use ring::digest;

use crate::database::SharedDatabase;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::click_manager::{ClickManager, ClickManagerTrait};
use crate::managers::ranking_cache::{RankingCacheStore, RankingCacheStoreTrait};
use crate::services::favicon_pipeline::{FaviconPipeline, FaviconPipelineConfig};
use crate::services::page_fetcher::{fetch_page_title, PageFetcher};
use crate::services::ranking_aggregator::one_month_before;
use crate::services::suggestion_engine::SuggestionEngine;
use crate::services::url_normalizer::{is_valid_url, normalize_url};
use crate::storage::ObjectStorage;
use crate::types::bookmark::{parse_tags, Bookmark, BookmarkQuery, NewBookmark};
use crate::types::click::ClickOutcome;
use crate::types::errors::{BookmarkError, ClickError, RankingError, StorageError};
use crate::types::ranking::{RankingCacheEntry, RankingItem, RankingMetric};

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Storage name of a user's favicon for `url`: `{user_id}/{sha256(url)}.png`.
pub fn favicon_file_name(user_id: &str, url: &str) -> String {
    let hash = digest::digest(&digest::SHA256, url.as_bytes());
    format!("{}/{}.png", user_id, hex_encode(hash.as_ref()))
}

pub struct BookmarkService {
    db: SharedDatabase,
    storage: Arc<dyn ObjectStorage>,
    fetcher: Arc<dyn PageFetcher>,
    favicons: FaviconPipeline,
    title_timeout: Duration,
}

impl BookmarkService {
    pub fn new(
        db: SharedDatabase,
        storage: Arc<dyn ObjectStorage>,
        fetcher: Arc<dyn PageFetcher>,
        favicon_config: FaviconPipelineConfig,
        title_timeout: Duration,
    ) -> Self {
        let favicons = FaviconPipeline::new(fetcher.clone(), favicon_config);
        Self {
            db,
            storage,
            fetcher,
            favicons,
            title_timeout,
        }
    }

    /// Validates, normalizes and stores a new bookmark.
    ///
    /// An empty title is replaced by the live page title, or the URL when the
    /// page cannot be fetched. The favicon is acquired before the insert.
    pub async fn add_bookmark(
        &self,
        user_id: &str,
        url: &str,
        title: &str,
        tags_input: &str,
    ) -> Result<Bookmark, BookmarkError> {
        let raw = url.trim();
        if !is_valid_url(raw) {
            return Err(BookmarkError::InvalidUrl(raw.to_string()));
        }
        let normalized = normalize_url(raw);

        let exists = {
            let db = self.db.lock();
            BookmarkManager::new(db.connection()).is_bookmarked_by_user(user_id, &normalized)?
        };
        if exists {
            return Err(BookmarkError::DuplicateUrl(normalized));
        }

        let title = match title.trim() {
            "" => fetch_page_title(self.fetcher.as_ref(), &normalized, self.title_timeout)
                .await
                .unwrap_or_else(|| normalized.clone()),
            given => given.to_string(),
        };
        let favicon_path = self.store_favicon(user_id, &normalized).await;

        let new = NewBookmark {
            user_id: user_id.to_string(),
            url: normalized,
            title,
            favicon_path: favicon_path.clone(),
            tags: parse_tags(tags_input),
        };
        let inserted = {
            let db = self.db.lock();
            BookmarkManager::new(db.connection()).add_bookmark(&new)
        };

        match inserted {
            Ok(bookmark) => {
                tracing::info!(user_id, url = %bookmark.url, "bookmark added");
                Ok(bookmark)
            }
            Err(e) => {
                if let Some(path) = favicon_path {
                    self.delete_stored(&path).await;
                }
                Err(e)
            }
        }
    }

    /// Replaces title and tags. `url` must normalize to the stored URL; an
    /// empty `url` or `title` keeps the stored value.
    pub async fn update_bookmark(
        &self,
        id: &str,
        user_id: &str,
        url: &str,
        title: &str,
        tags_input: &str,
    ) -> Result<Bookmark, BookmarkError> {
        let existing = {
            let db = self.db.lock();
            BookmarkManager::new(db.connection()).get_bookmark(id, user_id)?
        };

        let requested = url.trim();
        if !requested.is_empty() && normalize_url(requested) != existing.url {
            return Err(BookmarkError::UrlChangeRejected(requested.to_string()));
        }

        let title = match title.trim() {
            "" => existing.title.clone(),
            given => given.to_string(),
        };
        let tags = parse_tags(tags_input);

        let mut updated = {
            let db = self.db.lock();
            let mut bookmarks = BookmarkManager::new(db.connection());
            let updated = bookmarks.update_bookmark(id, user_id, &title, &tags)?;
            bookmarks.delete_orphan_tags()?;
            updated
        };

        if updated.favicon_path.is_none() {
            if let Some(path) = self.store_favicon(user_id, &updated.url).await {
                let db = self.db.lock();
                BookmarkManager::new(db.connection()).set_favicon_path(id, Some(&path))?;
                updated.favicon_path = Some(path);
            }
        }
        Ok(updated)
    }

    /// Deletes the bookmark, its click logs, orphaned tags and its stored favicon.
    pub async fn delete_bookmark(&self, id: &str, user_id: &str) -> Result<(), BookmarkError> {
        let removed = {
            let db = self.db.lock();
            let mut bookmarks = BookmarkManager::new(db.connection());
            let removed = bookmarks.remove_bookmark(id, user_id)?;
            bookmarks.delete_orphan_tags()?;
            removed
        };
        if let Some(path) = removed.favicon_path {
            self.delete_stored(&path).await;
        }
        tracing::info!(user_id, url = %removed.url, "bookmark deleted");
        Ok(())
    }

    /// Deletes every listed bookmark the user owns. Returns how many were removed.
    pub async fn delete_bookmarks(&self, ids: &[String], user_id: &str) -> Result<usize, BookmarkError> {
        let mut deleted = 0;
        for id in ids {
            match self.delete_bookmark(id, user_id).await {
                Ok(()) => deleted += 1,
                Err(BookmarkError::NotFound(_)) => {
                    tracing::debug!(id = %id, user_id, "bulk delete skipped unknown bookmark");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(deleted)
    }

    pub fn toggle_favorite(&self, id: &str, user_id: &str) -> Result<bool, BookmarkError> {
        let db = self.db.lock();
        BookmarkManager::new(db.connection()).toggle_favorite(id, user_id)
    }

    pub fn find_bookmarks(&self, user_id: &str, query: &BookmarkQuery) -> Result<(Vec<Bookmark>, i64), BookmarkError> {
        let db = self.db.lock();
        BookmarkManager::new(db.connection()).find_bookmarks(user_id, query)
    }

    pub fn list_tags(&self, user_id: &str) -> Result<Vec<String>, BookmarkError> {
        let db = self.db.lock();
        BookmarkManager::new(db.connection()).list_tags(user_id)
    }

    pub fn is_bookmarked_by_user(&self, user_id: &str, url: &str) -> Result<bool, BookmarkError> {
        let db = self.db.lock();
        BookmarkManager::new(db.connection()).is_bookmarked_by_user(user_id, &normalize_url(url.trim()))
    }

    pub fn record_click(&self, bookmark_id: &str, user_id: &str) -> Result<ClickOutcome, ClickError> {
        let db = self.db.lock();
        ClickManager::new(db.connection()).record_click(bookmark_id, user_id)
    }

    /// Deletes click logs older than one month.
    pub fn cleanup_old_click_logs(&self) -> Result<usize, ClickError> {
        let now = chrono::Utc::now().timestamp();
        let cutoff = one_month_before(now);
        let removed = {
            let db = self.db.lock();
            ClickManager::new(db.connection()).cleanup_before(cutoff)?
        };
        tracing::info!(removed, cutoff, "old click logs removed");
        Ok(removed)
    }

    /// One page of the cached ranking for `metric`. When `user_id` is given,
    /// items that user has bookmarked are flagged.
    pub fn ranking(
        &self,
        user_id: Option<&str>,
        metric: RankingMetric,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<RankingItem>, RankingError> {
        let db = self.db.lock();
        let mut items = RankingCacheStore::new(db.connection()).top_by(metric, offset, limit)?;
        if let Some(user_id) = user_id {
            let bookmarks = BookmarkManager::new(db.connection());
            for item in &mut items {
                item.bookmarked_by_current_user = bookmarks
                    .is_bookmarked_by_user(user_id, &item.url)
                    .map_err(|e| RankingError::DatabaseError(e.to_string()))?;
            }
        }
        Ok(items)
    }

    pub fn random_public_bookmark(&self) -> Result<Option<RankingCacheEntry>, RankingError> {
        let db = self.db.lock();
        RankingCacheStore::new(db.connection()).random_entry()
    }

    pub fn public_bookmark_by_url(&self, url: &str) -> Result<Option<RankingCacheEntry>, RankingError> {
        let db = self.db.lock();
        RankingCacheStore::new(db.connection()).find_by_url(&normalize_url(url.trim()))
    }

    pub fn similar_urls(&self, input: &str) -> Result<Vec<String>, RankingError> {
        let db = self.db.lock();
        SuggestionEngine::new(db.connection()).suggest(input)
    }

    /// Live page title, for form prefill.
    pub async fn fetch_title(&self, url: &str) -> Option<String> {
        fetch_page_title(self.fetcher.as_ref(), url.trim(), self.title_timeout).await
    }

    pub async fn favicon_url(&self, path: &str) -> Result<String, StorageError> {
        self.storage.url_for(path).await
    }

    async fn store_favicon(&self, user_id: &str, url: &str) -> Option<String> {
        let bytes = self.favicons.acquire(url).await?;
        match self.storage.save(&bytes, &favicon_file_name(user_id, url)).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(user_id, url, error = %e, "failed to store favicon");
                None
            }
        }
    }

    async fn delete_stored(&self, path: &str) {
        if let Err(e) = self.storage.delete(path).await {
            tracing::warn!(path, error = %e, "failed to delete stored favicon");
        }
    }
}
