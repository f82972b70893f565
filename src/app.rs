//! App Core for linkshelf.
//!
//! Central struct wiring the database, storage backend, page fetcher, the
//! bookmark service and the rebuild job, and managing the daemon lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::JobScheduler;

use crate::database::{Database, SharedDatabase};
use crate::services::bookmark_service::BookmarkService;
use crate::services::cache_rebuild::CacheRebuildJob;
use crate::services::favicon_pipeline::FaviconPipelineConfig;
use crate::services::page_fetcher::{HttpPageFetcher, PageFetcher};
use crate::services::scheduler;
use crate::storage::{self, ObjectStorage};
use crate::types::settings::AppSettings;

/// Central application struct holding all shared components.
///
/// Managers borrow a connection, so they are created on demand from
/// `db.lock().connection()` rather than stored here.
pub struct App {
    pub settings: AppSettings,
    pub db: SharedDatabase,
    pub storage: Arc<dyn ObjectStorage>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub bookmarks: Arc<BookmarkService>,
    pub rebuild: Arc<CacheRebuildJob>,
}

impl App {
    /// Opens the database and builds every component from `settings`.
    pub async fn new(settings: AppSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let db = SharedDatabase::new(Database::open(&settings.database_path)?);
        let storage = storage::from_settings(&settings.storage).await?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(
            &settings.favicon.user_agent,
            settings.favicon.max_body_bytes,
        )?);
        Ok(Self::from_parts(settings, db, storage, fetcher))
    }

    /// Builds the app around already constructed infrastructure.
    pub fn from_parts(
        settings: AppSettings,
        db: SharedDatabase,
        storage: Arc<dyn ObjectStorage>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let bookmarks = Arc::new(BookmarkService::new(
            db.clone(),
            storage.clone(),
            fetcher.clone(),
            FaviconPipelineConfig::from(&settings.favicon),
            Duration::from_secs(settings.ranking.title_timeout_secs),
        ));
        let rebuild = Arc::new(CacheRebuildJob::new(
            db.clone(),
            storage.clone(),
            fetcher.clone(),
            &settings.ranking,
        ));

        Self {
            settings,
            db,
            storage,
            fetcher,
            bookmarks,
            rebuild,
        }
    }

    /// Startup sequence: optional background rebuild, then the cron jobs.
    pub async fn startup(&self) -> Result<JobScheduler, Box<dyn std::error::Error>> {
        if self.settings.ranking.rebuild_on_startup {
            scheduler::spawn_startup_rebuild(self.rebuild.clone());
        }
        let jobs = scheduler::start_scheduler(
            self.bookmarks.clone(),
            self.rebuild.clone(),
            &self.settings.ranking,
        )
        .await?;
        Ok(jobs)
    }

    /// Shutdown sequence: stop the scheduler.
    pub async fn shutdown(&self, mut jobs: JobScheduler) {
        if let Err(e) = jobs.shutdown().await {
            tracing::warn!("Scheduler shutdown failed: {}", e);
        }
        tracing::info!("linkshelf stopped");
    }
}
