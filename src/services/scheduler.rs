//! Scheduled background jobs.
//!
//! Two cron jobs run outside any request: click-log retention and the
//! ranking cache rebuild. A startup rebuild can be spawned separately with
//! [`spawn_startup_rebuild`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::services::bookmark_service::BookmarkService;
use crate::services::cache_rebuild::CacheRebuildJob;
use crate::types::settings::RankingSettings;

/// Registers and starts the retention and rebuild jobs.
pub async fn start_scheduler(
    service: Arc<BookmarkService>,
    rebuild: Arc<CacheRebuildJob>,
    settings: &RankingSettings,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let cleanup_service = service.clone();
    let cleanup_job = Job::new_async(settings.cleanup_cron.as_str(), move |_uuid, _lock| {
        let service = cleanup_service.clone();
        Box::pin(async move {
            if let Err(e) = service.cleanup_old_click_logs() {
                tracing::error!("Click log cleanup failed: {}", e);
            }
        })
    })?;
    scheduler.add(cleanup_job).await?;

    let rebuild_job_handle = rebuild.clone();
    let rebuild_job = Job::new_async(settings.rebuild_cron.as_str(), move |_uuid, _lock| {
        let rebuild = rebuild_job_handle.clone();
        Box::pin(async move {
            if let Err(e) = rebuild.run().await {
                tracing::error!("Scheduled ranking cache rebuild failed: {}", e);
            }
        })
    })?;
    scheduler.add(rebuild_job).await?;

    scheduler.start().await?;

    tracing::info!(
        cleanup = %settings.cleanup_cron,
        rebuild = %settings.rebuild_cron,
        "scheduled tasks started"
    );
    Ok(scheduler)
}

/// Runs one rebuild in the background, logging its outcome.
pub fn spawn_startup_rebuild(rebuild: Arc<CacheRebuildJob>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match rebuild.run().await {
            Ok(report) => tracing::info!(
                rows_enriched = report.rows_enriched,
                "startup ranking cache rebuild complete"
            ),
            Err(e) => tracing::error!("Startup ranking cache rebuild failed: {}", e),
        }
    })
}
