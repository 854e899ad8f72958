//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring retention prune.

use std::sync::Arc;

use chrono::Utc;
use promodb_ranking::PruneThrottle;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::prune::run_prune;

/// Every 15 minutes, on the quarter hour.
const PRUNE_SCHEDULE: &str = "0 */15 * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    throttle: Arc<PruneThrottle>,
    retention_days: u32,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if retention_days > 0 {
        register_prune_job(&scheduler, pool, throttle, retention_days).await?;
    } else {
        tracing::info!("scheduler: event retention disabled; prune job not registered");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the retention prune. The job shares the process throttle with
/// the events endpoint, so the hourly limit holds across both callers.
async fn register_prune_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    throttle: Arc<PruneThrottle>,
    retention_days: u32,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(PRUNE_SCHEDULE, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let throttle = Arc::clone(&throttle);

        Box::pin(async move {
            match run_prune(&pool, &throttle, retention_days, Utc::now()).await {
                Some(removed) => {
                    tracing::info!(removed, "scheduler: retention prune complete");
                }
                None => tracing::debug!("scheduler: retention prune skipped"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
