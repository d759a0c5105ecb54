//! Background availability-check scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring availability sweep when a cron schedule is configured.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use stockwatch_core::RunOutcome;
use stockwatch_engine::Engine;

/// Builds and starts the background job scheduler.
///
/// Returns `None` when scheduled checks are disabled
/// (`STOCKWATCH_CHECK_SCHEDULE=off`). Otherwise returns the running
/// [`JobScheduler`] handle, which must be kept alive for the lifetime of
/// the process; dropping it shuts down the recurring job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    engine: Arc<Engine>,
    config: Arc<stockwatch_core::AppConfig>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(schedule) = config.check_schedule.as_deref() else {
        tracing::info!("no check schedule configured; runs happen on demand only");
        return Ok(None);
    };

    let scheduler = JobScheduler::new().await?;
    register_check_job(&scheduler, pool, engine, schedule).await?;
    scheduler.start().await?;

    tracing::info!(schedule, "scheduler: recurring availability checks registered");
    Ok(Some(scheduler))
}

/// Register the recurring availability sweep on the configured cron
/// expression.
async fn register_check_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    engine: Arc<Engine>,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let engine = Arc::clone(&engine);

        Box::pin(async move {
            tracing::info!("scheduler: starting availability run");
            run_scheduled_check(&pool, &engine).await;
            tracing::info!("scheduler: availability run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one scheduled sweep, recorded as a `check_runs` row.
async fn run_scheduled_check(pool: &PgPool, engine: &Engine) {
    let run = match stockwatch_db::create_check_run(pool, "schedule").await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to record check run");
            return;
        }
    };

    if let Err(e) = stockwatch_db::start_check_run(pool, run.id).await {
        tracing::error!(error = %e, "scheduler: failed to mark check run running");
        return;
    }

    let catalog = stockwatch_db::PgCatalog::new(pool.clone());
    let outcome = engine.run(&catalog).await;

    record_outcome(pool, run.id, &outcome).await;
}

/// Persist the final run status and log the result.
async fn record_outcome(pool: &PgPool, run_id: i64, outcome: &RunOutcome) {
    let result = match &outcome.catalog_error {
        Some(reason) => stockwatch_db::fail_check_run(pool, run_id, reason).await,
        None => {
            let total_tracked = i32::try_from(outcome.summary.total_tracked).unwrap_or(i32::MAX);
            let total_found = i32::try_from(outcome.summary.total_found).unwrap_or(i32::MAX);
            stockwatch_db::complete_check_run(pool, run_id, total_tracked, total_found).await
        }
    };

    match result {
        Ok(()) => {
            tracing::info!(summary = %outcome.summary, "scheduler: check run recorded");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to record check run result");
        }
    }
}
