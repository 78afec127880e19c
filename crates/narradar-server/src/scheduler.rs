//! Background job scheduler.
//!
//! Registers the recurring analysis job at server startup. The job shares
//! the run gate with the HTTP trigger, so a scheduled tick that lands while
//! a manual run is active is skipped, never queued.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::{run_analysis, AppState};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    state: AppState,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            run_scheduled_analysis(&state).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn run_scheduled_analysis(state: &AppState) {
    let Some(_guard) = state.store.try_begin_analysis() else {
        tracing::warn!("scheduler: analysis already in progress; skipping this tick");
        return;
    };

    tracing::info!("scheduler: starting analysis run");
    match run_analysis(state).await {
        Ok(metadata) => tracing::info!(
            signals = metadata.signal_count,
            narratives = metadata.narrative_count,
            ideas = metadata.idea_count,
            duration_ms = metadata.duration_ms,
            "scheduler: analysis run complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: analysis run failed"),
    }
}
