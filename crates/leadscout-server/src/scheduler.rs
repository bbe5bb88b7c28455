//! Background maintenance scheduler.
//!
//! Registers a recurring sweep that looks for jobs whose persisted status is
//! `Running` but which have no live execution handle. Those jobs lost their
//! task (process restart, aborted runtime) and would otherwise stay
//! `Running` forever; the sweep fails them so their terminal state is
//! visible to callers.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use leadscout_core::{JobStatus, JobTransition};
use leadscout_engine::JobOrchestrator;
use leadscout_store::{JobFilter, Store, StoreError};

/// Builds and starts the background maintenance scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the sweep cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    store: Arc<dyn Store>,
    orchestrator: JobOrchestrator,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let store = Arc::clone(&store);
        let orchestrator = orchestrator.clone();

        Box::pin(async move {
            run_stale_job_sweep(&store, &orchestrator).await;
        })
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Fails every `Running` job that has no live execution handle.
async fn run_stale_job_sweep(store: &Arc<dyn Store>, orchestrator: &JobOrchestrator) {
    let running = match store
        .list_jobs(&JobFilter {
            status: Some(JobStatus::Running),
            page: 1,
            per_page: 200,
        })
        .await
    {
        Ok(page) => page.items,
        Err(e) => {
            tracing::error!(error = %e, "sweep: failed to list running jobs");
            return;
        }
    };

    for job in running {
        if orchestrator.registry().is_running(job.id) {
            continue;
        }

        let transition = JobTransition::Fail {
            at: Utc::now(),
            error: "execution lost; no live task found for running job".to_string(),
        };
        match store.apply_transition(job.id, transition).await {
            Ok(_) => {
                tracing::warn!(job_id = %job.id, "sweep: stale running job marked failed");
            }
            // The job reached a terminal state between the listing and this
            // write; nothing to repair.
            Err(StoreError::InvalidTransition(_)) => {}
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "sweep: failed to mark stale job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use leadscout_core::{NewJob, RawListing};
    use leadscout_engine::{ExtractError, Extractor, FileExporter, ReportExporter};
    use leadscout_store::MemoryStore;

    use super::*;

    struct NullExtractor;

    #[async_trait]
    impl Extractor for NullExtractor {
        async fn scrape(
            &self,
            _location: &str,
            _business_type: &str,
        ) -> Result<Vec<RawListing>, ExtractError> {
            Ok(Vec::new())
        }
    }

    fn harness() -> (Arc<MemoryStore>, JobOrchestrator) {
        let store = Arc::new(MemoryStore::new());
        let exporter = Arc::new(FileExporter::new(
            std::env::temp_dir().join(format!("leadscout-sweep-{}", uuid::Uuid::new_v4())),
        ));
        let orchestrator = JobOrchestrator::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::new(NullExtractor),
            exporter as Arc<dyn ReportExporter>,
        );
        (store, orchestrator)
    }

    fn new_job(name: &str) -> NewJob {
        NewJob {
            name: name.to_string(),
            locations: vec!["Kuna, Idaho".to_string()],
            ..NewJob::default()
        }
    }

    #[tokio::test]
    async fn sweep_fails_running_jobs_without_a_handle() {
        let (store, orchestrator) = harness();
        let job = store.create_job(new_job("orphaned")).await.unwrap();
        // Simulate a run whose task died: status Running, no registry entry.
        store
            .apply_transition(job.id, JobTransition::Start { at: Utc::now() })
            .await
            .unwrap();

        let store_dyn: Arc<dyn Store> = Arc::clone(&store) as Arc<dyn Store>;
        run_stale_job_sweep(&store_dyn, &orchestrator).await;

        let swept = store.get_job(job.id).await.unwrap();
        assert_eq!(swept.status, JobStatus::Failed);
        assert!(swept.error_message.unwrap().contains("execution lost"));
    }

    #[tokio::test]
    async fn sweep_leaves_live_executions_alone() {
        let (store, orchestrator) = harness();
        let job = store.create_job(new_job("live")).await.unwrap();
        store
            .apply_transition(job.id, JobTransition::Start { at: Utc::now() })
            .await
            .unwrap();
        orchestrator
            .registry()
            .try_register(job.id)
            .expect("register handle");

        let store_dyn: Arc<dyn Store> = Arc::clone(&store) as Arc<dyn Store>;
        run_stale_job_sweep(&store_dyn, &orchestrator).await;

        let job = store.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running, "live job untouched");
    }

    #[tokio::test]
    async fn sweep_ignores_terminal_jobs() {
        let (store, orchestrator) = harness();
        let job = store.create_job(new_job("cancelled")).await.unwrap();
        store
            .apply_transition(job.id, JobTransition::Cancel { at: Utc::now() })
            .await
            .unwrap();

        let store_dyn: Arc<dyn Store> = Arc::clone(&store) as Arc<dyn Store>;
        run_stale_job_sweep(&store_dyn, &orchestrator).await;

        let job = store.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
    }
}
