//! Job lifecycle orchestration.
//!
//! The orchestrator owns every job for the duration of its run: it is the
//! only writer of the job's status and listings while the job is `Running`.
//! `start` registers the execution handle and applies the Pending→Running
//! transition before spawning, so concurrent callers observe either the
//! occupied handle or the already-running status — never a second
//! execution. The spawned task reports its outcome through the store and
//! removes its handle on every exit path.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use leadscout_core::{Job, JobTransition, NewJob, ReportArtifacts};
use leadscout_pipeline::SelectionCriteria;
use leadscout_store::{Store, StoreError};

use crate::error::{ExecutionError, OrchestratorError};
use crate::export::{ReportExporter, ReportMeta};
use crate::extract::Extractor;
use crate::registry::ExecutionRegistry;

#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<dyn Store>,
    extractor: Arc<dyn Extractor>,
    exporter: Arc<dyn ReportExporter>,
    registry: Arc<ExecutionRegistry>,
}

/// How one execution ended, before the terminal transition is written.
enum RunOutcome {
    Completed {
        total_found: u64,
        total_matching: u64,
        reports: ReportArtifacts,
    },
    /// A cancellation was observed at a stage boundary. The Cancelled status
    /// was already written by `cancel`; the task just stops.
    CancelledEarly,
}

impl JobOrchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn Extractor>,
        exporter: Arc<dyn ReportExporter>,
    ) -> Self {
        Self {
            store,
            extractor,
            exporter,
            registry: Arc::new(ExecutionRegistry::new()),
        }
    }

    /// The live-execution registry, for stats and the maintenance sweep.
    #[must_use]
    pub fn registry(&self) -> &ExecutionRegistry {
        &self.registry
    }

    /// Validates and persists a new job in `Pending`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] for malformed requests; no
    /// job is created in that case.
    pub async fn create(&self, new_job: NewJob) -> Result<Job, OrchestratorError> {
        new_job.validate()?;
        let job = self.store.create_job(new_job).await?;
        tracing::info!(job_id = %job.id, name = %job.name, "job created");
        Ok(job)
    }

    /// Starts a pending job's execution in the background.
    ///
    /// Returns as soon as the job has moved to `Running`; the caller never
    /// blocks on extraction or export.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::AlreadyRunning`] when an execution handle
    ///   already exists for the job.
    /// - [`OrchestratorError::Store`] wrapping `InvalidTransition` when the
    ///   persisted status is not `Pending`, or `NotFound` for unknown ids.
    pub async fn start(&self, job_id: Uuid) -> Result<Job, OrchestratorError> {
        let Some(cancel) = self.registry.try_register(job_id) else {
            return Err(OrchestratorError::AlreadyRunning);
        };

        // Move to Running before spawning, so a racing second caller sees
        // the new status even if this task has not been scheduled yet.
        let job = match self
            .store
            .apply_transition(job_id, JobTransition::Start { at: Utc::now() })
            .await
        {
            Ok(job) => job,
            Err(e) => {
                self.registry.remove(job_id);
                return Err(e.into());
            }
        };

        tracing::info!(job_id = %job_id, locations = job.locations.len(), "job started");

        let orchestrator = self.clone();
        let spawned = job.clone();
        tokio::spawn(async move { orchestrator.execute(spawned, cancel).await });

        Ok(job)
    }

    /// Cancels a pending or running job.
    ///
    /// Cancellation is cooperative: a running execution is signalled through
    /// its token and stops at its next stage boundary; an in-flight
    /// extractor call is never interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] wrapping `InvalidTransition`
    /// when the job is already terminal, or `NotFound` for unknown ids.
    pub async fn cancel(&self, job_id: Uuid) -> Result<Job, OrchestratorError> {
        let job = self
            .store
            .apply_transition(job_id, JobTransition::Cancel { at: Utc::now() })
            .await?;

        if self.registry.cancel(job_id) {
            tracing::info!(job_id = %job_id, "cancellation signalled to running execution");
        } else {
            tracing::info!(job_id = %job_id, "pending job cancelled");
        }

        Ok(job)
    }

    /// The spawned per-job task: runs the pipeline, records the outcome,
    /// and always releases the execution handle.
    async fn execute(&self, job: Job, cancel: CancellationToken) {
        let job_id = job.id;

        match self.run(&job, &cancel).await {
            Ok(RunOutcome::Completed {
                total_found,
                total_matching,
                reports,
            }) => {
                let transition = JobTransition::Complete {
                    at: Utc::now(),
                    total_found,
                    total_matching,
                    reports,
                };
                match self.store.apply_transition(job_id, transition).await {
                    Ok(_) => {
                        tracing::info!(job_id = %job_id, total_found, total_matching, "job completed");
                    }
                    // A cancel can land between the last boundary check and
                    // this write; the terminal status wins.
                    Err(StoreError::InvalidTransition(e)) => {
                        tracing::warn!(job_id = %job_id, error = %e, "completion superseded by terminal status");
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job_id, error = %e, "failed to record completion");
                    }
                }
            }
            Ok(RunOutcome::CancelledEarly) => {
                tracing::info!(job_id = %job_id, "execution stopped after cancellation");
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "job execution failed");
                self.discard_listings(job_id).await;
                let transition = JobTransition::Fail {
                    at: Utc::now(),
                    error: e.to_string(),
                };
                match self.store.apply_transition(job_id, transition).await {
                    Ok(_) => {}
                    Err(StoreError::InvalidTransition(te)) => {
                        tracing::warn!(job_id = %job_id, error = %te, "failure superseded by terminal status");
                    }
                    Err(store_err) => {
                        tracing::error!(job_id = %job_id, error = %store_err, "failed to record job failure");
                    }
                }
            }
        }

        self.registry.remove(job_id);
    }

    /// A failed run leaves no listings behind; partial progress is not a
    /// guarantee this service makes.
    async fn discard_listings(&self, job_id: Uuid) {
        match self.store.delete_listings(job_id).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(job_id = %job_id, discarded = n, "discarded listings from failed run"),
            Err(e) => tracing::warn!(job_id = %job_id, error = %e, "failed to discard listings"),
        }
    }

    /// The execution body. Cancellation is polled between locations and
    /// between pipeline stages only.
    async fn run(
        &self,
        job: &Job,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ExecutionError> {
        let mut raw = Vec::new();
        for location in &job.locations {
            if cancel.is_cancelled() {
                return Ok(RunOutcome::CancelledEarly);
            }
            let batch = self
                .extractor
                .scrape(location, &job.business_type)
                .await
                .map_err(|source| ExecutionError::Extract {
                    location: location.clone(),
                    source,
                })?;
            tracing::info!(job_id = %job.id, location = %location, count = batch.len(), "location extracted");
            raw.extend(batch);
        }

        if cancel.is_cancelled() {
            return Ok(RunOutcome::CancelledEarly);
        }
        let scored = leadscout_pipeline::process(raw);
        let total_found = scored.len() as u64;

        if cancel.is_cancelled() {
            return Ok(RunOutcome::CancelledEarly);
        }
        self.store.insert_listings(job.id, scored.clone()).await?;

        let selected = leadscout_pipeline::select(
            scored,
            &SelectionCriteria {
                max_reviews: job.max_reviews,
                min_quality_score: job.min_quality_score,
            },
        );
        let total_matching = selected.len() as u64;

        if cancel.is_cancelled() {
            return Ok(RunOutcome::CancelledEarly);
        }
        let meta = ReportMeta {
            job_id: job.id,
            job_name: job.name.clone(),
            generated_at: Utc::now(),
            locations: job.locations.clone(),
        };
        let reports = self.exporter.export(&selected, &meta).await?;

        Ok(RunOutcome::Completed {
            total_found,
            total_matching,
            reports,
        })
    }
}
