//! In-process registry of live job executions.
//!
//! The registry is the single source of truth for "is this job currently
//! executing". It is never persisted: entries exist only between a
//! successful `start` and the end of the spawned task, and the
//! check-and-register step is one critical section so two concurrent
//! `start` calls can never both observe an empty slot.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    handles: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl ExecutionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically registers an execution handle for the job.
    ///
    /// Returns the job's cancellation token, or `None` when a handle already
    /// exists (the job is executing).
    pub fn try_register(&self, job_id: Uuid) -> Option<CancellationToken> {
        let mut handles = self.handles.lock().expect("registry lock poisoned");
        if handles.contains_key(&job_id) {
            return None;
        }
        let token = CancellationToken::new();
        handles.insert(job_id, token.clone());
        Some(token)
    }

    /// Removes a job's handle. Idempotent.
    pub fn remove(&self, job_id: Uuid) {
        self.handles
            .lock()
            .expect("registry lock poisoned")
            .remove(&job_id);
    }

    /// Signals cancellation to a live execution and drops its handle.
    ///
    /// The running task keeps its own token clone, so it still observes the
    /// signal at its next stage boundary. Returns whether a handle existed.
    pub fn cancel(&self, job_id: Uuid) -> bool {
        let token = self
            .handles
            .lock()
            .expect("registry lock poisoned")
            .remove(&job_id);
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_running(&self, job_id: Uuid) -> bool {
        self.handles
            .lock()
            .expect("registry lock poisoned")
            .contains_key(&job_id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.handles.lock().expect("registry lock poisoned").len()
    }

    /// Ids of every currently-registered execution.
    #[must_use]
    pub fn active_ids(&self) -> Vec<Uuid> {
        self.handles
            .lock()
            .expect("registry lock poisoned")
            .keys()
            .copied()
            .collect()
    }
}
