//! Storage contract for jobs and their scored listings.
//!
//! The [`Store`] trait is the boundary to whatever persistence backend a
//! deployment uses; the service only ever talks through it. Job status
//! changes go through [`Store::apply_transition`], which must be atomic with
//! respect to concurrent callers and must enforce the core transition table,
//! so an illegal update can never be written no matter which backend sits
//! behind the trait. [`MemoryStore`] is the in-process reference
//! implementation used in the default wiring and throughout the tests.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use leadscout_core::{
    Job, JobStatus, JobTransition, NewJob, ScoredListing, TransitionError,
};

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// One page of results plus enough context to render pagination links.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// Number of pages at the current page size (at least 1).
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            return 1;
        }
        let per_page = u64::from(self.per_page.max(1));
        u32::try_from(self.total.div_ceil(per_page)).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Filters for the paginated job listing.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
    pub per_page: u32,
}

/// Filters for a job's scored-listing page.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Case-insensitive substring match on the listing location.
    pub location_contains: Option<String>,
    pub max_reviews: Option<u32>,
    pub page: u32,
    pub per_page: u32,
}

/// A persisted scored listing with its storage identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    pub id: Uuid,
    pub job_id: Uuid,
    #[serde(flatten)]
    pub scored: ScoredListing,
}

/// CRUD contract for jobs and scored listings.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persists a new job in `Pending`, assigning id and creation time.
    ///
    /// The request is assumed validated; see [`NewJob::validate`].
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StoreError>;

    /// Fetches one job.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids.
    async fn get_job(&self, id: Uuid) -> Result<Job, StoreError>;

    /// Lists jobs newest-first with optional status filtering.
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Page<Job>, StoreError>;

    /// Applies a lifecycle transition atomically and returns the updated job.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidTransition`] when the persisted status does not
    /// admit the transition (nothing is written in that case), or
    /// [`StoreError::NotFound`] for unknown ids.
    async fn apply_transition(
        &self,
        id: Uuid,
        transition: JobTransition,
    ) -> Result<Job, StoreError>;

    /// Persists a batch of scored listings against a job.
    ///
    /// Returns the number of rows written.
    async fn insert_listings(
        &self,
        job_id: Uuid,
        listings: Vec<ScoredListing>,
    ) -> Result<u64, StoreError>;

    /// Deletes every listing persisted against a job.
    ///
    /// Used to discard the output of a failed run. Returns the number of
    /// rows removed; an unknown job id removes nothing and is not an error.
    async fn delete_listings(&self, job_id: Uuid) -> Result<u64, StoreError>;

    /// Pages through a job's listings, ordered by ascending priority score.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the job itself is unknown.
    async fn list_listings(
        &self,
        job_id: Uuid,
        filter: &ListingFilter,
    ) -> Result<Page<ListingRow>, StoreError>;

    /// Job counts grouped by status, for the stats surface.
    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, u64)>, StoreError>;

    /// Total scored listings across all jobs.
    async fn count_listings(&self) -> Result<u64, StoreError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
