//! In-memory reference implementation of [`Store`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use leadscout_core::{Job, JobStatus, JobTransition, NewJob, ScoredListing};

use crate::{JobFilter, ListingFilter, ListingRow, Page, Store, StoreError};

/// `RwLock`-guarded maps behind the [`Store`] contract.
///
/// All mutation happens under the write half of one lock, so readers always
/// observe the latest fully-applied transition and never a torn update.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    /// Insertion order, newest last; listings iterate it in reverse.
    job_order: Vec<Uuid>,
    listings: HashMap<Uuid, Vec<ListingRow>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let items = items
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();
    Page {
        items,
        page,
        per_page,
        total,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StoreError> {
        let job = new_job.into_job(Uuid::new_v4(), Utc::now());
        let mut inner = self.inner.write().await;
        inner.job_order.push(job.id);
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Job, StoreError> {
        let inner = self.inner.read().await;
        inner.jobs.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Page<Job>, StoreError> {
        let inner = self.inner.read().await;
        let matching: Vec<Job> = inner
            .job_order
            .iter()
            .rev()
            .filter_map(|id| inner.jobs.get(id))
            .filter(|job| filter.status.is_none_or(|s| job.status == s))
            .cloned()
            .collect();
        Ok(paginate(matching, filter.page, filter.per_page))
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        transition: JobTransition,
    ) -> Result<Job, StoreError> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&id).ok_or(StoreError::NotFound)?;
        job.apply(transition)?;
        Ok(job.clone())
    }

    async fn insert_listings(
        &self,
        job_id: Uuid,
        listings: Vec<ScoredListing>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.jobs.contains_key(&job_id) {
            return Err(StoreError::NotFound);
        }
        let rows = inner.listings.entry(job_id).or_default();
        let count = listings.len() as u64;
        rows.extend(listings.into_iter().map(|scored| ListingRow {
            id: Uuid::new_v4(),
            job_id,
            scored,
        }));
        Ok(count)
    }

    async fn delete_listings(&self, job_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .listings
            .remove(&job_id)
            .map_or(0, |rows| rows.len() as u64);
        Ok(removed)
    }

    async fn list_listings(
        &self,
        job_id: Uuid,
        filter: &ListingFilter,
    ) -> Result<Page<ListingRow>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.jobs.contains_key(&job_id) {
            return Err(StoreError::NotFound);
        }

        let location_needle = filter
            .location_contains
            .as_ref()
            .map(|s| s.to_lowercase());

        let mut matching: Vec<ListingRow> = inner
            .listings
            .get(&job_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|row| {
                location_needle.as_ref().is_none_or(|needle| {
                    row.scored.listing.location.to_lowercase().contains(needle)
                })
            })
            .filter(|row| {
                filter
                    .max_reviews
                    .is_none_or(|max| row.scored.listing.review_count <= max)
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| a.scored.priority_score.cmp(&b.scored.priority_score));

        Ok(paginate(matching, filter.page, filter.per_page))
    }

    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, u64)>, StoreError> {
        let inner = self.inner.read().await;
        let mut counts: Vec<(JobStatus, u64)> = [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ]
        .into_iter()
        .map(|status| (status, 0))
        .collect();

        for job in inner.jobs.values() {
            if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == job.status) {
                entry.1 += 1;
            }
        }
        Ok(counts)
    }

    async fn count_listings(&self) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.listings.values().map(|rows| rows.len() as u64).sum())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
