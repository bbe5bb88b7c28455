use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use leadscout_core::{ArtifactKind, Job, JobStatus, NewJob, ReportArtifacts};
use leadscout_store::{JobFilter, ListingFilter, ListingRow, Page};

use crate::middleware::RequestId;

use super::{
    map_orchestrator_error, map_store_error, normalize_page, normalize_per_page, ApiError,
    ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct JobItem {
    pub id: Uuid,
    pub name: String,
    pub locations: Vec<String>,
    pub business_type: String,
    pub max_reviews: u32,
    pub min_quality_score: f64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_found: u64,
    pub total_matching: u64,
    pub error_message: Option<String>,
    pub reports: Option<ReportArtifacts>,
}

impl From<Job> for JobItem {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            name: job.name,
            locations: job.locations,
            business_type: job.business_type,
            max_reviews: job.max_reviews,
            min_quality_score: job.min_quality_score,
            status: job.status,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            total_found: job.total_found,
            total_matching: job.total_matching,
            error_message: job.error_message,
            reports: job.reports,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    fn from_page<T>(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            pages: page.total_pages(),
            has_next: page.has_next(),
            has_prev: page.has_prev(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct JobsData {
    pub jobs: Vec<JobItem>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub(super) struct ListingsData {
    pub listings: Vec<ListingRow>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub(super) struct StatsData {
    pub total_jobs: u64,
    pub pending_jobs: u64,
    pub running_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    pub cancelled_jobs: u64,
    pub total_listings: u64,
    pub active_executions: u64,
    pub recent_jobs: Vec<JobItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListJobsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListingsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub location: Option<String>,
    pub max_reviews: Option<u32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn create_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(new_job): Json<NewJob>,
) -> Result<(StatusCode, Json<ApiResponse<JobItem>>), ApiError> {
    let job = state
        .orchestrator
        .create(new_job)
        .await
        .map_err(|e| map_orchestrator_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: JobItem::from(job),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<ApiResponse<JobsData>>, ApiError> {
    let status = match &query.status {
        Some(raw) => Some(raw.parse::<JobStatus>().map_err(|_| {
            ApiError::new(req_id.0.clone(), "bad_request", "invalid status filter")
        })?),
        None => None,
    };

    let filter = JobFilter {
        status,
        page: normalize_page(query.page),
        per_page: normalize_per_page(query.per_page),
    };
    let page = state
        .store
        .list_jobs(&filter)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let pagination = PaginationMeta::from_page(&page);
    Ok(Json(ApiResponse {
        data: JobsData {
            jobs: page.items.into_iter().map(JobItem::from).collect(),
            pagination,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobItem>>, ApiError> {
    let job = state
        .store
        .get_job(id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: JobItem::from(job),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn start_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobItem>>, ApiError> {
    let job = state
        .orchestrator
        .start(id)
        .await
        .map_err(|e| map_orchestrator_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: JobItem::from(job),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn cancel_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobItem>>, ApiError> {
    let job = state
        .orchestrator
        .cancel(id)
        .await
        .map_err(|e| map_orchestrator_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: JobItem::from(job),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_job_listings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<ApiResponse<ListingsData>>, ApiError> {
    let filter = ListingFilter {
        location_contains: query.location,
        max_reviews: query.max_reviews,
        page: normalize_page(query.page),
        per_page: normalize_per_page(query.per_page),
    };
    let page = state
        .store
        .list_listings(id, &filter)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let pagination = PaginationMeta::from_page(&page);
    Ok(Json(ApiResponse {
        data: ListingsData {
            listings: page.items,
            pagination,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn download_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<axum::response::Response, ApiError> {
    let kind: ArtifactKind = kind.parse().map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            "invalid report kind; use report, csv, or json",
        )
    })?;

    let job = state
        .store
        .get_job(id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    if job.status != JobStatus::Completed {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            format!("job has not completed; current status: {}", job.status),
        ));
    }

    let Some(reports) = &job.reports else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            "report artifacts not available",
        ));
    };
    let artifact = reports.get(kind);

    let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
        tracing::warn!(job_id = %id, path = %artifact.path.display(), error = %e, "report file unreadable");
        ApiError::new(req_id.0.clone(), "not_found", "report file not found")
    })?;

    let (content_type, suffix) = match kind {
        ArtifactKind::Report => ("text/plain; charset=utf-8", "report.txt"),
        ArtifactKind::Csv => ("text/csv", "data.csv"),
        ArtifactKind::Json => ("application/json", "data.json"),
    };
    let filename = format!("{}_{suffix}", safe_filename(&job.name));

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StatsData>>, ApiError> {
    let counts = state
        .store
        .count_jobs_by_status()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    let count_of = |status: JobStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    };

    let total_listings = state
        .store
        .count_listings()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let recent = state
        .store
        .list_jobs(&JobFilter {
            status: None,
            page: 1,
            per_page: 5,
        })
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let data = StatsData {
        total_jobs: counts.iter().map(|(_, n)| n).sum(),
        pending_jobs: count_of(JobStatus::Pending),
        running_jobs: count_of(JobStatus::Running),
        completed_jobs: count_of(JobStatus::Completed),
        failed_jobs: count_of(JobStatus::Failed),
        cancelled_jobs: count_of(JobStatus::Cancelled),
        total_listings,
        active_executions: state.orchestrator.registry().active_count() as u64,
        recent_jobs: recent.items.into_iter().map(JobItem::from).collect(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Keeps download filenames header-safe: alphanumerics pass, everything
/// else becomes an underscore.
fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
