mod jobs;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use leadscout_engine::{JobOrchestrator, OrchestratorError};
use leadscout_store::{Store, StoreError};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub orchestrator: JobOrchestrator,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_per_page(per_page: Option<u32>) -> u32 {
    per_page.unwrap_or(50).clamp(1, 200)
}

pub(super) fn normalize_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    match error {
        StoreError::NotFound => ApiError::new(request_id, "not_found", "job not found"),
        StoreError::InvalidTransition(e) => ApiError::new(request_id, "conflict", e.to_string()),
        StoreError::Backend(_) => {
            tracing::error!(error = %error, "store operation failed");
            ApiError::new(request_id, "internal_error", "storage failure")
        }
    }
}

pub(super) fn map_orchestrator_error(request_id: String, error: &OrchestratorError) -> ApiError {
    match error {
        OrchestratorError::AlreadyRunning => {
            ApiError::new(request_id, "conflict", "job is already running")
        }
        OrchestratorError::Validation(e) => {
            ApiError::new(request_id, "validation_error", e.to_string())
        }
        OrchestratorError::Store(e) => map_store_error(request_id, e),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/api/v1/jobs/{id}", get(jobs::get_job))
        .route("/api/v1/jobs/{id}/start", post(jobs::start_job))
        .route("/api/v1/jobs/{id}/cancel", post(jobs::cancel_job))
        .route("/api/v1/jobs/{id}/listings", get(jobs::list_job_listings))
        .route(
            "/api/v1/jobs/{id}/reports/{kind}",
            get(jobs::download_report),
        )
        .route("/api/v1/stats", get(jobs::get_stats))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    store: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        store: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;

    use leadscout_core::RawListing;
    use leadscout_engine::{Extractor, ExtractError, FileExporter};
    use leadscout_store::MemoryStore;

    use super::*;

    /// Extractor stub with canned listings per location.
    struct StubExtractor {
        by_location: HashMap<String, Vec<RawListing>>,
    }

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn scrape(
            &self,
            location: &str,
            _business_type: &str,
        ) -> Result<Vec<RawListing>, ExtractError> {
            Ok(self.by_location.get(location).cloned().unwrap_or_default())
        }
    }

    fn raw(name: &str, phone: &str, reviews: &str) -> RawListing {
        RawListing {
            name: name.to_string(),
            phone: phone.to_string(),
            review_count: reviews.to_string(),
            location: "Kuna, Idaho".to_string(),
            ..RawListing::default()
        }
    }

    fn temp_reports_dir() -> PathBuf {
        std::env::temp_dir().join(format!("leadscout-api-{}", Uuid::new_v4()))
    }

    fn test_app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let extractor = Arc::new(StubExtractor {
            by_location: HashMap::from([(
                "Kuna, Idaho".to_string(),
                vec![
                    raw("Acme Heating", "208-555-1234", "2"),
                    raw("Summit Air", "208-555-9999", "0"),
                    raw("No Phone Co", "", "1"),
                ],
            )]),
        });
        let exporter = Arc::new(FileExporter::new(temp_reports_dir()));
        let orchestrator = JobOrchestrator::new(
            Arc::clone(&store) as Arc<dyn Store>,
            extractor,
            exporter,
        );
        let state = AppState {
            store: Arc::clone(&store) as Arc<dyn Store>,
            orchestrator,
        };
        let auth = AuthState::from_env(true).expect("auth");
        (build_app(state, auth), store)
    }

    async fn request_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    async fn create_test_job(app: &Router) -> Uuid {
        let (status, body) = request_json(
            app,
            "POST",
            "/api/v1/jobs",
            Some(serde_json::json!({
                "name": "Kuna sweep",
                "locations": ["Kuna, Idaho"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("job id in response")
    }

    async fn wait_for_api_status(app: &Router, id: Uuid, wanted: &str) -> serde_json::Value {
        for _ in 0..400 {
            let (status, body) =
                request_json(app, "GET", &format!("/api/v1/jobs/{id}"), None).await;
            assert_eq!(status, StatusCode::OK);
            if body["data"]["status"].as_str() == Some(wanted) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for job status {wanted}");
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _) = test_app();
        let (status, body) = request_json(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"].as_str(), Some("ok"));
        assert!(body["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn create_job_validates_request() {
        let (app, _) = test_app();
        let (status, body) = request_json(
            &app,
            "POST",
            "/api/v1/jobs",
            Some(serde_json::json!({"name": "no locations", "locations": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("validation_error"));
    }

    #[tokio::test]
    async fn create_job_returns_pending_job_with_defaults() {
        let (app, _) = test_app();
        let (status, body) = request_json(
            &app,
            "POST",
            "/api/v1/jobs",
            Some(serde_json::json!({
                "name": "Kuna sweep",
                "locations": ["Kuna, Idaho"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"].as_str(), Some("pending"));
        assert_eq!(body["data"]["business_type"].as_str(), Some("HVAC"));
        assert_eq!(body["data"]["max_reviews"].as_u64(), Some(20));
    }

    #[tokio::test]
    async fn get_unknown_job_returns_404() {
        let (app, _) = test_app();
        let (status, body) = request_json(
            &app,
            "GET",
            &format!("/api/v1/jobs/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"].as_str(), Some("not_found"));
    }

    #[tokio::test]
    async fn start_runs_job_to_completion_with_listings_and_reports() {
        let (app, _store) = test_app();
        let id = create_test_job(&app).await;

        let (status, body) =
            request_json(&app, "POST", &format!("/api/v1/jobs/{id}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"].as_str(), Some("running"));

        let done = wait_for_api_status(&app, id, "completed").await;
        assert_eq!(done["data"]["total_found"].as_u64(), Some(3));
        assert_eq!(done["data"]["total_matching"].as_u64(), Some(2));

        // Listings endpoint pages the persisted records by priority.
        let (status, body) = request_json(
            &app,
            "GET",
            &format!("/api/v1/jobs/{id}/listings?per_page=10"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pagination"]["total"].as_u64(), Some(3));
        assert_eq!(
            body["data"]["listings"][0]["name"].as_str(),
            Some("Summit Air"),
            "lowest priority score listed first"
        );

        // Review-count filter.
        let (_, filtered) = request_json(
            &app,
            "GET",
            &format!("/api/v1/jobs/{id}/listings?max_reviews=0"),
            None,
        )
        .await;
        assert_eq!(filtered["data"]["pagination"]["total"].as_u64(), Some(1));

        // The CSV artifact downloads with attachment headers.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/jobs/{id}/reports/csv"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/csv")
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .expect("content disposition");
        assert!(disposition.starts_with("attachment"));
        let csv = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let csv = String::from_utf8(csv.to_vec()).expect("utf8");
        assert!(csv.starts_with("name,location,phone"));
        assert!(csv.contains("Acme Heating"));
    }

    #[tokio::test]
    async fn start_twice_returns_conflict_on_second_call() {
        let (app, _) = test_app();
        let id = create_test_job(&app).await;

        let (first, _) =
            request_json(&app, "POST", &format!("/api/v1/jobs/{id}/start"), None).await;
        assert_eq!(first, StatusCode::OK);

        let (second, body) =
            request_json(&app, "POST", &format!("/api/v1/jobs/{id}/start"), None).await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"].as_str(), Some("conflict"));
    }

    #[tokio::test]
    async fn report_download_before_completion_is_conflict() {
        let (app, _) = test_app();
        let id = create_test_job(&app).await;
        let (status, body) = request_json(
            &app,
            "GET",
            &format!("/api/v1/jobs/{id}/reports/json"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"].as_str(), Some("conflict"));
    }

    #[tokio::test]
    async fn report_download_rejects_unknown_kind() {
        let (app, _) = test_app();
        let id = create_test_job(&app).await;
        let (status, body) = request_json(
            &app,
            "GET",
            &format!("/api/v1/jobs/{id}/reports/xlsx"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("bad_request"));
    }

    #[tokio::test]
    async fn cancel_pending_job_then_cancel_again_conflicts() {
        let (app, _) = test_app();
        let id = create_test_job(&app).await;

        let (status, body) =
            request_json(&app, "POST", &format!("/api/v1/jobs/{id}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"].as_str(), Some("cancelled"));

        let (status, _) =
            request_json(&app, "POST", &format!("/api/v1/jobs/{id}/cancel"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn list_jobs_filters_by_status_and_paginates() {
        let (app, _) = test_app();
        let first = create_test_job(&app).await;
        let _second = create_test_job(&app).await;
        request_json(&app, "POST", &format!("/api/v1/jobs/{first}/cancel"), None).await;

        let (status, body) = request_json(&app, "GET", "/api/v1/jobs?per_page=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["jobs"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["data"]["pagination"]["total"].as_u64(), Some(2));
        assert_eq!(body["data"]["pagination"]["pages"].as_u64(), Some(2));

        let (status, body) =
            request_json(&app, "GET", "/api/v1/jobs?status=cancelled", None).await;
        assert_eq!(status, StatusCode::OK);
        let jobs = body["data"]["jobs"].as_array().expect("jobs array");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["id"].as_str(), Some(first.to_string().as_str()));
    }

    #[tokio::test]
    async fn list_jobs_rejects_invalid_status_filter() {
        let (app, _) = test_app();
        let (status, body) = request_json(&app, "GET", "/api/v1/jobs?status=paused", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("bad_request"));
    }

    #[tokio::test]
    async fn stats_reports_counts_and_recent_jobs() {
        let (app, _) = test_app();
        let id = create_test_job(&app).await;
        request_json(&app, "POST", &format!("/api/v1/jobs/{id}/start"), None).await;
        wait_for_api_status(&app, id, "completed").await;

        let (status, body) = request_json(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_jobs"].as_u64(), Some(1));
        assert_eq!(body["data"]["completed_jobs"].as_u64(), Some(1));
        assert_eq!(body["data"]["total_listings"].as_u64(), Some(3));
        assert_eq!(body["data"]["active_executions"].as_u64(), Some(0));
        assert_eq!(body["data"]["recent_jobs"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn listings_for_unknown_job_is_404() {
        let (app, _) = test_app();
        let (status, _) = request_json(
            &app,
            "GET",
            &format!("/api/v1/jobs/{}/listings", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_routes_require_bearer_token_when_enabled() {
        let store = Arc::new(MemoryStore::new());
        let extractor = Arc::new(StubExtractor {
            by_location: HashMap::new(),
        });
        let exporter = Arc::new(FileExporter::new(temp_reports_dir()));
        let orchestrator = JobOrchestrator::new(
            Arc::clone(&store) as Arc<dyn Store>,
            extractor,
            exporter,
        );
        let state = AppState {
            store: store as Arc<dyn Store>,
            orchestrator,
        };
        let auth = AuthState::from_raw("secret-token", true).expect("auth");
        let app = build_app(state, auth);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/jobs")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/jobs")
                    .header(header::AUTHORIZATION, "Bearer secret-token")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        // Health stays public.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
