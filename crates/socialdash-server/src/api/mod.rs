mod dashboard;
mod export;
mod page;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use socialdash_analytics::{run_dashboard, AnalyticsError, DashboardContext, DashboardOutcome, Upload};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

/// Multipart field carrying the CSV upload.
const UPLOAD_FIELD: &str = "file";

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
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_analytics_error(request_id: String, error: &AnalyticsError) -> ApiError {
    if error.is_input_error() {
        tracing::warn!(error = %error, "rejected upload");
        return ApiError::new(request_id, "validation_error", error.to_string());
    }
    if let AnalyticsError::InvalidClusterLabel { .. } = error {
        return ApiError::new(request_id, "bad_request", error.to_string());
    }
    tracing::error!(error = %error, "dashboard pipeline failed");
    ApiError::new(request_id, "internal_error", "dashboard pipeline failed")
}

/// Read the `file` field of a multipart body. A missing field, or an empty
/// one without a file name (an unfilled form input), means no upload.
pub(super) async fn read_upload(
    request_id: &str,
    mut multipart: Multipart,
) -> Result<Option<Upload>, ApiError> {
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        let code = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            "payload_too_large"
        } else {
            "validation_error"
        };
        ApiError::new(request_id, code, format!("invalid multipart body: {e}"))
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() && file_name.is_none() {
            return Ok(None);
        }
        return Ok(Some(Upload::new(file_name, bytes.to_vec())));
    }
    Ok(None)
}

/// Run the synchronous pipeline on the blocking pool.
pub(super) async fn run_pipeline(
    request_id: &str,
    ctx: DashboardContext,
) -> Result<DashboardOutcome, ApiError> {
    tokio::task::spawn_blocking(move || run_dashboard(&ctx))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "dashboard task failed");
            ApiError::new(request_id, "internal_error", "dashboard task failed")
        })?
        .map_err(|e| map_analytics_error(request_id.to_string(), &e))
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
        .expose_headers([header::CONTENT_DISPOSITION])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/api/v1/dashboard", post(dashboard::build_dashboard))
        .route("/api/v1/export", post(export::export_csv))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(auth: AuthState, rate_limit: RateLimitState, max_upload_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/", get(page::index))
        .route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
