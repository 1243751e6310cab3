use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use tower::ServiceExt;

use super::*;

const SAMPLE: &str = include_str!("../../../socialdash-analytics/tests/fixtures/posts.csv");
const BOUNDARY: &str = "socialdash-test-boundary";

fn app_with(auth: AuthState, rate_limit: RateLimitState, max_upload_bytes: usize) -> Router {
    build_app(auth, rate_limit, max_upload_bytes)
}

fn app() -> Router {
    app_with(
        AuthState::from_keys(None, true).expect("auth"),
        RateLimitState::new(100, Duration::from_secs(60)),
        1 << 20,
    )
}

fn file_part(file_name: &str, contents: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

fn no_file_part() -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         nothing attached\r\n\
         --{BOUNDARY}--\r\n"
    )
}

fn multipart_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn analytics_errors_map_to_codes() {
    let input = AnalyticsError::MissingColumns {
        missing: vec!["likes".to_string()],
    };
    assert_eq!(
        map_analytics_error("r".to_string(), &input).error.code,
        "validation_error"
    );

    let label = AnalyticsError::InvalidClusterLabel { label: 4, k: 3 };
    assert_eq!(
        map_analytics_error("r".to_string(), &label).error.code,
        "bad_request"
    );

    let chart = AnalyticsError::Chart {
        chart: "content length",
        reason: "backend".to_string(),
    };
    let mapped = map_analytics_error("r".to_string(), &chart);
    assert_eq!(mapped.error.code, "internal_error");
    assert!(!mapped.error.message.contains("backend"));
}

#[tokio::test]
async fn health_returns_ok_and_echoes_request_id() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"req-health"[..])
    );
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[tokio::test]
async fn index_serves_html_page() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let html = String::from_utf8(body.to_vec()).expect("utf-8");
    assert!(html.contains("<form"));
    assert!(html.contains("/api/v1/dashboard"));
}

#[tokio::test]
async fn dashboard_without_file_awaits_upload() {
    let response = app()
        .oneshot(multipart_request("/api/v1/dashboard", no_file_part()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "awaiting_upload");
    assert_eq!(
        json["data"]["message"],
        "Please upload a CSV file to see the full analysis."
    );
}

#[tokio::test]
async fn dashboard_with_file_is_ready() {
    let response = app()
        .oneshot(multipart_request(
            "/api/v1/dashboard?cluster=2",
            file_part("posts.csv", SAMPLE),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let data = &json["data"];
    assert_eq!(data["status"], "ready");
    assert_eq!(data["summary"]["total_posts"], 12);
    assert_eq!(data["cards"].as_array().map(Vec::len), Some(4));
    assert_eq!(data["cards"][0]["label"], "Total Posts");
    assert!(data["charts"]["platform_comparison"]
        .as_str()
        .is_some_and(|svg| svg.contains("<svg")));
    assert_eq!(data["cluster"]["selected"], 2);
    assert_eq!(data["explorer"]["rows"].as_array().map(Vec::len), Some(12));
    assert!(data.get("export").is_none());
}

#[tokio::test]
async fn dashboard_rejects_missing_columns() {
    let response = app()
        .oneshot(multipart_request(
            "/api/v1/dashboard",
            file_part("posts.csv", "platform,likes\nTikTok,3"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("post_type")));
}

#[tokio::test]
async fn dashboard_rejects_non_csv_file_name() {
    let response = app()
        .oneshot(multipart_request(
            "/api/v1/dashboard",
            file_part("posts.xlsx", SAMPLE),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn dashboard_rejects_unknown_cluster() {
    let response = app()
        .oneshot(multipart_request(
            "/api/v1/dashboard?cluster=5",
            file_part("posts.csv", SAMPLE),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn dashboard_rejects_malformed_cluster_query_with_envelope() {
    for uri in ["/api/v1/dashboard?cluster=abc", "/api/v1/dashboard?cluster=300"] {
        let mut request = multipart_request(uri, file_part("posts.csv", SAMPLE));
        request
            .headers_mut()
            .insert("x-request-id", "req-query".parse().expect("header value"));
        let response = app().oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "bad_request", "{uri}");
        assert_eq!(json["meta"]["request_id"], "req-query", "{uri}");
    }
}

#[tokio::test]
async fn export_returns_csv_attachment() {
    let response = app()
        .oneshot(multipart_request(
            "/api/v1/export",
            file_part("posts.csv", SAMPLE),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"text/csv; charset=utf-8"[..])
    );
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .map(|v| v.as_bytes()),
        Some(&b"attachment; filename=\"social_media_analysis.csv\""[..])
    );

    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let text = String::from_utf8(body.to_vec()).expect("utf-8");
    let mut lines = text.lines();
    assert!(lines
        .next()
        .is_some_and(|h| h.ends_with("total_engagement,performance_cluster")));
    assert_eq!(lines.count(), 12);
}

#[tokio::test]
async fn export_without_file_is_a_validation_error() {
    let response = app()
        .oneshot(multipart_request("/api/v1/export", no_file_part()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn protected_routes_require_bearer_token_when_enabled() {
    let auth = AuthState::from_keys(Some("token-a"), false).expect("auth");
    let app = app_with(auth, RateLimitState::new(100, Duration::from_secs(60)), 1 << 20);

    let denied = app
        .clone()
        .oneshot(multipart_request("/api/v1/dashboard", no_file_part()))
        .await
        .expect("response");
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(denied).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(json["meta"]["request_id"].is_string());

    let mut request = multipart_request("/api/v1/dashboard", no_file_part());
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer token-a".parse().expect("header value"),
    );
    let allowed = app.oneshot(request).await.expect("response");
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_stays_public_when_auth_is_enabled() {
    let auth = AuthState::from_keys(Some("token-a"), false).expect("auth");
    let app = app_with(auth, RateLimitState::new(100, Duration::from_secs(60)), 1 << 20);
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

#[tokio::test]
async fn rate_limit_rejects_requests_over_the_window_budget() {
    let app = app_with(
        AuthState::from_keys(None, true).expect("auth"),
        RateLimitState::new(1, Duration::from_secs(60)),
        1 << 20,
    );

    let first = app
        .clone()
        .oneshot(multipart_request("/api/v1/dashboard", no_file_part()))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(multipart_request("/api/v1/dashboard", no_file_part()))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|secs| (1..=60).contains(&secs)));
    let json = json_body(second).await;
    assert_eq!(json["error"]["code"], "rate_limited");

    // The export route has its own budget.
    let export = app
        .oneshot(multipart_request(
            "/api/v1/export",
            file_part("posts.csv", SAMPLE),
        ))
        .await
        .expect("response");
    assert_eq!(export.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = app_with(
        AuthState::from_keys(None, true).expect("auth"),
        RateLimitState::new(100, Duration::from_secs(60)),
        256,
    );
    let response = app
        .oneshot(multipart_request(
            "/api/v1/dashboard",
            file_part("posts.csv", SAMPLE),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
