use axum::{
    extract::{rejection::QueryRejection, Multipart, Query},
    Extension, Json,
};
use serde::Deserialize;
use socialdash_analytics::{DashboardContext, DashboardOutcome};

use crate::middleware::RequestId;

use super::{read_upload, run_pipeline, ApiError, ApiResponse, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DashboardQuery {
    /// Performance cluster to show; defaults to the first one.
    pub cluster: Option<u8>,
}

pub(super) async fn build_dashboard(
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DashboardOutcome>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::warn!(error = %rejection, "rejected dashboard query");
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("invalid query: {}", rejection.body_text()),
        )
    })?;
    let upload = read_upload(&req_id.0, multipart).await?;
    let ctx = DashboardContext {
        upload,
        cluster_choice: query.cluster.unwrap_or(0),
    };

    let data = run_pipeline(&req_id.0, ctx).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
