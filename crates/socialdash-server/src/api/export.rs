use axum::{
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use socialdash_analytics::{DashboardContext, DashboardOutcome};
use socialdash_core::EXPORT_FILE_NAME;

use crate::middleware::RequestId;

use super::{read_upload, run_pipeline, ApiError};

/// Respond with the analyzed table as a CSV attachment.
pub(super) async fn export_csv(
    Extension(req_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let Some(upload) = read_upload(&req_id.0, multipart).await? else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "a CSV file is required in the `file` field",
        ));
    };

    let ctx = DashboardContext {
        upload: Some(upload),
        cluster_choice: 0,
    };
    let DashboardOutcome::Ready(dashboard) = run_pipeline(&req_id.0, ctx).await? else {
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "dashboard did not produce an export",
        ));
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        dashboard.export,
    )
        .into_response())
}
