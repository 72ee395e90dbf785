use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use quotagate_application::{ImageFormat, ImageUpload};
use quotagate_core::AppError;
use quotagate_domain::Identity;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Upper bound for uploaded images.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runs the watermark tool on a raw image body and returns the result.
pub async fn remove_watermark_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    if body.is_empty() {
        return Err(AppError::Validation("no file provided".to_owned()).into());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let format = ImageFormat::from_content_type(content_type)?;

    let upload_bytes = body.len();
    let processed = state
        .watermark_remover
        .remove_watermark(ImageUpload {
            bytes: body.to_vec(),
            format,
        })
        .await?;

    info!(
        address = %identity.address(),
        upload_bytes,
        output_bytes = processed.len(),
        "processed image"
    );

    Ok(([(CONTENT_TYPE, format.content_type())], processed).into_response())
}
