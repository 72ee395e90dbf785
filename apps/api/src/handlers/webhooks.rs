use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use crate::dto::WebhookAckResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-signature";

/// Receives billing provider deliveries. The body is read raw so the
/// signature is checked over the exact bytes sent.
pub async fn billing_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAckResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = state.webhook_processor.handle(&body, signature).await?;

    Ok(Json(WebhookAckResponse {
        status: outcome.as_str(),
    }))
}
