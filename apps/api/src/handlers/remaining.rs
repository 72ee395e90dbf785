use axum::Json;
use axum::extract::{Request, State};

use crate::client_identity::resolve_address;
use crate::dto::RemainingResponse;
use crate::error::ApiResult;
use crate::middleware::peer_address;
use crate::state::AppState;

/// Free allowance left today for the calling address.
pub async fn remaining_handler(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<RemainingResponse>> {
    let address = resolve_address(
        request.headers(),
        peer_address(&request),
        &state.trusted_proxies,
    )?;
    let remaining = state.gatekeeper.remaining_for_address(address).await;

    Ok(Json(RemainingResponse {
        remaining: remaining.remaining,
        limit: remaining.limit,
    }))
}
