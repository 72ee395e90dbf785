use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use quotagate_core::AppError;
use tracing::debug;

use crate::client_identity::resolve_identity;
use crate::error::ApiResult;
use crate::state::AppState;

/// Admits the caller against its daily quota and charges usage once the
/// handler returns a successful response.
pub async fn require_quota(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = resolve_identity(
        request.headers(),
        peer_address(&request),
        &state.trusted_proxies,
    )?;

    let admission = state.gatekeeper.admit(&identity).await;
    if !admission.allowed {
        return Err(AppError::RateLimited(
            "daily limit reached, upgrade to Pro for unlimited access".to_owned(),
        )
        .into());
    }

    request.extensions_mut().insert(identity.clone());
    let response = next.run(request).await;

    if response.status().is_success() {
        state.gatekeeper.commit(&identity, &admission).await;
    } else {
        debug!(status = %response.status(), address = %identity.address(), "gated call not charged");
    }

    Ok(response)
}

/// Socket peer recorded by `into_make_service_with_connect_info`.
pub fn peer_address(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| *address)
}
