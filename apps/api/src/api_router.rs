use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use quotagate_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers::remove::MAX_UPLOAD_BYTES;
use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: Option<&str>) -> Result<Router, AppError> {
    let gated_routes = Router::new()
        .route(
            "/api/remove",
            post(handlers::remove::remove_watermark_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_quota,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Ok(Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .route("/api/remaining", get(handlers::remaining::remaining_handler))
        .route(
            "/api/webhooks/billing",
            post(handlers::webhooks::billing_webhook_handler),
        )
        .merge(gated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
