//! quotagate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod client_identity;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use quotagate_application::{
    Clock, CounterBackend, CounterStore, EntitlementResolver, Gatekeeper, ProfileRepository,
    SystemClock, WebhookProcessor, WebhookSignatureVerifier,
};
use quotagate_core::AppError;
use quotagate_infrastructure::{
    CommandWatermarkRemover, InMemoryCounterBackend, PostgrestProfileRepository,
    RedisCounterBackend, UnconfiguredProfileRepository,
};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

const REDIS_KEY_PREFIX: &str = "quotagate:usage";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let redis_client = config
        .redis_url
        .as_deref()
        .map(|redis_url| {
            redis::Client::open(redis_url)
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))
        })
        .transpose()?;

    let durable_counters: Option<Arc<dyn CounterBackend>> = match &redis_client {
        Some(client) => Some(Arc::new(RedisCounterBackend::new(
            client.clone(),
            REDIS_KEY_PREFIX,
            config.store_timeout,
        ))),
        None => {
            warn!("REDIS_URL is not set, usage counters are process-local only");
            None
        }
    };
    let counters = CounterStore::new(durable_counters, Arc::new(InMemoryCounterBackend::new()));

    let profile_repository: Arc<dyn ProfileRepository> = match &config.profile_store {
        Some(profile_store) => {
            let http_client = reqwest::Client::builder()
                .timeout(config.store_timeout)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build profile store client: {error}"))
                })?;
            Arc::new(PostgrestProfileRepository::new(
                http_client,
                &profile_store.url,
                profile_store.service_key.clone(),
            )?)
        }
        None => {
            warn!("profile store is not configured, every caller is metered and webhooks fail");
            Arc::new(UnconfiguredProfileRepository)
        }
    };

    let verifier = match config.webhook_secret.as_deref() {
        Some(secret) => Some(WebhookSignatureVerifier::new(secret.as_bytes().to_vec())?),
        None => {
            warn!("WEBHOOK_SECRET is not set, billing webhooks will be rejected");
            None
        }
    };

    let gatekeeper = Gatekeeper::new(
        counters,
        EntitlementResolver::new(profile_repository.clone(), clock.clone()),
        clock.clone(),
        config.daily_free_limit,
    );
    let webhook_processor = WebhookProcessor::new(verifier, profile_repository.clone(), clock);
    let watermark_remover = Arc::new(CommandWatermarkRemover::new(
        config.watermark_tool_path.clone(),
        config.work_dir.clone(),
        config.watermark_tool_timeout,
    ));

    let daily_free_limit = gatekeeper.daily_limit();
    let durable_counters = gatekeeper.counters().has_durable_tier();
    let webhooks_enabled = webhook_processor.is_configured();

    let app_state = AppState {
        gatekeeper,
        webhook_processor,
        watermark_remover,
        redis_client,
        profile_repository,
        trusted_proxies: config.trusted_proxies.clone().into(),
    };

    let app = api_router::build_router(app_state, config.frontend_url.as_deref())?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(
        %address,
        daily_free_limit,
        durable_counters,
        webhooks_enabled,
        "quotagate api listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
