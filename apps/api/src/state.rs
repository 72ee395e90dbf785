use std::sync::Arc;

use ipnet::IpNet;
use quotagate_application::{Gatekeeper, ProfileRepository, WatermarkRemover, WebhookProcessor};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gatekeeper: Gatekeeper,
    pub webhook_processor: WebhookProcessor,
    pub watermark_remover: Arc<dyn WatermarkRemover>,
    pub redis_client: Option<redis::Client>,
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub trusted_proxies: Arc<[IpNet]>,
}
