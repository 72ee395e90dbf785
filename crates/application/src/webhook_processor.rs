//! Billing webhook verification and entitlement transitions.
//!
//! Deliveries are at-least-once. Each event maps to a target `is_pro` value
//! that depends only on the event content, so redelivery converges on the
//! same profile state without a dedup table.

use std::sync::Arc;

use tracing::{info, warn};

use quotagate_core::{AppError, AppResult};
use quotagate_domain::BillingEvent;

use crate::{Clock, ProfileRepository, ProfileUpdate};

mod signature;

pub use signature::WebhookSignatureVerifier;

/// Result of processing one verified webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A profile was updated.
    Applied,
    /// The event was acknowledged without any mutation.
    Ignored,
}

impl WebhookOutcome {
    /// Status label returned to the provider.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "ok",
            Self::Ignored => "ignored",
        }
    }
}

/// Application service for billing webhooks.
#[derive(Clone)]
pub struct WebhookProcessor {
    verifier: Option<WebhookSignatureVerifier>,
    repository: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
}

impl WebhookProcessor {
    /// Creates a processor. Without a verifier every delivery is rejected.
    #[must_use]
    pub fn new(
        verifier: Option<WebhookSignatureVerifier>,
        repository: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            repository,
            clock,
        }
    }

    /// Returns true when a webhook secret is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.verifier.is_some()
    }

    /// Authenticates a raw delivery.
    ///
    /// Fails closed: a missing secret is a configuration error, a missing or
    /// mismatching signature is unauthorized.
    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> AppResult<()> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            AppError::Configuration("webhook secret is not configured".to_owned())
        })?;

        let signature = signature
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing signature".to_owned()))?;

        verifier.verify(raw_body, signature).inspect_err(|_| {
            warn!(body_bytes = raw_body.len(), "rejected webhook with invalid signature");
        })
    }

    /// Decodes an authenticated body.
    pub fn decode(&self, raw_body: &[u8]) -> AppResult<BillingEvent> {
        let payload: serde_json::Value = serde_json::from_slice(raw_body)
            .map_err(|error| AppError::Validation(format!("invalid webhook body: {error}")))?;
        BillingEvent::from_payload(&payload)
    }

    /// Applies the entitlement transition carried by an event.
    pub async fn apply(&self, event: &BillingEvent) -> AppResult<WebhookOutcome> {
        let Some(transition) = event.transition() else {
            info!(event = event.kind.as_str(), "ignoring unhandled webhook event");
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(user_id) = event.user_id else {
            warn!(event = event.kind.as_str(), "webhook event has no usable user id");
            return Ok(WebhookOutcome::Ignored);
        };

        let (subscription_id, customer_id) = if event.records_subscription() {
            (event.subscription_id.clone(), event.customer_id.clone())
        } else {
            (None, None)
        };

        let update = ProfileUpdate {
            is_pro: transition.is_pro(),
            subscription_id,
            customer_id,
            updated_at: self.clock.now(),
        };

        self.repository
            .update_profile(user_id, update)
            .await
            .inspect_err(|error| {
                warn!(%user_id, event = event.kind.as_str(), error = %error, "failed to apply webhook");
            })?;

        info!(
            %user_id,
            event = event.kind.as_str(),
            is_pro = transition.is_pro(),
            "applied subscription webhook"
        );
        Ok(WebhookOutcome::Applied)
    }

    /// Verifies, decodes, and applies one delivery.
    pub async fn handle(&self, raw_body: &[u8], signature: Option<&str>) -> AppResult<WebhookOutcome> {
        self.verify(raw_body, signature)?;
        let event = self.decode(raw_body)?;
        self.apply(&event).await
    }
}
