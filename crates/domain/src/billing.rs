//! Billing provider events and the entitlement transitions they drive.

use quotagate_core::{AppError, AppResult};
use serde_json::Value;

use crate::UserId;

/// Kind of subscription event emitted by the billing provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEventKind {
    /// `subscription_created`.
    SubscriptionCreated,
    /// `subscription_updated`.
    SubscriptionUpdated,
    /// `subscription_cancelled`.
    SubscriptionCancelled,
    /// `subscription_expired`.
    SubscriptionExpired,
    /// Any event this system does not react to.
    Other(String),
}

impl BillingEventKind {
    /// Parses a provider event name.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "subscription_created" => Self::SubscriptionCreated,
            "subscription_updated" => Self::SubscriptionUpdated,
            "subscription_cancelled" => Self::SubscriptionCancelled,
            "subscription_expired" => Self::SubscriptionExpired,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the provider event name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SubscriptionCreated => "subscription_created",
            Self::SubscriptionUpdated => "subscription_updated",
            Self::SubscriptionCancelled => "subscription_cancelled",
            Self::SubscriptionExpired => "subscription_expired",
            Self::Other(other) => other.as_str(),
        }
    }
}

/// Subscription status reported on created/updated events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Paid and current.
    Active,
    /// Inside a free trial.
    OnTrial,
    /// Any other provider status (paused, past_due, unpaid, ...).
    Other(String),
}

impl SubscriptionStatus {
    /// Parses a provider status string.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "on_trial" => Self::OnTrial,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns true when the status entitles the subscriber.
    #[must_use]
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active | Self::OnTrial)
    }
}

/// Target state of a profile's `is_pro` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementTransition {
    /// Set `is_pro = true`.
    Activate,
    /// Set `is_pro = false`.
    Deactivate,
}

impl EntitlementTransition {
    /// Value written to the `is_pro` field.
    #[must_use]
    pub fn is_pro(self) -> bool {
        matches!(self, Self::Activate)
    }
}

/// Decoded billing webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEvent {
    /// Event kind from `meta.event_name`.
    pub kind: BillingEventKind,
    /// Profile the event targets, from `meta.custom_data.user_id`.
    pub user_id: Option<UserId>,
    /// Status from `data.attributes.status`.
    pub status: Option<SubscriptionStatus>,
    /// Provider subscription id from `data.id`.
    pub subscription_id: Option<String>,
    /// Provider customer id from `data.attributes.customer_id`.
    pub customer_id: Option<String>,
}

impl BillingEvent {
    /// Decodes a webhook body.
    ///
    /// Only the top-level shape is enforced; unknown or malformed inner
    /// fields decode to `None` so the event degrades to a no-op.
    pub fn from_payload(payload: &Value) -> AppResult<Self> {
        if !payload.is_object() {
            return Err(AppError::Validation(
                "webhook payload must be a JSON object".to_owned(),
            ));
        }

        let kind = payload
            .pointer("/meta/event_name")
            .and_then(Value::as_str)
            .map(BillingEventKind::parse)
            .unwrap_or_else(|| BillingEventKind::Other(String::new()));

        let user_id = payload
            .pointer("/meta/custom_data/user_id")
            .and_then(Value::as_str)
            .and_then(|value| UserId::parse(value).ok());

        let status = payload
            .pointer("/data/attributes/status")
            .and_then(Value::as_str)
            .map(SubscriptionStatus::parse);

        Ok(Self {
            kind,
            user_id,
            status,
            subscription_id: payload.pointer("/data/id").and_then(identifier_text),
            customer_id: payload
                .pointer("/data/attributes/customer_id")
                .and_then(identifier_text),
        })
    }

    /// Returns the transition this event drives, or `None` when it is ignored.
    #[must_use]
    pub fn transition(&self) -> Option<EntitlementTransition> {
        match self.kind {
            BillingEventKind::SubscriptionCreated | BillingEventKind::SubscriptionUpdated => {
                if self
                    .status
                    .as_ref()
                    .is_some_and(SubscriptionStatus::grants_access)
                {
                    Some(EntitlementTransition::Activate)
                } else {
                    Some(EntitlementTransition::Deactivate)
                }
            }
            BillingEventKind::SubscriptionCancelled | BillingEventKind::SubscriptionExpired => {
                Some(EntitlementTransition::Deactivate)
            }
            BillingEventKind::Other(_) => None,
        }
    }

    /// Returns true when provider identifiers should be recorded.
    #[must_use]
    pub fn records_subscription(&self) -> bool {
        matches!(
            self.kind,
            BillingEventKind::SubscriptionCreated | BillingEventKind::SubscriptionUpdated
        )
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
