use serde::Serialize;
use ts_rs::TS;

/// Status of one backing dependency.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

impl HealthDependencyStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            detail: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            status: "disabled",
            detail: None,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: "error",
            detail: Some(detail.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == "error"
    }
}

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub redis: HealthDependencyStatus,
    pub profile_store: HealthDependencyStatus,
}

/// Remaining free allowance for the calling address.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "remaining-response.ts"
)]
pub struct RemainingResponse {
    #[ts(type = "number")]
    pub remaining: u64,
    #[ts(type = "number")]
    pub limit: u64,
}

/// Acknowledgement returned to the billing provider.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "webhook-ack-response.ts"
)]
pub struct WebhookAckResponse {
    pub status: &'static str,
}
