//! Port onto the externally owned profile records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quotagate_core::AppResult;
use quotagate_domain::{ProfileEntitlement, UserId};

/// Field-level update written to a profile record by billing webhooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New value of the permanent entitlement flag.
    pub is_pro: bool,
    /// Provider subscription id, written only when present.
    pub subscription_id: Option<String>,
    /// Provider customer id, written only when present.
    pub customer_id: Option<String>,
    /// Modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Repository port for the externally owned profile records.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Loads the entitlement fields of one profile.
    ///
    /// Returns `Ok(None)` when no record exists for the id.
    async fn find_entitlement(&self, user_id: UserId) -> AppResult<Option<ProfileEntitlement>>;

    /// Applies a field-level update to one profile.
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AppResult<()>;

    /// Cheap reachability check used by the health endpoint.
    ///
    /// An unconfigured store reports `AppError::Configuration`.
    async fn check_health(&self) -> AppResult<()> {
        Ok(())
    }
}
