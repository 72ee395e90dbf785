//! Resolves whether a user currently has unmetered access.

use std::sync::Arc;

use tracing::{debug, warn};

use quotagate_core::AppError;
use quotagate_domain::UserId;

use crate::{Clock, ProfileRepository};

/// Read-only entitlement lookup that fails closed.
#[derive(Clone)]
pub struct EntitlementResolver {
    repository: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
}

impl EntitlementResolver {
    /// Creates a resolver over a profile repository.
    #[must_use]
    pub fn new(repository: Arc<dyn ProfileRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Returns true when the user holds an active entitlement.
    ///
    /// Any missing input, store failure, missing record, or malformed field
    /// resolves to `false`.
    pub async fn is_unmetered(&self, user_id: Option<UserId>) -> bool {
        let Some(user_id) = user_id else {
            return false;
        };

        let profile = match self.repository.find_entitlement(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!(%user_id, "no profile record, treating as metered");
                return false;
            }
            // Reported once at startup.
            Err(AppError::Configuration(_)) => return false,
            Err(error) => {
                warn!(%user_id, error = %error, "profile lookup failed, treating as metered");
                return false;
            }
        };

        match profile.is_active_at(self.clock.now()) {
            Ok(active) => active,
            Err(error) => {
                warn!(%user_id, error = %error, "unparsable pro_expires_at, treating as metered");
                false
            }
        }
    }
}
