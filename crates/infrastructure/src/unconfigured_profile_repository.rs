use async_trait::async_trait;
use quotagate_application::{ProfileRepository, ProfileUpdate};
use quotagate_core::{AppError, AppResult};
use quotagate_domain::{ProfileEntitlement, UserId};

/// Stand-in used when no profile store credentials are configured.
///
/// Every call reports a configuration error, which the entitlement path
/// treats as "metered" and the webhook path surfaces as a server error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProfileRepository;

#[async_trait]
impl ProfileRepository for UnconfiguredProfileRepository {
    async fn find_entitlement(&self, _user_id: UserId) -> AppResult<Option<ProfileEntitlement>> {
        Err(AppError::Configuration(
            "profile store is not configured".to_owned(),
        ))
    }

    async fn update_profile(&self, _user_id: UserId, _update: ProfileUpdate) -> AppResult<()> {
        Err(AppError::Configuration(
            "profile store is not configured".to_owned(),
        ))
    }

    async fn check_health(&self) -> AppResult<()> {
        Err(AppError::Configuration(
            "profile store is not configured".to_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use quotagate_application::ProfileRepository;
    use quotagate_core::AppError;

    use super::UnconfiguredProfileRepository;

    #[tokio::test]
    async fn health_check_reports_missing_configuration() {
        assert!(matches!(
            UnconfiguredProfileRepository.check_health().await,
            Err(AppError::Configuration(_))
        ));
    }
}
