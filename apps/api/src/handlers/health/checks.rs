use std::sync::Arc;
use std::time::Duration;

use quotagate_application::ProfileRepository;
use quotagate_core::AppError;
use redis::AsyncCommands;

use super::*;

const REDIS_PING_TIMEOUT: Duration = Duration::from_millis(500);
const PROFILE_STORE_CHECK_TIMEOUT: Duration = Duration::from_millis(500);

pub(super) async fn check_redis(redis_client: Option<redis::Client>) -> HealthDependencyStatus {
    let Some(redis_client) = redis_client else {
        return HealthDependencyStatus::disabled();
    };

    let ping = async {
        let mut connection = redis_client.get_multiplexed_async_connection().await?;
        connection.ping::<String>().await
    };

    match tokio::time::timeout(REDIS_PING_TIMEOUT, ping).await {
        Ok(Ok(value)) if value.eq_ignore_ascii_case("pong") => HealthDependencyStatus::ok(),
        Ok(Ok(value)) => {
            HealthDependencyStatus::error(format!("unexpected redis ping response: {value}"))
        }
        Ok(Err(error)) => HealthDependencyStatus::error(format!("redis ping failed: {error}")),
        Err(_) => HealthDependencyStatus::error("redis ping timed out"),
    }
}

pub(super) async fn check_profile_store(
    profile_repository: Arc<dyn ProfileRepository>,
) -> HealthDependencyStatus {
    match tokio::time::timeout(PROFILE_STORE_CHECK_TIMEOUT, profile_repository.check_health()).await
    {
        Ok(Ok(())) => HealthDependencyStatus::ok(),
        Ok(Err(AppError::Configuration(_))) => HealthDependencyStatus::disabled(),
        Ok(Err(error)) => {
            HealthDependencyStatus::error(format!("profile store check failed: {error}"))
        }
        Err(_) => HealthDependencyStatus::error("profile store check timed out"),
    }
}
