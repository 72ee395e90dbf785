use super::checks::{check_profile_store, check_redis};
use super::*;

/// Reports dependency status. Degraded dependencies still answer 200 since
/// the gate keeps serving in fallback mode.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (redis, profile_store) = tokio::join!(
        check_redis(state.redis_client.clone()),
        check_profile_store(state.profile_repository.clone()),
    );

    let degraded = redis.is_degraded() || profile_store.is_degraded();

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        ready: true,
        redis,
        profile_store,
    })
}
