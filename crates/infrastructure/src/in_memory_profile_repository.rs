use std::collections::HashMap;

use async_trait::async_trait;
use quotagate_application::{ProfileRepository, ProfileUpdate};
use quotagate_core::AppResult;
use quotagate_domain::{ProfileEntitlement, UserId};
use tokio::sync::RwLock;

/// In-memory profile repository for tests and local development.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<UserId, ProfileEntitlement>>,
}

impl InMemoryProfileRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one profile.
    pub async fn insert(&self, user_id: UserId, profile: ProfileEntitlement) {
        self.profiles.write().await.insert(user_id, profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_entitlement(&self, user_id: UserId) -> AppResult<Option<ProfileEntitlement>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AppResult<()> {
        // Matches a filtered PATCH: an unknown id updates nothing.
        if let Some(profile) = self.profiles.write().await.get_mut(&user_id) {
            profile.is_pro = update.is_pro;
        }
        Ok(())
    }
}
