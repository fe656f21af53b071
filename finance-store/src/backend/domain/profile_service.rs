use log::info;
use shared::{Profile, ProfilePatch};

use crate::backend::domain::error::{StoreError, StoreResult};
use crate::backend::domain::store::FinanceStore;
use crate::backend::storage::{StoreMode, DEMO_USER_ID};

const DEFAULT_PROFILE_NAME: &str = "User";
const DEFAULT_PROFILE_AVATAR: &str = "🔥";

/// Per-user profile record, created on first access
#[derive(Clone)]
pub struct ProfileService {
    store: FinanceStore,
}

impl ProfileService {
    pub fn new(store: FinanceStore) -> Self {
        Self { store }
    }

    async fn profile_owner(&self) -> StoreResult<String> {
        match (self.store.current_user_id().await, self.store.mode()) {
            (Some(user_id), _) => Ok(user_id),
            (None, StoreMode::Offline) => Ok(DEMO_USER_ID.to_string()),
            (None, StoreMode::Remote) => Err(StoreError::NotAuthenticated),
        }
    }

    /// The current user's profile, inserting a default one when absent
    pub async fn load_or_create(&self) -> StoreResult<Profile> {
        let user_id = self.profile_owner().await?;
        let repository = self.store.repository();
        if let Some(profile) = repository.fetch_profile(&user_id).await? {
            return Ok(profile);
        }
        info!("Creating default profile for {}", user_id);
        Ok(repository
            .insert_profile(&user_id, DEFAULT_PROFILE_NAME, DEFAULT_PROFILE_AVATAR)
            .await?)
    }

    pub async fn update(&self, patch: ProfilePatch) -> StoreResult<Profile> {
        let user_id = self.profile_owner().await?;
        if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
            return Err(StoreError::Validation("Profile name cannot be empty".to_string()));
        }
        let profile = self.store.repository().update_profile(&user_id, &patch).await?;
        info!("Updated profile for {}", user_id);
        Ok(profile)
    }
}
