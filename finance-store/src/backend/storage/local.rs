//! # Local Repository
//!
//! Offline/demo implementation of [`FinanceRepository`]. It owns no record
//! tables: the store's own working set (and its snapshot) is the only copy.
//! Writes simply confirm the record, assigning a synthetic id on insert,
//! and loads hand back the bundled sample data as a seed.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use shared::{Event, Goal, NewEvent, NewGoal, NewTransaction, Profile, ProfilePatch, Transaction};
use std::sync::Mutex;
use uuid::Uuid;

use super::sample_data::{sample_events, sample_goals, sample_transactions};
use super::traits::{FinanceRepository, Fetched, SessionProvider, SessionUser, StoreMode};

/// Fixed user id used when no backend is configured
pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_USER_EMAIL: &str = "demo@local";

/// Generate a locally unique id: millisecond prefix plus a random suffix
pub fn generate_local_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

pub fn demo_profile() -> Profile {
    Profile {
        id: DEMO_USER_ID.to_string(),
        user_id: DEMO_USER_ID.to_string(),
        name: "Demo User".to_string(),
        avatar: "🔥".to_string(),
        whatsapp: None,
    }
}

pub struct LocalRepository {
    profile: Mutex<Profile>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            profile: Mutex::new(demo_profile()),
        }
    }

    fn current_profile(&self) -> Profile {
        self.profile.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FinanceRepository for LocalRepository {
    fn mode(&self) -> StoreMode {
        StoreMode::Offline
    }

    async fn fetch_transactions(&self, _user_id: &str) -> Result<Fetched<Transaction>> {
        Ok(Fetched::Seed(sample_transactions()))
    }

    async fn insert_transaction(&self, _user_id: &str, transaction: &NewTransaction) -> Result<Transaction> {
        let id = generate_local_id();
        debug!("Assigned local transaction id {}", id);
        Ok(transaction.clone().with_id(id))
    }

    async fn update_transaction(&self, _user_id: &str, transaction: &Transaction) -> Result<Transaction> {
        Ok(transaction.clone())
    }

    async fn delete_transaction(&self, _user_id: &str, _transaction_id: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch_goals(&self, _user_id: &str) -> Result<Fetched<Goal>> {
        Ok(Fetched::Seed(sample_goals()))
    }

    async fn insert_goal(&self, _user_id: &str, goal: &NewGoal) -> Result<Goal> {
        Ok(goal.clone().with_id(generate_local_id()))
    }

    async fn update_goal(&self, _user_id: &str, goal: &Goal) -> Result<Goal> {
        Ok(goal.clone())
    }

    async fn delete_goal(&self, _user_id: &str, _goal_id: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch_events(&self, _user_id: &str) -> Result<Fetched<Event>> {
        Ok(Fetched::Seed(sample_events()))
    }

    async fn insert_event(&self, _user_id: &str, event: &NewEvent) -> Result<Event> {
        Ok(event.clone().with_id(generate_local_id()))
    }

    async fn update_event(&self, _user_id: &str, event: &Event) -> Result<Event> {
        Ok(event.clone())
    }

    async fn delete_event(&self, _user_id: &str, _event_id: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch_profile(&self, _user_id: &str) -> Result<Option<Profile>> {
        Ok(Some(self.current_profile()))
    }

    async fn insert_profile(&self, _user_id: &str, _name: &str, _avatar: &str) -> Result<Profile> {
        Ok(self.current_profile())
    }

    async fn update_profile(&self, _user_id: &str, patch: &ProfilePatch) -> Result<Profile> {
        let mut profile = self.profile.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *profile = patch.apply_to(&profile);
        Ok(profile.clone())
    }
}

/// Session provider for offline mode: the demo user, once demo auth is on
pub struct DemoSession {
    signed_in: bool,
}

impl DemoSession {
    pub fn new(signed_in: bool) -> Self {
        Self { signed_in }
    }
}

#[async_trait]
impl SessionProvider for DemoSession {
    async fn current_user(&self) -> Result<Option<SessionUser>> {
        if !self.signed_in {
            return Ok(None);
        }
        Ok(Some(SessionUser {
            id: DEMO_USER_ID.to_string(),
            email: Some(DEMO_USER_EMAIL.to_string()),
        }))
    }
}
