/// Test utilities: temp-dir backed snapshot storage plus in-memory stand-ins
/// for the hosted backend and the auth provider.
///
/// The temporary directory is removed when the environment is dropped, even
/// if the test panics.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{Event, Goal, NewEvent, NewGoal, NewTransaction, Profile, ProfilePatch, Transaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

use super::local::generate_local_id;
use super::snapshot::JsonFileSnapshotStorage;
use super::traits::{FinanceRepository, Fetched, SessionProvider, SessionUser, StoreMode};

/// Test environment that owns a temporary data directory
pub struct TestEnvironment {
    pub snapshots: JsonFileSnapshotStorage,
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let snapshots = JsonFileSnapshotStorage::new(temp_dir.path())?;
        Ok(Self {
            snapshots,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

#[derive(Default)]
struct Tables {
    transactions: HashMap<String, Vec<Transaction>>,
    goals: HashMap<String, Vec<Goal>>,
    events: HashMap<String, Vec<Event>>,
    profiles: HashMap<String, Profile>,
}

/// Hosted-backend stand-in: per-user tables held in memory.
///
/// `set_failing(true)` makes every call fail the way an unreachable backend
/// would. New rows are prepended so loads come back newest first.
#[derive(Default)]
pub struct InMemoryRemote {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    transaction_fetches: AtomicUsize,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn transaction_fetches(&self) -> usize {
        self.transaction_fetches.load(Ordering::SeqCst)
    }

    /// Write a row directly, as another device would
    pub fn put_transaction(&self, user_id: &str, transaction: Transaction) {
        self.lock().transactions.entry(user_id.to_string()).or_default().insert(0, transaction);
    }

    pub fn put_goal(&self, user_id: &str, goal: Goal) {
        self.lock().goals.entry(user_id.to_string()).or_default().insert(0, goal);
    }

    pub fn stored_transactions(&self, user_id: &str) -> Vec<Transaction> {
        self.lock().transactions.get(user_id).cloned().unwrap_or_default()
    }

    pub fn stored_events(&self, user_id: &str) -> Vec<Event> {
        self.lock().events.get(user_id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("Failed to fetch"));
        }
        Ok(())
    }
}

fn replace_row<T: Clone>(rows: &mut [T], id_of: impl Fn(&T) -> &str, record: &T, id: &str) -> Result<T> {
    let slot = rows
        .iter_mut()
        .find(|row| id_of(row) == id)
        .ok_or_else(|| anyhow!("No row with id {} for this user", id))?;
    *slot = record.clone();
    Ok(record.clone())
}

#[async_trait]
impl FinanceRepository for InMemoryRemote {
    fn mode(&self) -> StoreMode {
        StoreMode::Remote
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Fetched<Transaction>> {
        self.transaction_fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(Fetched::Authoritative(self.stored_transactions(user_id)))
    }

    async fn insert_transaction(&self, user_id: &str, transaction: &NewTransaction) -> Result<Transaction> {
        self.check()?;
        let stored = transaction.clone().with_id(generate_local_id());
        self.put_transaction(user_id, stored.clone());
        Ok(stored)
    }

    async fn update_transaction(&self, user_id: &str, transaction: &Transaction) -> Result<Transaction> {
        self.check()?;
        let mut tables = self.lock();
        let rows = tables.transactions.entry(user_id.to_string()).or_default();
        replace_row(rows, |row| row.id.as_str(), transaction, &transaction.id)
    }

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<()> {
        self.check()?;
        if let Some(rows) = self.lock().transactions.get_mut(user_id) {
            rows.retain(|row| row.id != transaction_id);
        }
        Ok(())
    }

    async fn fetch_goals(&self, user_id: &str) -> Result<Fetched<Goal>> {
        self.check()?;
        Ok(Fetched::Authoritative(self.lock().goals.get(user_id).cloned().unwrap_or_default()))
    }

    async fn insert_goal(&self, user_id: &str, goal: &NewGoal) -> Result<Goal> {
        self.check()?;
        let stored = goal.clone().with_id(generate_local_id());
        self.put_goal(user_id, stored.clone());
        Ok(stored)
    }

    async fn update_goal(&self, user_id: &str, goal: &Goal) -> Result<Goal> {
        self.check()?;
        let mut tables = self.lock();
        let rows = tables.goals.entry(user_id.to_string()).or_default();
        replace_row(rows, |row| row.id.as_str(), goal, &goal.id)
    }

    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<()> {
        self.check()?;
        if let Some(rows) = self.lock().goals.get_mut(user_id) {
            rows.retain(|row| row.id != goal_id);
        }
        Ok(())
    }

    async fn fetch_events(&self, user_id: &str) -> Result<Fetched<Event>> {
        self.check()?;
        Ok(Fetched::Authoritative(self.stored_events(user_id)))
    }

    async fn insert_event(&self, user_id: &str, event: &NewEvent) -> Result<Event> {
        self.check()?;
        let stored = event.clone().with_id(generate_local_id());
        self.lock().events.entry(user_id.to_string()).or_default().insert(0, stored.clone());
        Ok(stored)
    }

    async fn update_event(&self, user_id: &str, event: &Event) -> Result<Event> {
        self.check()?;
        let mut tables = self.lock();
        let rows = tables.events.entry(user_id.to_string()).or_default();
        replace_row(rows, |row| row.id.as_str(), event, &event.id)
    }

    async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        self.check()?;
        if let Some(rows) = self.lock().events.get_mut(user_id) {
            rows.retain(|row| row.id != event_id);
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.check()?;
        Ok(self.lock().profiles.get(user_id).cloned())
    }

    async fn insert_profile(&self, user_id: &str, name: &str, avatar: &str) -> Result<Profile> {
        self.check()?;
        let profile = Profile {
            id: generate_local_id(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            avatar: avatar.to_string(),
            whatsapp: None,
        };
        self.lock().profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<Profile> {
        self.check()?;
        let mut tables = self.lock();
        let profile = tables
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| anyhow!("No profile for {}", user_id))?;
        *profile = patch.apply_to(profile);
        Ok(profile.clone())
    }
}

/// Session provider returning a fixed answer
pub struct StaticSession {
    user: Option<SessionUser>,
}

impl StaticSession {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            user: Some(SessionUser {
                id: user_id.to_string(),
                email: Some(format!("{}@example.com", user_id)),
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user(&self) -> Result<Option<SessionUser>> {
        Ok(self.user.clone())
    }
}

/// Session provider that never answers, for timeout tests
pub struct HangingSession;

#[async_trait]
impl SessionProvider for HangingSession {
    async fn current_user(&self) -> Result<Option<SessionUser>> {
        std::future::pending::<()>().await;
        Ok(None)
    }
}
