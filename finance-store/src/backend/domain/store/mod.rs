//! # Finance Store
//!
//! Single source of truth for the signed-in user's transactions, goals and
//! events plus the totals derived from them.
//!
//! The store is an explicit service object: it owns its state behind an
//! async lock, the repository strategy chosen once at construction, and
//! the handles of its change subscriptions. Clones share the same state.
//!
//! ## Write discipline
//!
//! Every write goes through the repository first and the confirmed record
//! is then applied to local state, in both modes. `balance` moves by the
//! signed delta of the write and monthly totals are recomputed from the
//! full list. Full reloads only happen on `load_*`, `sync` and change
//! notifications.
//!
//! ## Failures
//!
//! Each operation raises `is_loading` for its duration. On failure the
//! message is stored in `error` and the same error is returned to the
//! caller. Nothing is rolled back or retried.

use log::{debug, error, info, warn};
use shared::{
    Event, EventPatch, EventType, FinanceSummary, Goal, GoalPatch, NewEvent, NewGoal,
    NewTransaction, Transaction, TransactionPatch,
};
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::backend::domain::error::{StoreError, StoreResult};
use crate::backend::domain::stats::{monthly_totals, today, total_balance};
use crate::backend::storage::local::DEMO_USER_ID;
use crate::backend::storage::{
    ChangeFeed, FinanceRepository, Fetched, SessionProvider, SnapshotStorage, StoreMode,
    StoreSnapshot, Table,
};

#[cfg(test)]
mod tests;

/// Time of day given to the calendar entry created alongside a goal
const GOAL_EVENT_HOUR: u32 = 9;

/// Everything the store holds for the current user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
    pub events: Vec<Event>,
    pub balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub is_loading: bool,
    pub error: Option<String>,
    pub current_user_id: Option<String>,
}

impl StoreState {
    fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            transactions: snapshot.transactions,
            goals: snapshot.goals,
            events: snapshot.events,
            balance: snapshot.balance,
            monthly_income: snapshot.monthly_income,
            monthly_expenses: snapshot.monthly_expenses,
            current_user_id: snapshot.current_user_id,
            ..Default::default()
        }
    }

    fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            transactions: self.transactions.clone(),
            goals: self.goals.clone(),
            events: self.events.clone(),
            balance: self.balance,
            monthly_income: self.monthly_income,
            monthly_expenses: self.monthly_expenses,
            current_user_id: self.current_user_id.clone(),
        }
    }

    /// Drop the working set and totals, keeping status flags and user id
    fn clear_working_set(&mut self) {
        self.transactions.clear();
        self.goals.clear();
        self.events.clear();
        self.balance = 0.0;
        self.monthly_income = 0.0;
        self.monthly_expenses = 0.0;
    }

    fn recalculate_monthly(&mut self) {
        let totals = monthly_totals(&self.transactions, today());
        self.monthly_income = totals.income;
        self.monthly_expenses = totals.expenses;
    }
}

/// Result of [`FinanceStore::sync`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { user_id: String },
    /// Remote mode without a signed-in user; nothing was loaded
    NoSession,
}

struct StoreInner {
    repository: Arc<dyn FinanceRepository>,
    snapshots: Option<Arc<dyn SnapshotStorage>>,
    change_feed: Option<Arc<dyn ChangeFeed>>,
    sessions: Option<Arc<dyn SessionProvider>>,
    state: RwLock<StoreState>,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let handles = self.subscriptions.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in handles.drain(..) {
            handle.abort();
        }
    }
}

pub struct FinanceStoreBuilder {
    repository: Arc<dyn FinanceRepository>,
    snapshots: Option<Arc<dyn SnapshotStorage>>,
    change_feed: Option<Arc<dyn ChangeFeed>>,
    sessions: Option<Arc<dyn SessionProvider>>,
}

impl FinanceStoreBuilder {
    pub fn snapshots(mut self, snapshots: Arc<dyn SnapshotStorage>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn change_feed(mut self, change_feed: Arc<dyn ChangeFeed>) -> Self {
        self.change_feed = Some(change_feed);
        self
    }

    pub fn sessions(mut self, sessions: Arc<dyn SessionProvider>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn build(self) -> FinanceStore {
        FinanceStore {
            inner: Arc::new(StoreInner {
                repository: self.repository,
                snapshots: self.snapshots,
                change_feed: self.change_feed,
                sessions: self.sessions,
                state: RwLock::new(StoreState::default()),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }
}

#[derive(Clone)]
pub struct FinanceStore {
    inner: Arc<StoreInner>,
}

impl FinanceStore {
    pub fn builder(repository: Arc<dyn FinanceRepository>) -> FinanceStoreBuilder {
        FinanceStoreBuilder {
            repository,
            snapshots: None,
            change_feed: None,
            sessions: None,
        }
    }

    /// Store with no snapshot storage, change feed or session provider
    pub fn new(repository: Arc<dyn FinanceRepository>) -> Self {
        Self::builder(repository).build()
    }

    pub fn mode(&self) -> StoreMode {
        self.inner.repository.mode()
    }

    pub fn is_remote(&self) -> bool {
        self.mode() == StoreMode::Remote
    }

    pub(crate) fn repository(&self) -> Arc<dyn FinanceRepository> {
        Arc::clone(&self.inner.repository)
    }

    // ---- lifecycle ----

    /// Restore the persisted working set.
    ///
    /// A snapshot saved for a different user than `resolved_user_id` is
    /// discarded and the store starts clean under the resolved user.
    pub async fn init(&self, resolved_user_id: Option<&str>) {
        let restored = match &self.inner.snapshots {
            Some(snapshots) => match snapshots.load() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Could not read stored finance data, starting clean: {}", e);
                    None
                }
            },
            None => None,
        };

        let mut state = self.inner.state.write().await;
        *state = match restored {
            Some(snapshot) => {
                let foreign = matches!(
                    (&snapshot.current_user_id, resolved_user_id),
                    (Some(stored), Some(resolved)) if stored != resolved
                );
                if foreign {
                    info!("Stored data belongs to another user, discarding it");
                    StoreState {
                        current_user_id: resolved_user_id.map(str::to_string),
                        ..Default::default()
                    }
                } else {
                    let mut restored = StoreState::from_snapshot(snapshot);
                    if restored.current_user_id.is_none() {
                        restored.current_user_id = resolved_user_id.map(str::to_string);
                    }
                    restored.recalculate_monthly();
                    info!(
                        "Restored {} transactions, {} goals, {} events",
                        restored.transactions.len(),
                        restored.goals.len(),
                        restored.events.len()
                    );
                    restored
                }
            }
            None => StoreState {
                current_user_id: resolved_user_id.map(str::to_string),
                ..Default::default()
            },
        };
        self.persist(&state);
    }

    /// Stop change subscriptions and flush the working set
    pub async fn teardown(&self) {
        self.cleanup_subscriptions();
        let state = self.inner.state.read().await;
        self.persist(&state);
        info!("Finance store shut down");
    }

    // ---- read model ----

    pub async fn state(&self) -> StoreState {
        self.inner.state.read().await.clone()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.inner.state.read().await.transactions.clone()
    }

    pub async fn goals(&self) -> Vec<Goal> {
        self.inner.state.read().await.goals.clone()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.inner.state.read().await.events.clone()
    }

    pub async fn current_user_id(&self) -> Option<String> {
        self.inner.state.read().await.current_user_id.clone()
    }

    pub async fn summary(&self) -> FinanceSummary {
        let state = self.inner.state.read().await;
        FinanceSummary {
            balance: state.balance,
            monthly_income: state.monthly_income,
            monthly_expenses: state.monthly_expenses,
            transaction_count: state.transactions.len(),
            goal_count: state.goals.len(),
            event_count: state.events.len(),
            is_loading: state.is_loading,
            error: state.error.clone(),
            current_user_id: state.current_user_id.clone(),
            remote: self.is_remote(),
        }
    }

    // ---- transactions ----

    pub async fn add_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        self.run("add_transaction", async {
            let user_id = self.acting_user().await?;
            let created = self.inner.repository.insert_transaction(&user_id, &transaction).await?;

            let mut state = self.inner.state.write().await;
            state.balance += created.amount;
            state.transactions.insert(0, created.clone());
            state.recalculate_monthly();
            self.persist(&state);
            info!("Added transaction {} ({:.2})", created.id, created.amount);
            Ok(created)
        })
        .await
    }

    pub async fn update_transaction(&self, id: &str, patch: TransactionPatch) -> StoreResult<Transaction> {
        self.run("update_transaction", async {
            let user_id = self.acting_user().await?;
            let held = self
                .transactions()
                .await
                .into_iter()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::not_found("Transaction", id))?;
            let confirmed = self
                .inner
                .repository
                .update_transaction(&user_id, &patch.apply_to(&held))
                .await?;

            let mut state = self.inner.state.write().await;
            if let Some(slot) = state.transactions.iter_mut().find(|t| t.id == id) {
                let delta = confirmed.amount - slot.amount;
                *slot = confirmed.clone();
                state.balance += delta;
            }
            state.recalculate_monthly();
            self.persist(&state);
            info!("Updated transaction {}", id);
            Ok(confirmed)
        })
        .await
    }

    pub async fn delete_transaction(&self, id: &str) -> StoreResult<()> {
        self.run("delete_transaction", async {
            let user_id = self.acting_user().await?;
            self.inner.repository.delete_transaction(&user_id, id).await?;

            let mut state = self.inner.state.write().await;
            if let Some(position) = state.transactions.iter().position(|t| t.id == id) {
                let removed = state.transactions.remove(position);
                state.balance -= removed.amount;
            }
            state.recalculate_monthly();
            self.persist(&state);
            info!("Deleted transaction {}", id);
            Ok(())
        })
        .await
    }

    // ---- goals ----

    /// Create a goal together with its deadline entry on the calendar
    pub async fn add_goal(&self, goal: NewGoal) -> StoreResult<Goal> {
        self.run("add_goal", async {
            let user_id = self.acting_user().await?;
            let created = self.inner.repository.insert_goal(&user_id, &goal).await?;
            {
                let mut state = self.inner.state.write().await;
                state.goals.insert(0, created.clone());
                self.persist(&state);
            }
            info!("Added goal {} ({})", created.id, created.name);

            let deadline_event = goal_deadline_event(&created);
            let event = self.inner.repository.insert_event(&user_id, &deadline_event).await?;
            let mut state = self.inner.state.write().await;
            state.events.insert(0, event);
            self.persist(&state);
            Ok(created)
        })
        .await
    }

    pub async fn update_goal(&self, id: &str, patch: GoalPatch) -> StoreResult<Goal> {
        self.run("update_goal", async {
            let user_id = self.acting_user().await?;
            let held = self
                .goals()
                .await
                .into_iter()
                .find(|g| g.id == id)
                .ok_or_else(|| StoreError::not_found("Goal", id))?;
            let confirmed = self.inner.repository.update_goal(&user_id, &patch.apply_to(&held)).await?;

            let mut state = self.inner.state.write().await;
            if let Some(slot) = state.goals.iter_mut().find(|g| g.id == id) {
                *slot = confirmed.clone();
            }
            self.persist(&state);
            info!("Updated goal {}", id);
            Ok(confirmed)
        })
        .await
    }

    pub async fn delete_goal(&self, id: &str) -> StoreResult<()> {
        self.run("delete_goal", async {
            let user_id = self.acting_user().await?;
            self.inner.repository.delete_goal(&user_id, id).await?;

            let mut state = self.inner.state.write().await;
            state.goals.retain(|g| g.id != id);
            self.persist(&state);
            info!("Deleted goal {}", id);
            Ok(())
        })
        .await
    }

    // ---- events ----

    pub async fn add_event(&self, event: NewEvent) -> StoreResult<Event> {
        self.run("add_event", async {
            let user_id = self.acting_user().await?;
            let created = self.inner.repository.insert_event(&user_id, &event).await?;

            let mut state = self.inner.state.write().await;
            state.events.insert(0, created.clone());
            self.persist(&state);
            info!("Added event {} on {}", created.id, created.date);
            Ok(created)
        })
        .await
    }

    pub async fn update_event(&self, id: &str, patch: EventPatch) -> StoreResult<Event> {
        self.run("update_event", async {
            let user_id = self.acting_user().await?;
            let held = self
                .events()
                .await
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::not_found("Event", id))?;
            let confirmed = self.inner.repository.update_event(&user_id, &patch.apply_to(&held)).await?;

            let mut state = self.inner.state.write().await;
            if let Some(slot) = state.events.iter_mut().find(|e| e.id == id) {
                *slot = confirmed.clone();
            }
            self.persist(&state);
            info!("Updated event {}", id);
            Ok(confirmed)
        })
        .await
    }

    pub async fn delete_event(&self, id: &str) -> StoreResult<()> {
        self.run("delete_event", async {
            let user_id = self.acting_user().await?;
            self.inner.repository.delete_event(&user_id, id).await?;

            let mut state = self.inner.state.write().await;
            state.events.retain(|e| e.id != id);
            self.persist(&state);
            info!("Deleted event {}", id);
            Ok(())
        })
        .await
    }

    // ---- loads ----

    /// Refetch transactions. Remote rows replace the list; offline sample
    /// rows are only used when nothing is held yet.
    pub async fn load_transactions(&self) -> StoreResult<()> {
        self.run("load_transactions", async {
            let user_id = self.acting_user().await?;
            let fetched = self.inner.repository.fetch_transactions(&user_id).await?;

            let mut state = self.inner.state.write().await;
            apply_fetched(&mut state.transactions, fetched);
            state.balance = total_balance(&state.transactions);
            state.recalculate_monthly();
            self.persist(&state);
            debug!("Holding {} transactions", state.transactions.len());
            Ok(())
        })
        .await
    }

    pub async fn load_goals(&self) -> StoreResult<()> {
        self.run("load_goals", async {
            let user_id = self.acting_user().await?;
            let fetched = self.inner.repository.fetch_goals(&user_id).await?;

            let mut state = self.inner.state.write().await;
            apply_fetched(&mut state.goals, fetched);
            self.persist(&state);
            debug!("Holding {} goals", state.goals.len());
            Ok(())
        })
        .await
    }

    pub async fn load_events(&self) -> StoreResult<()> {
        self.run("load_events", async {
            let user_id = self.acting_user().await?;
            let fetched = self.inner.repository.fetch_events(&user_id).await?;

            let mut state = self.inner.state.write().await;
            apply_fetched(&mut state.events, fetched);
            self.persist(&state);
            debug!("Holding {} events", state.events.len());
            Ok(())
        })
        .await
    }

    /// Recompute monthly income and expenses for the current calendar month
    pub async fn calculate_monthly_stats(&self) {
        let mut state = self.inner.state.write().await;
        state.recalculate_monthly();
        self.persist(&state);
    }

    // ---- session ----

    /// Resolve the active user, reload every table, then subscribe to
    /// changes. Loads continue past failures; the first error is returned.
    pub async fn sync(&self) -> StoreResult<SyncOutcome> {
        let user_id = match self.mode() {
            StoreMode::Offline => DEMO_USER_ID.to_string(),
            StoreMode::Remote => {
                let Some(sessions) = &self.inner.sessions else {
                    warn!("No session provider configured, skipping sync");
                    return Ok(SyncOutcome::NoSession);
                };
                match sessions.current_user().await {
                    Ok(Some(user)) => user.id,
                    Ok(None) => {
                        info!("No signed-in user, nothing to sync");
                        return Ok(SyncOutcome::NoSession);
                    }
                    Err(e) => return Err(self.record_failure("sync", e.into()).await),
                }
            }
        };

        info!("Syncing finance data for {}", user_id);
        self.set_current_user_id(Some(user_id.clone())).await;

        let mut first_error = None;
        for result in [
            self.load_transactions().await,
            self.load_goals().await,
            self.load_events().await,
        ] {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        self.setup_realtime_subscriptions().await;

        match first_error {
            Some(e) => Err(e),
            None => Ok(SyncOutcome::Synced { user_id }),
        }
    }

    /// Adopt a new active user. Switching from one known user to a
    /// different one drops the held working set first; adopting a user
    /// while none is set keeps what is held.
    pub async fn set_current_user_id(&self, user_id: Option<String>) {
        let switching = {
            let state = self.inner.state.read().await;
            matches!(
                (state.current_user_id.as_deref(), user_id.as_deref()),
                (Some(old_id), Some(new_id)) if old_id != new_id
            )
        };
        if switching {
            self.cleanup_subscriptions();
        }

        let mut state = self.inner.state.write().await;
        if switching {
            info!("Active user changed, clearing held data");
            state.clear_working_set();
        }
        state.current_user_id = user_id;
        self.persist(&state);
    }

    /// Logout: stop subscriptions and reset to the empty initial state
    pub async fn clear_store(&self) {
        self.cleanup_subscriptions();
        let mut state = self.inner.state.write().await;
        *state = StoreState::default();
        if let Some(snapshots) = &self.inner.snapshots {
            if let Err(e) = snapshots.clear() {
                warn!("Failed to remove stored finance data: {}", e);
            }
        }
        info!("Finance store cleared");
    }

    // ---- change subscriptions ----

    /// Open one change channel per table for the current user. Prior
    /// subscriptions are always torn down first. Returns the number of
    /// channels opened.
    pub async fn setup_realtime_subscriptions(&self) -> usize {
        self.cleanup_subscriptions();

        if !self.is_remote() {
            return 0;
        }
        let Some(feed) = &self.inner.change_feed else {
            return 0;
        };
        let Some(user_id) = self.current_user_id().await else {
            return 0;
        };

        let handles: Vec<JoinHandle<()>> = Table::SUBSCRIBED
            .iter()
            .map(|&table| {
                let receiver = feed.subscribe(table, &user_id);
                let store = Arc::downgrade(&self.inner);
                tokio::spawn(watch_table(store, table, receiver))
            })
            .collect();

        let opened = handles.len();
        let mut subscriptions = self.subscriptions();
        // A concurrent setup may have raced in between
        for stale in subscriptions.drain(..) {
            stale.abort();
        }
        subscriptions.extend(handles);
        info!("Subscribed to {} change channels for {}", opened, user_id);
        opened
    }

    /// Abort every change subscription; returns how many were active
    pub fn cleanup_subscriptions(&self) -> usize {
        let mut subscriptions = self.subscriptions();
        let count = subscriptions.len();
        for handle in subscriptions.drain(..) {
            handle.abort();
        }
        if count > 0 {
            info!("Removed {} change subscriptions", count);
        }
        count
    }

    pub fn active_subscription_count(&self) -> usize {
        self.subscriptions().iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Reload one table after a change notification
    pub async fn reload_table(&self, table: Table) -> StoreResult<()> {
        match table {
            Table::Transactions => self.load_transactions().await,
            Table::Goals => self.load_goals().await,
            Table::Events => self.load_events().await,
        }
    }

    // ---- internals ----

    fn subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// User id a repository call acts for. Remote calls need a resolved
    /// user; offline calls fall back to the demo user.
    async fn acting_user(&self) -> StoreResult<String> {
        match (self.current_user_id().await, self.mode()) {
            (Some(user_id), _) => Ok(user_id),
            (None, StoreMode::Offline) => Ok(DEMO_USER_ID.to_string()),
            (None, StoreMode::Remote) => Err(StoreError::NotAuthenticated),
        }
    }

    /// Run one operation inside the loading window
    async fn run<T, F>(&self, operation: &'static str, work: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        {
            let mut state = self.inner.state.write().await;
            state.is_loading = true;
            state.error = None;
        }

        let result = work.await;

        match result {
            Ok(value) => {
                self.inner.state.write().await.is_loading = false;
                Ok(value)
            }
            Err(e) => Err(self.record_failure(operation, e).await),
        }
    }

    /// Store the failure in the shared error field and hand it back
    pub(crate) async fn record_failure(&self, operation: &str, err: StoreError) -> StoreError {
        error!("{} failed: {}", operation, err);
        let mut state = self.inner.state.write().await;
        state.is_loading = false;
        state.error = Some(err.to_string());
        err
    }

    fn persist(&self, state: &StoreState) {
        if let Some(snapshots) = &self.inner.snapshots {
            if let Err(e) = snapshots.save(&state.to_snapshot()) {
                warn!("Failed to persist finance data: {}", e);
            }
        }
    }
}

fn apply_fetched<T>(held: &mut Vec<T>, fetched: Fetched<T>) {
    match fetched {
        Fetched::Authoritative(rows) => *held = rows,
        Fetched::Seed(rows) => {
            if held.is_empty() {
                *held = rows;
            }
        }
    }
}

/// The calendar entry that marks a goal's deadline
pub fn goal_deadline_event(goal: &Goal) -> NewEvent {
    NewEvent {
        date: goal.deadline,
        title: format!("Deadline: {}", goal.name),
        description: format!("Deadline for goal \"{}\".", goal.name),
        event_type: EventType::Goal,
        amount: None,
        time: chrono::NaiveTime::from_hms_opt(GOAL_EVENT_HOUR, 0, 0).unwrap_or_default(),
    }
}

async fn watch_table(
    store: Weak<StoreInner>,
    table: Table,
    mut receiver: tokio::sync::broadcast::Receiver<crate::backend::storage::ChangeEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => {
                let Some(inner) = store.upgrade() else {
                    break;
                };
                debug!("Change on {}, reloading", table.as_str());
                let store = FinanceStore { inner };
                if let Err(e) = store.reload_table(table).await {
                    warn!("Reload of {} after change failed: {}", table.as_str(), e);
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}
