//! # Storage Traits
//!
//! Abstractions that let the finance store run unchanged against the hosted
//! backend or against a purely local working set. The store picks one
//! [`FinanceRepository`] at construction time and never branches on the
//! mode inside individual operations.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{Event, Goal, NewEvent, NewGoal, NewTransaction, Profile, ProfilePatch, Transaction};
use tokio::sync::broadcast;

use super::snapshot::StoreSnapshot;

/// Which persistence path the store is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreMode {
    /// Hosted backend configured; every read and write goes through it
    Remote,
    /// No backend; state lives only in memory and the local snapshot
    Offline,
}

/// Outcome of a table load
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Rows from the backend; they replace the held list
    Authoritative(Vec<T>),
    /// Sample rows; applied only when the held list is empty
    Seed(Vec<T>),
}

/// Trait defining the record operations the finance store needs.
///
/// All calls are scoped to `user_id`. Writes return the confirmed record
/// as stored, which the store applies to its local state.
#[async_trait]
pub trait FinanceRepository: Send + Sync {
    fn mode(&self) -> StoreMode;

    /// Transactions ordered by date descending
    async fn fetch_transactions(&self, user_id: &str) -> Result<Fetched<Transaction>>;
    async fn insert_transaction(&self, user_id: &str, transaction: &NewTransaction) -> Result<Transaction>;
    async fn update_transaction(&self, user_id: &str, transaction: &Transaction) -> Result<Transaction>;
    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<()>;

    /// Goals ordered newest first
    async fn fetch_goals(&self, user_id: &str) -> Result<Fetched<Goal>>;
    async fn insert_goal(&self, user_id: &str, goal: &NewGoal) -> Result<Goal>;
    async fn update_goal(&self, user_id: &str, goal: &Goal) -> Result<Goal>;
    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<()>;

    /// Events ordered by date then time, descending
    async fn fetch_events(&self, user_id: &str) -> Result<Fetched<Event>>;
    async fn insert_event(&self, user_id: &str, event: &NewEvent) -> Result<Event>;
    async fn update_event(&self, user_id: &str, event: &Event) -> Result<Event>;
    async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()>;

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>>;
    async fn insert_profile(&self, user_id: &str, name: &str, avatar: &str) -> Result<Profile>;
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<Profile>;
}

/// Durable storage for the store's working set
pub trait SnapshotStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoreSnapshot>>;
    fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Tables that deliver change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Transactions,
    Goals,
    Events,
}

impl Table {
    pub const SUBSCRIBED: [Table; 3] = [Table::Transactions, Table::Goals, Table::Events];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Transactions => "transactions",
            Table::Goals => "goals",
            Table::Events => "events",
        }
    }

    pub fn parse(name: &str) -> Option<Table> {
        match name {
            "transactions" => Some(Table::Transactions),
            "goals" => Some(Table::Goals),
            "events" => Some(Table::Events),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row changed on the backend. Only its arrival matters to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: Table,
    pub user_id: String,
    pub kind: ChangeKind,
}

/// Source of change notifications, one channel per (table, user) pair
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, table: Table, user_id: &str) -> broadcast::Receiver<ChangeEvent>;

    /// Returns the number of subscribers that received the event
    fn publish(&self, event: ChangeEvent) -> usize;
}

/// The authenticated user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Answers "is there a user, and what is their id"
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<SessionUser>>;
}
