//! Hosted implementation of [`FinanceRepository`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use shared::{Event, Goal, NewEvent, NewGoal, NewTransaction, Profile, ProfilePatch, Transaction};

use super::client::{eq, SupabaseClient};
use super::rows::{
    EventRow, EventWrite, GoalRow, GoalWrite, ProfileInsert, ProfileUpdate, TransactionInsert,
    TransactionRow, TransactionUpdate,
};
use crate::backend::storage::traits::{FinanceRepository, Fetched, StoreMode};

const TRANSACTIONS: &str = "transactions";
const GOALS: &str = "goals";
const EVENTS: &str = "events";
const PROFILES: &str = "profiles";

fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Query scoped to the owning user, with an explicit ordering
fn owned_by(user_id: &str, order: &str) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("user_id", eq(user_id)),
        ("order", order.to_string()),
    ]
}

fn row_filter(user_id: &str, id: &str) -> Vec<(&'static str, String)> {
    vec![("id", eq(id)), ("user_id", eq(user_id))]
}

/// First row of an update response; an empty response means nothing matched
fn updated_row<R>(rows: Vec<R>, table: &str, id: &str) -> Result<R> {
    rows.into_iter()
        .next()
        .ok_or_else(|| anyhow!("No {} row with id {} for this user", table, id))
}

pub struct RemoteRepository {
    client: SupabaseClient,
}

impl RemoteRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }
}

#[async_trait]
impl FinanceRepository for RemoteRepository {
    fn mode(&self) -> StoreMode {
        StoreMode::Remote
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Fetched<Transaction>> {
        let rows: Vec<TransactionRow> = self
            .client
            .select(TRANSACTIONS, &owned_by(user_id, "date.desc"))
            .await?;
        debug!("Fetched {} transactions for {}", rows.len(), user_id);
        Ok(Fetched::Authoritative(rows.into_iter().map(Transaction::from).collect()))
    }

    async fn insert_transaction(&self, user_id: &str, transaction: &NewTransaction) -> Result<Transaction> {
        let now = now_timestamp();
        let row: TransactionRow = self
            .client
            .insert(TRANSACTIONS, &TransactionInsert::new(user_id, transaction, &now))
            .await?;
        info!("Inserted transaction {}", row.id);
        Ok(row.into())
    }

    async fn update_transaction(&self, user_id: &str, transaction: &Transaction) -> Result<Transaction> {
        let now = now_timestamp();
        let rows: Vec<TransactionRow> = self
            .client
            .update(
                TRANSACTIONS,
                &row_filter(user_id, &transaction.id),
                &TransactionUpdate::new(transaction, &now),
            )
            .await?;
        Ok(updated_row(rows, TRANSACTIONS, &transaction.id)?.into())
    }

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<()> {
        self.client
            .delete(TRANSACTIONS, &row_filter(user_id, transaction_id))
            .await
    }

    async fn fetch_goals(&self, user_id: &str) -> Result<Fetched<Goal>> {
        let rows: Vec<GoalRow> = self
            .client
            .select(GOALS, &owned_by(user_id, "created_at.desc"))
            .await?;
        debug!("Fetched {} goals for {}", rows.len(), user_id);
        Ok(Fetched::Authoritative(rows.into_iter().map(Goal::from).collect()))
    }

    async fn insert_goal(&self, user_id: &str, goal: &NewGoal) -> Result<Goal> {
        let row: GoalRow = self.client.insert(GOALS, &GoalWrite::insert(user_id, goal)).await?;
        info!("Inserted goal {}", row.id);
        Ok(row.into())
    }

    async fn update_goal(&self, user_id: &str, goal: &Goal) -> Result<Goal> {
        let now = now_timestamp();
        let rows: Vec<GoalRow> = self
            .client
            .update(GOALS, &row_filter(user_id, &goal.id), &GoalWrite::update(goal, &now))
            .await?;
        Ok(updated_row(rows, GOALS, &goal.id)?.into())
    }

    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<()> {
        self.client.delete(GOALS, &row_filter(user_id, goal_id)).await
    }

    async fn fetch_events(&self, user_id: &str) -> Result<Fetched<Event>> {
        let rows: Vec<EventRow> = self
            .client
            .select(EVENTS, &owned_by(user_id, "date.desc,time.desc"))
            .await?;
        debug!("Fetched {} events for {}", rows.len(), user_id);
        Ok(Fetched::Authoritative(rows.into_iter().map(Event::from).collect()))
    }

    async fn insert_event(&self, user_id: &str, event: &NewEvent) -> Result<Event> {
        let row: EventRow = self.client.insert(EVENTS, &EventWrite::insert(user_id, event)).await?;
        info!("Inserted event {}", row.id);
        Ok(row.into())
    }

    async fn update_event(&self, user_id: &str, event: &Event) -> Result<Event> {
        let now = now_timestamp();
        let rows: Vec<EventRow> = self
            .client
            .update(EVENTS, &row_filter(user_id, &event.id), &EventWrite::update(event, &now))
            .await?;
        Ok(updated_row(rows, EVENTS, &event.id)?.into())
    }

    async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        self.client.delete(EVENTS, &row_filter(user_id, event_id)).await
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<Profile> = self.client.select(PROFILES, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, user_id: &str, name: &str, avatar: &str) -> Result<Profile> {
        let body = ProfileInsert {
            user_id,
            name,
            avatar,
            whatsapp: None,
        };
        let profile: Profile = self.client.insert(PROFILES, &body).await?;
        info!("Created profile for {}", user_id);
        Ok(profile)
    }

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<Profile> {
        let now = now_timestamp();
        let rows: Vec<Profile> = self
            .client
            .update(PROFILES, &[("user_id", eq(user_id))], &ProfileUpdate::new(patch, &now))
            .await?;
        updated_row(rows, PROFILES, user_id)
    }
}
