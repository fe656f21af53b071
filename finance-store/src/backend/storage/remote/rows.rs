//! Row shapes of the hosted tables and their translation to the client
//! model. The tables use `user_id`, `created_at`, `updated_at` and
//! snake_case amounts; numeric columns may arrive as JSON strings.

use chrono::{NaiveDate, NaiveTime};
use serde::{de::Error, Deserialize, Deserializer, Serialize};
use shared::{
    Event, EventType, Goal, NewEvent, NewGoal, NewTransaction, ProfilePatch, Transaction,
    TransactionCategory, TransactionType,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn into_f64<E: Error>(self) -> Result<f64, E> {
        match self {
            Numeric::Number(value) => Ok(value),
            Numeric::Text(text) => text.trim().parse().map_err(E::custom),
        }
    }
}

fn numeric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Numeric::deserialize(deserializer)?.into_f64()
}

fn optional_numeric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Option::<Numeric>::deserialize(deserializer)?
        .map(Numeric::into_f64)
        .transpose()
}

fn skip_absent<T>(value: &Option<T>) -> bool {
    value.is_none()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub description: String,
    #[serde(deserialize_with = "numeric")]
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            description: row.description,
            amount: row.amount,
            category: row.category,
            transaction_type: row.transaction_type,
            date: row.date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionInsert<'a> {
    pub user_id: &'a str,
    pub description: &'a str,
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl<'a> TransactionInsert<'a> {
    pub fn new(user_id: &'a str, transaction: &'a NewTransaction, now: &str) -> Self {
        Self {
            user_id,
            description: &transaction.description,
            amount: transaction.amount,
            category: transaction.category,
            transaction_type: transaction.transaction_type,
            date: transaction.date,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionUpdate<'a> {
    pub description: &'a str,
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub updated_at: String,
}

impl<'a> TransactionUpdate<'a> {
    pub fn new(transaction: &'a Transaction, now: &str) -> Self {
        Self {
            description: &transaction.description,
            amount: transaction.amount,
            category: transaction.category,
            transaction_type: transaction.transaction_type,
            date: transaction.date,
            updated_at: now.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalRow {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "numeric")]
    pub target_amount: f64,
    #[serde(deserialize_with = "numeric")]
    pub current_amount: f64,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub recurring: Option<bool>,
}

impl From<GoalRow> for Goal {
    fn from(row: GoalRow) -> Self {
        Goal {
            id: row.id,
            name: row.name,
            target_amount: row.target_amount,
            current_amount: row.current_amount,
            deadline: row.deadline,
            recurring: row.recurring.unwrap_or(false),
        }
    }
}

/// Goal fields as written; `target_amount`/`current_amount` are the
/// table's names for the client's `targetAmount`/`currentAmount`.
#[derive(Debug, Clone, Serialize)]
pub struct GoalWrite<'a> {
    #[serde(skip_serializing_if = "skip_absent")]
    pub user_id: Option<&'a str>,
    pub name: &'a str,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: NaiveDate,
    pub recurring: bool,
    #[serde(skip_serializing_if = "skip_absent")]
    pub updated_at: Option<String>,
}

impl<'a> GoalWrite<'a> {
    pub fn insert(user_id: &'a str, goal: &'a NewGoal) -> Self {
        Self {
            user_id: Some(user_id),
            name: &goal.name,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            deadline: goal.deadline,
            recurring: goal.recurring,
            updated_at: None,
        }
    }

    pub fn update(goal: &'a Goal, now: &str) -> Self {
        Self {
            user_id: None,
            name: &goal.name,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            deadline: goal.deadline,
            recurring: goal.recurring,
            updated_at: Some(now.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, deserialize_with = "optional_numeric")]
    pub amount: Option<f64>,
    #[serde(with = "shared::time_of_day")]
    pub time: NaiveTime,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            date: row.date,
            title: row.title,
            description: row.description.unwrap_or_default(),
            event_type: row.event_type,
            amount: row.amount,
            time: row.time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventWrite<'a> {
    #[serde(skip_serializing_if = "skip_absent")]
    pub user_id: Option<&'a str>,
    pub date: NaiveDate,
    pub title: &'a str,
    pub description: &'a str,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub amount: Option<f64>,
    #[serde(with = "shared::time_of_day")]
    pub time: NaiveTime,
    #[serde(skip_serializing_if = "skip_absent")]
    pub updated_at: Option<String>,
}

impl<'a> EventWrite<'a> {
    pub fn insert(user_id: &'a str, event: &'a NewEvent) -> Self {
        Self {
            user_id: Some(user_id),
            date: event.date,
            title: &event.title,
            description: &event.description,
            event_type: event.event_type,
            amount: event.amount,
            time: event.time,
            updated_at: None,
        }
    }

    pub fn update(event: &'a Event, now: &str) -> Self {
        Self {
            user_id: None,
            date: event.date,
            title: &event.title,
            description: &event.description,
            event_type: event.event_type,
            amount: event.amount,
            time: event.time,
            updated_at: Some(now.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileInsert<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub avatar: &'a str,
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate<'a> {
    #[serde(skip_serializing_if = "skip_absent")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "skip_absent")]
    pub avatar: Option<&'a str>,
    #[serde(skip_serializing_if = "skip_absent")]
    pub whatsapp: Option<Option<&'a str>>,
    pub updated_at: String,
}

impl<'a> ProfileUpdate<'a> {
    pub fn new(patch: &'a ProfilePatch, now: &str) -> Self {
        Self {
            name: patch.name.as_deref(),
            avatar: patch.avatar.as_deref(),
            whatsapp: patch.whatsapp.as_ref().map(|value| value.as_deref()),
            updated_at: now.to_string(),
        }
    }
}
