use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Spending/earning bucket of a transaction.
///
/// Rows written by older clients use the Portuguese labels, which are
/// accepted as aliases on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionCategory {
    #[serde(alias = "Moradia")]
    Housing,
    #[serde(alias = "Mercado")]
    Groceries,
    Freelance,
    #[serde(alias = "Outros")]
    Other,
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionCategory::Housing => "Housing",
            TransactionCategory::Groceries => "Groceries",
            TransactionCategory::Freelance => "Freelance",
            TransactionCategory::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Direction of a transaction. Redundant with the sign of the amount by UI convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Type implied by the sign of an amount (zero counts as income)
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }
}

/// A single dated monetary movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub description: String,
    /// Signed amount (positive for income, negative for expense)
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Calendar day (YYYY-MM-DD)
    pub date: NaiveDate,
}

/// Input for creating a transaction; the id is assigned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn with_id(self, id: String) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            category: self.category,
            transaction_type: self.transaction_type,
            date: self.date,
        }
    }
}

/// Partial update of a transaction. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<TransactionCategory>,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn apply_to(&self, transaction: &Transaction) -> Transaction {
        let mut updated = transaction.clone();
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(amount) = self.amount {
            updated.amount = amount;
        }
        if let Some(category) = self.category {
            updated.category = category;
        }
        if let Some(transaction_type) = self.transaction_type {
            updated.transaction_type = transaction_type;
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        updated
    }
}

/// Request body for creating a transaction over the local API.
///
/// `type` defaults to the one implied by the amount sign and `date` to today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub description: String,
    pub amount: f64,
    pub category: TransactionCategory,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A savings target with a deadline and progress amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: NaiveDate,
    /// Stored but not used by any operation
    #[serde(default)]
    pub recurring: bool,
}

impl Goal {
    /// Progress towards the target as a percentage (may exceed 100)
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        self.current_amount / self.target_amount * 100.0
    }

    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub recurring: bool,
}

impl NewGoal {
    pub fn with_id(self, id: String) -> Goal {
        Goal {
            id,
            name: self.name,
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            deadline: self.deadline,
            recurring: self.recurring,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_amount: Option<f64>,
    #[serde(default)]
    pub current_amount: Option<f64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub recurring: Option<bool>,
}

impl GoalPatch {
    pub fn apply_to(&self, goal: &Goal) -> Goal {
        let mut updated = goal.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(target_amount) = self.target_amount {
            updated.target_amount = target_amount;
        }
        if let Some(current_amount) = self.current_amount {
            updated.current_amount = current_amount;
        }
        if let Some(deadline) = self.deadline {
            updated.deadline = deadline;
        }
        if let Some(recurring) = self.recurring {
            updated.recurring = recurring;
        }
        updated
    }
}

/// Request body for adding money to a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributeToGoalRequest {
    pub amount: f64,
}

/// Aggregated progress over all goals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalOverview {
    pub goal_count: usize,
    pub total_saved: f64,
    pub total_target: f64,
    /// Percentage, 0 when there is no target at all
    pub overall_progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Payment,
    Goal,
    Reminder,
}

/// A calendar entry, optionally tied to a monetary amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Only meaningful for payments
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(with = "time_of_day")]
    pub time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(with = "time_of_day")]
    pub time: NaiveTime,
}

impl NewEvent {
    pub fn with_id(self, id: String) -> Event {
        Event {
            id,
            date: self.date,
            title: self.title,
            description: self.description,
            event_type: self.event_type,
            amount: self.amount,
            time: self.time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub event_type: Option<EventType>,
    /// `Some(None)` clears the amount, `None` leaves it untouched
    #[serde(default, deserialize_with = "deserialize_some")]
    pub amount: Option<Option<f64>>,
    #[serde(default, with = "optional_time_of_day")]
    pub time: Option<NaiveTime>,
}

impl EventPatch {
    pub fn apply_to(&self, event: &Event) -> Event {
        let mut updated = event.clone();
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(event_type) = self.event_type {
            updated.event_type = event_type;
        }
        if let Some(amount) = self.amount {
            updated.amount = amount;
        }
        if let Some(time) = self.time {
            updated.time = time;
        }
        updated
    }
}

/// Per-user profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub whatsapp: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn apply_to(&self, profile: &Profile) -> Profile {
        let mut updated = profile.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(avatar) = &self.avatar {
            updated.avatar = avatar.clone();
        }
        if let Some(whatsapp) = &self.whatsapp {
            updated.whatsapp = whatsapp.clone();
        }
        updated
    }
}

/// Read model of the store: derived totals plus status flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub transaction_count: usize,
    pub goal_count: usize,
    pub event_count: usize,
    pub is_loading: bool,
    pub error: Option<String>,
    pub current_user_id: Option<String>,
    pub remote: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub synced: bool,
    pub user_id: Option<String>,
    pub summary: FinanceSummary,
}

/// Filter for financial reports (inclusive date range)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub category: Option<TransactionCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReportRow {
    /// 1 = January
    pub month: u32,
    pub month_name: String,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub filter: ReportFilter,
    pub total_income: f64,
    pub total_expenses: f64,
    /// Percentage of income kept, 0 when there is no income
    pub savings_rate: f64,
    pub monthly: Vec<MonthlyReportRow>,
    pub yearly_totals: ReportTotals,
    pub categories: Vec<TransactionCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Any value present in the input (including `null`) becomes `Some`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Times of day travel as `HH:MM`; the hosted database returns `HH:MM:SS`.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }
}

mod optional_time_of_day {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => super::time_of_day::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| super::time_of_day::parse(&value).map_err(D::Error::custom))
            .transpose()
    }
}
