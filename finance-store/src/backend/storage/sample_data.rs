//! Bundled sample records used to seed offline/demo mode on first run.

use chrono::{NaiveDate, NaiveTime};
use shared::{Event, EventType, Goal, Transaction, TransactionCategory, TransactionType};

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default()
}

fn transaction(
    id: &str,
    description: &str,
    amount: f64,
    category: TransactionCategory,
    date: NaiveDate,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        description: description.to_string(),
        amount,
        category,
        transaction_type: TransactionType::from_amount(amount),
        date,
    }
}

pub fn sample_transactions() -> Vec<Transaction> {
    vec![
        transaction("1", "Grocery run", -130.0, TransactionCategory::Groceries, day(2025, 10, 10)),
        transaction("2", "Freelance", 500.0, TransactionCategory::Freelance, day(2025, 10, 10)),
        transaction("3", "Rent", -800.0, TransactionCategory::Housing, day(2025, 10, 5)),
        transaction("4", "Salary", 3000.0, TransactionCategory::Freelance, day(2025, 10, 1)),
    ]
}

pub fn sample_goals() -> Vec<Goal> {
    vec![
        Goal {
            id: "1".to_string(),
            name: "65\" TV".to_string(),
            target_amount: 3500.0,
            current_amount: 650.0,
            deadline: day(2025, 10, 29),
            recurring: false,
        },
        Goal {
            id: "2".to_string(),
            name: "Gaming PC".to_string(),
            target_amount: 7500.0,
            current_amount: 50.0,
            deadline: day(2025, 10, 29),
            recurring: false,
        },
    ]
}

pub fn sample_events() -> Vec<Event> {
    vec![
        Event {
            id: "1".to_string(),
            date: day(2025, 10, 13),
            title: "Rent payment".to_string(),
            description: "Monthly rent".to_string(),
            event_type: EventType::Payment,
            amount: Some(800.0),
            time: at(9),
        },
        Event {
            id: "2".to_string(),
            date: day(2025, 10, 15),
            title: "TV goal milestone".to_string(),
            description: "Goal milestone".to_string(),
            event_type: EventType::Goal,
            amount: None,
            time: at(10),
        },
        Event {
            id: "3".to_string(),
            date: day(2025, 10, 20),
            title: "Freelance".to_string(),
            description: "Project payout".to_string(),
            event_type: EventType::Payment,
            amount: Some(500.0),
            time: at(14),
        },
        Event {
            id: "4".to_string(),
            date: day(2025, 10, 25),
            title: "Groceries".to_string(),
            description: "Monthly shopping".to_string(),
            event_type: EventType::Payment,
            amount: Some(150.0),
            time: at(16),
        },
    ]
}
