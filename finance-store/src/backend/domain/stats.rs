//! Aggregate math over the transaction list.
//!
//! Balance is the plain sum of signed amounts. Monthly totals only look at
//! transactions in the calendar month and year of `today`, regardless of
//! the date range the data covers.

use chrono::{Datelike, Local, NaiveDate};
use shared::Transaction;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyTotals {
    pub income: f64,
    /// Sum of expense magnitudes, reported as a positive number
    pub expenses: f64,
}

pub fn total_balance(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(|t| t.amount).sum()
}

pub fn monthly_totals(transactions: &[Transaction], today: NaiveDate) -> MonthlyTotals {
    transactions
        .iter()
        .filter(|t| t.date.year() == today.year() && t.date.month() == today.month())
        .fold(MonthlyTotals::default(), |mut totals, t| {
            if t.amount > 0.0 {
                totals.income += t.amount;
            } else {
                totals.expenses += t.amount.abs();
            }
            totals
        })
}

/// The local wall-clock date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
