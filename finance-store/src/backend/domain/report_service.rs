//! Report aggregation and export of transaction data.
//!
//! Reports are computed from the store's held transactions; nothing is
//! fetched. Date ranges are inclusive on both ends.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use log::info;
use shared::{
    ExportFormat, FinancialReport, MonthlyReportRow, ReportFilter, ReportTotals, Transaction,
    TransactionCategory,
};
use std::collections::BTreeSet;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn filter_transactions<'a>(transactions: &'a [Transaction], filter: &ReportFilter) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| t.date >= filter.start && t.date <= filter.end)
        .filter(|t| filter.category.map_or(true, |category| t.category == category))
        .collect()
}

fn split_totals<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> ReportTotals {
    let mut totals = ReportTotals::default();
    for t in transactions {
        if t.amount > 0.0 {
            totals.income += t.amount;
        } else {
            totals.expenses += t.amount.abs();
        }
    }
    totals.balance = totals.income - totals.expenses;
    totals
}

pub fn build_report(transactions: &[Transaction], filter: &ReportFilter) -> FinancialReport {
    let selected = filter_transactions(transactions, filter);
    let totals = split_totals(selected.iter().copied());

    let monthly = MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let month = index as u32 + 1;
            let totals = split_totals(selected.iter().copied().filter(|t| t.date.month() == month));
            MonthlyReportRow {
                month,
                month_name: name.to_string(),
                income: totals.income,
                expenses: totals.expenses,
                balance: totals.balance,
            }
        })
        .collect();

    let savings_rate = if totals.income > 0.0 {
        (totals.income - totals.expenses) / totals.income * 100.0
    } else {
        0.0
    };

    let categories: BTreeSet<TransactionCategory> = selected.iter().map(|t| t.category).collect();

    FinancialReport {
        filter: filter.clone(),
        total_income: totals.income,
        total_expenses: totals.expenses,
        savings_rate,
        monthly,
        yearly_totals: totals,
        categories: categories.into_iter().collect(),
    }
}

/// CSV with columns `Date,Description,Category,Amount`
pub fn export_csv(transactions: &[Transaction], filter: &ReportFilter) -> Result<String> {
    let selected = filter_transactions(transactions, filter);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Date", "Description", "Category", "Amount"])?;
    for t in &selected {
        writer.write_record([
            t.date.format("%Y-%m-%d").to_string(),
            t.description.clone(),
            t.category.to_string(),
            format!("{:.2}", t.amount),
        ])?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV export")?;
    info!("📄 EXPORT: {} transactions as CSV", selected.len());
    Ok(String::from_utf8(bytes)?)
}

pub fn export_json(transactions: &[Transaction], filter: &ReportFilter) -> Result<String> {
    let selected = filter_transactions(transactions, filter);
    info!("📄 EXPORT: {} transactions as JSON", selected.len());
    Ok(serde_json::to_string_pretty(&selected)?)
}

pub fn export(transactions: &[Transaction], filter: &ReportFilter, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => export_csv(transactions, filter),
        ExportFormat::Json => export_json(transactions, filter),
    }
}

pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    };
    format!("financial-report-{}.{}", date.format("%Y-%m-%d"), extension)
}
