//! # REST API for Reports and Export

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use log::{error, info};
use serde::Deserialize;
use shared::{ExportFormat, ReportFilter, TransactionCategory};

use crate::backend::domain::report_service::{build_report, export, export_filename};
use crate::backend::domain::stats::today;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_report))
        .route("/export", get(export_report))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub category: Option<TransactionCategory>,
    #[serde(default)]
    pub format: Option<ExportFormat>,
}

pub async fn get_report(State(state): State<AppState>, Query(filter): Query<ReportFilter>) -> impl IntoResponse {
    info!("GET /api/reports - filter: {:?}", filter);
    if filter.start > filter.end {
        return (StatusCode::BAD_REQUEST, "Report start date is after end date").into_response();
    }
    let transactions = state.store.transactions().await;
    Json(build_report(&transactions, &filter)).into_response()
}

/// Download the filtered transactions as an attachment (CSV by default)
pub async fn export_report(State(state): State<AppState>, Query(query): Query<ExportQuery>) -> impl IntoResponse {
    info!("GET /api/reports/export - query: {:?}", query);

    let format = query.format.unwrap_or(ExportFormat::Csv);
    let filter = ReportFilter {
        start: query.start,
        end: query.end,
        category: query.category,
    };
    let transactions = state.store.transactions().await;

    match export(&transactions, &filter, format) {
        Ok(content) => {
            let content_type = match format {
                ExportFormat::Csv => "text/csv; charset=utf-8",
                ExportFormat::Json => "application/json",
            };
            let disposition = format!("attachment; filename=\"{}\"", export_filename(format, today()));
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
                content,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to export report: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error exporting report").into_response()
        }
    }
}
