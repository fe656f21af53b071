//! # REST API for Transactions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use log::info;
use shared::{CreateTransactionRequest, NewTransaction, TransactionPatch, TransactionType};

use super::error_response;
use crate::backend::domain::stats::today;
use crate::backend::AppState;

/// Create a router for transaction related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/:id", put(update_transaction).delete(delete_transaction))
}

pub async fn list_transactions(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/transactions");
    Json(state.store.transactions().await)
}

/// Create a transaction. Type defaults to the sign of the amount and date
/// to today.
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions - request: {:?}", request);

    let transaction = NewTransaction {
        description: request.description,
        amount: request.amount,
        category: request.category,
        transaction_type: request
            .transaction_type
            .unwrap_or_else(|| TransactionType::from_amount(request.amount)),
        date: request.date.unwrap_or_else(today),
    };

    match state.store.add_transaction(transaction).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => error_response("Failed to create transaction", e),
    }
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TransactionPatch>,
) -> impl IntoResponse {
    info!("PUT /api/transactions/{}", id);

    match state.store.update_transaction(&id, patch).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => error_response("Failed to update transaction", e),
    }
}

pub async fn delete_transaction(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/transactions/{}", id);

    match state.store.delete_transaction(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete transaction", e),
    }
}
