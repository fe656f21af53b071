//! # REST API for the Store Session
//!
//! Read model, sync after sign-in, and logout.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;
use shared::SyncResponse;

use super::error_response;
use crate::backend::domain::SyncOutcome;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/sync", post(sync))
        .route("/logout", post(logout))
}

pub async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.summary().await)
}

pub async fn sync(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/sync");

    match state.store.sync().await {
        Ok(outcome) => {
            let (synced, user_id) = match outcome {
                SyncOutcome::Synced { user_id } => (true, Some(user_id)),
                SyncOutcome::NoSession => (false, None),
            };
            let response = SyncResponse {
                synced,
                user_id,
                summary: state.store.summary().await,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Sync failed", e),
    }
}

/// Forget the user and every record held for them
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/logout");
    state.store.set_current_user_id(None).await;
    state.store.clear_store().await;
    Json(state.store.summary().await)
}
