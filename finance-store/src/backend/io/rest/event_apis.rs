//! # REST API for Calendar Events

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use log::info;
use shared::{EventPatch, NewEvent};

use super::error_response;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", put(update_event).delete(delete_event))
}

pub async fn list_events(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/events");
    Json(state.store.events().await)
}

pub async fn create_event(State(state): State<AppState>, Json(event): Json<NewEvent>) -> impl IntoResponse {
    info!("POST /api/events - request: {:?}", event);

    match state.store.add_event(event).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => error_response("Failed to create event", e),
    }
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> impl IntoResponse {
    info!("PUT /api/events/{}", id);

    match state.store.update_event(&id, patch).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => error_response("Failed to update event", e),
    }
}

pub async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/events/{}", id);

    match state.store.delete_event(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete event", e),
    }
}
