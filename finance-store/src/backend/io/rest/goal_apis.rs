//! # REST API for Goal Management
//!
//! CRUD plus the contribute/cancel workflows and an overview of progress.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use log::info;
use shared::{ContributeToGoalRequest, GoalPatch, NewGoal};

use super::error_response;
use crate::backend::AppState;

/// Create a router for goal related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route("/overview", get(get_overview))
        .route("/:id", put(update_goal).delete(delete_goal))
        .route("/:id/contribute", post(contribute_to_goal))
        .route("/:id/cancel", post(cancel_goal))
}

pub async fn list_goals(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/goals");
    Json(state.store.goals().await)
}

/// Create a goal; its deadline also lands on the calendar
pub async fn create_goal(State(state): State<AppState>, Json(goal): Json<NewGoal>) -> impl IntoResponse {
    info!("POST /api/goals - request: {:?}", goal);

    match state.store.add_goal(goal).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => error_response("Failed to create goal", e),
    }
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<GoalPatch>,
) -> impl IntoResponse {
    info!("PUT /api/goals/{}", id);

    match state.store.update_goal(&id, patch).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => error_response("Failed to update goal", e),
    }
}

pub async fn delete_goal(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/goals/{}", id);

    match state.store.delete_goal(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete goal", e),
    }
}

pub async fn contribute_to_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ContributeToGoalRequest>,
) -> impl IntoResponse {
    info!("POST /api/goals/{}/contribute - amount: {:.2}", id, request.amount);

    match state.goal_service.contribute(&id, request.amount).await {
        Ok(goal) => (StatusCode::OK, Json(goal)).into_response(),
        Err(e) => error_response("Failed to contribute to goal", e),
    }
}

/// Cancel a goal, refunding its savings
pub async fn cancel_goal(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("POST /api/goals/{}/cancel", id);

    match state.goal_service.cancel(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to cancel goal", e),
    }
}

pub async fn get_overview(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/goals/overview");
    Json(state.goal_service.overview().await)
}
