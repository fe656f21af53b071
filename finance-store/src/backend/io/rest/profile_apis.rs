//! # REST API for the User Profile

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use shared::ProfilePatch;

use super::error_response;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

pub async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/profile");

    match state.profile_service.load_or_create().await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response("Failed to load profile", e),
    }
}

pub async fn update_profile(State(state): State<AppState>, Json(patch): Json<ProfilePatch>) -> impl IntoResponse {
    info!("PUT /api/profile - request: {:?}", patch);

    match state.profile_service.update(patch).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response("Failed to update profile", e),
    }
}
