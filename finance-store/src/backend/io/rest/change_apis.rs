//! # Change Notification Webhook
//!
//! The hosted database posts a payload for every row change:
//!
//! ```json
//! { "type": "INSERT", "table": "transactions", "record": {...}, "old_record": null }
//! ```
//!
//! The owning `user_id` is taken from `record` (or `old_record` for
//! deletes) and the change is published on that user's channel. Tables
//! without a subscription channel are accepted and ignored.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::storage::{ChangeEvent, ChangeKind, Table};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(receive_change))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePayload {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub table: String,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
}

impl ChangePayload {
    fn user_id(&self) -> Option<String> {
        [&self.record, &self.old_record]
            .into_iter()
            .flatten()
            .find_map(|row| row.get("user_id").and_then(Value::as_str))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReceipt {
    pub delivered: usize,
}

pub async fn receive_change(State(state): State<AppState>, Json(payload): Json<ChangePayload>) -> impl IntoResponse {
    info!("POST /api/changes - {:?} on {}", payload.kind, payload.table);

    let Some(table) = Table::parse(&payload.table) else {
        debug!("No channel for table {}, ignoring", payload.table);
        return (StatusCode::OK, Json(ChangeReceipt { delivered: 0 })).into_response();
    };
    let Some(user_id) = payload.user_id() else {
        return (StatusCode::BAD_REQUEST, "Change payload has no user_id").into_response();
    };

    let delivered = state.change_feed.publish(ChangeEvent {
        table,
        user_id,
        kind: payload.kind,
    });
    (StatusCode::OK, Json(ChangeReceipt { delivered })).into_response()
}
