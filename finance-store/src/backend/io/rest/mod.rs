//! # REST API Interface Layer
//!
//! Every resource gets its own `*_apis` module exposing a `router()`; the
//! routers are nested under `/api` by [`crate::backend::create_router`].
//!
//! Store failures map to status codes as follows:
//!
//! | Error | Status |
//! |---|---|
//! | not authenticated | 401 |
//! | not found | 404 |
//! | validation | 400 |
//! | backend failure | 502 |
//! | session timeout | 504 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;

use crate::backend::domain::StoreError;

pub mod change_apis;
pub mod event_apis;
pub mod goal_apis;
pub mod profile_apis;
pub mod report_apis;
pub mod session_apis;
pub mod transaction_apis;

pub fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Backend(_) => StatusCode::BAD_GATEWAY,
        StoreError::SessionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

pub fn error_response(context: &str, err: StoreError) -> Response {
    error!("{}: {}", context, err);
    (status_for(&err), err.to_string()).into_response()
}
