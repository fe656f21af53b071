//! Startup session check.
//!
//! The auth lookup is the only call guarded by a hard timeout: a hanging
//! auth service must not keep the app from starting.

use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::domain::error::StoreError;
use crate::backend::storage::{SessionProvider, SessionUser};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    SignedIn(SessionUser),
    SignedOut,
    /// The check failed or timed out; carries the reason
    Unavailable(StoreError),
}

impl SessionStatus {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            SessionStatus::SignedIn(user) => Some(&user.id),
            _ => None,
        }
    }
}

pub async fn bootstrap(provider: Arc<dyn SessionProvider>, timeout: Duration) -> SessionStatus {
    match tokio::time::timeout(timeout, provider.current_user()).await {
        Ok(Ok(Some(user))) => {
            info!("Session found for {}", user.email.as_deref().unwrap_or(&user.id));
            SessionStatus::SignedIn(user)
        }
        Ok(Ok(None)) => {
            info!("No active session");
            SessionStatus::SignedOut
        }
        Ok(Err(e)) => {
            warn!("Session check failed: {}", e);
            SessionStatus::Unavailable(e.into())
        }
        Err(_) => {
            warn!("Session check timed out after {:?}", timeout);
            SessionStatus::Unavailable(StoreError::SessionTimeout(timeout))
        }
    }
}
