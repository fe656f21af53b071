//! # Backend Module
//!
//! All non-UI logic of the finance tracker.
//!
//! ```text
//! UI (any client of the local REST API)
//!     ↓
//! IO Layer (REST handlers, change webhook)
//!     ↓
//! Domain Layer (FinanceStore, goal/report/profile workflows)
//!     ↓
//! Storage Layer (hosted backend or offline repository, JSON snapshot)
//! ```
//!
//! The repository strategy is picked once here, from configuration, and
//! never revisited while the process runs.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::config::AppConfig;
use crate::backend::domain::{FinanceStore, GoalService, ProfileService};
use crate::backend::io::rest::{
    change_apis, event_apis, goal_apis, profile_apis, report_apis, session_apis, transaction_apis,
};
use crate::backend::storage::{
    BroadcastChangeFeed, ChangeFeed, DemoSession, FinanceRepository, JsonFileSnapshotStorage,
    LocalRepository, RemoteRepository, SessionProvider, SupabaseAuth, SupabaseClient,
};

const UI_ORIGIN: &str = "http://localhost:8080";

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub store: FinanceStore,
    pub goal_service: GoalService,
    pub profile_service: ProfileService,
    pub change_feed: Arc<dyn ChangeFeed>,
    pub sessions: Arc<dyn SessionProvider>,
}

impl AppState {
    pub fn new(store: FinanceStore, change_feed: Arc<dyn ChangeFeed>, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            goal_service: GoalService::new(store.clone()),
            profile_service: ProfileService::new(store.clone()),
            store,
            change_feed,
            sessions,
        }
    }
}

/// Wire storage, session provider and store for the configured mode
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up snapshot storage in {}", config.data_dir.display());
    let snapshots = Arc::new(JsonFileSnapshotStorage::new(&config.data_dir)?);
    let change_feed: Arc<dyn ChangeFeed> = Arc::new(BroadcastChangeFeed::new());

    let (repository, sessions): (Arc<dyn FinanceRepository>, Arc<dyn SessionProvider>) =
        match (&config.supabase_url, &config.supabase_anon_key) {
            (Some(url), Some(key)) if config.remote_configured() => {
                info!("Hosted backend configured at {}", url);
                let client = SupabaseClient::new(url, key, config.access_token.clone())?;
                (
                    Arc::new(RemoteRepository::new(client.clone())),
                    Arc::new(SupabaseAuth::new(client)),
                )
            }
            _ => {
                info!("No hosted backend configured, running offline");
                (Arc::new(LocalRepository::new()), Arc::new(DemoSession::new(config.demo_auth)))
            }
        };

    let store = FinanceStore::builder(repository)
        .snapshots(snapshots)
        .change_feed(Arc::clone(&change_feed))
        .sessions(Arc::clone(&sessions))
        .build();

    Ok(AppState::new(store, change_feed, sessions))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow the UI to make requests
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static(UI_ORIGIN))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(session_apis::router())
        .nest("/transactions", transaction_apis::router())
        .nest("/goals", goal_apis::router())
        .nest("/events", event_apis::router())
        .nest("/reports", report_apis::router())
        .nest("/profile", profile_apis::router())
        .nest("/changes", change_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
