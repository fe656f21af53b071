use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use finance_store::backend::config::AppConfig;
use finance_store::backend::domain::{bootstrap, SessionStatus};
use finance_store::backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; `log` records from the library are captured too
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Starting finance store ({} mode)",
        if config.remote_configured() { "remote" } else { "offline" }
    );

    let state = initialize_backend(&config)?;

    let session = bootstrap(state.sessions.clone(), config.session_timeout).await;
    state.store.init(session.user_id()).await;
    match &session {
        SessionStatus::SignedIn(_) => {
            if let Err(e) = state.store.sync().await {
                warn!("Initial sync finished with an error: {}", e);
            }
        }
        SessionStatus::SignedOut => info!("Waiting for sign-in before syncing"),
        SessionStatus::Unavailable(e) => warn!("Starting without a session: {}", e),
    }

    let app = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    state.store.teardown().await;
    info!("Server stopped");
    Ok(())
}
