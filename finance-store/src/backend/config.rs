//! Environment configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `SUPABASE_URL` / `SUPABASE_ANON_KEY` | unset: offline mode |
//! | `SUPABASE_ACCESS_TOKEN` | unset: requests use the anon key |
//! | `FINANCE_DATA_DIR` | `<platform data dir>/finance-tracker` |
//! | `FINANCE_BIND_ADDR` | `127.0.0.1:3000` |
//! | `FINANCE_SESSION_TIMEOUT_MS` | `3000` |
//! | `FINANCE_DEMO_AUTH` | `false` |

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::domain::session::DEFAULT_SESSION_TIMEOUT;

const HOSTED_DOMAIN: &str = "supabase.co";
const MIN_KEY_LENGTH: usize = 50;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DATA_DIR_NAME: &str = "finance-tracker";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub access_token: Option<String>,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub session_timeout: Duration,
    pub demo_auth: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = match get("FINANCE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME),
        };

        let bind_addr = get("FINANCE_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("FINANCE_BIND_ADDR is not a valid socket address")?;

        let session_timeout = match get("FINANCE_SESSION_TIMEOUT_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .context("FINANCE_SESSION_TIMEOUT_MS must be a number of milliseconds")?,
            ),
            None => DEFAULT_SESSION_TIMEOUT,
        };

        let demo_auth = get("FINANCE_DEMO_AUTH")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            supabase_url: get("SUPABASE_URL"),
            supabase_anon_key: get("SUPABASE_ANON_KEY"),
            access_token: get("SUPABASE_ACCESS_TOKEN"),
            data_dir,
            bind_addr,
            session_timeout,
            demo_auth,
        })
    }

    /// Whether the hosted backend is configured. Decided once at startup.
    pub fn remote_configured(&self) -> bool {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => url.contains(HOSTED_DOMAIN) && key.len() > MIN_KEY_LENGTH,
            _ => false,
        }
    }
}
