use anyhow::Result;
use async_trait::async_trait;

use super::client::SupabaseClient;
use crate::backend::storage::traits::{SessionProvider, SessionUser};

/// Session provider backed by the hosted auth service
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionProvider for SupabaseAuth {
    async fn current_user(&self) -> Result<Option<SessionUser>> {
        self.client.get_user().await
    }
}
