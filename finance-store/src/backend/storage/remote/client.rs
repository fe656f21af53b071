//! Thin HTTP client for the hosted backend's auto-generated REST API
//! (PostgREST conventions) and its auth endpoint.

use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::storage::traits::SessionUser;

/// PostgREST equality filter value
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Extract the backend's own message from an error response body
pub fn backend_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.msg).or(parsed.error_description))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("Backend request failed with status {}", status))
}

#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, access_token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token,
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request.header("apikey", &self.anon_key).bearer_auth(token)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!(backend_error_message(status, &body)))
    }

    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        debug!("SELECT {} {:?}", table, query);
        let response = self
            .authorized(self.http.get(self.table_url(table)))
            .query(query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Insert one row and return it as stored
    pub async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T> {
        debug!("INSERT {}", table);
        let response = self
            .authorized(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let mut rows: Vec<T> = Self::check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(anyhow!("Backend returned no row for insert into {}", table));
        }
        Ok(rows.remove(0))
    }

    /// Update rows matching `filters` and return them as stored
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>> {
        debug!("UPDATE {} {:?}", table, filters);
        let response = self
            .authorized(self.http.patch(self.table_url(table)))
            .query(filters)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete(&self, table: &str, filters: &[(&str, String)]) -> Result<()> {
        debug!("DELETE {} {:?}", table, filters);
        let response = self
            .authorized(self.http.delete(self.table_url(table)))
            .query(filters)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// The user owning the access token, `None` when there is no valid session
    pub async fn get_user(&self) -> Result<Option<SessionUser>> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let response = self.authorized(self.http.get(self.auth_user_url())).send().await?;
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        Ok(Some(Self::check(response).await?.json().await?))
    }
}
