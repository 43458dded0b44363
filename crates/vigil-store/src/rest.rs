//! HTTP transport for the remote backend, behind a trait so adapter logic
//! is testable without a network.
//!
//! The wire protocol is PostgREST-flavored: rows are posted as JSON to
//! `{base}/rest/v1/{table}`, filtered and ordered via query parameters.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::adapter::{StoreError, StoreResult};
use crate::rows::{ActivityRow, SessionRow};

#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Cheap connectivity check used by `initialize`.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_session(&self, row: SessionRow) -> StoreResult<()>;

    async fn update_session(&self, session_id: &str, row: SessionRow) -> StoreResult<()>;

    /// One write for the whole batch.
    async fn insert_events(&self, rows: Vec<ActivityRow>) -> StoreResult<()>;

    async fn list_sessions(&self, call_url: &str) -> StoreResult<Vec<SessionRow>>;

    async fn fetch_session(&self, session_id: &str) -> StoreResult<Option<SessionRow>>;

    async fn fetch_events(&self, session_id: &str) -> StoreResult<Vec<ActivityRow>>;
}

pub struct RestApi {
    client: reqwest::Client,
    base: String,
    api_key: String,
}

impl RestApi {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Connectivity(format!(
            "backend returned {status}: {body}"
        )))
    }

    fn transport_err(err: reqwest::Error) -> StoreError {
        StoreError::Connectivity(err.to_string())
    }
}

#[async_trait]
impl RemoteApi for RestApi {
    async fn ping(&self) -> StoreResult<()> {
        let response = self
            .authed(self.client.get(self.table_url("sessions")))
            .query(&[("select", "session_id"), ("limit", "1")])
            .send()
            .await
            .map_err(Self::transport_err)?;
        // An empty table is a healthy backend; only transport and auth
        // failures count.
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::Connectivity(
                "sessions table not found".to_string(),
            ));
        }
        Self::check(response).await.map(|_| ())
    }

    async fn insert_session(&self, row: SessionRow) -> StoreResult<()> {
        let response = self
            .authed(self.client.post(self.table_url("sessions")))
            .json(&row)
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::check(response).await.map(|_| ())
    }

    async fn update_session(&self, session_id: &str, row: SessionRow) -> StoreResult<()> {
        let response = self
            .authed(self.client.patch(self.table_url("sessions")))
            .query(&[("session_id", format!("eq.{session_id}"))])
            .json(&row)
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::check(response).await.map(|_| ())
    }

    async fn insert_events(&self, rows: Vec<ActivityRow>) -> StoreResult<()> {
        let response = self
            .authed(self.client.post(self.table_url("user_activities")))
            .json(&rows)
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::check(response).await.map(|_| ())
    }

    async fn list_sessions(&self, call_url: &str) -> StoreResult<Vec<SessionRow>> {
        let response = self
            .authed(self.client.get(self.table_url("sessions")))
            .query(&[
                ("call_url", format!("eq.{call_url}")),
                ("order", "start_time.desc".to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_err)
    }

    async fn fetch_session(&self, session_id: &str) -> StoreResult<Option<SessionRow>> {
        let response = self
            .authed(self.client.get(self.table_url("sessions")))
            .query(&[
                ("session_id", format!("eq.{session_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport_err)?;
        let mut rows: Vec<SessionRow> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_err)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn fetch_events(&self, session_id: &str) -> StoreResult<Vec<ActivityRow>> {
        let response = self
            .authed(self.client.get(self.table_url("user_activities")))
            .query(&[
                ("session_id", format!("eq.{session_id}")),
                ("order", "timestamp.asc".to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_err)
    }
}
