//! Client for the hosted REST + auth API

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{AuthSession, AuthUser, Backend, BackendError, Credentials, Query, Table};

/// Backend that forwards every call to the hosted service
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// Sign-up responses carry either a bare user or a session wrapping one,
/// depending on whether email confirmation is required.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

impl RestBackend {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cryptoblog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach the project key, and the user's token when there is one
    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    /// Build the request for a select
    pub fn build_select(
        &self,
        table: Table,
        query: &Query,
    ) -> Result<reqwest::Request, reqwest::Error> {
        self.authorize(self.client.get(self.table_url(table)), None)
            .query(&query.to_query_pairs())
            .build()
    }

    /// Build a write request targeting a single row by id
    pub fn build_row_write(
        &self,
        method: Method,
        table: Table,
        id: i64,
        row: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Request, reqwest::Error> {
        let mut request = self
            .authorize(self.client.request(method, self.table_url(table)), token)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal");
        if let Some(row) = row {
            request = request.json(row);
        }
        request.build()
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Response, BackendError> {
        let method = request.method().clone();
        let url = request.url().path().to_string();
        let response = self.client.execute(request).await?;
        tracing::debug!(%method, %url, status = %response.status(), "backend call");
        check(response).await
    }
}

/// Turn non-success responses into [`BackendError::Api`]
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendError::from_response(status.as_u16(), &body))
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(
        &self,
        table: Table,
        query: &Query,
    ) -> Result<Vec<serde_json::Value>, BackendError> {
        tracing::debug!(%table, ?query, "select");
        let request = self.build_select(table, query)?;
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn insert(
        &self,
        table: Table,
        row: serde_json::Value,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        tracing::debug!(%table, "insert");
        let request = self
            .authorize(self.client.post(self.table_url(table)), token)
            .header("Prefer", "return=minimal")
            .json(&json!([row]))
            .build()?;
        self.execute(request).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: Table,
        id: i64,
        row: serde_json::Value,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        tracing::debug!(%table, id, "update");
        let request = self.build_row_write(Method::PATCH, table, id, Some(&row), token)?;
        self.execute(request).await?;
        Ok(())
    }

    async fn delete(
        &self,
        table: Table,
        id: i64,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        tracing::debug!(%table, id, "delete");
        let request = self.build_row_write(Method::DELETE, table, id, None, token)?;
        self.execute(request).await?;
        Ok(())
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, BackendError> {
        let request = self
            .authorize(self.client.post(self.auth_url("signup")), None)
            .json(credentials)
            .build()?;
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(match serde_json::from_slice::<SignUpResponse>(&bytes)? {
            SignUpResponse::Session { user } => user,
            SignUpResponse::User(user) => user,
        })
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError> {
        let request = self
            .authorize(self.client.post(self.auth_url("token")), None)
            .query(&[("grant_type", "password")])
            .json(credentials)
            .build()?;
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        let request = self
            .authorize(self.client.post(self.auth_url("logout")), Some(token))
            .build()?;
        self.execute(request).await?;
        Ok(())
    }

    async fn user(&self, token: &str) -> Result<AuthUser, BackendError> {
        let request = self
            .authorize(self.client.get(self.auth_url("user")), Some(token))
            .build()?;
        let response = self.execute(request).await.map_err(|e| match e {
            BackendError::Api { status: 401, message } => BackendError::Unauthorized(message),
            other => other,
        })?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
