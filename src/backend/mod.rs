//! Hosted backend access
//!
//! Every read and write in the blog is a direct round trip to a hosted
//! Postgres + auth service. The [`Backend`] trait is the single seam to it:
//!
//! - [`RestBackend`] talks to the real service over HTTPS
//! - [`NullBackend`] stands in when no credentials are configured and
//!   answers every query with nothing
//! - [`MemoryBackend`] keeps rows in process, for local demos and tests

mod error;
mod memory;
mod null;
mod query;
mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use error::BackendError;
pub use memory::MemoryBackend;
pub use null::NullBackend;
pub use query::{Filter, FilterOp, Order, Query};
pub use rest::RestBackend;

use crate::config::SiteConfig;

/// The persisted content tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Posts,
    Pages,
    Settings,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Posts => "posts",
            Table::Pages => "pages",
            Table::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email + password pair sent to the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

/// A signed-in session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

/// Operations the blog needs from the hosted service.
///
/// `token` is the signed-in user's access token; writes made without one run
/// with the anonymous key and are subject to the backend's row policies.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch rows from a table
    async fn select(&self, table: Table, query: &Query)
        -> Result<Vec<serde_json::Value>, BackendError>;

    /// Insert one row
    async fn insert(
        &self,
        table: Table,
        row: serde_json::Value,
        token: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Update the row with the given id
    async fn update(
        &self,
        table: Table,
        id: i64,
        row: serde_json::Value,
        token: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Delete the row with the given id
    async fn delete(&self, table: Table, id: i64, token: Option<&str>)
        -> Result<(), BackendError>;

    /// Register a new account
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, BackendError>;

    /// Exchange email + password for a session
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError>;

    /// Revoke a session
    async fn sign_out(&self, token: &str) -> Result<(), BackendError>;

    /// Look up the user behind an access token
    async fn user(&self, token: &str) -> Result<AuthUser, BackendError>;

    /// Whether this backend is wired to a real service
    fn is_configured(&self) -> bool {
        true
    }
}

/// Pick the backend for a configuration.
///
/// Falls back to [`NullBackend`] when the URL or key is absent.
pub fn connect(config: &SiteConfig) -> Result<Arc<dyn Backend>, BackendError> {
    match config.backend_credentials() {
        Some(creds) => {
            tracing::info!("Using hosted backend at {}", creds.url);
            let timeout = Duration::from_secs(config.request_timeout_secs);
            Ok(Arc::new(RestBackend::new(&creds.url, &creds.anon_key, timeout)?))
        }
        None => {
            tracing::warn!(
                "Supabase credentials not configured. Using mock backend for development."
            );
            Ok(Arc::new(NullBackend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(Table::Posts.as_str(), "posts");
        assert_eq!(Table::Pages.to_string(), "pages");
        assert_eq!(Table::Settings.as_str(), "settings");
    }

    #[test]
    fn test_connect_without_credentials_uses_mock() {
        let backend = connect(&SiteConfig::default()).unwrap();
        assert!(!backend.is_configured());
    }

    #[test]
    fn test_connect_with_credentials_uses_rest() {
        let mut config = SiteConfig::default();
        config.supabase_url = Some("https://abc.supabase.co".to_string());
        config.supabase_anon_key = Some("anon".to_string());
        let backend = connect(&config).unwrap();
        assert!(backend.is_configured());
    }
}
