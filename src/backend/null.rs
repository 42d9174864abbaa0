//! Mock backend used when no credentials are configured

use async_trait::async_trait;

use super::{AuthSession, AuthUser, Backend, BackendError, Credentials, Query, Table};

/// Answers every select with no rows, accepts and drops every write,
/// and refuses every auth call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

#[async_trait]
impl Backend for NullBackend {
    async fn select(
        &self,
        _table: Table,
        _query: &Query,
    ) -> Result<Vec<serde_json::Value>, BackendError> {
        Ok(Vec::new())
    }

    async fn insert(
        &self,
        _table: Table,
        _row: serde_json::Value,
        _token: Option<&str>,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    async fn update(
        &self,
        _table: Table,
        _id: i64,
        _row: serde_json::Value,
        _token: Option<&str>,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    async fn delete(
        &self,
        _table: Table,
        _id: i64,
        _token: Option<&str>,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    async fn sign_up(&self, _credentials: &Credentials) -> Result<AuthUser, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<AuthSession, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn sign_out(&self, _token: &str) -> Result<(), BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn user(&self, _token: &str) -> Result<AuthUser, BackendError> {
        Err(BackendError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_selects_are_empty() {
        let rows = NullBackend
            .select(Table::Posts, &Query::new().newest_first())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_auth_is_not_configured() {
        let creds = Credentials {
            email: "admin@merncryptoblog.com".to_string(),
            password: "secret".to_string(),
        };
        let err = NullBackend.sign_in(&creds).await.unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured));
        assert!(err.to_string().contains("not configured"));
    }
}
