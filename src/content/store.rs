//! Typed access to the content tables

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::post::{Page, PageInput, Post, PostInput, Settings, SettingsInput};
use super::slug::generate_slug;
use crate::backend::{AuthSession, AuthUser, Backend, BackendError, Credentials, Query, Table};

/// Number of recent items the dashboard shows
pub const DASHBOARD_RECENT: usize = 5;

/// Numbers and recent items for the admin dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub total_posts: usize,
    pub total_pages: usize,
    pub recent_posts: Vec<Post>,
    pub recent_pages: Vec<Page>,
}

/// Repository over the hosted backend.
///
/// Every method is a direct round trip; nothing is cached or validated here.
#[derive(Clone)]
pub struct ContentStore {
    backend: Arc<dyn Backend>,
}

impl ContentStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// False when running against the mock backend
    pub fn is_configured(&self) -> bool {
        self.backend.is_configured()
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: Table,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        self.backend
            .select(table, query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(BackendError::from))
            .collect()
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        table: Table,
        query: Query,
    ) -> Result<Option<T>, BackendError> {
        Ok(self.fetch(table, &query.limit(1)).await?.into_iter().next())
    }

    // Posts

    /// Posts, newest first
    pub async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>, BackendError> {
        let mut query = Query::new().newest_first();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.fetch(Table::Posts, &query).await
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, BackendError> {
        self.fetch_one(Table::Posts, Query::new().eq("id", id)).await
    }

    /// Newest posts in the same category, excluding the post itself
    pub async fn related_posts(&self, post: &Post, limit: usize) -> Result<Vec<Post>, BackendError> {
        let Some(category) = post.category.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(Vec::new());
        };

        let query = Query::new()
            .eq("category", category)
            .neq("id", post.id)
            .newest_first()
            .limit(limit);
        self.fetch(Table::Posts, &query).await
    }

    pub async fn create_post(
        &self,
        input: &PostInput,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        self.backend
            .insert(Table::Posts, serde_json::to_value(input)?, token)
            .await
    }

    pub async fn update_post(
        &self,
        id: i64,
        input: &PostInput,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        self.backend
            .update(Table::Posts, id, touched(input)?, token)
            .await
    }

    pub async fn delete_post(&self, id: i64, token: Option<&str>) -> Result<(), BackendError> {
        self.backend.delete(Table::Posts, id, token).await
    }

    // Pages

    /// Pages, newest first
    pub async fn list_pages(&self) -> Result<Vec<Page>, BackendError> {
        self.fetch(Table::Pages, &Query::new().newest_first()).await
    }

    pub async fn get_page(&self, id: i64) -> Result<Option<Page>, BackendError> {
        self.fetch_one(Table::Pages, Query::new().eq("id", id)).await
    }

    pub async fn get_page_by_slug(&self, slug: &str) -> Result<Option<Page>, BackendError> {
        self.fetch_one(Table::Pages, Query::new().eq("slug", slug))
            .await
    }

    pub async fn create_page(
        &self,
        input: &PageInput,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        let input = with_slug(input);
        self.backend
            .insert(Table::Pages, serde_json::to_value(&input)?, token)
            .await
    }

    pub async fn update_page(
        &self,
        id: i64,
        input: &PageInput,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        let input = with_slug(input);
        self.backend
            .update(Table::Pages, id, touched(&input)?, token)
            .await
    }

    pub async fn delete_page(&self, id: i64, token: Option<&str>) -> Result<(), BackendError> {
        self.backend.delete(Table::Pages, id, token).await
    }

    // Settings

    /// The settings record, if one has been saved
    pub async fn get_settings(&self) -> Result<Option<Settings>, BackendError> {
        self.fetch_one(Table::Settings, Query::new()).await
    }

    /// Update the singleton in place, or create it when none exists yet
    pub async fn save_settings(
        &self,
        input: &SettingsInput,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        let existing: Option<Settings> = self
            .fetch_one(Table::Settings, Query::new().columns("id"))
            .await?;
        let row = serde_json::to_value(input)?;

        match existing.and_then(|s| s.id) {
            Some(id) => self.backend.update(Table::Settings, id, row, token).await,
            None => self.backend.insert(Table::Settings, row, token).await,
        }
    }

    // Aggregates

    /// Posts and pages for the sitemap, fetched concurrently
    pub async fn sitemap_entries(&self) -> Result<(Vec<Post>, Vec<Page>), BackendError> {
        let posts_query = Query::new()
            .columns("id,title,created_at,updated_at")
            .newest_first();
        let pages_query = Query::new()
            .columns("id,slug,title,created_at,updated_at")
            .newest_first();

        let (posts, pages) = tokio::join!(
            self.fetch::<Post>(Table::Posts, &posts_query),
            self.fetch::<Page>(Table::Pages, &pages_query),
        );
        Ok((posts?, pages?))
    }

    pub async fn dashboard(&self) -> Result<Dashboard, BackendError> {
        let posts_query = Query::new().columns("id,title,created_at").newest_first();
        let pages_query = Query::new()
            .columns("id,title,slug,created_at")
            .newest_first();

        let (posts, pages) = tokio::join!(
            self.fetch::<Post>(Table::Posts, &posts_query),
            self.fetch::<Page>(Table::Pages, &pages_query),
        );
        let (posts, pages) = (posts?, pages?);

        Ok(Dashboard {
            total_posts: posts.len(),
            total_pages: pages.len(),
            recent_posts: posts.into_iter().take(DASHBOARD_RECENT).collect(),
            recent_pages: pages.into_iter().take(DASHBOARD_RECENT).collect(),
        })
    }

    // Auth

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, BackendError> {
        self.backend.sign_up(credentials).await
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError> {
        self.backend.sign_in(credentials).await
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        self.backend.sign_out(token).await
    }
}

/// Serialize an update and stamp `updated_at`
fn touched<T: Serialize>(input: &T) -> Result<serde_json::Value, BackendError> {
    let mut row = serde_json::to_value(input)?;
    if let Some(fields) = row.as_object_mut() {
        fields.insert(
            "updated_at".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
    }
    Ok(row)
}

/// Fill in a blank slug from the title
fn with_slug(input: &PageInput) -> PageInput {
    let mut input = input.clone();
    if input.slug.trim().is_empty() {
        input.slug = generate_slug(&input.title);
    } else {
        input.slug = input.slug.trim().to_string();
    }
    input
}

/// Log a failed read and fall back to an empty value.
///
/// Views render their "no data" state instead of an error page.
pub fn or_empty<T: Default>(result: Result<T, BackendError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!("Error {}: {}", what, e);
        T::default()
    })
}
