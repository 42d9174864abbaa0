//! cryptoblog: a server-rendered crypto-news blog
//!
//! Public pages, an admin console and sitemap/robots generation, all backed
//! by a hosted Postgres + auth service. Without backend credentials the site
//! runs against a mock backend that has no content and refuses logins.

pub mod backend;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod seo;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backend::{Backend, MemoryBackend};
use config::SiteConfig;
use content::ContentStore;

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content repository over the configured backend
    pub store: ContentStore,
}

impl Blog {
    /// Create a new Blog from a directory, connecting to the configured backend
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = SiteConfig::from_dir(&base_dir)?;
        let backend = backend::connect(&config).context("failed to create backend client")?;
        Ok(Self::with_backend(base_dir, config, backend))
    }

    /// Create a Blog that keeps everything in process memory
    pub fn in_memory<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = SiteConfig::from_dir(&base_dir)?;
        tracing::info!("Using in-memory backend; content is lost on exit");
        Ok(Self::with_backend(
            base_dir,
            config,
            Arc::new(MemoryBackend::new()),
        ))
    }

    pub fn with_backend<P: AsRef<Path>>(
        base_dir: P,
        config: SiteConfig,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            config,
            base_dir: base_dir.as_ref().to_path_buf(),
            store: ContentStore::new(backend),
        }
    }

    /// Generate sitemap.xml from the current posts and pages
    pub async fn sitemap(&self) -> Result<String> {
        let (posts, pages) = self
            .store
            .sitemap_entries()
            .await
            .context("failed to fetch sitemap data")?;
        Ok(seo::sitemap_xml(
            self.config.base_url(),
            Utc::now(),
            &posts,
            &pages,
        ))
    }

    /// Generate robots.txt
    pub fn robots(&self) -> String {
        seo::robots_txt(self.config.base_url())
    }

    /// Serve the site until interrupted
    pub async fn serve(&self, ip: &str, port: u16) -> Result<()> {
        let state = server::ServerState::new(self.config.clone(), self.store.clone())?;
        server::start(Arc::new(state), ip, port).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostInput;

    #[tokio::test]
    async fn test_sitemap_from_store() {
        let blog = Blog::in_memory(".").unwrap();
        let input = PostInput {
            title: "Hello".to_string(),
            ..Default::default()
        };
        blog.store.create_post(&input, None).await.unwrap();

        let xml = blog.sitemap().await.unwrap();
        assert_eq!(xml.matches("<url>").count(), 5);
    }

    #[test]
    fn test_robots_uses_site_url() {
        let mut config = SiteConfig::default();
        config.url = "https://chain.example/".to_string();
        let blog = Blog::with_backend(".", config, Arc::new(backend::NullBackend));
        assert!(blog
            .robots()
            .contains("Sitemap: https://chain.example/sitemap.xml"));
    }
}
