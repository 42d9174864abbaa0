//! Site configuration (blog.yml + environment)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the optional configuration file in the base directory
pub const CONFIG_FILE: &str = "blog.yml";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub default_image: String,
    pub twitter_handle: String,
    pub contact_email: String,

    // URL
    pub url: String,

    // Server
    pub host: String,
    pub port: u16,
    pub secure_cookies: bool,

    // Hosted backend
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "MernCryptoBlog".to_string(),
            tagline: "Your Trusted Crypto News Source".to_string(),
            description: "Stay updated with the latest cryptocurrency news, blockchain technology insights, and digital finance trends.".to_string(),
            keywords: "cryptocurrency, blockchain, bitcoin, ethereum, crypto news, digital finance"
                .to_string(),
            author: "MernCryptoBlog".to_string(),
            default_image:
                "https://images.unsplash.com/photo-1639762681485-074b7f938ba0?w=1200&h=630&fit=crop"
                    .to_string(),
            twitter_handle: "@merncryptoblog".to_string(),
            contact_email: "contact@merncryptoblog.com".to_string(),

            url: "https://merncryptoblog.com".to_string(),

            host: "127.0.0.1".to_string(),
            port: 3000,
            secure_cookies: false,

            supabase_url: None,
            supabase_anon_key: None,
            request_timeout_secs: 10,
        }
    }
}

/// Credentials for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCredentials {
    pub url: String,
    pub anon_key: String,
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Load `blog.yml` from a directory when present, then apply environment overrides
    pub fn from_dir<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            tracing::debug!("Loading configuration from {:?}", config_path);
            Self::load(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment-style lookups.
    ///
    /// Both the plain and the `VITE_`-prefixed backend variable names are accepted.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        if let Some(url) = first(&["SUPABASE_URL", "VITE_SUPABASE_URL"]) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = first(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]) {
            self.supabase_anon_key = Some(key);
        }
        if let Some(url) = first(&["SITE_URL"]) {
            self.url = url;
        }
        if let Some(host) = first(&["HOST"]) {
            self.host = host;
        }
        if let Some(port) = first(&["PORT"]) {
            self.port = port.parse().context("PORT must be a valid u16")?;
        }

        Ok(())
    }

    /// Backend credentials, or `None` when missing or still placeholders
    pub fn backend_credentials(&self) -> Option<BackendCredentials> {
        let url = self.supabase_url.as_deref()?.trim();
        let key = self.supabase_anon_key.as_deref()?.trim();

        if url.is_empty() || key.is_empty() || url.contains("your_") || key.contains("your_") {
            return None;
        }

        Some(BackendCredentials {
            url: url.trim_end_matches('/').to_string(),
            anon_key: key.to_string(),
        })
    }

    /// Public base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Default page title, e.g. "MernCryptoBlog - Your Trusted Crypto News Source"
    pub fn default_title(&self) -> String {
        if self.tagline.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.tagline)
        }
    }
}
