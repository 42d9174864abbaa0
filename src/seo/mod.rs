//! Search-engine metadata: head tags, JSON-LD documents, sitemap and robots

pub mod sitemap;
pub mod structured;

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::helpers::{full_url, html_escape, iso_millis};

pub use sitemap::{robots_txt, sitemap_xml, ChangeFreq, SitemapUrl};

const ROBOTS: &str = "index, follow, max-image-preview:large, max-snippet:-1, max-video-preview:-1";

/// Open Graph object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OgType {
    #[default]
    Website,
    Article,
}

impl OgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OgType::Website => "website",
            OgType::Article => "article",
        }
    }
}

/// Per-page metadata rendered into `<head>`
#[derive(Debug, Clone, PartialEq)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub image: String,
    /// Canonical URL of the page
    pub url: String,
    pub og_type: OgType,
    pub published_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub author: String,
    pub section: Option<String>,
    pub tags: Vec<String>,
    pub site_name: String,
    pub twitter_handle: String,
}

impl SeoMeta {
    /// Site-wide defaults for the page at `path`
    pub fn for_path(config: &SiteConfig, path: &str) -> Self {
        Self {
            title: config.default_title(),
            description: config.description.clone(),
            keywords: config.keywords.clone(),
            image: config.default_image.clone(),
            url: full_url(config.base_url(), path),
            og_type: OgType::Website,
            published_time: None,
            modified_time: None,
            author: config.author.clone(),
            section: None,
            tags: Vec::new(),
            site_name: config.title.clone(),
            twitter_handle: config.twitter_handle.clone(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the description when `description` is present and non-empty
    pub fn description(mut self, description: Option<&str>) -> Self {
        if let Some(d) = description.filter(|d| !d.trim().is_empty()) {
            self.description = d.to_string();
        }
        self
    }

    /// Replace the keywords when `keywords` is present and non-empty
    pub fn keywords(mut self, keywords: Option<&str>) -> Self {
        if let Some(k) = keywords.filter(|k| !k.trim().is_empty()) {
            self.keywords = k.to_string();
        }
        self
    }

    /// Replace the share image when `image` is present and non-empty
    pub fn image(mut self, image: Option<&str>) -> Self {
        if let Some(i) = image.filter(|i| !i.trim().is_empty()) {
            self.image = i.to_string();
        }
        self
    }

    /// Mark the page as an article with its timestamps, section and tags
    pub fn article(
        mut self,
        published: DateTime<Utc>,
        modified: Option<DateTime<Utc>>,
        section: Option<&str>,
        tags: Vec<String>,
    ) -> Self {
        self.og_type = OgType::Article;
        self.published_time = Some(published);
        self.modified_time = modified;
        self.section = section.filter(|s| !s.is_empty()).map(str::to_string);
        self.tags = tags;
        self
    }

    /// Render the head tags. Every value is HTML-escaped.
    pub fn render(&self) -> String {
        let mut tags = vec![
            format!("<title>{}</title>", html_escape(&self.title)),
            meta_name("description", &self.description),
            meta_name("keywords", &self.keywords),
            format!(r#"<link rel="canonical" href="{}">"#, html_escape(&self.url)),
            meta_property("og:title", &self.title),
            meta_property("og:description", &self.description),
            meta_property("og:image", &self.image),
            meta_property("og:url", &self.url),
            meta_property("og:type", self.og_type.as_str()),
            meta_property("og:site_name", &self.site_name),
            meta_property("og:locale", "en_US"),
        ];

        if let Some(published) = &self.published_time {
            tags.push(meta_property("article:published_time", &iso_millis(published)));
        }
        if let Some(modified) = &self.modified_time {
            tags.push(meta_property("article:modified_time", &iso_millis(modified)));
        }
        if self.og_type == OgType::Article && !self.author.is_empty() {
            tags.push(meta_property("article:author", &self.author));
        }
        if let Some(section) = &self.section {
            tags.push(meta_property("article:section", section));
        }
        for tag in &self.tags {
            tags.push(meta_property("article:tag", tag));
        }

        tags.extend([
            meta_name("twitter:card", "summary_large_image"),
            meta_name("twitter:title", &self.title),
            meta_name("twitter:description", &self.description),
            meta_name("twitter:image", &self.image),
            meta_name("twitter:site", &self.twitter_handle),
            meta_name("twitter:creator", &self.twitter_handle),
            meta_name("robots", ROBOTS),
            meta_name("author", &self.author),
        ]);

        tags.join("\n")
    }
}

fn meta_name(name: &str, content: &str) -> String {
    format!(
        r#"<meta name="{}" content="{}">"#,
        name,
        html_escape(content)
    )
}

fn meta_property(property: &str, content: &str) -> String {
    format!(
        r#"<meta property="{}" content="{}">"#,
        property,
        html_escape(content)
    )
}
