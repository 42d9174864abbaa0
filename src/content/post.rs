//! Post, Page and Settings records

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize};

/// A blog post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: i64,

    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,

    #[serde(deserialize_with = "null_as_empty")]
    pub content: String,

    pub category: Option<String>,

    /// Comma-separated tag list, as stored
    pub tags: Option<String>,

    pub image_url: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Tags split on commas, trimmed, empties dropped
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(self.tags.as_deref().unwrap_or_default())
    }

    /// First `length` characters of the content
    pub fn excerpt(&self, length: usize) -> String {
        self.content.chars().take(length).collect()
    }

    /// When the post last changed
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Case-insensitive search over title and content, plus an exact category match.
    ///
    /// Empty search and empty category match everything.
    pub fn matches(&self, search: &str, category: &str) -> bool {
        let needle = search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle);
        let matches_category =
            category.is_empty() || self.category.as_deref() == Some(category);
        matches_search && matches_category
    }
}

/// A standalone page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: i64,

    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,

    /// URL-safe identifier, derived from the title
    #[serde(deserialize_with = "null_as_empty")]
    pub slug: String,

    #[serde(deserialize_with = "null_as_empty")]
    pub content: String,

    pub seo_title: Option<String>,
    pub seo_description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Page {
    /// When the page last changed
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// The singleton site settings record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub id: Option<i64>,
    pub site_name: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub favicon_url: Option<String>,
}

/// Writable fields of a post, as submitted by the admin form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub seo_title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub seo_description: Option<String>,
}

impl From<&Post> for PostInput {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
            tags: post.tags.clone(),
            image_url: post.image_url.clone(),
            seo_title: post.seo_title.clone(),
            seo_description: post.seo_description.clone(),
        }
    }
}

/// Writable fields of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInput {
    pub title: String,
    /// Left empty, the slug is derived from the title on save
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub seo_title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub seo_description: Option<String>,
}

impl From<&Page> for PageInput {
    fn from(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            slug: page.slug.clone(),
            content: page.content.clone(),
            seo_title: page.seo_title.clone(),
            seo_description: page.seo_description.clone(),
        }
    }
}

/// Writable fields of the settings record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsInput {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub site_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub keywords: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub favicon_url: Option<String>,
}

impl From<&Settings> for SettingsInput {
    fn from(settings: &Settings) -> Self {
        Self {
            site_name: settings.site_name.clone(),
            description: settings.description.clone(),
            keywords: settings.keywords.clone(),
            favicon_url: settings.favicon_url.clone(),
        }
    }
}

/// Split a comma-separated tag string
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct categories in first-seen order
pub fn unique_categories(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .filter_map(|p| p.category.as_deref())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
