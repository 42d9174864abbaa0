//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary. Autoescaping is on for
//! every `.html` template, so post and page text is always rendered as text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers::{category_path, encode_component, long_date, short_date, truncate};

/// The site stylesheet, served at `/static/style.css`
pub const STYLESHEET: &str = include_str!("site/style.css");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("page.html", include_str!("site/page.html")),
            ("privacy.html", include_str!("site/privacy.html")),
            ("contact.html", include_str!("site/contact.html")),
            ("sitemap.html", include_str!("site/sitemap.html")),
            ("login.html", include_str!("site/login.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            // Partials
            (
                "partials/post_card.html",
                include_str!("site/partials/post_card.html"),
            ),
            (
                "partials/flash.html",
                include_str!("site/partials/flash.html"),
            ),
            // Admin console
            ("admin/layout.html", include_str!("site/admin/layout.html")),
            (
                "admin/dashboard.html",
                include_str!("site/admin/dashboard.html"),
            ),
            ("admin/posts.html", include_str!("site/admin/posts.html")),
            (
                "admin/post_form.html",
                include_str!("site/admin/post_form.html"),
            ),
            ("admin/pages.html", include_str!("site/admin/pages.html")),
            (
                "admin/page_form.html",
                include_str!("site/admin/page_form.html"),
            ),
            (
                "admin/settings.html",
                include_str!("site/admin/settings.html"),
            ),
        ])?;

        // Register custom filters
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);
        tera.register_filter("urlencode_component", urlencode_component_filter);
        tera.register_filter("category_path", category_path_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(template_name, context)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(truncate(&s, length, Some(&omission))))
}

/// Tera filter: format an RFC 3339 timestamp as `long` or `short`
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "long".to_string(),
    };

    let Ok(date) = DateTime::parse_from_rfc3339(&s) else {
        return Ok(tera::Value::String(s));
    };
    let date = date.with_timezone(&Utc);

    let formatted = match format.as_str() {
        "short" => short_date(&date),
        "long" => long_date(&date),
        other => date.format(other).to_string(),
    };
    Ok(tera::Value::String(formatted))
}

/// Tera filter: percent-encode a URL component
fn urlencode_component_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("urlencode_component", "value", String, value);
    Ok(tera::Value::String(encode_component(&s)))
}

/// Tera filter: blog listing path filtered to a category
fn category_path_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("category_path", "value", String, value);
    Ok(tera::Value::String(category_path(&s)))
}

/// Data structures for template context

/// Values every public page layout needs
#[derive(Debug, Clone, Serialize)]
pub struct LayoutData {
    pub site_name: String,
    pub tagline: String,
    pub description: String,
    pub favicon_url: Option<String>,
    pub contact_email: String,
    /// Rendered `<head>` metadata
    pub seo: String,
    /// Rendered JSON-LD script elements
    pub structured_data: Vec<String>,
    pub signed_in: bool,
    pub user_email: Option<String>,
    pub year: i32,
}

/// A link in the HTML sitemap
#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub title: String,
    pub path: String,
}

/// Notice shown at the top of a form
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Flash {
    pub kind: &'static str,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }
}
