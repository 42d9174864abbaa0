//! schema.org JSON-LD documents

use serde_json::{json, Value};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers::{full_url, iso_millis, post_path};

/// `WebSite` with a search action pointing at the blog listing
pub fn website(config: &SiteConfig, name: Option<&str>, description: Option<&str>) -> Value {
    let base = config.base_url();
    json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": name.unwrap_or(&config.title),
        "description": description.unwrap_or(&config.description),
        "url": base,
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{}/blog?search={{search_term_string}}", base)
            },
            "query-input": "required name=search_term_string"
        }
    })
}

pub fn organization(config: &SiteConfig, name: Option<&str>, description: Option<&str>) -> Value {
    let base = config.base_url();
    let handle = config.twitter_handle.trim_start_matches('@');
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": name.unwrap_or(&config.title),
        "description": description.unwrap_or(&config.description),
        "url": base,
        "logo": format!("{}/logo.png", base),
        "contactPoint": {
            "@type": "ContactPoint",
            "contactType": "customer service",
            "email": config.contact_email
        },
        "sameAs": [format!("https://twitter.com/{}", handle)]
    })
}

/// `BlogPosting` for a post; `dateModified` falls back to the publish date
pub fn blog_posting(config: &SiteConfig, post: &Post, description: &str, image: &str) -> Value {
    let base = config.base_url();
    let published = iso_millis(&post.created_at);
    json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": description,
        "image": image,
        "author": {
            "@type": "Organization",
            "name": config.author
        },
        "publisher": {
            "@type": "Organization",
            "name": config.title,
            "logo": {
                "@type": "ImageObject",
                "url": format!("{}/logo.png", base)
            }
        },
        "datePublished": published,
        "dateModified": iso_millis(&post.last_modified()),
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": full_url(base, &post_path(post.id))
        },
        "articleSection": post.category,
        "keywords": post.tags
    })
}

/// `BreadcrumbList` from (name, url) pairs, positions starting at 1
pub fn breadcrumbs(items: &[(&str, String)]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, (name, url))| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": name,
                "item": url
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": elements
    })
}

/// Wrap a document in a JSON-LD script element
///
/// `</` is escaped so content cannot close the script early.
pub fn to_script_tag(document: &Value) -> String {
    let body = document.to_string().replace("</", "<\\/");
    format!(r#"<script type="application/ld+json">{}</script>"#, body)
}
