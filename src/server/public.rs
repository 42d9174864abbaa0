//! Public site handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use super::AppState;
use crate::content::{or_empty, unique_categories, Post};
use crate::error::AppResult;
use crate::helpers::{full_url, page_path, post_path};
use crate::seo::{robots_txt as render_robots, sitemap_xml as render_sitemap, structured, SeoMeta};
use crate::templates::LinkData;

/// Number of posts featured on the home page
pub const FEATURED_POSTS: usize = 6;
/// Number of related posts under an article
pub const RELATED_POSTS: usize = 3;
/// Length of descriptions derived from body text
const DESCRIPTION_CHARS: usize = 160;

const HERO_DESCRIPTION: &str =
    "Your trusted source for cryptocurrency insights and blockchain technology news";

pub async fn home(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let (posts, settings) = tokio::join!(
        state.store.list_posts(Some(FEATURED_POSTS)),
        state.store.get_settings(),
    );
    let posts = or_empty(posts, "fetching featured posts");
    let settings = or_empty(settings, "fetching settings");

    let name = settings.as_ref().and_then(|s| s.site_name.as_deref());
    let description = settings.as_ref().and_then(|s| s.description.as_deref());

    let mut seo = SeoMeta::for_path(&state.config, "/")
        .description(description)
        .keywords(settings.as_ref().and_then(|s| s.keywords.as_deref()));
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        seo = seo.title(name);
    }
    let documents = [
        structured::organization(&state.config, name, description.or(Some(HERO_DESCRIPTION))),
        structured::website(&state.config, name, description.or(Some(HERO_DESCRIPTION))),
    ];

    let mut context = state
        .page_context(&session, &seo, &documents, settings.as_ref())
        .await;
    context.insert("posts", &posts);
    context.insert(
        "hero_description",
        description.filter(|d| !d.is_empty()).unwrap_or(HERO_DESCRIPTION),
    );
    Ok(state.render("home.html", &context)?.into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: String,
}

pub async fn blog(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BlogQuery>,
) -> AppResult<Response> {
    let posts = or_empty(state.store.list_posts(None).await, "fetching posts");
    let categories = unique_categories(&posts);
    let search = query.search.trim();
    let posts: Vec<Post> = posts
        .into_iter()
        .filter(|p| p.matches(search, &query.category))
        .collect();

    let seo = SeoMeta::for_path(&state.config, "/blog")
        .title(format!("Blog - {}", state.config.title))
        .description(Some(
            "Explore our latest articles on cryptocurrency, blockchain technology, and digital finance.",
        ))
        .keywords(Some(
            "crypto blog, cryptocurrency articles, blockchain news, digital finance",
        ));

    let mut context = state.page_context(&session, &seo, &[], None).await;
    context.insert("posts", &posts);
    context.insert("categories", &categories);
    context.insert("search", search);
    context.insert("category", &query.category);
    context.insert("filtered", &(!search.is_empty() || !query.category.is_empty()));
    Ok(state.render("blog.html", &context)?.into_response())
}

pub async fn post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let found = match id.parse::<i64>() {
        Ok(id) => or_empty(state.store.get_post(id).await, "fetching post"),
        Err(_) => None,
    };
    let Some(post) = found else {
        return state
            .not_found(
                &session,
                "Post Not Found",
                "The post you're looking for doesn't exist.",
                ("/blog", "Back to Blog"),
            )
            .await;
    };

    let related = or_empty(
        state.store.related_posts(&post, RELATED_POSTS).await,
        "fetching related posts",
    );

    let path = post_path(post.id);
    let description = post
        .seo_description
        .clone()
        .unwrap_or_else(|| post.excerpt(DESCRIPTION_CHARS));
    let seo = SeoMeta::for_path(&state.config, &path)
        .title(post.seo_title.clone().unwrap_or_else(|| post.title.clone()))
        .description(Some(description.as_str()))
        .keywords(post.tags.as_deref().or(post.category.as_deref()))
        .image(post.image_url.as_deref())
        .article(
            post.created_at,
            Some(post.last_modified()),
            post.category.as_deref(),
            post.tag_list(),
        );

    let base = state.config.base_url();
    let documents = [
        structured::blog_posting(&state.config, &post, &seo.description, &seo.image),
        structured::breadcrumbs(&[
            ("Home", full_url(base, "/")),
            ("Blog", full_url(base, "/blog")),
            (post.title.as_str(), full_url(base, &path)),
        ]),
    ];

    let mut context = state.page_context(&session, &seo, &documents, None).await;
    context.insert("post", &post);
    context.insert("tags", &post.tag_list());
    context.insert("related", &related);
    Ok(state.render("post.html", &context)?.into_response())
}

pub async fn page(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let Some(page) = or_empty(state.store.get_page_by_slug(&slug).await, "fetching page") else {
        return state
            .not_found(
                &session,
                "Page Not Found",
                "The page you're looking for doesn't exist.",
                ("/", "Back to Home"),
            )
            .await;
    };

    let excerpt: String = page.content.chars().take(DESCRIPTION_CHARS).collect();
    let seo = SeoMeta::for_path(&state.config, &page_path(&page.slug))
        .title(page.seo_title.clone().unwrap_or_else(|| page.title.clone()))
        .description(page.seo_description.as_deref().or(Some(excerpt.as_str())))
        .keywords(Some("custom page"));

    let mut context = state.page_context(&session, &seo, &[], None).await;
    context.insert("page", &page);
    Ok(state.render("page.html", &context)?.into_response())
}

pub async fn contact(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let seo = SeoMeta::for_path(&state.config, "/contact")
        .title(format!("Contact Us - {}", state.config.title))
        .description(Some(
            "Get in touch with our team for tips, corrections and partnership enquiries.",
        ))
        .keywords(Some("contact, crypto news tips, partnerships"));

    let context = state.page_context(&session, &seo, &[], None).await;
    Ok(state.render("contact.html", &context)?.into_response())
}

/// Slug of the page that replaces the built-in privacy text
pub const PRIVACY_SLUG: &str = "privacy-policy";

pub async fn privacy(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let page = or_empty(
        state.store.get_page_by_slug(PRIVACY_SLUG).await,
        "fetching privacy page",
    );

    let title = page
        .as_ref()
        .and_then(|p| p.seo_title.clone())
        .unwrap_or_else(|| format!("Privacy Policy - {}", state.config.title));
    let seo = SeoMeta::for_path(&state.config, "/privacy")
        .title(title)
        .description(
            page.as_ref()
                .and_then(|p| p.seo_description.as_deref())
                .or(Some(
                    "Learn about how we collect, use, and protect your personal information.",
                )),
        )
        .keywords(Some("privacy policy, data protection, user privacy"));

    let mut context = state.page_context(&session, &seo, &[], None).await;
    context.insert("page", &page);
    Ok(state.render("privacy.html", &context)?.into_response())
}

fn main_links() -> Vec<LinkData> {
    [
        ("Home", "/"),
        ("Blog", "/blog"),
        ("Contact", "/contact"),
        ("Privacy Policy", "/privacy"),
    ]
    .into_iter()
    .map(|(title, path)| LinkData {
        title: title.to_string(),
        path: path.to_string(),
    })
    .collect()
}

pub async fn sitemap_page(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let (posts, pages) = or_empty(state.store.sitemap_entries().await, "fetching sitemap data");
    let xml = render_sitemap(state.config.base_url(), Utc::now(), &posts, &pages);

    let seo = SeoMeta::for_path(&state.config, "/sitemap")
        .title(format!("Sitemap - {}", state.config.title))
        .description(Some("Every article and page on the site."));

    let mut context = state.page_context(&session, &seo, &[], None).await;
    context.insert("main_links", &main_links());
    context.insert("posts", &posts);
    context.insert("pages", &pages);
    context.insert("sitemap_xml", &xml);
    Ok(state.render("sitemap.html", &context)?.into_response())
}

pub async fn sitemap_xml(State(state): State<AppState>) -> impl IntoResponse {
    let (posts, pages) = or_empty(state.store.sitemap_entries().await, "fetching sitemap data");
    let xml = render_sitemap(state.config.base_url(), Utc::now(), &posts, &pages);
    ([(header::CONTENT_TYPE, "application/xml")], xml)
}

pub async fn robots_txt(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_robots(state.config.base_url()),
    )
}

pub async fn fallback(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    state
        .not_found(
            &session,
            "Page Not Found",
            "The page you're looking for doesn't exist.",
            ("/", "Back to Home"),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::backend::{Backend, Table};
    use axum::http::{header, StatusCode};
    use serde_json::json;

    async fn seed_post(backend: &crate::backend::MemoryBackend, title: &str, category: &str) {
        backend
            .insert(
                Table::Posts,
                json!({
                    "title": title,
                    "content": format!("{} content", title),
                    "category": category,
                    "tags": "btc, markets"
                }),
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_home_empty_state() {
        let (app, _) = memory_app();
        let response = get(&app, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("No posts available yet."));
        assert!(body.contains(r#"<script type="application/ld+json">"#));
        assert!(body.contains("MernCryptoBlog - Your Trusted Crypto News Source"));
    }

    #[tokio::test]
    async fn test_home_uses_settings() {
        let (app, backend) = memory_app();
        backend
            .insert(
                Table::Settings,
                json!({"site_name": "Chain Digest", "description": "Daily chain news"}),
                None,
            )
            .await
            .unwrap();
        let body = body_text(get(&app, "/", None).await).await;
        assert!(body.contains("<title>Chain Digest</title>"));
        assert!(body.contains("Daily chain news"));
    }

    #[tokio::test]
    async fn test_blog_filters() {
        let (app, backend) = memory_app();
        seed_post(&backend, "Bitcoin halving", "Bitcoin").await;
        seed_post(&backend, "Ether staking", "Ethereum").await;

        let body = body_text(get(&app, "/blog", None).await).await;
        assert!(body.contains("Bitcoin halving"));
        assert!(body.contains("Ether staking"));
        assert!(body.contains(r#"<option value="Ethereum">"#));

        let body = body_text(get(&app, "/blog?category=Ethereum", None).await).await;
        assert!(!body.contains("Bitcoin halving"));
        assert!(body.contains("Ether staking"));

        let body = body_text(get(&app, "/blog?search=HALVING", None).await).await;
        assert!(body.contains("Bitcoin halving"));
        assert!(!body.contains("Ether staking"));

        let body = body_text(get(&app, "/blog?search=dogecoin", None).await).await;
        assert!(body.contains("No posts found matching your criteria."));
    }

    #[tokio::test]
    async fn test_blog_without_posts() {
        let (app, _) = memory_app();
        let body = body_text(get(&app, "/blog", None).await).await;
        assert!(body.contains("No posts available yet."));
    }

    #[tokio::test]
    async fn test_post_detail_and_related() {
        let (app, backend) = memory_app();
        seed_post(&backend, "Bitcoin halving", "Bitcoin").await;
        seed_post(&backend, "Lightning fees", "Bitcoin").await;
        seed_post(&backend, "Ether staking", "Ethereum").await;

        let response = get(&app, "/post/1", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<h1>Bitcoin halving</h1>"));
        assert!(body.contains("Related Articles"));
        assert!(body.contains("Lightning fees"));
        assert!(!body.contains("Ether staking"));
        assert!(body.contains(r#"<meta property="og:type" content="article">"#));
        assert!(body.contains("BlogPosting"));
        assert!(body.contains("BreadcrumbList"));
        assert!(body.contains(r#"<span class="tag">markets</span>"#));
        assert!(body.contains(r#"<a class="badge" href="/blog?category=Bitcoin">Bitcoin</a>"#));
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let (app, _) = memory_app();
        for uri in ["/post/99", "/post/not-a-number"] {
            let response = get(&app, uri, None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(body_text(response).await.contains("Post Not Found"));
        }
    }

    #[tokio::test]
    async fn test_page_by_slug() {
        let (app, backend) = memory_app();
        backend
            .insert(
                Table::Pages,
                json!({"title": "About Us", "slug": "about-us", "content": "We write about crypto."}),
                None,
            )
            .await
            .unwrap();

        let body = body_text(get(&app, "/page/about-us", None).await).await;
        assert!(body.contains("We write about crypto."));

        let response = get(&app, "/page/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page Not Found"));
    }

    #[tokio::test]
    async fn test_privacy_default_and_custom() {
        let (app, backend) = memory_app();
        let body = body_text(get(&app, "/privacy", None).await).await;
        assert!(body.contains("We are committed to protecting your privacy"));

        backend
            .insert(
                Table::Pages,
                json!({"title": "Our Privacy Promise", "slug": "privacy-policy", "content": "No trackers."}),
                None,
            )
            .await
            .unwrap();
        let body = body_text(get(&app, "/privacy", None).await).await;
        assert!(body.contains("Our Privacy Promise"));
        assert!(body.contains("No trackers."));
    }

    #[tokio::test]
    async fn test_contact_page() {
        let (app, _) = memory_app();
        let body = body_text(get(&app, "/contact", None).await).await;
        assert!(body.contains("contact@merncryptoblog.com"));
    }

    #[tokio::test]
    async fn test_sitemap_xml() {
        let (app, backend) = memory_app();
        seed_post(&backend, "Bitcoin halving", "Bitcoin").await;
        backend
            .insert(Table::Pages, json!({"title": "About", "slug": "about"}), None)
            .await
            .unwrap();

        let response = get(&app, "/sitemap.xml", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
        let body = body_text(response).await;
        assert_eq!(body.matches("<url>").count(), 6);
        assert!(body.contains("<loc>https://merncryptoblog.com/post/1</loc>"));
        assert!(body.contains("<loc>https://merncryptoblog.com/page/about</loc>"));
    }

    #[tokio::test]
    async fn test_sitemap_page_lists_content() {
        let (app, backend) = memory_app();
        seed_post(&backend, "Bitcoin halving", "Bitcoin").await;
        let body = body_text(get(&app, "/sitemap", None).await).await;
        assert!(body.contains(r#"<a href="/post/1">Bitcoin halving</a>"#));
        assert!(body.contains("&lt;urlset"));
    }

    #[tokio::test]
    async fn test_robots_txt() {
        let (app, _) = memory_app();
        let response = get(&app, "/robots.txt", None).await;
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let body = body_text(response).await;
        assert!(body.contains("Sitemap: https://merncryptoblog.com/sitemap.xml"));
        assert!(body.contains("Disallow: /admin/"));
    }

    #[tokio::test]
    async fn test_failed_reads_degrade_to_empty_views() {
        let (app, backend) = flaky_app();
        seed_post(&backend.inner, "Hidden during outage", "Bitcoin").await;
        backend.set_reads_down(true);

        let response = get(&app, "/sitemap.xml", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert_eq!(body.matches("<url>").count(), 4);
        assert!(!body.contains("/post/1"));

        let response = get(&app, "/blog", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("No posts available yet."));
        assert!(!body.contains("Hidden during outage"));

        let response = get(&app, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        backend.set_reads_down(false);
        let body = body_text(get(&app, "/blog", None).await).await;
        assert!(body.contains("Hidden during outage"));
    }
}
