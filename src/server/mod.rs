//! HTTP server: public site, login and the admin console

pub mod admin;
pub mod auth;
pub mod public;

use anyhow::{Context as _, Result};
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Datelike, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::SiteConfig;
use crate::content::{ContentStore, Settings};
use crate::error::AppResult;
use crate::seo::{structured, SeoMeta};
use crate::templates::{LayoutData, TemplateRenderer, STYLESHEET};

/// Session expiry after inactivity
pub const SESSION_EXPIRY_HOURS: i64 = 24;

/// Shared state of the running site
pub struct ServerState {
    pub config: SiteConfig,
    pub store: ContentStore,
    pub renderer: TemplateRenderer,
}

pub type AppState = Arc<ServerState>;

impl ServerState {
    pub fn new(config: SiteConfig, store: ContentStore) -> Result<Self> {
        let renderer = TemplateRenderer::new().context("failed to load templates")?;
        Ok(Self {
            config,
            store,
            renderer,
        })
    }

    pub(crate) fn render(&self, template: &str, context: &Context) -> AppResult<Html<String>> {
        Ok(Html(self.renderer.render(template, context)?))
    }

    /// Base context for a public page: layout chrome, head tags and JSON-LD
    pub(crate) async fn page_context(
        &self,
        session: &Session,
        seo: &SeoMeta,
        documents: &[serde_json::Value],
        settings: Option<&Settings>,
    ) -> Context {
        let user = auth::current_user(session).await;
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        let layout = LayoutData {
            site_name: settings
                .and_then(|s| non_empty(&s.site_name))
                .unwrap_or_else(|| self.config.title.clone()),
            tagline: self.config.tagline.clone(),
            description: settings
                .and_then(|s| non_empty(&s.description))
                .unwrap_or_else(|| self.config.description.clone()),
            favicon_url: settings.and_then(|s| non_empty(&s.favicon_url)),
            contact_email: self.config.contact_email.clone(),
            seo: seo.render(),
            structured_data: documents.iter().map(structured::to_script_tag).collect(),
            signed_in: user.is_some(),
            user_email: user.and_then(|u| u.email),
            year: Utc::now().year(),
        };

        let mut context = Context::new();
        context.insert("layout", &layout);
        context
    }

    /// Render the 404 page with a heading, a message and a way back
    pub(crate) async fn not_found(
        &self,
        session: &Session,
        heading: &str,
        message: &str,
        back: (&str, &str),
    ) -> AppResult<Response> {
        let seo = SeoMeta::for_path(&self.config, "/")
            .title(format!("{} - {}", heading, self.config.title));
        let mut context = self.page_context(session, &seo, &[], None).await;
        context.insert("heading", heading);
        context.insert("message", message);
        context.insert("back_path", back.0);
        context.insert("back_label", back.1);

        let html = self.render("not_found.html", &context)?;
        Ok((StatusCode::NOT_FOUND, html).into_response())
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_EXPIRY_HOURS)));

    Router::new()
        // Public site
        .route("/", get(public::home))
        .route("/blog", get(public::blog))
        .route("/post/{id}", get(public::post))
        .route("/page/{slug}", get(public::page))
        .route("/contact", get(public::contact))
        .route("/privacy", get(public::privacy))
        .route("/sitemap", get(public::sitemap_page))
        .route("/sitemap.xml", get(public::sitemap_xml))
        .route("/robots.txt", get(public::robots_txt))
        .route("/static/style.css", get(stylesheet))
        // Auth
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", post(auth::logout))
        // Admin console
        .route("/admin", get(admin::dashboard))
        .route("/admin/posts", get(admin::list_posts).post(admin::create_post))
        .route("/admin/posts/new", get(admin::new_post))
        .route("/admin/posts/{id}", post(admin::update_post))
        .route("/admin/posts/{id}/edit", get(admin::edit_post))
        .route("/admin/posts/{id}/delete", post(admin::delete_post))
        .route("/admin/pages", get(admin::list_pages).post(admin::create_page))
        .route("/admin/pages/new", get(admin::new_page))
        .route("/admin/pages/{id}", post(admin::update_page))
        .route("/admin/pages/{id}/edit", get(admin::edit_page))
        .route("/admin/pages/{id}/delete", post(admin::delete_page))
        .route(
            "/admin/settings",
            get(admin::settings_form).post(admin::save_settings),
        )
        .fallback(public::fallback)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

/// Start the server and run until Ctrl+C
pub async fn start(state: AppState, ip: &str, port: u16) -> Result<()> {
    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", ip, port))?;

    if !state.store.is_configured() {
        tracing::warn!("Running without a hosted backend: lists are empty and login is disabled");
    }

    let app = router(state);

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
    tracing::info!("Shutting down");
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_text, get, memory_app};
    use axum::http::{header, StatusCode};

    #[tokio::test]
    async fn test_stylesheet_is_served() {
        let (app, _) = memory_app();
        let response = get(&app, "/static/style.css", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (app, _) = memory_app();
        let response = get(&app, "/does/not/exist", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_text(response).await;
        assert!(body.contains("Page Not Found"));
    }
}
