//! Admin console: dashboard, post and page managers, settings

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tera::Context;

use super::auth::AdminSession;
use super::AppState;
use crate::backend::BackendError;
use crate::content::{or_empty, PageInput, PostInput, SettingsInput};
use crate::error::AppResult;
use crate::helpers::encode_component;
use crate::templates::Flash;

const SETTINGS_SAVED: &str = "Settings saved successfully!";
const SETTINGS_FAILED: &str = "Error saving settings. Please try again.";

/// `?notice=` / `?error=` carried across a redirect
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl FlashQuery {
    fn flash(self) -> Option<Flash> {
        match (self.error, self.notice) {
            (Some(error), _) => Some(Flash::error(error)),
            (None, Some(notice)) => Some(Flash::success(notice)),
            (None, None) => None,
        }
    }
}

/// Redirect to `path` with a flash message in the query string
fn redirect_with(path: &str, flash: Flash) -> Redirect {
    let key = if flash.kind == "error" { "error" } else { "notice" };
    Redirect::to(&format!("{}?{}={}", path, key, encode_component(&flash.message)))
}

/// Turn a write outcome into a redirect back to the manager
fn after_write(
    result: Result<(), BackendError>,
    path: &str,
    action: &str,
    success: &str,
    failure: &str,
) -> Redirect {
    match result {
        Ok(()) => {
            tracing::info!("{} succeeded", action);
            redirect_with(path, Flash::success(success))
        }
        Err(e) => {
            tracing::error!("Error {}: {}", action, e);
            redirect_with(path, Flash::error(failure))
        }
    }
}

fn admin_context(
    state: &AppState,
    admin: &AdminSession,
    section: &str,
    heading: &str,
    flash: Option<Flash>,
) -> Context {
    let mut context = Context::new();
    context.insert("site_name", &state.config.title);
    context.insert("section", section);
    context.insert("heading", heading);
    context.insert("user_email", &admin.user.email);
    context.insert("backend_configured", &state.store.is_configured());
    context.insert("flash", &flash);
    context
}

pub async fn dashboard(
    State(state): State<AppState>,
    admin: AdminSession,
    Query(query): Query<FlashQuery>,
) -> AppResult<Response> {
    let dashboard = or_empty(state.store.dashboard().await, "fetching dashboard data");

    let mut context = admin_context(&state, &admin, "dashboard", "Dashboard", query.flash());
    context.insert("dashboard", &dashboard);
    Ok(state.render("admin/dashboard.html", &context)?.into_response())
}

// Posts

pub async fn list_posts(
    State(state): State<AppState>,
    admin: AdminSession,
    Query(query): Query<FlashQuery>,
) -> AppResult<Response> {
    let posts = or_empty(state.store.list_posts(None).await, "fetching posts");

    let mut context = admin_context(&state, &admin, "posts", "Posts", query.flash());
    context.insert("posts", &posts);
    Ok(state.render("admin/posts.html", &context)?.into_response())
}

fn post_form(
    state: &AppState,
    admin: &AdminSession,
    input: &PostInput,
    editing: Option<i64>,
) -> AppResult<Response> {
    let (heading, action) = match editing {
        Some(id) => ("Edit Post".to_string(), format!("/admin/posts/{}", id)),
        None => ("Create New Post".to_string(), "/admin/posts".to_string()),
    };
    let mut context = admin_context(state, admin, "posts", &heading, None);
    context.insert("input", input);
    context.insert("editing", &editing.is_some());
    context.insert("action", &action);
    Ok(state.render("admin/post_form.html", &context)?.into_response())
}

pub async fn new_post(State(state): State<AppState>, admin: AdminSession) -> AppResult<Response> {
    post_form(&state, &admin, &PostInput::default(), None)
}

pub async fn edit_post(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    match state.store.get_post(id).await {
        Ok(Some(post)) => post_form(&state, &admin, &PostInput::from(&post), Some(id)),
        Ok(None) => {
            state
                .not_found(
                    &admin.session,
                    "Post Not Found",
                    "The post you're trying to edit doesn't exist.",
                    ("/admin/posts", "Back to Posts"),
                )
                .await
        }
        Err(e) => {
            tracing::error!("Error fetching post {}: {}", id, e);
            let flash = Flash::error("Error loading post. Please try again.");
            Ok(redirect_with("/admin/posts", flash).into_response())
        }
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    admin: AdminSession,
    Form(input): Form<PostInput>,
) -> Redirect {
    let result = state.store.create_post(&input, admin.token()).await;
    after_write(
        result,
        "/admin/posts",
        "creating post",
        "Post created.",
        "Error saving post. Please try again.",
    )
}

pub async fn update_post(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<i64>,
    Form(input): Form<PostInput>,
) -> Redirect {
    let result = state.store.update_post(id, &input, admin.token()).await;
    after_write(
        result,
        "/admin/posts",
        "updating post",
        "Post updated.",
        "Error saving post. Please try again.",
    )
}

pub async fn delete_post(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<i64>,
) -> Redirect {
    let result = state.store.delete_post(id, admin.token()).await;
    after_write(
        result,
        "/admin/posts",
        "deleting post",
        "Post deleted.",
        "Error deleting post. Please try again.",
    )
}

// Pages

pub async fn list_pages(
    State(state): State<AppState>,
    admin: AdminSession,
    Query(query): Query<FlashQuery>,
) -> AppResult<Response> {
    let pages = or_empty(state.store.list_pages().await, "fetching pages");

    let mut context = admin_context(&state, &admin, "pages", "Pages", query.flash());
    context.insert("pages", &pages);
    Ok(state.render("admin/pages.html", &context)?.into_response())
}

fn page_form(
    state: &AppState,
    admin: &AdminSession,
    input: &PageInput,
    editing: Option<i64>,
) -> AppResult<Response> {
    let (heading, action) = match editing {
        Some(id) => ("Edit Page".to_string(), format!("/admin/pages/{}", id)),
        None => ("Create New Page".to_string(), "/admin/pages".to_string()),
    };
    let mut context = admin_context(state, admin, "pages", &heading, None);
    context.insert("input", input);
    context.insert("editing", &editing.is_some());
    context.insert("action", &action);
    Ok(state.render("admin/page_form.html", &context)?.into_response())
}

pub async fn new_page(State(state): State<AppState>, admin: AdminSession) -> AppResult<Response> {
    page_form(&state, &admin, &PageInput::default(), None)
}

pub async fn edit_page(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    match state.store.get_page(id).await {
        Ok(Some(page)) => page_form(&state, &admin, &PageInput::from(&page), Some(id)),
        Ok(None) => {
            state
                .not_found(
                    &admin.session,
                    "Page Not Found",
                    "The page you're trying to edit doesn't exist.",
                    ("/admin/pages", "Back to Pages"),
                )
                .await
        }
        Err(e) => {
            tracing::error!("Error fetching page {}: {}", id, e);
            let flash = Flash::error("Error loading page. Please try again.");
            Ok(redirect_with("/admin/pages", flash).into_response())
        }
    }
}

pub async fn create_page(
    State(state): State<AppState>,
    admin: AdminSession,
    Form(input): Form<PageInput>,
) -> Redirect {
    let result = state.store.create_page(&input, admin.token()).await;
    after_write(
        result,
        "/admin/pages",
        "creating page",
        "Page created.",
        "Error saving page. Please try again.",
    )
}

pub async fn update_page(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<i64>,
    Form(input): Form<PageInput>,
) -> Redirect {
    let result = state.store.update_page(id, &input, admin.token()).await;
    after_write(
        result,
        "/admin/pages",
        "updating page",
        "Page updated.",
        "Error saving page. Please try again.",
    )
}

pub async fn delete_page(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<i64>,
) -> Redirect {
    let result = state.store.delete_page(id, admin.token()).await;
    after_write(
        result,
        "/admin/pages",
        "deleting page",
        "Page deleted.",
        "Error deleting page. Please try again.",
    )
}

// Settings

pub async fn settings_form(
    State(state): State<AppState>,
    admin: AdminSession,
    Query(query): Query<FlashQuery>,
) -> AppResult<Response> {
    let settings = or_empty(state.store.get_settings().await, "fetching settings");
    let input = settings
        .as_ref()
        .map(SettingsInput::from)
        .unwrap_or_default();

    let mut context = admin_context(&state, &admin, "settings", "Site Settings", query.flash());
    context.insert("input", &input);
    Ok(state.render("admin/settings.html", &context)?.into_response())
}

pub async fn save_settings(
    State(state): State<AppState>,
    admin: AdminSession,
    Form(input): Form<SettingsInput>,
) -> Redirect {
    let result = state.store.save_settings(&input, admin.token()).await;
    after_write(
        result,
        "/admin/settings",
        "saving settings",
        SETTINGS_SAVED,
        SETTINGS_FAILED,
    )
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::backend::Table;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_admin_redirects_when_signed_out() {
        let (app, _) = memory_app();
        for uri in ["/admin", "/admin/posts", "/admin/pages/new", "/admin/settings"] {
            let response = get(&app, uri, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(location(&response), "/login");
        }

        let response = post_form(&app, "/admin/posts", "title=x&content=y", None).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_dashboard() {
        let (app, backend) = memory_app();
        let cookie = signed_in(&app, &backend).await;
        let response = get(&app, "/admin", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Total Posts"));
        assert!(body.contains(ADMIN_EMAIL));
    }

    #[tokio::test]
    async fn test_post_manager_crud() {
        let (app, backend) = memory_app();
        let cookie = signed_in(&app, &backend).await;

        let form = "title=Bitcoin+ETF+approved&content=Big+day&category=Bitcoin&tags=btc%2C+etf&image_url=";
        let response = post_form(&app, "/admin/posts", form, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/posts?notice=Post%20created.");
        assert_eq!(backend.row_count(Table::Posts), 1);

        let body = body_text(get(&app, "/admin/posts?notice=Post%20created.", Some(&cookie)).await).await;
        assert!(body.contains("Bitcoin ETF approved"));
        assert!(body.contains("Post created."));

        let body = body_text(get(&app, "/admin/posts/1/edit", Some(&cookie)).await).await;
        assert!(body.contains("Update Post"));
        assert!(body.contains(r#"value="btc, etf""#));

        let form = "title=Bitcoin+ETF+live&content=Bigger+day";
        let response = post_form(&app, "/admin/posts/1", form, Some(&cookie)).await;
        assert_eq!(location(&response), "/admin/posts?notice=Post%20updated.");
        let body = body_text(get(&app, "/post/1", None).await).await;
        assert!(body.contains("Bitcoin ETF live"));

        let response = post_form(&app, "/admin/posts/1/delete", "", Some(&cookie)).await;
        assert_eq!(location(&response), "/admin/posts?notice=Post%20deleted.");
        assert_eq!(backend.row_count(Table::Posts), 0);
    }

    #[tokio::test]
    async fn test_edit_missing_post_is_404() {
        let (app, backend) = memory_app();
        let cookie = signed_in(&app, &backend).await;
        let response = get(&app, "/admin/posts/42/edit", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_text(response).await;
        assert!(body.contains("Post Not Found"));
        assert!(body.contains("Back to Posts"));

        let response = get(&app, "/admin/pages/42/edit", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page Not Found"));
    }

    #[tokio::test]
    async fn test_edit_during_outage_redirects_with_error() {
        let (app, backend) = flaky_app();
        let cookie = signed_in(&app, &backend.inner).await;
        backend.set_reads_down(true);

        let response = get(&app, "/admin/posts/1/edit", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/admin/posts?error=Error%20loading%20post"));

        let response = get(&app, "/admin/pages/1/edit", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/admin/pages?error=Error%20loading%20page"));
    }

    #[tokio::test]
    async fn test_page_manager_derives_slug() {
        let (app, backend) = memory_app();
        let cookie = signed_in(&app, &backend).await;

        let form = "title=Terms+of+Service&slug=&content=Be+nice.";
        let response = post_form(&app, "/admin/pages", form, Some(&cookie)).await;
        assert_eq!(location(&response), "/admin/pages?notice=Page%20created.");

        let response = get(&app, "/page/terms-of-service", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Be nice."));

        let body = body_text(get(&app, "/admin/pages", Some(&cookie)).await).await;
        assert!(body.contains("/page/terms-of-service"));
    }

    #[tokio::test]
    async fn test_settings_save_twice_keeps_one_row() {
        let (app, backend) = memory_app();
        let cookie = signed_in(&app, &backend).await;

        for name in ["Chain Digest", "Chain Digest Daily"] {
            let form = format!("site_name={}&description=News&keywords=&favicon_url=", name.replace(' ', "+"));
            let response = post_form(&app, "/admin/settings", &form, Some(&cookie)).await;
            assert_eq!(
                location(&response),
                "/admin/settings?notice=Settings%20saved%20successfully!"
            );
        }
        assert_eq!(backend.row_count(Table::Settings), 1);

        let body = body_text(
            get(&app, "/admin/settings?notice=Settings%20saved%20successfully!", Some(&cookie)).await,
        )
        .await;
        assert!(body.contains(r#"value="Chain Digest Daily""#));
        assert!(body.contains("Settings saved successfully!"));
        assert!(body.contains("No keywords set"));
    }
}
