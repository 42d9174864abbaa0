//! Sign-in, sign-up, sign-out and the admin session guard

use axum::{
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::AppState;
use crate::backend::{BackendError, Credentials};
use crate::error::{AppError, AppResult};
use crate::seo::SeoMeta;
use crate::templates::Flash;

/// Session key holding the signed-in [`SessionUser`]
pub const SESSION_USER: &str = "user";

const SIGNED_UP: &str =
    "Account created! Check your email to confirm your address, then sign in.";

/// What the session remembers about the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub access_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

/// The signed-in user, if any
pub async fn current_user(session: &Session) -> Option<SessionUser> {
    session.get(SESSION_USER).await.ok().flatten()
}

/// Extractor for admin routes.
///
/// Redirects to `/login` when nobody is signed in or the backend no longer
/// accepts the stored access token.
pub struct AdminSession {
    pub user: SessionUser,
    pub session: Session,
}

impl AdminSession {
    pub fn token(&self) -> Option<&str> {
        Some(self.user.access_token.as_str())
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let Some(user) = current_user(&session).await else {
            return Err(Redirect::to("/login").into_response());
        };

        match state.store.backend().user(&user.access_token).await {
            Ok(_) => Ok(AdminSession { user, session }),
            Err(e) if e.is_auth_rejection() => {
                tracing::info!("Dropping stale admin session: {}", e);
                if let Err(e) = session.flush().await {
                    tracing::warn!("Failed to clear session: {}", e);
                }
                Err(Redirect::to("/login").into_response())
            }
            // Keep the session through an outage
            Err(e) => Err(AppError::Unavailable(e).into_response()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub mode: Option<String>,
}

impl LoginQuery {
    fn signup(&self) -> bool {
        self.mode.as_deref() == Some("signup")
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub mode: Option<String>,
}

async fn render_login(
    state: &AppState,
    session: &Session,
    signup: bool,
    email: &str,
    flash: Option<Flash>,
) -> AppResult<Response> {
    let (title, description) = if signup {
        (
            "Create Account",
            "Create an admin account for the dashboard.",
        )
    } else {
        ("Login", "Access the admin dashboard.")
    };
    let seo = SeoMeta::for_path(&state.config, "/login")
        .title(format!("{} - {} Admin", title, state.config.title))
        .description(Some(description))
        .keywords(Some("admin login, dashboard access, create account"));

    let mut context = state.page_context(session, &seo, &[], None).await;
    context.insert("signup", &signup);
    context.insert("email", email);
    context.insert("flash", &flash);
    Ok(state.render("login.html", &context)?.into_response())
}

pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    render_login(&state, &session, query.signup(), "", None).await
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password,
    };

    if form.mode.as_deref() == Some("signup") {
        return match state.store.sign_up(&credentials).await {
            Ok(user) => {
                tracing::info!("Registered account {}", user.email.as_deref().unwrap_or("?"));
                let flash = Flash::success(SIGNED_UP);
                render_login(&state, &session, false, &credentials.email, Some(flash)).await
            }
            Err(e) => {
                log_auth_error("Sign-up", &e);
                let flash = Flash::error(e.user_message());
                render_login(&state, &session, true, &credentials.email, Some(flash)).await
            }
        };
    }

    match state.store.sign_in(&credentials).await {
        Ok(auth) => {
            let user = SessionUser {
                access_token: auth.access_token,
                user_id: auth.user.id,
                email: auth.user.email,
            };
            session.cycle_id().await.map_err(anyhow::Error::from)?;
            session
                .insert(SESSION_USER, &user)
                .await
                .map_err(anyhow::Error::from)?;
            tracing::info!("Signed in {}", user.email.as_deref().unwrap_or(&user.user_id));
            Ok(Redirect::to("/admin").into_response())
        }
        Err(e) => {
            log_auth_error("Sign-in", &e);
            let flash = Flash::error(e.user_message());
            render_login(&state, &session, false, &credentials.email, Some(flash)).await
        }
    }
}

fn log_auth_error(action: &str, e: &BackendError) {
    match e {
        BackendError::Http(_) | BackendError::Decode(_) => {
            tracing::error!("{} failed: {}", action, e)
        }
        _ => tracing::info!("{} rejected: {}", action, e),
    }
}

pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<Redirect> {
    if let Some(user) = current_user(&session).await {
        if let Err(e) = state.store.sign_out(&user.access_token).await {
            tracing::warn!("Backend sign-out failed: {}", e);
        }
    }
    session.flush().await.map_err(anyhow::Error::from)?;
    Ok(Redirect::to("/"))
}
