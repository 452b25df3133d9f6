use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::session::Session;
use crate::repository::RepoError;
use crate::state::AppState;
use crate::views;

pub const SESSION_COOKIE: &str = "sid";

/// An authenticated admin. Extracting it from a request without a live
/// session redirects the visitor to the home page.
pub struct AdminSession {
    pub id: String,
    pub session: Session,
}

async fn restore(jar: &CookieJar, state: &AppState) -> Option<AdminSession> {
    let id = jar.get(SESSION_COOKIE)?.value().to_string();
    let session = state.repo.get_session(&id).await?;
    Some(AdminSession { id, session })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match restore(&jar, state).await {
            Some(admin) => Ok(admin),
            None => {
                warn!(path = %parts.uri.path(), "Unauthenticated admin request");
                Err(Redirect::to("/"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// GET {login_path}
pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if restore(&jar, &state).await.is_some() {
        return Redirect::to("/admin").into_response();
    }
    Html(views::admin::login(&state.config.login_path, "", None)).into_response()
}

/// POST {login_path}
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.repo.login(&form.email, &form.password).await {
        Ok(session_id) => {
            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to("/admin")).into_response()
        }
        Err(e) => {
            let status = match e {
                RepoError::Auth(_) => StatusCode::UNAUTHORIZED,
                RepoError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            info!("Sign-in refused: {e}");
            let page = views::admin::login(&state.config.login_path, &form.email, Some(&e.to_string()));
            (status, Html(page)).into_response()
        }
    }
}

/// POST /admin/logout
pub async fn logout(State(state): State<AppState>, admin: AdminSession, jar: CookieJar) -> impl IntoResponse {
    state.repo.logout(&admin.id).await;
    info!("Admin signed out: {}", admin.session.email);
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
