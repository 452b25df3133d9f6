pub mod admin;
pub mod auth;
pub mod health;
pub mod public;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Multipart overhead on top of the largest accepted file.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let login_path = state.config.login_path.clone();
    let body_limit = state.config.max_upload_bytes + BODY_LIMIT_SLACK;

    Router::new()
        .route("/health", get(health::health_handler))
        // Public site
        .route("/", get(public::home))
        .route("/projects", get(public::projects))
        .route("/blog", get(public::blog))
        .route("/blog/:slug", get(public::blog_post))
        .route("/blog/:slug/comments", post(public::post_comment))
        .route("/contact", get(public::contact_page).post(public::contact))
        .route("/subscribe", post(public::subscribe))
        // Session gate
        .route(&login_path, get(auth::login_page).post(auth::login))
        .route("/admin/logout", post(auth::logout))
        // Dashboard
        .route("/admin", get(admin::dashboard))
        .route("/admin/:kind/new", get(admin::new_record))
        .route("/admin/:kind/:id/edit", get(admin::edit_record))
        .route("/admin/:kind/editor", post(admin::submit_editor))
        .route(
            "/admin/:kind/:id/delete",
            get(admin::confirm_delete).post(admin::delete_record),
        )
        .fallback(public::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_LOGIN_PATH};
    use crate::models::content::BlogPost;
    use crate::repository::fakes::{repository_with, FakeIdentity, MemoryStore, TEST_EMAIL, TEST_PASSWORD};
    use std::sync::Arc;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, Response, StatusCode};
    use tower::ServiceExt;

    fn config() -> Config {
        Config {
            database_url: None,
            redis_url: None,
            identity: None,
            storage: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            max_upload_bytes: 1024,
            session_ttl_secs: 3600,
            port: 0,
            rust_log: "info".into(),
        }
    }

    async fn app() -> Router {
        build_router(AppState::load(FakeIdentity::repository(), config()).await)
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::post(DEFAULT_LOGIN_PATH)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("email={email}&password={password}")))
            .unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response<Body>) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_admin_without_session_redirects_home() {
        let response = app()
            .await
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_login_path_is_not_the_conventional_one() {
        let response = app()
            .await
            .oneshot(Request::get("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_credentials_stay_unauthenticated_with_error() {
        let response = app()
            .await
            .oneshot(login_request(TEST_EMAIL, "wrong"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response).await.contains("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_login_then_dashboard_reachable_with_cookie() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(login_request(TEST_EMAIL, TEST_PASSWORD))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/admin");
        let cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("sid="));

        let response = app
            .clone()
            .oneshot(
                Request::get("/admin?tab=skills")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("/admin/skills/new"));

        // Already signed in: the login page forwards to the dashboard.
        let response = app
            .clone()
            .oneshot(
                Request::get(DEFAULT_LOGIN_PATH)
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/admin");

        let response = app
            .clone()
            .oneshot(
                Request::post("/admin/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/");

        let response = app
            .oneshot(
                Request::get("/admin")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_blog_detail_resolves_slug_then_id() {
        let app = app().await;
        for address in ["seo-strategy-2024", "00000000-0000-4000-8000-000000000401"] {
            let response = app
                .clone()
                .oneshot(Request::get(format!("/blog/{address}")).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{address}");
            assert!(body_text(response).await.contains("SEO Strategy for 2024"));
        }
        let response = app
            .oneshot(Request::get("/blog/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blog_link_with_reserved_characters_reaches_post() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        repo.save_post(BlogPost {
            title: "C# Tips".into(),
            slug: Some("c#-tips?/100%".into()),
            ..Default::default()
        })
        .await
        .unwrap();
        let app = build_router(AppState::load(repo, config()).await);

        let listing = body_text(
            app.clone()
                .oneshot(Request::get("/blog").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        let href = "/blog/c%23-tips%3F%2F100%25";
        assert!(listing.contains(&format!("href=\"{href}\"")), "{listing}");

        let response = app
            .oneshot(Request::get(href).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("C# Tips"));
        assert!(page.contains(&format!("action=\"{href}/comments\"")));
    }

    #[tokio::test]
    async fn test_public_pages_render_fallback_content() {
        let app = app().await;
        for path in ["/", "/projects", "/blog", "/contact", "/health"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn test_subscribe_without_backend_reports_error() {
        let response = app()
            .await
            .oneshot(
                Request::post("/subscribe")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=fan%40example.com"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Backend not connected"));
    }
}
