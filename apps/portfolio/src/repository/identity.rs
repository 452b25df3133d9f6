//! Identity client: password sign-in, token refresh and sign-out against the
//! backend's auth service.
//!
//! No other module talks to the identity service directly; the repository owns
//! the only handle.
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::IdentityConfig;
use crate::models::session::Session;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The service understood the request and refused it (bad credentials, revoked token).
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity service error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    email: Option<String>,
}

/// Both historical error shapes of the auth service.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl TokenResponse {
    fn into_session(self, fallback_email: &str) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            email: self
                .user
                .and_then(|u| u.email)
                .unwrap_or_else(|| fallback_email.to_string()),
            expires_at: Utc::now() + Duration::seconds(self.expires_in.max(0)),
        }
    }
}

/// [`IdentityService`] over the backend's REST auth endpoints.
#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoTrueClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn token<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<TokenResponse, IdentityError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        Ok(response.json().await?)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> IdentityError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| body.to_string());

    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        IdentityError::Rejected(message)
    } else {
        IdentityError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl IdentityService for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let token = self
            .token("password", &PasswordGrant { email, password })
            .await?;
        debug!("Password sign-in succeeded for {email}");
        Ok(token.into_session(email))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let token = self
            .token("refresh_token", &RefreshGrant { refresh_token })
            .await?;
        Ok(token.into_session(""))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_credentials_are_rejected_with_service_message() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert!(matches!(err, IdentityError::Rejected(ref m) if m == "Invalid login credentials"));
    }

    #[test]
    fn test_newer_error_shape_is_understood() {
        let err = classify_failure(StatusCode::BAD_REQUEST, r#"{"code":400,"msg":"Email not confirmed"}"#);
        assert!(matches!(err, IdentityError::Rejected(ref m) if m == "Email not confirmed"));
    }

    #[test]
    fn test_server_errors_are_not_credential_failures() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, IdentityError::Api { status: 502, .. }));
    }

    #[test]
    fn test_token_response_falls_back_to_submitted_email() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"user":{}}"#,
        )
        .unwrap();
        let session = token.into_session("me@example.com");
        assert_eq!(session.email, "me@example.com");
        assert!(!session.is_expired(Utc::now()));
    }
}
