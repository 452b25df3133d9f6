use anyhow::{Context, Result};

/// Login page address. Deliberately not `/login`; override with `LOGIN_PATH`.
pub const DEFAULT_LOGIN_PATH: &str = "/gate-k7q2";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
///
/// Every backend group is optional. A missing group puts the matching part of
/// the repository into fallback mode: reads serve the built-in dataset and
/// writes fail. A partially configured group is a startup error.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub identity: Option<IdentityConfig>,
    pub storage: Option<StorageConfig>,
    pub login_path: String,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

/// Endpoint and public key of the backend's identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

/// S3-compatible bucket that receives uploads.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Prefix under which uploaded objects are publicly reachable.
    pub public_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let identity = match optional_env("BACKEND_URL") {
            Some(base_url) => Some(IdentityConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: require_env("BACKEND_API_KEY")?,
            }),
            None => None,
        };

        let storage = match optional_env("S3_BUCKET") {
            Some(bucket) => Some(StorageConfig {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
                public_url: require_env("STORAGE_PUBLIC_URL")?
                    .trim_end_matches('/')
                    .to_string(),
            }),
            None => None,
        };

        let login_path = validate_login_path(
            optional_env("LOGIN_PATH").unwrap_or_else(|| DEFAULT_LOGIN_PATH.into()),
        )?;

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            identity,
            storage,
            login_path,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Paths the router already serves; the login page may not sit on or under one.
const RESERVED_PATHS: &[&str] = &["/health", "/projects", "/blog", "/contact", "/subscribe", "/admin"];

fn validate_login_path(path: String) -> Result<String> {
    if !path.starts_with('/') || path == "/" || path.ends_with('/') {
        anyhow::bail!("LOGIN_PATH '{path}' must be a single path such as /gate-k7q2");
    }
    if path.contains(|c: char| matches!(c, ':' | '*' | '?' | '#')) {
        anyhow::bail!("LOGIN_PATH '{path}' must not contain route captures or query characters");
    }
    let taken = RESERVED_PATHS.iter().any(|reserved| {
        path == *reserved
            || path
                .strip_prefix(reserved)
                .is_some_and(|rest| rest.starts_with('/'))
    });
    if taken {
        anyhow::bail!("LOGIN_PATH '{path}' overlaps a route the site already serves");
    }
    Ok(path)
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and empty variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
