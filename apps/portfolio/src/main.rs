mod config;
mod db;
mod errors;
mod forms;
mod markdown;
mod models;
mod repository;
mod routes;
mod state;
mod views;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::repository::identity::{GoTrueClient, IdentityService};
use crate::repository::pg_store::PgStore;
use crate::repository::sessions::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::repository::storage::{ObjectStorage, S3Storage};
use crate::repository::store::ContentStore;
use crate::repository::{Backends, Repository};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a partially configured backend group)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting portfolio v{}", env!("CARGO_PKG_VERSION"));

    let backends = build_backends(&config).await?;
    let repo = Repository::new(backends, config.max_upload_bytes);

    // First snapshot is loaded before the listener opens
    let state = AppState::load(repo, config.clone()).await;
    info!("Login page mounted at {}", config.login_path);

    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs every configured backend once. Missing groups leave the
/// matching handle empty and the repository serves fallbacks for it.
async fn build_backends(config: &Config) -> Result<Backends> {
    let store: Option<Arc<dyn ContentStore>> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url)?;
            Some(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; serving built-in content and refusing writes");
            None
        }
    };

    let storage: Option<Arc<dyn ObjectStorage>> = match &config.storage {
        Some(storage) => {
            let s3 = S3Storage::connect(storage).await;
            info!("S3 client initialized (bucket: {})", storage.bucket);
            Some(Arc::new(s3))
        }
        None => {
            warn!("S3_BUCKET not set; uploads become inline data URLs and are not durable");
            None
        }
    };

    let identity: Option<Arc<dyn IdentityService>> = match &config.identity {
        Some(identity) => {
            let client = GoTrueClient::new(identity)?;
            info!("Identity client initialized ({})", identity.base_url);
            Some(Arc::new(client))
        }
        None => {
            warn!("BACKEND_URL not set; admin sign-in is unavailable");
            None
        }
    };

    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Redis client initialized (sessions expire after {}s)", config.session_ttl_secs);
            Arc::new(RedisSessionStore::new(client, config.session_ttl_secs))
        }
        None => {
            info!("REDIS_URL not set; sessions are kept in memory");
            Arc::new(MemorySessionStore::new(config.session_ttl_secs))
        }
    };

    Ok(Backends {
        store,
        storage,
        identity,
        sessions,
    })
}
