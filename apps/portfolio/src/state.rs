use std::sync::{Arc, RwLock};

use tracing::info;

use crate::config::Config;
use crate::repository::{ContentSnapshot, Repository};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub data: Arc<SiteData>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Loads the first snapshot before the server starts accepting requests.
    pub async fn load(repo: Repository, config: Config) -> Self {
        let repo = Arc::new(repo);
        let data = Arc::new(SiteData::new(repo.load_all().await));
        AppState {
            repo,
            data,
            config: Arc::new(config),
        }
    }
}

/// The snapshot every page renders from. Replaced wholesale after each mutation.
pub struct SiteData {
    current: RwLock<Arc<ContentSnapshot>>,
}

impl SiteData {
    pub fn new(snapshot: ContentSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<ContentSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-fetches every collection and swaps the snapshot in.
    pub async fn reload(&self, repo: &Repository) -> Arc<ContentSnapshot> {
        let fresh = Arc::new(repo.load_all().await);
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&fresh),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&fresh),
        }
        info!(
            posts = fresh.posts.len(),
            projects = fresh.projects.len(),
            "Content reloaded"
        );
        fresh
    }
}
