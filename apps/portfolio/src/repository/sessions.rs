use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;

use crate::models::session::Session;

const KEY_PREFIX: &str = "portfolio:session:";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Stored session is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Server-side storage of backend sessions, keyed by the id held in the
/// visitor's cookie. Credentials are never stored.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, id: &str, session: &Session) -> Result<(), SessionError>;

    async fn get(&self, id: &str) -> Result<Option<Session>, SessionError>;

    async fn remove(&self, id: &str) -> Result<(), SessionError>;
}

/// Sessions kept in Redis so they survive restarts.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, id: &str, session: &Session) -> Result<(), SessionError> {
        let payload = serde_json::to_string(session)?;
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let _: () = con
            .set_ex(format!("{KEY_PREFIX}{id}"), payload, self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = con.get(format!("{KEY_PREFIX}{id}")).await?;
        payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(SessionError::from)
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let _: () = con.del(format!("{KEY_PREFIX}{id}")).await?;
        Ok(())
    }
}

/// Process-local sessions, used when no Redis URL is configured.
/// Entries older than the TTL are dropped lazily.
pub struct MemorySessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Session)>>,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Instant, Session)>> {
        // A poisoned map still holds valid sessions.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, id: &str, session: &Session) -> Result<(), SessionError> {
        let mut entries = self.entries();
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(id.to_string(), (Instant::now(), session.clone()));
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let entries = self.entries();
        Ok(entries
            .get(id)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, session)| session.clone()))
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        self.entries().remove(id);
        Ok(())
    }
}
