//! In-process stand-ins for the backends, used by repository and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::session::Session;
use crate::repository::identity::{IdentityError, IdentityService};
use crate::repository::sessions::MemorySessionStore;
use crate::repository::storage::{ObjectStorage, StorageError};
use crate::repository::store::{ContentStore, Direction, Select, StoreError, Table};
use crate::repository::{Backends, Repository};

pub const TEST_EMAIL: &str = "owner@example.com";
pub const TEST_PASSWORD: &str = "secret";

type Row = Map<String, Value>;

/// Table store kept in memory. Assigns ids and `created_at` the way the
/// database defaults do.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    received: Mutex<Vec<(String, Row)>>,
    reject_writes: Option<String>,
}

impl MemoryStore {
    /// Reads succeed (empty); every write is refused with `message`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_writes: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn seed(&self, table: &str, row: Value) {
        if let Value::Object(row) = row {
            self.tables
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .push(row);
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Rows exactly as the repository sent them.
    pub fn received_rows(&self, table: &str) -> Vec<Row> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    fn write(&self, table: &Table, mut row: Row) -> Result<(), StoreError> {
        if let Some(message) = &self.reject_writes {
            return Err(StoreError::Rejected(message.clone()));
        }
        self.received
            .lock()
            .unwrap()
            .push((table.name.to_string(), row.clone()));

        if !row.contains_key("id") {
            row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        if table.is_column("created_at") && !row.contains_key("created_at") {
            row.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        }

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.name.to_string()).or_default();
        match rows.iter_mut().find(|existing| existing.get("id") == row.get("id")) {
            Some(existing) => existing.extend(row),
            None => rows.push(row),
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn select(&self, query: Select<'_>) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<Row> = self
            .rows(query.table.name)
            .into_iter()
            .filter(|row| match query.filter {
                Some((column, value)) => row.get(column).and_then(Value::as_str) == Some(value),
                None => true,
            })
            .collect();

        if let Some((column, direction)) = query.table.order {
            let key = |row: &Row| row.get(column).map(Value::to_string).unwrap_or_default();
            rows.sort_by(|a, b| match direction {
                Direction::Asc => key(a).cmp(&key(b)),
                Direction::Desc => key(b).cmp(&key(a)),
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn upsert(&self, table: &Table, row: Row) -> Result<(), StoreError> {
        self.write(table, row)
    }

    async fn insert(&self, table: &Table, row: Row) -> Result<(), StoreError> {
        self.write(table, row)
    }

    async fn delete(&self, table: &Table, id: &str) -> Result<(), StoreError> {
        if let Some(message) = &self.reject_writes {
            return Err(StoreError::Rejected(message.clone()));
        }
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table.name) {
            rows.retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }
}

/// A database that is never reachable.
pub struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn select(&self, _query: Select<'_>) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn upsert(&self, _table: &Table, _row: Row) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _table: &Table, _row: Row) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _table: &Table, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[derive(Default)]
pub struct FakeStorage {
    keys: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(&self, key: &str, _body: Bytes, _content_type: &str) -> Result<String, StorageError> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("https://cdn.test/{key}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Accepting,
    IssuesExpiredTokens,
    Unreachable,
}

/// Accepts [`TEST_EMAIL`] / [`TEST_PASSWORD`] and nothing else.
pub struct FakeIdentity {
    mode: Mode,
}

impl FakeIdentity {
    fn repository_in(mode: Mode) -> Repository {
        Repository::new(
            Backends {
                store: None,
                storage: None,
                identity: Some(Arc::new(FakeIdentity { mode })),
                sessions: Arc::new(MemorySessionStore::new(3600)),
            },
            1024,
        )
    }

    pub fn repository() -> Repository {
        Self::repository_in(Mode::Accepting)
    }

    pub fn repository_with_expired_tokens() -> Repository {
        Self::repository_in(Mode::IssuesExpiredTokens)
    }

    pub fn unreachable_repository() -> Repository {
        Self::repository_in(Mode::Unreachable)
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        if self.mode == Mode::Unreachable {
            return Err(IdentityError::Api {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        if email != TEST_EMAIL || password != TEST_PASSWORD {
            return Err(IdentityError::Rejected("Invalid login credentials".into()));
        }
        let lifetime = match self.mode {
            Mode::IssuesExpiredTokens => Duration::minutes(-1),
            _ => Duration::hours(1),
        };
        Ok(Session {
            access_token: "access-token".into(),
            refresh_token: Some("refresh-token".into()),
            email: email.to_string(),
            expires_at: Utc::now() + lifetime,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        if refresh_token != "refresh-token" {
            return Err(IdentityError::Rejected("Invalid refresh token".into()));
        }
        Ok(Session {
            access_token: "refreshed-token".into(),
            refresh_token: Some("refresh-token".into()),
            email: String::new(),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Repository backed by `store` with every other backend absent.
pub fn repository_with(store: Arc<dyn ContentStore>) -> Repository {
    Repository::new(
        Backends {
            store: Some(store),
            storage: None,
            identity: None,
            sessions: Arc::new(MemorySessionStore::new(3600)),
        },
        1024,
    )
}
