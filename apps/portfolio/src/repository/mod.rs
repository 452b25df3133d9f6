//! Content Repository, the single point of contact with persistent storage.
//!
//! Reads never fail: any backend error is logged and the built-in content (or
//! an empty list, for visitor submissions) is returned instead. Writes,
//! deletes, uploads and sign-in always report failure to the caller.

pub mod fallback;
pub mod identity;
pub mod period;
pub mod pg_store;
pub mod sessions;
pub mod storage;
pub mod store;

#[cfg(test)]
pub mod fakes;

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::content::{BlogPost, Experience, Profile, Project, Skill};
use crate::models::identifier::Identifier;
use crate::models::inbox::{
    Comment, CommentDraft, ContactMessage, MessageDraft, Subscriber,
};
use crate::models::session::Session;
use crate::repository::identity::{IdentityError, IdentityService};
use crate::repository::sessions::{SessionError, SessionStore};
use crate::repository::storage::{data_url, object_name, ObjectStorage, UploadedFile};
use crate::repository::store::{to_row, ContentStore, Record, Select, StoreError};

#[derive(Debug, Error)]
pub enum RepoError {
    /// The backend rejected a read or write.
    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    Validation(String),

    /// The backend could not be reached while authenticating.
    #[error("Could not reach the identity service: {0}")]
    Transport(String),

    #[error("Backend not connected: no {0} is configured")]
    NotConfigured(&'static str),
}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Rejected(message) => RepoError::Persistence(explain_rejection(message)),
            StoreError::Unavailable(message) => {
                RepoError::Persistence(format!("Database unreachable: {message}"))
            }
        }
    }
}

impl From<IdentityError> for RepoError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Rejected(message) => RepoError::Auth(message),
            other => RepoError::Transport(other.to_string()),
        }
    }
}

impl From<SessionError> for RepoError {
    fn from(e: SessionError) -> Self {
        RepoError::Persistence(e.to_string())
    }
}

/// Missing-column errors mean the database predates a newer field.
fn explain_rejection(message: String) -> String {
    let lower = message.to_lowercase();
    let missing_column = lower.contains("column")
        && (lower.contains("does not exist") || lower.contains("could not find"));
    if missing_column {
        format!(
            "Database schema is out of date ({message}). Apply the latest migration to add the missing columns."
        )
    } else {
        message
    }
}

/// Every collection the site renders, fetched together.
#[derive(Debug, Clone, Default)]
pub struct ContentSnapshot {
    pub profile: Profile,
    pub experiences: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub posts: Vec<BlogPost>,
    pub comments: Vec<Comment>,
    pub messages: Vec<ContactMessage>,
    pub subscribers: Vec<Subscriber>,
}

/// Backend handles. Each is constructed once at startup; `None` means the
/// matching backend is not configured.
pub struct Backends {
    pub store: Option<Arc<dyn ContentStore>>,
    pub storage: Option<Arc<dyn ObjectStorage>>,
    pub identity: Option<Arc<dyn IdentityService>>,
    pub sessions: Arc<dyn SessionStore>,
}

pub struct Repository {
    store: Option<Arc<dyn ContentStore>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    identity: Option<Arc<dyn IdentityService>>,
    sessions: Arc<dyn SessionStore>,
    max_upload_bytes: usize,
}

impl Repository {
    pub fn new(backends: Backends, max_upload_bytes: usize) -> Self {
        Self {
            store: backends.store,
            storage: backends.storage,
            identity: backends.identity,
            sessions: backends.sessions,
            max_upload_bytes,
        }
    }

    fn store(&self) -> Result<&dyn ContentStore, RepoError> {
        self.store
            .as_deref()
            .ok_or(RepoError::NotConfigured("database"))
    }

    // ────────────────────────────────────────────────────────────────────
    // Generic read/write helpers
    // ────────────────────────────────────────────────────────────────────

    async fn read<R: Record>(&self, query: Select<'_>) -> Result<Vec<R>, RepoError> {
        let rows = self.store()?.select(query).await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    RepoError::Persistence(format!("unreadable row in '{}': {e}", R::TABLE.name))
                })
            })
            .collect()
    }

    /// Full collection, or `fallback()` when the read fails or comes back empty.
    async fn collection<R: Record>(&self, fallback: fn() -> Vec<R>) -> Vec<R> {
        if self.store.is_none() {
            debug!(table = R::TABLE.name, "No database configured; serving built-in content");
            return fallback();
        }
        match self.read::<R>(Select::all(&R::TABLE)).await {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => fallback(),
            Err(e) => {
                warn!(table = R::TABLE.name, "Read failed, serving built-in content: {e}");
                fallback()
            }
        }
    }

    /// Newest-first visitor submissions; empty on any failure.
    async fn submissions<R: Record>(&self, query: Select<'_>) -> Vec<R> {
        if self.store.is_none() {
            return Vec::new();
        }
        self.read::<R>(query).await.unwrap_or_else(|e| {
            warn!(table = R::TABLE.name, "Read failed, showing nothing: {e}");
            Vec::new()
        })
    }

    async fn upsert<R: Record>(&self, record: &R) -> Result<(), RepoError> {
        let store = self.store()?;
        let row = to_row(record)?;
        store.upsert(&R::TABLE, row).await?;
        info!(table = R::TABLE.name, new = record.id().is_new(), "Saved record");
        Ok(())
    }

    async fn insert<R: Record>(&self, record: &R) -> Result<(), RepoError> {
        let store = self.store()?;
        store.insert(&R::TABLE, to_row(record)?).await?;
        info!(table = R::TABLE.name, "Inserted record");
        Ok(())
    }

    async fn delete<R: Record>(&self, id: &str) -> Result<(), RepoError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RepoError::Validation("Nothing to delete: missing id".into()));
        }
        self.store()?.delete(&R::TABLE, id).await?;
        info!(table = R::TABLE.name, id, "Deleted record");
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────
    // Profile
    // ────────────────────────────────────────────────────────────────────

    /// The stored profile merged over the default, or the default itself.
    pub async fn get_profile(&self) -> Profile {
        let Some(store) = self.store.as_deref() else {
            return fallback::profile();
        };
        match store.select(Select::all(&Profile::TABLE).limit(1)).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(row) => merge_over_default(row),
                None => fallback::profile(),
            },
            Err(e) => {
                warn!("Profile read failed, serving default profile: {e}");
                fallback::profile()
            }
        }
    }

    /// Upserts the singleton profile. A draft without an id takes over the id
    /// of the row already stored, so there is never more than one.
    pub async fn save_profile(&self, mut profile: Profile) -> Result<(), RepoError> {
        if profile.id.is_new() {
            let rows = self
                .store()?
                .select(Select::all(&Profile::TABLE).limit(1))
                .await?;
            if let Some(id) = rows.first().and_then(|r| r.get("id")).and_then(Value::as_str) {
                profile.id = Identifier::existing(id);
            }
        }
        self.upsert(&profile).await
    }

    // ────────────────────────────────────────────────────────────────────
    // Collections
    // ────────────────────────────────────────────────────────────────────

    pub async fn get_experiences(&self) -> Vec<Experience> {
        let mut entries = self.collection(fallback::experiences).await;
        period::sort_most_recent_first(&mut entries);
        entries
    }

    pub async fn save_experience(&self, item: Experience) -> Result<(), RepoError> {
        self.upsert(&item).await
    }

    pub async fn delete_experience(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<Experience>(id).await
    }

    pub async fn get_skills(&self) -> Vec<Skill> {
        self.collection(fallback::skills).await
    }

    pub async fn save_skill(&self, item: Skill) -> Result<(), RepoError> {
        self.upsert(&item).await
    }

    pub async fn delete_skill(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<Skill>(id).await
    }

    pub async fn get_projects(&self) -> Vec<Project> {
        self.collection(fallback::projects).await
    }

    pub async fn save_project(&self, item: Project) -> Result<(), RepoError> {
        self.upsert(&item).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<Project>(id).await
    }

    pub async fn get_posts(&self) -> Vec<BlogPost> {
        self.collection(fallback::posts).await
    }

    pub async fn save_post(&self, item: BlogPost) -> Result<(), RepoError> {
        self.upsert(&item).await
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<BlogPost>(id).await
    }

    // ────────────────────────────────────────────────────────────────────
    // Visitor submissions
    // ────────────────────────────────────────────────────────────────────

    pub async fn get_comments(&self, post_id: &str) -> Vec<Comment> {
        self.submissions(Select::all(&Comment::TABLE).filter("post_id", post_id))
            .await
    }

    pub async fn get_all_comments(&self) -> Vec<Comment> {
        self.submissions(Select::all(&Comment::TABLE)).await
    }

    pub async fn save_comment(&self, draft: CommentDraft) -> Result<(), RepoError> {
        if draft.post_id.trim().is_empty() {
            return Err(RepoError::Validation("A comment must belong to a post".into()));
        }
        if draft.content.trim().is_empty() {
            return Err(RepoError::Validation("Comment cannot be empty".into()));
        }
        self.insert(&draft.into_comment()).await
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<Comment>(id).await
    }

    pub async fn get_messages(&self) -> Vec<ContactMessage> {
        self.submissions(Select::all(&ContactMessage::TABLE)).await
    }

    pub async fn save_message(&self, draft: MessageDraft) -> Result<(), RepoError> {
        let message = draft.into_message();
        if message.name.is_empty() || message.message.trim().is_empty() {
            return Err(RepoError::Validation("Name and message are required".into()));
        }
        validate_email(&message.email)?;
        self.insert(&message).await
    }

    pub async fn delete_message(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<ContactMessage>(id).await
    }

    pub async fn get_subscribers(&self) -> Vec<Subscriber> {
        self.submissions(Select::all(&Subscriber::TABLE)).await
    }

    /// Duplicate emails are left for the backend's unique constraint to reject.
    pub async fn save_subscriber(&self, email: &str) -> Result<(), RepoError> {
        let email = email.trim();
        validate_email(email)?;
        self.insert(&Subscriber {
            email: email.to_string(),
            ..Default::default()
        })
        .await
    }

    pub async fn delete_subscriber(&self, id: &str) -> Result<(), RepoError> {
        self.delete::<Subscriber>(id).await
    }

    // ────────────────────────────────────────────────────────────────────
    // Files
    // ────────────────────────────────────────────────────────────────────

    /// Stores the file and returns its public URL.
    ///
    /// With no bucket configured the file comes back as a `data:` URL. That
    /// keeps the editor usable but is not durable storage.
    pub async fn upload_file(&self, file: UploadedFile) -> Result<String, RepoError> {
        if file.bytes.is_empty() {
            return Err(RepoError::Upload(format!("'{}' is empty", file.file_name)));
        }
        if file.bytes.len() > self.max_upload_bytes {
            return Err(RepoError::Upload(format!(
                "'{}' is {} bytes; the limit is {} bytes",
                file.file_name,
                file.bytes.len(),
                self.max_upload_bytes
            )));
        }

        let Some(storage) = self.storage.as_deref() else {
            warn!(
                file = %file.file_name,
                "No object storage configured; file is inlined as a data URL and is not durable"
            );
            return Ok(data_url(&file));
        };

        let key = object_name(&file, Utc::now());
        let content_type = file.mime_type();
        storage
            .put(&key, file.bytes, &content_type)
            .await
            .map_err(|e| RepoError::Upload(e.to_string()))
    }

    // ────────────────────────────────────────────────────────────────────
    // Sessions
    // ────────────────────────────────────────────────────────────────────

    /// Signs in and returns the id of the stored session.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, RepoError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(RepoError::Auth("Email and password are required".into()));
        }
        let identity = self
            .identity
            .as_deref()
            .ok_or(RepoError::NotConfigured("identity service"))?;

        let session = identity.sign_in(email, password).await?;
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions.put(&session_id, &session).await?;
        info!("Admin signed in: {}", session.email);
        Ok(session_id)
    }

    /// Restores a stored session. An expired one gets a single refresh attempt.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        let stored = match self.sessions.get(session_id).await {
            Ok(stored) => stored?,
            Err(e) => {
                warn!("Session lookup failed: {e}");
                return None;
            }
        };
        if !stored.is_expired(Utc::now()) {
            return Some(stored);
        }

        let refreshed = match (self.identity.as_deref(), stored.refresh_token.as_deref()) {
            (Some(identity), Some(token)) => match identity.refresh(token).await {
                Ok(mut session) => {
                    if session.email.is_empty() {
                        session.email = stored.email.clone();
                    }
                    Some(session)
                }
                Err(e) => {
                    debug!("Session refresh failed: {e}");
                    None
                }
            },
            _ => None,
        };

        match refreshed {
            Some(session) => {
                if let Err(e) = self.sessions.put(session_id, &session).await {
                    warn!("Could not store refreshed session: {e}");
                }
                Some(session)
            }
            None => {
                if let Err(e) = self.sessions.remove(session_id).await {
                    warn!("Could not drop expired session: {e}");
                }
                None
            }
        }
    }

    pub async fn logout(&self, session_id: &str) {
        if let (Ok(Some(session)), Some(identity)) = (
            self.sessions.get(session_id).await,
            self.identity.as_deref(),
        ) {
            if let Err(e) = identity.sign_out(&session.access_token).await {
                warn!("Identity sign-out failed: {e}");
            }
        }
        if let Err(e) = self.sessions.remove(session_id).await {
            warn!("Could not drop session: {e}");
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Snapshot
    // ────────────────────────────────────────────────────────────────────

    /// Fetches every collection concurrently.
    pub async fn load_all(&self) -> ContentSnapshot {
        let (profile, experiences, skills, projects, posts, comments, messages, subscribers) = tokio::join!(
            self.get_profile(),
            self.get_experiences(),
            self.get_skills(),
            self.get_projects(),
            self.get_posts(),
            self.get_all_comments(),
            self.get_messages(),
            self.get_subscribers(),
        );
        ContentSnapshot {
            profile,
            experiences,
            skills,
            projects,
            posts,
            comments,
            messages,
            subscribers,
        }
    }
}

fn validate_email(email: &str) -> Result<(), RepoError> {
    if email.contains('@') && !email.starts_with('@') && !email.ends_with('@') {
        Ok(())
    } else {
        Err(RepoError::Validation("Please enter a valid email address".into()))
    }
}

/// Non-null stored columns override the default profile.
fn merge_over_default(row: Value) -> Profile {
    let Ok(Value::Object(mut merged)) = serde_json::to_value(fallback::profile()) else {
        return fallback::profile();
    };
    if let Value::Object(stored) = row {
        merged.extend(stored.into_iter().filter(|(_, v)| !v.is_null()));
    }
    serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
        warn!("Stored profile is unreadable, serving default profile: {e}");
        fallback::profile()
    })
}
