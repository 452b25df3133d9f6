use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::forms::editor::{self, EditorOutcome, RawSubmission};
use crate::forms::{blank_draft, synthesize, EditorKind, EditorState};
use crate::repository::storage::UploadedFile;
use crate::repository::{ContentSnapshot, RepoError, Repository};
use crate::routes::auth::AdminSession;
use crate::state::AppState;
use crate::views::admin::{self as admin_views, Tab};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub notice: Option<String>,
}

fn editor_kind(slug: &str) -> Result<EditorKind, AppError> {
    EditorKind::from_slug(slug).ok_or_else(|| AppError::NotFound(format!("No editor for '{slug}'")))
}

fn tab(slug: &str) -> Result<Tab, AppError> {
    Tab::from_slug(slug).ok_or_else(|| AppError::NotFound(format!("No dashboard tab '{slug}'")))
}

fn dashboard_url(tab: Tab, notice: Option<&str>) -> String {
    match notice {
        Some(notice) => format!("/admin?tab={}&notice={notice}", tab.slug()),
        None => format!("/admin?tab={}", tab.slug()),
    }
}

/// GET /admin
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(q): Query<DashboardQuery>,
) -> Html<String> {
    let tab = q.tab.as_deref().and_then(Tab::from_slug).unwrap_or_default();
    let message = match q.notice.as_deref() {
        Some("saved") => Some(Ok("Saved.".to_string())),
        Some("deleted") => Some(Ok("Deleted.".to_string())),
        _ => None,
    };
    Html(admin_views::dashboard(tab, &state.data.current(), message.as_ref()))
}

/// GET /admin/:kind/new
pub async fn new_record(
    _admin: AdminSession,
    Path(kind): Path<String>,
) -> Result<Html<String>, AppError> {
    let kind = editor_kind(&kind)?;
    let form = synthesize(kind, &blank_draft(kind), EditorState::default());
    Ok(Html(admin_views::editor(&form)))
}

/// GET /admin/:kind/:id/edit
pub async fn edit_record(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let kind = editor_kind(&kind)?;
    let draft = editor::existing_draft(kind, &state.data.current(), &id)
        .ok_or_else(|| AppError::NotFound(format!("No {} with id '{id}'", kind.noun())))?;
    let form = synthesize(kind, &draft, EditorState::default());
    Ok(Html(admin_views::editor(&form)))
}

async fn read_submission(mut multipart: Multipart) -> Result<RawSubmission, AppError> {
    let mut raw = RawSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes: Bytes = field.bytes().await?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                raw.files.push((
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                ));
            }
            None => {
                let value = field.text().await?;
                raw.fields.push((name, value));
            }
        }
    }
    Ok(raw)
}

/// POST /admin/:kind/editor
pub async fn submit_editor(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let kind = editor_kind(&kind)?;
    let tab = tab(kind.slug())?;
    let raw = read_submission(multipart).await?;

    Ok(match editor::handle(&state.repo, kind, raw).await {
        EditorOutcome::Saved => {
            state.data.reload(&state.repo).await;
            Redirect::to(&dashboard_url(tab, Some("saved"))).into_response()
        }
        EditorOutcome::Cancelled => Redirect::to(&dashboard_url(tab, None)).into_response(),
        EditorOutcome::Render(form) => {
            let status = if form.state.error.is_some() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::OK
            };
            (status, Html(admin_views::editor(&form))).into_response()
        }
    })
}

/// Human label of a record shown on the delete confirmation.
fn record_label(tab: Tab, data: &ContentSnapshot, id: &str) -> Option<String> {
    let matches = |candidate: &crate::models::identifier::Identifier| candidate.as_existing() == Some(id);
    match tab {
        Tab::Profile => None,
        Tab::Experience => data
            .experiences
            .iter()
            .find(|e| matches(&e.id))
            .map(|e| format!("{} at {}", e.role, e.company)),
        Tab::Skills => data.skills.iter().find(|s| matches(&s.id)).map(|s| s.name.clone()),
        Tab::Projects => data.projects.iter().find(|p| matches(&p.id)).map(|p| p.title.clone()),
        Tab::Blog => data.posts.iter().find(|p| matches(&p.id)).map(|p| p.title.clone()),
        Tab::Comments => data
            .comments
            .iter()
            .find(|c| matches(&c.id))
            .map(|c| format!("Comment by {}", c.user_name)),
        Tab::Messages => data
            .messages
            .iter()
            .find(|m| matches(&m.id))
            .map(|m| format!("Message from {}", m.name)),
        Tab::Subscribers => data.subscribers.iter().find(|s| matches(&s.id)).map(|s| s.email.clone()),
    }
}

/// GET /admin/:kind/:id/delete
pub async fn confirm_delete(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let tab = tab(&kind)?;
    if !tab.deletable() {
        return Err(AppError::Validation(format!("{} cannot be deleted", tab.title())));
    }
    let label = record_label(tab, &state.data.current(), &id).unwrap_or_else(|| id.clone());
    Ok(Html(admin_views::confirm_delete(tab, &id, &label)))
}

async fn delete(repo: &Repository, tab: Tab, id: &str) -> Result<(), RepoError> {
    match tab {
        Tab::Profile => Err(RepoError::Validation("The profile cannot be deleted".into())),
        Tab::Experience => repo.delete_experience(id).await,
        Tab::Skills => repo.delete_skill(id).await,
        Tab::Projects => repo.delete_project(id).await,
        Tab::Blog => repo.delete_post(id).await,
        Tab::Comments => repo.delete_comment(id).await,
        Tab::Messages => repo.delete_message(id).await,
        Tab::Subscribers => repo.delete_subscriber(id).await,
    }
}

/// POST /admin/:kind/:id/delete
pub async fn delete_record(
    State(state): State<AppState>,
    admin: AdminSession,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let tab = tab(&kind)?;
    match delete(&state.repo, tab, &id).await {
        Ok(()) => {
            info!(tab = tab.slug(), id = %id, by = %admin.session.email, "Record deleted");
            state.data.reload(&state.repo).await;
            Ok(Redirect::to(&dashboard_url(tab, Some("deleted"))).into_response())
        }
        Err(e) => {
            warn!(tab = tab.slug(), id = %id, "Delete failed: {e}");
            let message = Err(format!("Could not delete: {e}"));
            let page = admin_views::dashboard(tab, &state.data.current(), Some(&message));
            Ok((StatusCode::BAD_GATEWAY, Html(page)).into_response())
        }
    }
}
