//! One round trip of the editor: apply the submitted draft, run the action,
//! and either persist or hand back the form to render again.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::forms::toolbar::{insert_link, insert_snippet, Snippet};
use crate::forms::{
    apply_input, blank_draft, synthesize, Draft, EditorKind, EditorState, Form, Group, Widget,
};
use crate::repository::storage::UploadedFile;
use crate::repository::{ContentSnapshot, RepoError, Repository};

pub const ACTION_FIELD: &str = "_action";
pub const TAB_FIELD: &str = "_tab";
pub const PREVIEW_FIELD: &str = "_preview";
pub const LINK_PROMPT_FIELD: &str = "_link_prompt";
pub const LINK_URL_FIELD: &str = "_link_url";
pub const SELECTION_START_FIELD: &str = "_sel_start";
pub const SELECTION_END_FIELD: &str = "_sel_end";
/// File inputs are named `upload:<field>`.
pub const UPLOAD_PREFIX: &str = "upload:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    Save,
    Cancel,
    Tab(Group),
    TogglePreview,
    Snippet(Snippet),
    OpenLinkPrompt,
    InsertLink,
    CloseLinkPrompt,
    RemoveGalleryItem(usize),
    /// Only process attached files.
    Upload,
}

impl EditorAction {
    pub fn parse(raw: &str) -> Self {
        let (verb, arg) = raw.split_once(':').unwrap_or((raw, ""));
        match verb {
            "save" => EditorAction::Save,
            "cancel" => EditorAction::Cancel,
            "tab" => Group::parse(arg).map_or(EditorAction::Upload, EditorAction::Tab),
            "preview" => EditorAction::TogglePreview,
            "snippet" => Snippet::parse(arg).map_or(EditorAction::Upload, EditorAction::Snippet),
            "link" => EditorAction::OpenLinkPrompt,
            "link-insert" => EditorAction::InsertLink,
            "link-cancel" => EditorAction::CloseLinkPrompt,
            "remove" => arg
                .parse()
                .map_or(EditorAction::Upload, EditorAction::RemoveGalleryItem),
            _ => EditorAction::Upload,
        }
    }
}

/// Multipart editor submission, already read off the wire.
#[derive(Debug, Default)]
pub struct RawSubmission {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, UploadedFile)>,
}

impl RawSubmission {
    fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
pub enum EditorOutcome {
    Saved,
    Cancelled,
    Render(Form),
}

/// Draft for editing an existing record, looked up in the current snapshot.
pub fn existing_draft(kind: EditorKind, snapshot: &ContentSnapshot, id: &str) -> Option<Draft> {
    let value = match kind {
        EditorKind::Profile => {
            let mut profile = snapshot.profile.clone();
            profile.years_experience.get_or_insert_with(|| "5+".into());
            profile.brands_handled.get_or_insert_with(|| "12+".into());
            serde_json::to_value(profile)
        }
        EditorKind::Experience => find(&snapshot.experiences, id, |e| e.id.as_existing())?,
        EditorKind::Skill => find(&snapshot.skills, id, |s| s.id.as_existing())?,
        EditorKind::Project => find(&snapshot.projects, id, |p| p.id.as_existing())?,
        EditorKind::Post => find(&snapshot.posts, id, |p| p.id.as_existing())?,
    };
    match value {
        Ok(Value::Object(draft)) => Some(draft),
        _ => None,
    }
}

fn find<T: serde::Serialize>(
    items: &[T],
    id: &str,
    id_of: impl Fn(&T) -> Option<&str>,
) -> Option<serde_json::Result<Value>> {
    items
        .iter()
        .find(|item| id_of(item) == Some(id))
        .map(serde_json::to_value)
}

/// Rebuilds the draft from submitted fields. Coercion errors are collected,
/// not fatal.
fn read_draft(kind: EditorKind, raw: &RawSubmission) -> (Draft, Vec<String>) {
    let mut draft = blank_draft(kind);
    draft.insert("id".into(), json!(raw.value("id").unwrap_or_default()));
    let mut errors = Vec::new();

    for spec in kind.fields() {
        let result = match spec.widget {
            Widget::Gallery => {
                let items: Vec<&str> = raw.values(spec.name).collect();
                apply_input(spec, &mut draft, &items.join("\n"))
            }
            _ => match raw.value(spec.name) {
                Some(value) => apply_input(spec, &mut draft, value),
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            errors.push(e.to_string());
        }
    }
    (draft, errors)
}

fn read_state(raw: &RawSubmission) -> EditorState {
    let offset = |name| raw.value(name).and_then(|v| v.trim().parse::<usize>().ok());
    EditorState {
        tab: raw.value(TAB_FIELD).and_then(Group::parse).unwrap_or_default(),
        preview: raw.value(PREVIEW_FIELD) == Some("1"),
        link_prompt: raw.value(LINK_PROMPT_FIELD) == Some("1"),
        selection: offset(SELECTION_START_FIELD).zip(offset(SELECTION_END_FIELD)),
        link_url: raw.value(LINK_URL_FIELD).unwrap_or_default().to_string(),
        error: None,
    }
}

fn content_of(draft: &Draft) -> String {
    draft
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn decode<T: DeserializeOwned>(draft: Draft) -> Result<T, RepoError> {
    serde_json::from_value(Value::Object(draft)).map_err(|e| RepoError::Validation(e.to_string()))
}

async fn save(repo: &Repository, kind: EditorKind, draft: Draft) -> Result<(), RepoError> {
    match kind {
        EditorKind::Profile => repo.save_profile(decode(draft)?).await,
        EditorKind::Experience => repo.save_experience(decode(draft)?).await,
        EditorKind::Skill => repo.save_skill(decode(draft)?).await,
        EditorKind::Project => repo.save_project(decode(draft)?).await,
        EditorKind::Post => repo.save_post(decode(draft)?).await,
    }
}

/// Uploads every attached file and writes the returned URL into its field.
async fn attach_uploads(
    repo: &Repository,
    kind: EditorKind,
    draft: &mut Draft,
    files: Vec<(String, UploadedFile)>,
) -> Result<(), RepoError> {
    for (input, file) in files {
        let Some(spec) = input
            .strip_prefix(UPLOAD_PREFIX)
            .and_then(|name| crate::forms::field(kind, name))
        else {
            continue;
        };
        if file.bytes.is_empty() {
            continue;
        }
        let url = repo.upload_file(file).await?;
        info!(field = spec.name, "Attached upload");
        match spec.widget {
            Widget::Gallery => match draft.get_mut(spec.name) {
                Some(Value::Array(items)) => items.push(json!(url)),
                _ => {
                    draft.insert(spec.name.into(), json!([url]));
                }
            },
            _ => {
                draft.insert(spec.name.into(), json!(url));
            }
        }
    }
    Ok(())
}

/// Runs one editor submission to completion.
pub async fn handle(repo: &Repository, kind: EditorKind, mut raw: RawSubmission) -> EditorOutcome {
    let action = EditorAction::parse(raw.value(ACTION_FIELD).unwrap_or_default());
    if action == EditorAction::Cancel {
        return EditorOutcome::Cancelled;
    }

    let (mut draft, mut errors) = read_draft(kind, &raw);
    let mut state = read_state(&raw);

    let files = std::mem::take(&mut raw.files);
    if let Err(e) = attach_uploads(repo, kind, &mut draft, files).await {
        warn!("Upload failed: {e}");
        errors.push(format!("Upload failed: {e}"));
    }

    match action {
        EditorAction::Save if errors.is_empty() => match save(repo, kind, draft.clone()).await {
            Ok(()) => return EditorOutcome::Saved,
            Err(e) => {
                warn!(kind = kind.slug(), "Save failed: {e}");
                errors.push(format!("Could not save: {e}"));
            }
        },
        EditorAction::Save | EditorAction::Cancel | EditorAction::Upload => {}
        EditorAction::Tab(group) => state.tab = group,
        EditorAction::TogglePreview => state.preview = !state.preview,
        EditorAction::Snippet(snippet) => {
            let content = insert_snippet(&content_of(&draft), state.selection, snippet);
            draft.insert("content".into(), json!(content));
        }
        EditorAction::OpenLinkPrompt => state.link_prompt = true,
        EditorAction::InsertLink => {
            let content = insert_link(&content_of(&draft), state.selection, &state.link_url);
            draft.insert("content".into(), json!(content));
            state.link_prompt = false;
            state.link_url.clear();
        }
        EditorAction::CloseLinkPrompt => {
            state.link_prompt = false;
            state.link_url.clear();
        }
        EditorAction::RemoveGalleryItem(index) => {
            if let Some(Value::Array(items)) = draft.get_mut("gallery") {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
    }

    if !errors.is_empty() {
        state.error = Some(errors.join("\n"));
    }
    EditorOutcome::Render(synthesize(kind, &draft, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FieldValue;
    use crate::repository::fakes::{repository_with, MemoryStore};
    use bytes::Bytes;
    use std::sync::Arc;

    fn submission(fields: &[(&str, &str)]) -> RawSubmission {
        RawSubmission {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
        }
    }

    fn rendered(outcome: EditorOutcome) -> Form {
        match outcome {
            EditorOutcome::Render(form) => form,
            other => panic!("expected a form, got {other:?}"),
        }
    }

    fn value_of<'a>(form: &'a Form, name: &str) -> &'a FieldValue {
        &form.fields.iter().find(|f| f.spec.name == name).unwrap().value
    }

    #[tokio::test]
    async fn test_save_persists_new_record() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        let raw = submission(&[
            ("_action", "save"),
            ("id", ""),
            ("name", "Figma"),
            ("category", "Design"),
            ("level", "70"),
        ]);
        assert!(matches!(handle(&repo, EditorKind::Skill, raw).await, EditorOutcome::Saved));
        let skills = repo.get_skills().await;
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Figma");
        assert_eq!(skills[0].level, 70);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft_and_reports_error() {
        let repo = repository_with(Arc::new(MemoryStore::rejecting("permission denied for table skills")));
        let raw = submission(&[("_action", "save"), ("name", "Figma"), ("level", "70")]);
        let form = rendered(handle(&repo, EditorKind::Skill, raw).await);
        assert!(form.state.error.as_deref().unwrap().contains("permission denied"));
        assert_eq!(value_of(&form, "name"), &FieldValue::Text("Figma".into()));
    }

    #[tokio::test]
    async fn test_invalid_number_blocks_save() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        let raw = submission(&[("_action", "save"), ("name", "Figma"), ("level", "lots")]);
        let form = rendered(handle(&repo, EditorKind::Skill, raw).await);
        assert!(form.state.error.is_some());
        assert_eq!(value_of(&form, "level"), &FieldValue::Text("lots".into()));
        assert!(repo.get_skills().await.iter().all(|s| s.name != "Figma"));
    }

    #[tokio::test]
    async fn test_cancel_discards_draft() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        let raw = submission(&[("_action", "cancel"), ("name", "Figma")]);
        assert!(matches!(handle(&repo, EditorKind::Skill, raw).await, EditorOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_toolbar_and_link_actions_edit_body() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        let raw = submission(&[
            ("_action", "snippet:bold"),
            ("content", "make me loud"),
            ("_sel_start", "8"),
            ("_sel_end", "12"),
        ]);
        let form = rendered(handle(&repo, EditorKind::Post, raw).await);
        assert_eq!(value_of(&form, "content"), &FieldValue::Text("make me **loud**".into()));

        let raw = submission(&[
            ("_action", "link-insert"),
            ("content", "Read more"),
            ("_sel_start", "5"),
            ("_sel_end", "9"),
            ("_link_url", "https://example.com"),
            ("_link_prompt", "1"),
        ]);
        let form = rendered(handle(&repo, EditorKind::Post, raw).await);
        assert_eq!(
            value_of(&form, "content"),
            &FieldValue::Text("Read [more](https://example.com)".into())
        );
        assert!(!form.state.link_prompt);
    }

    #[tokio::test]
    async fn test_tab_switch_and_preview_keep_every_field() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        let raw = submission(&[
            ("_action", "tab:seo"),
            ("title", "Hello"),
            ("slug", "Hello World"),
            ("_preview", "1"),
        ]);
        let form = rendered(handle(&repo, EditorKind::Post, raw).await);
        assert_eq!(form.state.tab, Group::Seo);
        assert_eq!(value_of(&form, "title"), &FieldValue::Text("Hello".into()));
        assert_eq!(value_of(&form, "slug"), &FieldValue::Text("hello-world".into()));
        assert_eq!(form.preview.as_ref().unwrap().title, "Hello");
    }

    #[tokio::test]
    async fn test_gallery_upload_appends_and_remove_drops_item() {
        let repo = repository_with(Arc::new(MemoryStore::default()));
        let mut raw = submission(&[("_action", "upload"), ("gallery", "a.jpg")]);
        raw.files.push((
            "upload:gallery".into(),
            UploadedFile {
                file_name: "b.png".into(),
                content_type: Some("image/png".into()),
                bytes: Bytes::from_static(b"png"),
            },
        ));
        let form = rendered(handle(&repo, EditorKind::Project, raw).await);
        let FieldValue::List(items) = value_of(&form, "gallery") else {
            panic!("gallery is a list");
        };
        assert_eq!(items.len(), 2);
        assert!(items[1].starts_with("data:image/png;base64,"));

        let raw = submission(&[("_action", "remove:0"), ("gallery", "a.jpg"), ("gallery", "b.jpg")]);
        let form = rendered(handle(&repo, EditorKind::Project, raw).await);
        assert_eq!(value_of(&form, "gallery"), &FieldValue::List(vec!["b.jpg".into()]));
    }

    #[test]
    fn test_existing_draft_finds_record_by_id() {
        let snapshot = ContentSnapshot {
            skills: crate::repository::fallback::skills(),
            ..Default::default()
        };
        let id = snapshot.skills[0].id.to_string();
        let draft = existing_draft(EditorKind::Skill, &snapshot, &id).unwrap();
        assert_eq!(draft["id"], json!(id));
        assert!(existing_draft(EditorKind::Skill, &snapshot, "missing").is_none());
    }
}
