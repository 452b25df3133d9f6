//! Form synthesis for the admin editor.
//!
//! Each editable kind gets a field table, built once by classifying the
//! field names (and sample values) of the kind's blank record. A single
//! generic routine, [`synthesize`], turns any draft into a [`Form`] using that
//! table; [`apply_input`] applies one submitted value back onto a draft.

pub mod editor;
pub mod toolbar;

use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::content::{BlogPost, Experience, Profile, Project, Skill};
use crate::repository::store::Record;

pub type Draft = Map<String, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{label} must be a whole number (got '{value}')")]
    NotANumber { label: String, value: String },

    #[error("{label} must be one of: {options}")]
    UnknownChoice { label: String, options: String },

    #[error("{label} must be a date (YYYY-MM-DD)")]
    NotADate { label: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Kinds and widgets
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Profile,
    Experience,
    Skill,
    Project,
    Post,
}

impl EditorKind {
    pub const ALL: [EditorKind; 5] = [
        EditorKind::Profile,
        EditorKind::Experience,
        EditorKind::Skill,
        EditorKind::Project,
        EditorKind::Post,
    ];

    /// Path segment used under `/admin`.
    pub fn slug(self) -> &'static str {
        match self {
            EditorKind::Profile => "profile",
            EditorKind::Experience => "experience",
            EditorKind::Skill => "skills",
            EditorKind::Project => "projects",
            EditorKind::Post => "blog",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    pub fn noun(self) -> &'static str {
        match self {
            EditorKind::Profile => "Profile",
            EditorKind::Experience => "Experience",
            EditorKind::Skill => "Skill",
            EditorKind::Project => "Project",
            EditorKind::Post => "Blog Post",
        }
    }

    fn columns(self) -> &'static [&'static str] {
        match self {
            EditorKind::Profile => Profile::TABLE.columns,
            EditorKind::Experience => Experience::TABLE.columns,
            EditorKind::Skill => Skill::TABLE.columns,
            EditorKind::Project => Project::TABLE.columns,
            EditorKind::Post => BlogPost::TABLE.columns,
        }
    }

    /// Field table for this kind.
    pub fn fields(self) -> &'static [FieldSpec] {
        static TABLES: OnceLock<Vec<Vec<FieldSpec>>> = OnceLock::new();
        let tables = TABLES.get_or_init(|| {
            EditorKind::ALL
                .into_iter()
                .map(|kind| classify(kind, &template(kind)))
                .collect()
        });
        let index = Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default();
        &tables[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    /// `accept` attribute of the file picker.
    pub fn accept(self) -> &'static str {
        match self {
            UploadKind::Image => "image/*",
            UploadKind::Document => ".pdf,.doc,.docx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Text,
    Number,
    TextArea { rows: u8 },
    /// Post body: toolbar, link prompt and preview.
    Markdown { rows: u8 },
    Tags,
    Choice(&'static [&'static str]),
    Upload(UploadKind),
    Gallery,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Group {
    #[default]
    Content,
    Seo,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Content => "content",
            Group::Seo => "seo",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "content" => Some(Group::Content),
            "seo" => Some(Group::Seo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: String,
    pub widget: Widget,
    pub group: Group,
    /// Recommended maximum length, shown as a live counter.
    pub guide: Option<usize>,
    /// Blank input clears the field instead of storing an empty string.
    pub optional: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Classification
// ────────────────────────────────────────────────────────────────────────────

const EXPERIENCE_TYPES: &[&str] = &["work", "education"];
const SEO_FIELDS: &[&str] = &["slug", "meta_title", "meta_description", "tags"];

fn to_object<T: Serialize>(record: T) -> Value {
    serde_json::to_value(record).unwrap_or_else(|_| json!({}))
}

/// The blank record a field table is derived from.
pub fn template(kind: EditorKind) -> Value {
    match kind {
        EditorKind::Profile => to_object(Profile::default()),
        EditorKind::Experience => to_object(Experience::default()),
        EditorKind::Skill => to_object(Skill::default()),
        EditorKind::Project => to_object(Project::default()),
        EditorKind::Post => to_object(BlogPost::default()),
    }
}

/// Draft for a brand-new record of `kind`.
pub fn blank_draft(kind: EditorKind) -> Draft {
    let mut draft = match template(kind) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let defaults = match kind {
        EditorKind::Skill => json!({"category": "Frontend", "level": 50}),
        EditorKind::Project => json!({"category": "Web"}),
        EditorKind::Post => json!({"category": "General", "created_at": Utc::now().to_rfc3339()}),
        EditorKind::Profile | EditorKind::Experience => json!({}),
    };
    if let Value::Object(defaults) = defaults {
        draft.extend(defaults);
    }
    draft
}

fn label_for(name: &str) -> String {
    match name {
        "image_url" => "Thumbnail / Cover Image".to_string(),
        "tags" => "Tags (comma separated)".to_string(),
        "type" => "Type".to_string(),
        "cv_url" => "CV".to_string(),
        _ => {
            let spaced = name.replace('_', " ");
            let mut chars = spaced.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn widget_for(kind: EditorKind, name: &str, sample: &Value) -> Widget {
    match name {
        "gallery" => return Widget::Gallery,
        "type" if kind == EditorKind::Experience => return Widget::Choice(EXPERIENCE_TYPES),
        "created_at" if kind == EditorKind::Post => return Widget::Date,
        "tags" => return Widget::Tags,
        "content" => return Widget::Markdown { rows: 10 },
        "description" | "bio" | "excerpt" => return Widget::TextArea { rows: 5 },
        _ => {}
    }
    if name.contains("image") || name.ends_with("_url") {
        let document = ["cv", "pdf", "portfolio", "demo", "repo"]
            .iter()
            .any(|marker| name.contains(marker));
        return Widget::Upload(if document {
            UploadKind::Document
        } else {
            UploadKind::Image
        });
    }
    if sample.is_number() {
        return Widget::Number;
    }
    Widget::Text
}

/// Builds the field table for `kind` from its blank record. Fields follow the
/// table's column order; `id` is never editable.
pub fn classify(kind: EditorKind, blank: &Value) -> Vec<FieldSpec> {
    kind.columns()
        .iter()
        .copied()
        .filter(|name| *name != "id")
        .map(|name| {
            let sample = blank.get(name).unwrap_or(&Value::Null);
            let group = if kind == EditorKind::Post && SEO_FIELDS.contains(&name) {
                Group::Seo
            } else {
                Group::Content
            };
            let guide = match (kind, name) {
                (EditorKind::Post, "meta_title") => Some(60),
                (EditorKind::Post, "meta_description") => Some(160),
                _ => None,
            };
            FieldSpec {
                name,
                label: label_for(name),
                widget: widget_for(kind, name, sample),
                group,
                guide,
                optional: sample.is_null(),
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Synthesis
// ────────────────────────────────────────────────────────────────────────────

/// Editor state carried between submissions in hidden fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub tab: Group,
    pub preview: bool,
    pub link_prompt: bool,
    /// Selection in the body textarea, in UTF-16 code units.
    pub selection: Option<(usize, usize)>,
    pub link_url: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub spec: &'static FieldSpec,
    pub value: FieldValue,
    /// Hidden fields are still submitted so the draft survives tab switches.
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: EditorKind,
    /// Empty for a record the backend has not seen yet.
    pub id: String,
    pub fields: Vec<FormField>,
    pub state: EditorState,
    /// Markdown body for the preview pane, when the preview is on.
    pub preview: Option<PreviewData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewData {
    pub title: String,
    pub category: String,
    pub cover_image: String,
    pub content: String,
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn list_of(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|item| text_of(Some(item))).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Derives the editable form for any draft of `kind`.
pub fn synthesize(kind: EditorKind, draft: &Draft, state: EditorState) -> Form {
    let fields = kind
        .fields()
        .iter()
        .map(|spec| {
            let raw = draft.get(spec.name);
            let value = match spec.widget {
                Widget::Gallery => FieldValue::List(list_of(raw)),
                Widget::Tags => FieldValue::Text(list_of(raw).join(", ")),
                Widget::Date => FieldValue::Text(text_of(raw).chars().take(10).collect()),
                _ => FieldValue::Text(text_of(raw)),
            };
            FormField {
                spec,
                value,
                visible: kind != EditorKind::Post || spec.group == state.tab,
            }
        })
        .collect();

    let preview = (kind == EditorKind::Post && state.preview).then(|| PreviewData {
        title: text_of(draft.get("title")),
        category: text_of(draft.get("category")),
        cover_image: text_of(draft.get("cover_image")),
        content: text_of(draft.get("content")),
    });

    Form {
        kind,
        id: text_of(draft.get("id")),
        fields,
        state,
        preview,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// Lower-cases and turns each whitespace run into a single `-`.
pub fn normalize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.extend(c.to_lowercase());
            in_space = false;
        }
    }
    slug
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Applies one submitted value to the draft, coercing it for the field's widget.
///
/// On a coercion error the raw text is still stored so the form redisplays
/// what was typed.
pub fn apply_input(spec: &FieldSpec, draft: &mut Draft, raw: &str) -> Result<(), FormError> {
    let value = match spec.widget {
        Widget::Tags => json!(split_tags(raw)),
        Widget::Gallery => json!(raw
            .lines()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .collect::<Vec<_>>()),
        Widget::Number => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                json!(0)
            } else {
                match trimmed.parse::<i64>() {
                    Ok(n) => json!(n),
                    Err(_) => {
                        draft.insert(spec.name.into(), json!(raw));
                        return Err(FormError::NotANumber {
                            label: spec.label.clone(),
                            value: raw.to_string(),
                        });
                    }
                }
            }
        }
        Widget::Choice(options) => {
            if !options.contains(&raw) {
                return Err(FormError::UnknownChoice {
                    label: spec.label.clone(),
                    options: options.join(", "),
                });
            }
            json!(raw)
        }
        Widget::Date => {
            let trimmed = raw.trim();
            if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() {
                draft.insert(spec.name.into(), json!(raw));
                return Err(FormError::NotADate {
                    label: spec.label.clone(),
                });
            }
            json!(format!("{trimmed}T00:00:00Z"))
        }
        Widget::TextArea { .. } | Widget::Markdown { .. } => json!(raw.replace("\r\n", "\n")),
        Widget::Text | Widget::Upload(_) if spec.optional && raw.trim().is_empty() => Value::Null,
        Widget::Text | Widget::Upload(_) if spec.name == "slug" => json!(normalize_slug(raw.trim())),
        Widget::Text | Widget::Upload(_) => json!(raw),
    };
    draft.insert(spec.name.into(), value);
    Ok(())
}

pub fn field(kind: EditorKind, name: &str) -> Option<&'static FieldSpec> {
    kind.fields().iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(kind: EditorKind, name: &str) -> Widget {
        field(kind, name).map(|f| f.widget).unwrap()
    }

    #[test]
    fn test_classification_by_name_and_value() {
        assert_eq!(widget(EditorKind::Project, "gallery"), Widget::Gallery);
        assert_eq!(
            widget(EditorKind::Project, "image_url"),
            Widget::Upload(UploadKind::Image)
        );
        assert_eq!(
            widget(EditorKind::Profile, "cv_url"),
            Widget::Upload(UploadKind::Document)
        );
        assert_eq!(
            widget(EditorKind::Profile, "portfolio_url"),
            Widget::Upload(UploadKind::Document)
        );
        assert_eq!(widget(EditorKind::Post, "cover_image"), Widget::Upload(UploadKind::Image));
        assert_eq!(widget(EditorKind::Profile, "bio"), Widget::TextArea { rows: 5 });
        assert_eq!(widget(EditorKind::Post, "content"), Widget::Markdown { rows: 10 });
        assert_eq!(widget(EditorKind::Experience, "type"), Widget::Choice(&["work", "education"]));
        assert_eq!(widget(EditorKind::Skill, "level"), Widget::Number);
        assert_eq!(widget(EditorKind::Skill, "category"), Widget::Text);
        assert_eq!(widget(EditorKind::Post, "created_at"), Widget::Date);
    }

    #[test]
    fn test_id_is_never_a_field() {
        for kind in EditorKind::ALL {
            assert!(field(kind, "id").is_none());
        }
    }

    #[test]
    fn test_post_fields_split_into_groups() {
        let seo: Vec<_> = EditorKind::Post
            .fields()
            .iter()
            .filter(|f| f.group == Group::Seo)
            .map(|f| f.name)
            .collect();
        assert_eq!(seo, vec!["slug", "meta_title", "meta_description", "tags"]);
        assert_eq!(field(EditorKind::Post, "meta_title").unwrap().guide, Some(60));
        assert_eq!(field(EditorKind::Post, "meta_description").unwrap().guide, Some(160));
        assert_eq!(field(EditorKind::Project, "tags").unwrap().group, Group::Content);
    }

    #[test]
    fn test_tags_input_is_split_and_trimmed() {
        let spec = field(EditorKind::Project, "tags").unwrap();
        let mut draft = blank_draft(EditorKind::Project);
        apply_input(spec, &mut draft, "a, b ,c").unwrap();
        assert_eq!(draft["tags"], json!(["a", "b", "c"]));

        let form = synthesize(EditorKind::Project, &draft, EditorState::default());
        let tags = form.fields.iter().find(|f| f.spec.name == "tags").unwrap();
        assert_eq!(tags.value, FieldValue::Text("a, b, c".into()));
    }

    #[test]
    fn test_number_input_is_coerced_or_rejected() {
        let spec = field(EditorKind::Skill, "level").unwrap();
        let mut draft = blank_draft(EditorKind::Skill);
        apply_input(spec, &mut draft, " 85 ").unwrap();
        assert_eq!(draft["level"], json!(85));

        let err = apply_input(spec, &mut draft, "high").unwrap_err();
        assert!(matches!(err, FormError::NotANumber { .. }));
        assert_eq!(draft["level"], json!("high"));
    }

    #[test]
    fn test_slug_is_normalized() {
        let spec = field(EditorKind::Post, "slug").unwrap();
        let mut draft = blank_draft(EditorKind::Post);
        apply_input(spec, &mut draft, "SEO  Tips 2024").unwrap();
        assert_eq!(draft["slug"], json!("seo-tips-2024"));

        apply_input(spec, &mut draft, "  Launch Notes ").unwrap();
        assert_eq!(draft["slug"], json!("launch-notes"));

        apply_input(spec, &mut draft, "   ").unwrap();
        assert_eq!(draft["slug"], Value::Null);
    }

    #[test]
    fn test_date_input_becomes_timestamp() {
        let spec = field(EditorKind::Post, "created_at").unwrap();
        let mut draft = blank_draft(EditorKind::Post);
        apply_input(spec, &mut draft, "2024-05-01").unwrap();
        assert_eq!(draft["created_at"], json!("2024-05-01T00:00:00Z"));
        assert!(apply_input(spec, &mut draft, "May 1st").is_err());
    }

    #[test]
    fn test_seo_tab_hides_content_fields_but_keeps_them() {
        let draft = blank_draft(EditorKind::Post);
        let state = EditorState {
            tab: Group::Seo,
            ..Default::default()
        };
        let form = synthesize(EditorKind::Post, &draft, state);
        let title = form.fields.iter().find(|f| f.spec.name == "title").unwrap();
        let slug = form.fields.iter().find(|f| f.spec.name == "slug").unwrap();
        assert!(!title.visible);
        assert!(slug.visible);
        assert_eq!(form.fields.len(), EditorKind::Post.fields().len());
    }

    #[test]
    fn test_new_draft_has_no_id() {
        let form = synthesize(
            EditorKind::Experience,
            &blank_draft(EditorKind::Experience),
            EditorState::default(),
        );
        assert_eq!(form.id, "");
        let kind = form.fields.iter().find(|f| f.spec.name == "type").unwrap();
        assert_eq!(kind.value, FieldValue::Text("work".into()));
    }
}
