use crate::forms::editor::{
    ACTION_FIELD, LINK_PROMPT_FIELD, LINK_URL_FIELD, PREVIEW_FIELD, SELECTION_END_FIELD,
    SELECTION_START_FIELD, TAB_FIELD, UPLOAD_PREFIX,
};
use crate::forms::{EditorKind, FieldValue, Form, FormField, UploadKind, Widget};
use crate::markdown;
use crate::models::inbox::format_timestamp;
use crate::repository::ContentSnapshot;
use crate::views::{document, escape, flash, Meta};

// ────────────────────────────────────────────────────────────────────────────
// Dashboard tabs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Profile,
    Experience,
    Skills,
    Projects,
    Blog,
    Comments,
    Messages,
    Subscribers,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Profile,
        Tab::Experience,
        Tab::Skills,
        Tab::Projects,
        Tab::Blog,
        Tab::Comments,
        Tab::Messages,
        Tab::Subscribers,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Tab::Profile => "profile",
            Tab::Experience => "experience",
            Tab::Skills => "skills",
            Tab::Projects => "projects",
            Tab::Blog => "blog",
            Tab::Comments => "comments",
            Tab::Messages => "messages",
            Tab::Subscribers => "subscribers",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.slug() == slug)
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Profile => "Profile",
            Tab::Experience => "Experience",
            Tab::Skills => "Skills",
            Tab::Projects => "Projects",
            Tab::Blog => "Blog",
            Tab::Comments => "Comments",
            Tab::Messages => "Messages",
            Tab::Subscribers => "Subscribers",
        }
    }

    /// Kind edited from this tab, if its records are editable.
    pub fn editor(self) -> Option<EditorKind> {
        EditorKind::from_slug(self.slug())
    }

    pub fn deletable(self) -> bool {
        self != Tab::Profile
    }
}

fn admin_page(title: &str, main: &str) -> String {
    let nav: String = Tab::ALL
        .iter()
        .map(|tab| format!("<a href=\"/admin?tab={}\">{}</a>", tab.slug(), tab.title()))
        .collect();
    let body = format!(
        "<header class=\"admin\"><nav>{nav}</nav><a href=\"/\">View site</a>\
         <form method=\"post\" action=\"/admin/logout\"><button type=\"submit\">Log out</button></form>\
         </header><main>{main}</main>"
    );
    document(&Meta::titled(format!("{title} | Admin")), &body)
}

// ────────────────────────────────────────────────────────────────────────────
// Login
// ────────────────────────────────────────────────────────────────────────────

pub fn login(login_path: &str, email: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\" role=\"alert\">{}</p>", escape(e)))
        .unwrap_or_default();
    let body = format!(
        "<main class=\"login\"><h1>Admin sign in</h1>{error}\
         <form method=\"post\" action=\"{action}\">\
         <label>Email <input type=\"email\" name=\"email\" value=\"{email}\" required></label>\
         <label>Password <input type=\"password\" name=\"password\" required></label>\
         <button type=\"submit\">Sign in</button></form><a href=\"/\">Back to site</a></main>",
        action = escape(login_path),
        email = escape(email),
    );
    document(&Meta::titled("Sign in"), &body)
}

// ────────────────────────────────────────────────────────────────────────────
// Dashboard
// ────────────────────────────────────────────────────────────────────────────

struct Row {
    id: String,
    primary: String,
    secondary: String,
}

fn rows(tab: Tab, data: &ContentSnapshot) -> Vec<Row> {
    match tab {
        Tab::Profile => Vec::new(),
        Tab::Experience => data
            .experiences
            .iter()
            .map(|e| Row {
                id: e.id.to_string(),
                primary: e.role.clone(),
                secondary: format!("{} · {}", e.company, e.period),
            })
            .collect(),
        Tab::Skills => data
            .skills
            .iter()
            .map(|s| Row {
                id: s.id.to_string(),
                primary: s.name.clone(),
                secondary: format!("{} · {}%", s.category, s.level),
            })
            .collect(),
        Tab::Projects => data
            .projects
            .iter()
            .map(|p| Row {
                id: p.id.to_string(),
                primary: p.title.clone(),
                secondary: p.category.clone(),
            })
            .collect(),
        Tab::Blog => data
            .posts
            .iter()
            .map(|p| Row {
                id: p.id.to_string(),
                primary: p.title.clone(),
                secondary: match p.slug.as_deref().filter(|s| !s.is_empty()) {
                    Some(slug) => format!("{} · /{slug}", p.published_on()),
                    None => p.published_on().to_string(),
                },
            })
            .collect(),
        Tab::Comments => data
            .comments
            .iter()
            .map(|c| Row {
                id: c.id.to_string(),
                primary: format!("{}: {}", c.user_name, c.content),
                secondary: format!("post {} · {}", c.post_id, format_timestamp(&c.created_at)),
            })
            .collect(),
        Tab::Messages => data
            .messages
            .iter()
            .map(|m| Row {
                id: m.id.to_string(),
                primary: format!("{} <{}>", m.name, m.email),
                secondary: format!("{} · {}", m.message, format_timestamp(&m.created_at)),
            })
            .collect(),
        Tab::Subscribers => data
            .subscribers
            .iter()
            .map(|s| Row {
                id: s.id.to_string(),
                primary: s.email.clone(),
                secondary: format_timestamp(&s.created_at),
            })
            .collect(),
    }
}

fn profile_summary(data: &ContentSnapshot) -> String {
    let p = &data.profile;
    format!(
        "<dl class=\"profile\"><dt>Name</dt><dd>{name}</dd><dt>Tagline</dt><dd>{tagline}</dd>\
         <dt>Bio</dt><dd>{bio}</dd><dt>Email</dt><dd>{email}</dd></dl>\
         <a class=\"button\" href=\"/admin/profile/current/edit\">Edit profile</a>",
        name = escape(&p.name),
        tagline = escape(&p.tagline),
        bio = escape(&p.bio),
        email = escape(&p.email),
    )
}

pub fn dashboard(tab: Tab, data: &ContentSnapshot, message: Option<&Result<String, String>>) -> String {
    let body = if tab == Tab::Profile {
        profile_summary(data)
    } else {
        let entries = rows(tab, data);
        let list: String = if entries.is_empty() {
            "<li class=\"empty\">Nothing here yet.</li>".to_string()
        } else {
            entries
                .iter()
                .map(|row| {
                    let mut actions = String::new();
                    if tab.editor().is_some() && !row.id.is_empty() {
                        actions.push_str(&format!(
                            "<a href=\"/admin/{}/{}/edit\">Edit</a>",
                            tab.slug(),
                            escape(&row.id)
                        ));
                    }
                    if tab.deletable() && !row.id.is_empty() {
                        actions.push_str(&format!(
                            "<a href=\"/admin/{}/{}/delete\">Delete</a>",
                            tab.slug(),
                            escape(&row.id)
                        ));
                    }
                    format!(
                        "<li><div><strong>{}</strong><p>{}</p></div><div class=\"actions\">{actions}</div></li>",
                        escape(&row.primary),
                        escape(&row.secondary)
                    )
                })
                .collect()
        };
        let add = tab
            .editor()
            .map(|kind| format!("<a class=\"button\" href=\"/admin/{}/new\">Add new</a>", kind.slug()))
            .unwrap_or_default();
        format!("{add}<ul class=\"records\">{list}</ul>")
    };
    let main = format!(
        "<section><h1>{title}</h1>{flash}{body}</section>",
        title = tab.title(),
        flash = flash(message),
    );
    admin_page(tab.title(), &main)
}

pub fn confirm_delete(tab: Tab, id: &str, label: &str) -> String {
    let main = format!(
        "<section class=\"confirm\"><h1>Delete this item?</h1><p>{label}</p>\
         <form method=\"post\" action=\"/admin/{slug}/{id}/delete\">\
         <button type=\"submit\" class=\"danger\">Delete</button>\
         <a href=\"/admin?tab={slug}\">Cancel</a></form></section>",
        label = escape(label),
        slug = tab.slug(),
        id = escape(id),
    );
    admin_page("Confirm delete", &main)
}

// ────────────────────────────────────────────────────────────────────────────
// Editor
// ────────────────────────────────────────────────────────────────────────────

fn hidden(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        escape(name),
        escape(value)
    )
}

fn action_button(action: &str, label: &str) -> String {
    format!(
        "<button type=\"submit\" name=\"{ACTION_FIELD}\" value=\"{}\" formnovalidate>{}</button>",
        escape(action),
        escape(label)
    )
}

fn text_value(field: &FormField) -> &str {
    match &field.value {
        FieldValue::Text(text) => text,
        FieldValue::List(_) => "",
    }
}

/// Fields on the inactive tab still travel with the form.
fn hidden_field(field: &FormField) -> String {
    match &field.value {
        FieldValue::Text(text) => hidden(field.spec.name, text),
        FieldValue::List(items) => items.iter().map(|item| hidden(field.spec.name, item)).collect(),
    }
}

fn upload_picker(name: &str, kind: UploadKind) -> String {
    format!(
        "<input type=\"file\" name=\"{UPLOAD_PREFIX}{}\" accept=\"{}\">{}",
        escape(name),
        kind.accept(),
        action_button("upload", "Upload")
    )
}

fn field_html(field: &FormField) -> String {
    let spec = field.spec;
    let name = escape(spec.name);
    let label = escape(&spec.label);
    let value = text_value(field);
    let control = match spec.widget {
        Widget::Text => format!("<input name=\"{name}\" value=\"{}\">", escape(value)),
        Widget::Number => format!("<input type=\"number\" name=\"{name}\" value=\"{}\">", escape(value)),
        Widget::Date => format!("<input type=\"date\" name=\"{name}\" value=\"{}\">", escape(value)),
        Widget::Tags => format!("<input name=\"{name}\" value=\"{}\" placeholder=\"a, b, c\">", escape(value)),
        Widget::TextArea { rows } => {
            format!("<textarea name=\"{name}\" rows=\"{rows}\">{}</textarea>", escape(value))
        }
        Widget::Markdown { rows } => format!(
            "<div class=\"toolbar\">{bold}{italic}{heading}{list}{link}</div>\
             <textarea id=\"body-editor\" name=\"{name}\" rows=\"{rows}\">{text}</textarea>",
            bold = action_button("snippet:bold", "B"),
            italic = action_button("snippet:italic", "I"),
            heading = action_button("snippet:heading", "H2"),
            list = action_button("snippet:list", "List"),
            link = action_button("link", "Link"),
            text = escape(value),
        ),
        Widget::Choice(options) => {
            let opts: String = options
                .iter()
                .map(|option| {
                    let selected = if *option == value { " selected" } else { "" };
                    format!("<option value=\"{option}\"{selected}>{option}</option>")
                })
                .collect();
            format!("<select name=\"{name}\">{opts}</select>")
        }
        Widget::Upload(kind) => {
            let preview = if kind == UploadKind::Image && !value.is_empty() {
                format!("<img class=\"preview\" src=\"{}\" alt=\"\">", escape(value))
            } else {
                String::new()
            };
            let placeholder = match kind {
                UploadKind::Image => "URL to image...",
                UploadKind::Document => "URL to document...",
            };
            format!(
                "<input name=\"{name}\" value=\"{}\" placeholder=\"{placeholder}\">{}{preview}",
                escape(value),
                upload_picker(spec.name, kind)
            )
        }
        Widget::Gallery => {
            let items: String = match &field.value {
                FieldValue::List(items) => items
                    .iter()
                    .enumerate()
                    .map(|(index, url)| {
                        format!(
                            "<li><img src=\"{}\" alt=\"\">{}{}</li>",
                            escape(url),
                            hidden(spec.name, url),
                            action_button(&format!("remove:{index}"), "Remove")
                        )
                    })
                    .collect(),
                FieldValue::Text(_) => String::new(),
            };
            format!(
                "<ul class=\"gallery\">{items}</ul>{}",
                upload_picker(spec.name, UploadKind::Image)
            )
        }
    };
    let guide = spec
        .guide
        .map(|max| {
            format!(
                "<small class=\"guide\">{} / {max} characters</small>",
                value.chars().count()
            )
        })
        .unwrap_or_default();
    format!("<div class=\"field\"><label>{label}</label>{control}{guide}</div>")
}

/// Carries the body selection across round trips. While the link prompt is
/// open the selection captured by the Link click is kept as-is.
const SELECTION_SCRIPT: &str = "<script>\
    (function () {\
      var form = document.querySelector('form.editor');\
      var body = document.getElementById('body-editor');\
      if (!form || !body) return;\
      var start = form.querySelector('[name=_sel_start]');\
      var end = form.querySelector('[name=_sel_end]');\
      var prompt = form.querySelector('[name=_link_prompt]');\
      if (start.value !== '' && end.value !== '') {\
        body.setSelectionRange(Number(start.value), Number(end.value));\
      }\
      form.addEventListener('submit', function () {\
        if (prompt && prompt.value === '1') return;\
        start.value = body.selectionStart;\
        end.value = body.selectionEnd;\
      });\
    })();\
    </script>";

pub fn editor(form: &Form) -> String {
    let kind = form.kind;
    let mut fields = String::new();
    for field in &form.fields {
        if field.visible {
            fields.push_str(&field_html(field));
        } else {
            fields.push_str(&hidden_field(field));
        }
    }

    let mut state = String::new();
    state.push_str(&hidden("id", &form.id));
    state.push_str(&hidden(TAB_FIELD, form.state.tab.as_str()));
    state.push_str(&hidden(PREVIEW_FIELD, if form.state.preview { "1" } else { "" }));
    state.push_str(&hidden(LINK_PROMPT_FIELD, if form.state.link_prompt { "1" } else { "" }));
    let (start, end) = form
        .state
        .selection
        .map(|(s, e)| (s.to_string(), e.to_string()))
        .unwrap_or_default();
    state.push_str(&hidden(SELECTION_START_FIELD, &start));
    state.push_str(&hidden(SELECTION_END_FIELD, &end));

    let tabs = if kind == EditorKind::Post {
        format!(
            "<nav class=\"editor-tabs\">{}{}{}</nav>",
            action_button("tab:content", "Content"),
            action_button("tab:seo", "SEO & metadata"),
            action_button("preview", if form.state.preview { "Hide preview" } else { "Preview" }),
        )
    } else {
        String::new()
    };

    let link_prompt = if form.state.link_prompt {
        format!(
            "<div class=\"modal\" role=\"dialog\"><h2>Insert link</h2>\
             <input name=\"{LINK_URL_FIELD}\" value=\"{}\" placeholder=\"https://example.com\">{}{}</div>",
            escape(&form.state.link_url),
            action_button("link-insert", "Insert"),
            action_button("link-cancel", "Cancel"),
        )
    } else {
        String::new()
    };

    let preview = form
        .preview
        .as_ref()
        .map(|p| {
            format!(
                "<aside class=\"preview\"><p class=\"meta\">{}</p><h1>{}</h1>{}{}</aside>",
                escape(&p.category),
                escape(&p.title),
                if p.cover_image.is_empty() {
                    String::new()
                } else {
                    format!("<img class=\"cover\" src=\"{}\" alt=\"\">", escape(&p.cover_image))
                },
                markdown::render(&p.content),
            )
        })
        .unwrap_or_default();

    let error = form
        .state
        .error
        .clone()
        .map(Err)
        .map(|message| flash(Some(&message)))
        .unwrap_or_default();

    let heading = if form.id.is_empty() {
        format!("New {}", kind.noun())
    } else {
        format!("Edit {}", kind.noun())
    };

    let main = format!(
        "<section><h1>{heading}</h1>{error}\
         <form class=\"editor\" method=\"post\" action=\"/admin/{slug}/editor\" enctype=\"multipart/form-data\">\
         {state}{tabs}{link_prompt}{fields}\
         <div class=\"editor-actions\">{cancel}{save}</div></form>{preview}</section>{SELECTION_SCRIPT}",
        slug = kind.slug(),
        cancel = action_button("cancel", "Cancel"),
        save = format!(
            "<button type=\"submit\" name=\"{ACTION_FIELD}\" value=\"save\">Save</button>"
        ),
    );
    admin_page(&heading, &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{blank_draft, synthesize, EditorState, Group};
    use crate::repository::fallback;

    #[test]
    fn test_tab_slugs_round_trip_and_editor_kinds() {
        for tab in Tab::ALL {
            assert_eq!(Tab::from_slug(tab.slug()), Some(tab));
        }
        assert_eq!(Tab::Blog.editor(), Some(EditorKind::Post));
        assert_eq!(Tab::Messages.editor(), None);
        assert!(!Tab::Profile.deletable());
    }

    #[test]
    fn test_dashboard_lists_records_with_actions() {
        let data = ContentSnapshot {
            skills: fallback::skills(),
            ..Default::default()
        };
        let html = dashboard(Tab::Skills, &data, None);
        assert!(html.contains("/admin/skills/new"));
        assert_eq!(html.matches("/edit\"").count(), data.skills.len());
        assert_eq!(html.matches("/delete\"").count(), data.skills.len());
    }

    #[test]
    fn test_inbox_tabs_have_no_editor() {
        let html = dashboard(Tab::Messages, &ContentSnapshot::default(), None);
        assert!(html.contains("Nothing here yet."));
        assert!(!html.contains("Add new"));
    }

    #[test]
    fn test_editor_renders_every_widget_for_posts() {
        let form = synthesize(EditorKind::Post, &blank_draft(EditorKind::Post), EditorState::default());
        let html = editor(&form);
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(html.contains("value=\"snippet:bold\""));
        assert!(html.contains("name=\"upload:cover_image\""));
        assert!(html.contains("type=\"date\""));
        // SEO fields are carried hidden while the content tab is active.
        assert!(html.contains("<input type=\"hidden\" name=\"slug\""));
        assert!(html.contains("New Blog Post"));
    }

    #[test]
    fn test_editor_shows_error_and_guide() {
        let state = EditorState {
            tab: Group::Seo,
            error: Some("Could not save: boom".into()),
            ..Default::default()
        };
        let mut draft = blank_draft(EditorKind::Post);
        draft.insert("meta_title".into(), serde_json::json!("Twelve chars"));
        let html = editor(&synthesize(EditorKind::Post, &draft, state));
        assert!(html.contains("Could not save: boom"));
        assert!(html.contains("12 / 60 characters"));
    }

    fn hidden_value<'a>(html: &'a str, name: &str) -> &'a str {
        let marker = format!("name=\"{name}\" value=\"");
        let start = html.find(&marker).unwrap() + marker.len();
        let len = html[start..].find('"').unwrap();
        &html[start..start + len]
    }

    #[tokio::test]
    async fn test_link_prompt_round_trip_keeps_selection() {
        use crate::forms::editor::{handle, EditorOutcome, RawSubmission};
        use crate::forms::FieldValue;
        use crate::repository::fakes::{repository_with, MemoryStore};
        use std::sync::Arc;

        fn fields(pairs: &[(&str, &str)]) -> RawSubmission {
            RawSubmission {
                fields: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                files: Vec::new(),
            }
        }

        let repo = repository_with(Arc::new(MemoryStore::default()));

        let opened = handle(
            &repo,
            EditorKind::Post,
            fields(&[("_action", "link"), ("content", "Read more"), ("_sel_start", "5"), ("_sel_end", "9")]),
        )
        .await;
        let EditorOutcome::Render(form) = opened else {
            panic!("link click re-renders the editor");
        };
        let html = editor(&form);
        assert_eq!(hidden_value(&html, "_link_prompt"), "1");
        assert!(html.contains("setSelectionRange"));

        // The next submit carries the rendered hidden state back unchanged.
        let carried = fields(&[
            ("_action", "link-insert"),
            ("content", "Read more"),
            ("_link_prompt", hidden_value(&html, "_link_prompt")),
            ("_sel_start", hidden_value(&html, "_sel_start")),
            ("_sel_end", hidden_value(&html, "_sel_end")),
            ("_link_url", "https://example.com"),
        ]);
        let EditorOutcome::Render(form) = handle(&repo, EditorKind::Post, carried).await else {
            panic!("link insert re-renders the editor");
        };
        let content = &form.fields.iter().find(|f| f.spec.name == "content").unwrap().value;
        assert_eq!(content, &FieldValue::Text("Read [more](https://example.com)".into()));
    }

    #[test]
    fn test_login_page_posts_to_configured_path() {
        let html = login("/gate-k7q2", "me@example.com", Some("Invalid login credentials"));
        assert!(html.contains("action=\"/gate-k7q2\""));
        assert!(html.contains("Invalid login credentials"));
    }
}
