//! Server-rendered HTML. Every value interpolated into markup goes through
//! [`escape`].

pub mod admin;
pub mod public;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page metadata for the document head.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    pub title: String,
    pub description: Option<String>,
}

impl Meta {
    pub fn titled(title: impl Into<String>) -> Self {
        Meta {
            title: title.into(),
            description: None,
        }
    }
}

const PUBLIC_NAV: &str = "<nav class=\"site-nav\">\
    <a href=\"/\">Home</a>\
    <a href=\"/projects\">Projects</a>\
    <a href=\"/blog\">Blog</a>\
    <a href=\"/contact\">Contact</a>\
    </nav>";

/// Full document around `body`.
pub fn document(meta: &Meta, body: &str) -> String {
    let description = meta
        .description
        .as_deref()
        .map(|d| format!("<meta name=\"description\" content=\"{}\">", escape(d)))
        .unwrap_or_default();
    format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title>{description}</head><body>{body}</body></html>",
        title = escape(&meta.title),
    )
}

/// Document with the public navigation and footer.
pub fn public_page(meta: &Meta, site_name: &str, main: &str) -> String {
    let body = format!(
        "<header>{PUBLIC_NAV}</header><main>{main}</main>\
         <footer><p>&copy; {name}</p></footer>",
        name = escape(site_name),
    );
    document(meta, &body)
}

/// Inline status line: `Ok` renders as a notice, `Err` as an error.
pub fn flash(message: Option<&Result<String, String>>) -> String {
    match message {
        Some(Ok(notice)) => format!("<p class=\"notice\" role=\"status\">{}</p>", escape(notice)),
        Some(Err(error)) => format!("<p class=\"error\" role=\"alert\">{}</p>", escape(error)),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_covers_attribute_and_text_contexts() {
        assert_eq!(
            escape("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_document_escapes_title_and_description() {
        let meta = Meta {
            title: "A <b> title".into(),
            description: Some("\"quoted\"".into()),
        };
        let html = document(&meta, "<p>ok</p>");
        assert!(html.contains("<title>A &lt;b&gt; title</title>"));
        assert!(html.contains("content=\"&quot;quoted&quot;\""));
        assert!(html.contains("<p>ok</p>"));
    }
}
