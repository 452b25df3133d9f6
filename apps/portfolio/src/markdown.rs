//! Restricted markdown used by blog posts.
//!
//! Line based. `#`, `##`, `###` headings, `> ` quotes and `- ` list items are
//! recognised at the start of a line; inside list items and paragraphs
//! `**bold**` and `[text](url)` are recognised. Everything else is text.

use crate::views::escape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Quote(String),
    ListItem(Vec<Inline>),
    Blank,
    Paragraph(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Link { text: String, url: String },
}

pub fn parse(content: &str) -> Vec<Block> {
    content.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Block {
    if let Some(text) = line.strip_prefix("### ") {
        return Block::Heading { level: 3, text: text.to_string() };
    }
    if let Some(text) = line.strip_prefix("## ") {
        return Block::Heading { level: 2, text: text.to_string() };
    }
    if let Some(text) = line.strip_prefix("# ") {
        return Block::Heading { level: 1, text: text.to_string() };
    }
    if let Some(text) = line.strip_prefix("> ") {
        return Block::Quote(text.to_string());
    }
    if let Some(text) = line.strip_prefix("- ") {
        return Block::ListItem(parse_inline(text));
    }
    if line.trim().is_empty() {
        return Block::Blank;
    }
    Block::Paragraph(parse_inline(line))
}

pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some((span, tail)) = bold_at(rest).or_else(|| link_at(rest)) {
            if !plain.is_empty() {
                spans.push(Inline::Text(std::mem::take(&mut plain)));
            }
            spans.push(span);
            rest = tail;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            plain.push(c);
        }
        rest = chars.as_str();
    }
    if !plain.is_empty() {
        spans.push(Inline::Text(plain));
    }
    spans
}

/// `**text**`, shortest match.
fn bold_at(s: &str) -> Option<(Inline, &str)> {
    let inner = s.strip_prefix("**")?;
    let end = inner.find("**")?;
    Some((Inline::Bold(inner[..end].to_string()), &inner[end + 2..]))
}

/// `[text](url)` with no nesting.
fn link_at(s: &str) -> Option<(Inline, &str)> {
    let inner = s.strip_prefix('[')?;
    let close = inner.find("](")?;
    let text = &inner[..close];
    if text.contains('[') {
        return None;
    }
    let after = &inner[close + 2..];
    let end = after.find(')')?;
    Some((
        Inline::Link {
            text: text.to_string(),
            url: after[..end].trim().to_string(),
        },
        &after[end + 1..],
    ))
}

/// Only web, mail and relative targets become live links.
fn safe_url(url: &str) -> &str {
    let lower = url.to_ascii_lowercase();
    let allowed = ["http://", "https://", "mailto:", "/", "#"]
        .iter()
        .any(|prefix| lower.starts_with(prefix));
    if allowed {
        url
    } else {
        "#"
    }
}

fn render_inline(spans: &[Inline]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Inline::Text(text) => escape(text),
            Inline::Bold(text) => format!("<strong>{}</strong>", escape(text)),
            Inline::Link { text, url } => format!(
                "<a href=\"{}\" rel=\"noopener\">{}</a>",
                escape(safe_url(url)),
                escape(text)
            ),
        })
        .collect()
}

/// Renders to escaped HTML. Consecutive list items share one `<ul>`.
pub fn render(content: &str) -> String {
    let mut html = String::from("<div class=\"prose\">");
    let mut in_list = false;

    for block in parse(content) {
        let is_item = matches!(block, Block::ListItem(_));
        if in_list && !is_item {
            html.push_str("</ul>");
            in_list = false;
        }
        match block {
            Block::Heading { level, text } => {
                html.push_str(&format!("<h{level}>{}</h{level}>", escape(&text)));
            }
            Block::Quote(text) => {
                html.push_str(&format!("<blockquote>{}</blockquote>", escape(&text)));
            }
            Block::ListItem(spans) => {
                if !in_list {
                    html.push_str("<ul>");
                    in_list = true;
                }
                html.push_str(&format!("<li>{}</li>", render_inline(&spans)));
            }
            Block::Blank => html.push_str("<div class=\"gap\"></div>"),
            Block::Paragraph(spans) => {
                html.push_str(&format!("<p>{}</p>", render_inline(&spans)));
            }
        }
    }
    if in_list {
        html.push_str("</ul>");
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_list_and_bold_in_order() {
        let blocks = parse("## Title\n- item one\n- item two\n**bold**");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 2, text: "Title".into() },
                Block::ListItem(vec![Inline::Text("item one".into())]),
                Block::ListItem(vec![Inline::Text("item two".into())]),
                Block::Paragraph(vec![Inline::Bold("bold".into())]),
            ]
        );

        let html = render("## Title\n- item one\n- item two\n**bold**");
        assert_eq!(
            html,
            "<div class=\"prose\"><h2>Title</h2><ul><li>item one</li><li>item two</li></ul>\
             <p><strong>bold</strong></p></div>"
        );
    }

    #[test]
    fn test_inline_mix_and_unclosed_markers() {
        assert_eq!(
            parse_inline("see [docs](https://x.io) and **this** **open"),
            vec![
                Inline::Text("see ".into()),
                Inline::Link { text: "docs".into(), url: "https://x.io".into() },
                Inline::Text(" and ".into()),
                Inline::Bold("this".into()),
                Inline::Text(" **open".into()),
            ]
        );
    }

    #[test]
    fn test_quotes_and_headings_are_plain_text() {
        assert_eq!(parse("> **q**")[0], Block::Quote("**q**".into()));
        assert_eq!(
            parse("### Small")[0],
            Block::Heading { level: 3, text: "Small".into() }
        );
        assert_eq!(parse("   ")[0], Block::Blank);
    }

    #[test]
    fn test_render_escapes_html_and_neutralises_script_links() {
        let html = render("<b>hi</b> [x](javascript:alert(1))");
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("href=\"#\""));
        assert!(!html.contains("javascript:"));
    }
}
