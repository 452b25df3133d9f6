//! Markdown toolbar for the post body.
//!
//! Selections arrive as UTF-16 offsets, the unit browsers report for
//! `selectionStart`/`selectionEnd`.

use std::ops::Range;

pub const LINK_PLACEHOLDER: &str = "Link Text";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snippet {
    Bold,
    Italic,
    Heading,
    List,
}

impl Snippet {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bold" => Some(Snippet::Bold),
            "italic" => Some(Snippet::Italic),
            "heading" => Some(Snippet::Heading),
            "list" => Some(Snippet::List),
            _ => None,
        }
    }

    fn wrap(self, text: &str) -> String {
        match self {
            Snippet::Bold => format!("**{text}**"),
            Snippet::Italic => format!("*{text}*"),
            Snippet::Heading => format!("\n## {text}\n"),
            Snippet::List => format!("\n- {text}\n"),
        }
    }
}

/// Byte offset of the `units`-th UTF-16 code unit, clamped to the text.
fn byte_offset(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (index, c) in text.char_indices() {
        if seen >= units {
            return index;
        }
        seen += c.len_utf16();
    }
    text.len()
}

/// Byte range of a selection; no selection means the end of the text.
fn selected_range(text: &str, selection: Option<(usize, usize)>) -> Range<usize> {
    match selection {
        Some((start, end)) => {
            let (start, end) = if start <= end { (start, end) } else { (end, start) };
            byte_offset(text, start)..byte_offset(text, end)
        }
        None => text.len()..text.len(),
    }
}

fn replace(content: &str, range: Range<usize>, with: &str) -> String {
    let mut out = String::with_capacity(content.len() + with.len());
    out.push_str(&content[..range.start]);
    out.push_str(with);
    out.push_str(&content[range.end..]);
    out
}

/// Wraps the selection (or an empty span at the cursor) in the snippet's syntax.
pub fn insert_snippet(content: &str, selection: Option<(usize, usize)>, snippet: Snippet) -> String {
    let range = selected_range(content, selection);
    let wrapped = snippet.wrap(&content[range.clone()]);
    replace(content, range, &wrapped)
}

/// Replaces the selection with `[text](url)`.
pub fn insert_link(content: &str, selection: Option<(usize, usize)>, url: &str) -> String {
    let range = selected_range(content, selection);
    let text = match &content[range.clone()] {
        "" => LINK_PLACEHOLDER,
        selected => selected,
    };
    let url = match url.trim() {
        "" => "#",
        url => url,
    };
    let link = format!("[{text}]({url})");
    replace(content, range, &link)
}
