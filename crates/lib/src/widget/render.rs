//! HTML rendering of transcript entries.
//!
//! Assistant text is Markdown and is rendered with raw HTML escaped and
//! script-capable link targets neutralised. Every other role is plain text:
//! escaped, with newlines kept as `<br>`.

use std::borrow::Cow;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::chat::{Role, ToolExecution};

/// Shown when the transcript has no messages.
pub const EMPTY_STATE_TEXT: &str =
    "Ask me to add, reorder or review your intentions. Try \"Add 'call the dentist' as my frog\".";

const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "data:", "vbscript:"];

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Plain text with line breaks preserved.
pub fn render_plain(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>")
}

fn is_blocked_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCKED_SCHEMES.iter().any(|s| normalized.starts_with(s))
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_blocked_url(&url) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Sanitized HTML for Markdown source.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(source, options).map(|event| match event {
        // Raw HTML is shown as text, never interpreted
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// `create_intention` becomes `Create Intention`.
pub fn tool_label(tool_name: &str) -> String {
    tool_name
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One badge per tool execution.
pub fn render_badges(executions: &[ToolExecution]) -> String {
    if executions.is_empty() {
        return String::new();
    }

    let mut out = String::from("<div class=\"tool-badges\">");
    for execution in executions {
        let (class, icon, fallback) = if execution.success {
            ("success", "✓", "Action completed")
        } else {
            ("failure", "✗", "Action failed")
        };
        let message: Cow<'_, str> = execution
            .message()
            .filter(|m| !m.is_empty())
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Borrowed(fallback));
        out.push_str(&format!(
            "<div class=\"tool-badge {class}\"><span class=\"tool-badge-icon\">{icon}</span>\
             <span class=\"tool-badge-label\">{}</span>\
             <span class=\"tool-badge-message\">{}</span></div>",
            escape_html(&tool_label(&execution.tool_name)),
            escape_html(&message),
        ));
    }
    out.push_str("</div>");
    out
}

/// A full message block.
pub fn render_message(
    role: Role,
    content: &str,
    executions: &[ToolExecution],
    show_badges: bool,
) -> String {
    let body = match role {
        Role::Assistant => render_markdown(content),
        Role::User | Role::System => render_plain(content),
    };
    let badges = if show_badges && role == Role::Assistant {
        render_badges(executions)
    } else {
        String::new()
    };
    format!(
        "<div class=\"chat-message {role}\"><div class=\"chat-message-content\">{body}</div>{badges}</div>"
    )
}

pub fn render_empty_state() -> String {
    format!(
        "<div class=\"chat-empty-state\">{}</div>",
        escape_html(EMPTY_STATE_TEXT)
    )
}

pub fn render_loading() -> String {
    "<div class=\"chat-message assistant loading\"><div class=\"chat-message-content\">Thinking…</div></div>"
        .to_string()
}
