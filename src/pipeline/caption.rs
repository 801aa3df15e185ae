// src/pipeline/caption.rs

//! Caption rendering for resource notifications.
//!
//! One caption template, three formatting modes, and the description-only
//! truncation policy that keeps captions within the transport's limit.

use unicode_segmentation::UnicodeSegmentation;

use crate::models::ResourceRecord;
use crate::telegram::ParseMode;

const ELLIPSIS: &str = "...";

/// Render the caption for a record in the given formatting mode, keeping it
/// within `limit` characters.
///
/// Over-long captions are shortened by cutting the tail of the description
/// and appending an ellipsis. The cut is recomputed on the rendered text
/// because escaping changes the caption's length between modes; the loop
/// settles the rare case where the escaped ellipsis itself overflows.
pub fn render_caption(
    record: &ResourceRecord,
    base_url: &str,
    mode: ParseMode,
    limit: usize,
) -> String {
    let url = format!("{base_url}{}", record.link);
    let mut description = record.description.clone();

    loop {
        let caption = compose(mode, &record.title, &description, &url);
        let length = caption.chars().count();
        if length <= limit || description.is_empty() {
            return caption;
        }

        let excess = length - limit + ELLIPSIS.len();
        description = cut_description(&description, excess);
    }
}

/// Drop the last `excess` graphemes of the description and append an
/// ellipsis. A previous ellipsis is stripped first so repeated cuts do not
/// stack dots; a cut that consumes the whole description yields the empty
/// string so the caller can stop.
fn cut_description(description: &str, excess: usize) -> String {
    let body = description.strip_suffix(ELLIPSIS).unwrap_or(description);
    let graphemes: Vec<&str> = body.graphemes(true).collect();
    let keep = graphemes.len().saturating_sub(excess);
    if keep == 0 {
        return String::new();
    }

    let mut cut: String = graphemes[..keep].concat();
    cut.push_str(ELLIPSIS);
    cut
}

fn compose(mode: ParseMode, title: &str, description: &str, url: &str) -> String {
    match mode {
        ParseMode::MarkdownV2 => format!(
            "*{}*\n\n{}\n\nLink to the full article: [Link]({})",
            escape_markdown(title),
            escape_markdown(description),
            escape_markdown_url(url),
        ),
        ParseMode::Html => format!(
            "<b>{}</b>\n\n{}\n\nLink to the full article: <a href=\"{}\">Link</a>",
            escape_html(title),
            escape_html(description),
            escape_html(url),
        ),
        ParseMode::Plain => {
            format!("{title}\n\n{description}\n\nLink to the full article: {url}")
        }
    }
}

/// Escape every metacharacter MarkdownV2 reserves.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
                | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inside an inline-link URL only `)` and `\` are reserved.
fn escape_markdown_url(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

/// Minimal escaping for HTML mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
