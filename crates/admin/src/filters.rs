//! Custom Askama template filters.
//!
//! Product descriptions arrive as merchant-authored HTML. Pages never
//! insert that markup: `plain_text` reduces it to text, and Askama's
//! auto-escaping handles the rest.

use std::fmt::Display;

/// Elements whose content is dropped along with the tags.
const OPAQUE_ELEMENTS: [&str; 2] = ["script", "style"];

/// Reduce HTML to whitespace-collapsed plain text.
///
/// Usage in templates: `{{ product.description_html|plain_text }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn plain_text(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(strip_tags(&value.to_string()))
}

/// Remove tags, drop `<script>`/`<style>` content, decode common entities
/// and collapse whitespace.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some((before, after)) = rest.split_once('<') {
        text.push_str(before);

        let Some((tag, tail)) = after.split_once('>') else {
            // Unterminated tag: drop the remainder.
            rest = "";
            break;
        };
        rest = tail;
        text.push(' ');

        let name = tag
            .split(|c: char| c.is_whitespace() || c == '/')
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let self_closing = tag.ends_with('/');

        if !tag.starts_with('/') && !self_closing && OPAQUE_ELEMENTS.contains(&name.as_str()) {
            let close = format!("</{name}");
            rest = rest
                .to_ascii_lowercase()
                .find(&close)
                .and_then(|pos| rest.get(pos..))
                .and_then(|from_close| from_close.split_once('>'))
                .map_or("", |(_, tail)| tail);
        }
    }
    text.push_str(rest);

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
