use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::core::ViewBox;
use crate::ids::table::quoted_value;

static ROOT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<svg\b").expect("root tag pattern compiles"));

static GROUP_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<g\b").expect("group tag pattern compiles"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?P<name>[A-Za-z_:][\w:.\-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#)
        .expect("attribute pattern compiles")
});

/// Byte offset just past the `>` closing the start tag whose attributes begin at `from`.
///
/// Quoted attribute values may contain `>`.
fn tag_end(text: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in text.as_bytes()[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + i + 1),
            None => {}
        }
    }
    None
}

/// Span of the root `<svg ...>` start tag.
fn root_tag(text: &str) -> Option<Range<usize>> {
    let open = ROOT_OPEN.find(text)?;
    let end = tag_end(text, open.end())?;
    Some(open.start()..end)
}

/// Value of attribute `name` (ASCII case-insensitive) inside one start tag.
fn attribute<'t>(tag: &'t str, name: &str) -> Option<&'t str> {
    ATTRIBUTE
        .captures_iter(tag)
        .find(|caps| {
            caps.name("name")
                .is_some_and(|n| n.as_str().eq_ignore_ascii_case(name))
        })
        .and_then(|caps| quoted_value(&caps).map(|m| m.as_str()))
}

fn dimension(value: &str) -> Option<f64> {
    let v = value.trim();
    let v = v.strip_suffix("px").unwrap_or(v).trim_end();
    v.parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
}

/// The root element's own coordinate system, if it declares one.
///
/// Prefers the root `viewBox`; otherwise builds one from numeric `width`/`height` (a missing
/// dimension counts as 100). Only the root start tag is consulted.
pub fn try_parse_viewbox(text: &str) -> Option<ViewBox> {
    let range = root_tag(text)?;
    let tag = &text[range];
    if let Some(vb) = attribute(tag, "viewBox").and_then(|v| ViewBox::parse(v).ok()) {
        return Some(vb);
    }
    let width = attribute(tag, "width").and_then(dimension);
    let height = attribute(tag, "height").and_then(dimension);
    if width.is_none() && height.is_none() {
        return None;
    }
    ViewBox::from_size(width.unwrap_or(100.0), height.unwrap_or(100.0)).ok()
}

/// Like [`try_parse_viewbox`], falling back to [`ViewBox::FALLBACK`].
pub fn parse_viewbox(text: &str) -> ViewBox {
    try_parse_viewbox(text).unwrap_or_else(|| {
        tracing::debug!("no usable viewBox or dimensions on root svg, using fallback");
        ViewBox::FALLBACK
    })
}

/// Content between the root start tag and the last `</svg>`.
///
/// Text without a root tag is returned unchanged; a missing close tag keeps everything after the
/// start tag.
pub fn extract_inner(text: &str) -> &str {
    let Some(range) = root_tag(text) else {
        return text;
    };
    match text.rfind("</svg>") {
        Some(end) if end >= range.end => &text[range.end..end],
        _ => &text[range.end..],
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Make `text` legal inside an XML comment (no `--` runs).
pub(crate) fn comment_text(text: &str) -> Cow<'_, str> {
    if !text.contains("--") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if c == '-' && out.ends_with('-') {
            out.push(' ');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Where content goes inside an anchor group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AnchorInsert {
    /// Offset just past `<g ...>`.
    Open(usize),
    /// Span of the `/>` closing an empty `<g .../>`, to be replaced by `>` content `</g>`.
    SelfClosing(Range<usize>),
}

/// Insertion point inside the first `<g>` whose `id` is `anchor_id`.
pub(crate) fn find_anchor_insert(text: &str, anchor_id: &str) -> Option<AnchorInsert> {
    GROUP_OPEN.find_iter(text).find_map(|open| {
        let end = tag_end(text, open.end())?;
        let tag = &text[open.start()..end];
        if attribute(tag, "id") != Some(anchor_id) {
            return None;
        }
        let before_close = text[..end - 1].trim_end();
        if before_close.len() > open.end() && before_close.ends_with('/') {
            return Some(AnchorInsert::SelfClosing(before_close.len() - 1..end));
        }
        Some(AnchorInsert::Open(end))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/document.rs"]
mod tests;
