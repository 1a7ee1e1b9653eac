//! SVG markup optimizer
//!
//! A small set of text-level passes over SVG markup, each switchable through
//! [`VectorParams`]. Icons are small, hand-exported files; the passes only
//! remove things (comments, editor data, redundant attributes), never
//! rewrite geometry.
//!
//! [`strip_outer_tag`] removes exactly the first `<svg ...>` opening tag and
//! the last `</svg>` closing tag. Everything between them, nested `<svg>`
//! elements included, passes through unchanged.

use crate::config::VectorParams;
use crate::error::{IconpackError, IconpackResult};
use regex::Regex;
use std::sync::LazyLock;

static XML_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>").expect("valid regex"));
static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>\[]*(\[.*?\])?\s*>").expect("valid regex"));
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static METADATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<metadata\b[^>]*/>|<metadata\b[^>]*>.*?</metadata\s*>").expect("valid regex")
});
static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<title\b[^>]*/>|<title\b[^>]*>.*?</title\s*>").expect("valid regex")
});
static DESC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<desc\b[^>]*/>|<desc\b[^>]*>.*?</desc\s*>").expect("valid regex")
});
static EDITOR_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<(sodipodi|inkscape):[\w.-]+\b[^>]*/>|<(sodipodi|inkscape):([\w.-]+)\b[^>]*>.*?</(sodipodi|inkscape):[\w.-]+\s*>",
    )
    .expect("valid regex")
});
static EDITOR_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+(?:xmlns:)?(?:sodipodi|inkscape)(?::[\w.-]+)?\s*=\s*(?:"[^"]*"|'[^']*')"#)
        .expect("valid regex")
});
static EMPTY_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<g\b[^>]*/>|<g\b[^>]*>\s*</g\s*>").expect("valid regex"));
static EMPTY_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+[\w:.-]+\s*=\s*(?:""|'')"#).expect("valid regex"));
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));
static ROOT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*svg\b[^>]*>").expect("valid regex"));
static ROOT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</\s*svg\s*>").expect("valid regex"));
static VIEW_BOX_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+viewBox\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});
static DIMENSION_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+(?:width|height)\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
});

/// Runs the enabled optimizer passes over SVG markup
#[derive(Debug, Clone)]
pub struct SvgOptimizer {
    params: VectorParams,
}

impl SvgOptimizer {
    pub fn new(params: VectorParams) -> Self {
        Self { params }
    }

    /// Optimize `markup`, which must contain an `<svg>` root
    pub fn optimize(&self, markup: &str) -> IconpackResult<String> {
        if !ROOT_OPEN.is_match(markup) {
            return Err(IconpackError::transform("no <svg> root element"));
        }

        let p = &self.params;
        let mut out = markup.to_string();

        if p.remove_xml_declaration {
            out = XML_DECLARATION.replace_all(&out, "").into_owned();
        }
        if p.remove_doctype {
            out = DOCTYPE.replace_all(&out, "").into_owned();
        }
        if p.remove_comments {
            out = COMMENT.replace_all(&out, "").into_owned();
        }
        if p.remove_metadata {
            out = METADATA.replace_all(&out, "").into_owned();
        }
        if p.remove_title {
            out = TITLE.replace_all(&out, "").into_owned();
        }
        if p.remove_desc {
            out = DESC.replace_all(&out, "").into_owned();
        }
        if p.remove_editor_data {
            out = EDITOR_ELEMENT.replace_all(&out, "").into_owned();
            out = EDITOR_ATTR.replace_all(&out, "").into_owned();
        }
        if p.remove_empty_attrs {
            out = EMPTY_ATTR.replace_all(&out, "").into_owned();
        }
        if p.remove_dimensions || p.remove_view_box {
            out = self.rewrite_root_attrs(&out);
        }
        if p.remove_empty_containers {
            // Removing an inner group can leave its parent empty
            loop {
                let next = EMPTY_GROUP.replace_all(&out, "").into_owned();
                if next == out {
                    break;
                }
                out = next;
            }
        }
        if p.collapse_whitespace {
            out = BETWEEN_TAGS.replace_all(&out, "><").into_owned();
        }

        Ok(out.trim().to_string())
    }

    /// Apply the root-only attribute passes to the first `<svg>` tag
    fn rewrite_root_attrs(&self, markup: &str) -> String {
        let Some(root) = ROOT_OPEN.find(markup) else {
            return markup.to_string();
        };
        let mut tag = root.as_str().to_string();

        if self.params.remove_dimensions && VIEW_BOX_ATTR.is_match(&tag) {
            tag = DIMENSION_ATTR.replace_all(&tag, "").into_owned();
        }
        if self.params.remove_view_box {
            tag = VIEW_BOX_ATTR.replace_all(&tag, "").into_owned();
        }

        format!("{}{}{}", &markup[..root.start()], tag, &markup[root.end()..])
    }
}

/// Value of the root element's `viewBox` attribute, if any
pub fn extract_view_box(markup: &str) -> Option<String> {
    let root = ROOT_OPEN.find(markup)?;
    VIEW_BOX_ATTR.captures(root.as_str()).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim().to_string())
    })
}

/// Remove the outermost `<svg ...>` and `</svg>` tags
///
/// A self-closing root yields empty markup. A missing closing tag leaves
/// the tail untouched.
pub fn strip_outer_tag(markup: &str) -> String {
    let Some(open) = ROOT_OPEN.find(markup) else {
        return markup.to_string();
    };
    if open.as_str().trim_end_matches('>').trim_end().ends_with('/') {
        return String::new();
    }

    let inner = &markup[open.end()..];
    let end = ROOT_CLOSE
        .find_iter(inner)
        .last()
        .map(|m| m.start())
        .unwrap_or(inner.len());

    inner[..end].trim().to_string()
}
