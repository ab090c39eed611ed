//! Pure text helpers shared by the generators.

use regex::Regex;
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("Invalid camel boundary regex"));

static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid separator regex"));

/// Line separator used inside diagram labels
pub const LABEL_BREAK: &str = "<br/>";

/// Stable identifier from a display name: `Browse Catalog` -> `browse_catalog`,
/// `CatListing` -> `cat_listing`
pub fn slugify(text: &str) -> String {
    let separated = CAMEL_BOUNDARY.replace_all(text, "${1}_${2}");
    let lowered = separated.to_lowercase();
    NON_ALNUM_RUN
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Greedy word wrap at `width` columns.
///
/// A word longer than `width` gets a line to itself.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrapped text joined for embedding in a diagram label
pub fn wrap_text(text: &str, width: usize) -> String {
    wrap_lines(text, width).join(LABEL_BREAK)
}

/// Make text safe inside a quoted diagram label
pub fn sanitize(text: &str) -> String {
    text.replace('"', "'").replace('\n', LABEL_BREAK)
}

/// Identifier keeping only ASCII letters and digits
pub fn alnum_id(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Identifier with whitespace removed
pub fn compact_id(text: &str) -> String {
    text.split_whitespace().collect()
}
