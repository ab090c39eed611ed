//! Capability spec documents and their lifecycle status.

use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extension shared by every generated spec document
pub const SPEC_FILE_SUFFIX: &str = ".spec.md";

static STATUS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Status:?\*\*:?\s*(template|planned|implemented)\b")
        .expect("Invalid status marker regex")
});

/// File name of the spec for a capability slug
pub fn spec_file_name(slug: &str) -> String {
    format!("{slug}{SPEC_FILE_SUFFIX}")
}

/// Lifecycle status of one capability's spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecStatus {
    /// No spec document generated yet
    #[serde(rename = "none")]
    NotGenerated,
    Template,
    Planned,
    Implemented,
}

impl SpecStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotGenerated => "none",
            Self::Template => "template",
            Self::Planned => "planned",
            Self::Implemented => "implemented",
        }
    }

    fn from_marker(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "template" => Some(Self::Template),
            "planned" => Some(Self::Planned),
            "implemented" => Some(Self::Implemented),
            _ => None,
        }
    }

    /// Status declared by a spec document.
    ///
    /// Only bold `Status` labels in prose count; code blocks and HTML comments
    /// are ignored. A document without a marker is a `template`.
    pub fn parse(content: &str) -> Self {
        let prose = flatten_prose(content);
        let mut markers = STATUS_MARKER
            .captures_iter(&prose)
            .filter_map(|caps| caps.get(1).and_then(|m| Self::from_marker(m.as_str())));

        let Some(status) = markers.next() else {
            return Self::Template;
        };
        if markers.next().is_some() {
            tracing::warn!(
                "Spec declares more than one status marker; using the first ({})",
                status
            );
        }
        status
    }

    /// Status of the spec at `path`, or `NotGenerated` if there is none
    pub fn read(path: &Path) -> Self {
        if !path.is_file() {
            return Self::NotGenerated;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read spec {}: {}", path.display(), e);
                Self::Template
            }
        }
    }
}

impl std::fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Markdown prose with bold spans kept as `**...**`, code and HTML dropped
fn flatten_prose(content: &str) -> String {
    let mut prose = String::new();
    let mut in_code_block = false;

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(Tag::CodeBlock(_)) => in_code_block = false,
            _ if in_code_block => {}
            Event::Start(Tag::Strong) | Event::End(Tag::Strong) => prose.push_str("**"),
            Event::Text(text) => prose.push_str(&text),
            Event::SoftBreak | Event::HardBreak => prose.push('\n'),
            Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item) => prose.push('\n'),
            _ => {}
        }
    }

    prose
}

/// Spec state of one capability, derived fresh from the filesystem
#[derive(Debug, Clone, Serialize)]
pub struct CapabilitySpecState {
    pub capability_name: String,
    pub slug: String,
    pub spec_exists: bool,
    /// Expected spec location, whether or not it exists
    pub spec_path: PathBuf,
    pub status: SpecStatus,
}

impl CapabilitySpecState {
    pub fn scan(capability_name: &str, slug: &str, specs_dir: &Path) -> Self {
        let spec_path = specs_dir.join(spec_file_name(slug));
        let status = SpecStatus::read(&spec_path);
        Self {
            capability_name: capability_name.to_string(),
            slug: slug.to_string(),
            spec_exists: status != SpecStatus::NotGenerated,
            spec_path,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_status_both_label_forms() {
        assert_eq!(SpecStatus::parse("**Status:** planned\n"), SpecStatus::Planned);
        assert_eq!(SpecStatus::parse("**Status**: Implemented\n"), SpecStatus::Implemented);
    }

    #[test]
    fn test_missing_marker_defaults_to_template() {
        assert_eq!(SpecStatus::parse("# Checkout\n\nNo marker here.\n"), SpecStatus::Template);
        assert_eq!(SpecStatus::parse("**Status:** unknown\n"), SpecStatus::Template);
    }

    #[test]
    fn test_marker_in_comment_or_code_is_ignored() {
        let content = "# Spec\n\n<!--\n**Status:** implemented\n-->\n\n```\n**Status:** planned\n```\n";
        assert_eq!(SpecStatus::parse(content), SpecStatus::Template);
    }

    #[test]
    fn test_first_marker_wins() {
        let content = "**Status:** planned\n\nLater: **Status:** implemented\n";
        assert_eq!(SpecStatus::parse(content), SpecStatus::Planned);
    }

    #[test]
    fn test_capability_state_scan() {
        let temp = TempDir::new().unwrap();
        let missing = CapabilitySpecState::scan("Checkout", "checkout", temp.path());
        assert!(!missing.spec_exists);
        assert_eq!(missing.status, SpecStatus::NotGenerated);

        std::fs::write(
            temp.path().join("checkout.spec.md"),
            "# Checkout\n\n**Status:** planned\n",
        )
        .unwrap();
        let planned = CapabilitySpecState::scan("Checkout", "checkout", temp.path());
        assert!(planned.spec_exists);
        assert_eq!(planned.status, SpecStatus::Planned);
        assert_eq!(planned.spec_path, temp.path().join("checkout.spec.md"));
    }

    #[test]
    fn test_status_serializes_none() {
        let json = serde_json::to_value(SpecStatus::NotGenerated).unwrap();
        assert_eq!(json, "none");
    }
}
