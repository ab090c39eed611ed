//! Capability spec scaffolding.

use super::diagram::capability_diagram;
use super::text::slugify;
use crate::domain::{spec_file_name, Blueprint, Capability, SpecStatus};
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Lines of one Markdown document
#[derive(Default)]
struct Document {
    lines: Vec<String>,
}

impl Document {
    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn rule(&mut self) {
        self.line("---");
        self.blank();
    }

    fn bullets<'a>(&mut self, items: impl IntoIterator<Item = &'a String>) {
        for item in items {
            self.line(format!("- {item}"));
        }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn list_or_na(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".to_string()
    } else {
        items.join(", ")
    }
}

/// Render the spec document for one capability.
///
/// The document carries exactly one status marker, initialised to `template`.
/// `source` is the blueprint location shown in the header.
pub fn render_capability_spec(
    blueprint: &Blueprint,
    capability: &Capability,
    component_id: &str,
    source: &str,
) -> String {
    let mut doc = Document::default();

    doc.line(format!("# {} — Capability Spec", capability.name));
    doc.blank();
    doc.line(format!("**Bounded Context:** {}", blueprint.name));
    doc.line(format!("**Status:** {}", SpecStatus::Template));
    doc.line(format!("**Source:** `{source}`"));
    doc.blank();
    doc.line("<!--");
    doc.line("Status values:");
    doc.line("  - template: Initial generated template, not yet planned");
    doc.line("  - planned: Specs completed during planning, ready for implementation");
    doc.line("  - implemented: Code implementation complete");
    doc.line("Change only the value of the status line above as the capability progresses.");
    doc.line("-->");
    doc.blank();
    doc.rule();

    doc.line("## Overview");
    doc.blank();
    doc.line(format!("**Actors:** {}", list_or_na(&capability.actors)));
    doc.line(format!("**Entrypoints:** {}", list_or_na(&capability.entrypoints)));
    doc.line(format!("**Outputs:** {}", list_or_na(&capability.outputs)));
    doc.blank();
    doc.rule();

    doc.line("## Acceptance Criteria");
    doc.blank();
    doc.line("<!-- Use EARS notation for testable requirements -->");
    doc.line("<!-- WHEN <trigger> THE SYSTEM SHALL <response> -->");
    doc.line("<!-- WHILE <state> THE SYSTEM SHALL <response> -->");
    doc.line("<!-- IF <condition> THEN THE SYSTEM SHALL <response> -->");
    doc.blank();
    for _ in 0..3 {
        doc.line("- [ ] WHEN ... THE SYSTEM SHALL ...");
    }
    doc.blank();
    doc.rule();

    doc.line("## Error Handling");
    doc.blank();
    doc.line("<!-- Define error scenarios using EARS IF/THEN notation -->");
    doc.blank();
    for _ in 0..2 {
        doc.line("- [ ] IF ... THEN THE SYSTEM SHALL ...");
    }
    doc.blank();
    doc.rule();

    domain_state_section(&mut doc, blueprint, capability);
    placeholder_sections(&mut doc);
    architecture_section(&mut doc, blueprint, capability, component_id);

    let questions: Vec<String> = blueprint
        .open_questions()
        .into_iter()
        .filter(|q| q.capability == capability.name)
        .map(|q| q.to_string())
        .collect();
    if !questions.is_empty() {
        doc.line("## Open Questions");
        doc.blank();
        doc.bullets(&questions);
        doc.blank();
        doc.rule();
    }

    doc.line("## Implementation Notes (Optional)");
    doc.blank();
    doc.line("<!-- Add any implementation-specific notes, constraints, or considerations -->");
    doc.blank();
    doc.rule();

    doc.line("## ✅ Post-Implementation Checklist");
    doc.blank();
    doc.line("Once implementation is complete:");
    doc.blank();
    doc.line("- [ ] All acceptance criteria pass");
    doc.line("- [ ] Error handling scenarios covered by tests");
    doc.line("- [ ] Status line at the top of this file changed from `planned` to `implemented`");

    doc.finish()
}

fn domain_state_section(doc: &mut Document, blueprint: &Blueprint, capability: &Capability) {
    doc.line("## Domain State & Data");
    doc.blank();
    doc.line("### Aggregates involved");
    doc.blank();

    let aggregates = blueprint.aggregates_for_capability(capability);
    if aggregates.is_empty() {
        doc.line("_No specific aggregates identified in architecture._");
        doc.blank();
    }
    for aggregate in aggregates {
        doc.line(format!("#### {}", aggregate.name));
        doc.line(format!(
            "> {}",
            aggregate.description.as_deref().unwrap_or("No description")
        ));
        doc.blank();
        if !aggregate.key_attributes.is_empty() {
            doc.line("**Key Attributes:**");
            for attribute in &aggregate.key_attributes {
                doc.line(format!("- `{attribute}`"));
            }
            doc.blank();
        }
        if !aggregate.invariants.is_empty() {
            doc.line("**Invariants:**");
            doc.bullets(&aggregate.invariants);
            doc.blank();
        }
        if !aggregate.lifecycle.is_empty() {
            doc.line(format!("**Lifecycle:** {}", aggregate.lifecycle.join(" -> ")));
            doc.blank();
        }
    }

    if !capability.emits.is_empty() {
        doc.line("### Domain Events Emitted");
        doc.blank();
        for name in &capability.emits {
            let Some(event) = blueprint.event(name) else {
                doc.line(format!("- {name} (definition not found)"));
                doc.blank();
                continue;
            };
            doc.line(format!("#### {}", event.name));
            doc.line(format!(
                "> {}",
                event.description.as_deref().unwrap_or("No description")
            ));
            doc.blank();
            if !event.payload_intent.is_empty() {
                doc.line("**Payload Intent:**");
                for field in &event.payload_intent {
                    doc.line(format!("- `{field}`"));
                }
                doc.blank();
            }
        }
    }
    doc.rule();
}

fn placeholder_sections(doc: &mut Document) {
    doc.line("## Data Model");
    doc.blank();
    doc.line("<!-- Map the Aggregate attributes above to a persistence schema -->");
    doc.line("<!-- Note: Only model tables owned by this Bounded Context -->");
    doc.blank();
    doc.line("### Schema");
    doc.blank();
    doc.line("| Table | Column | Type | Constraints |");
    doc.line("|-------|--------|------|-------------|");
    doc.line("| ...   | ...    | ...  | ...         |");
    doc.blank();
    doc.line("### Relationships");
    doc.blank();
    doc.line("<!-- Define foreign keys, join tables, and cross-aggregate references -->");
    doc.blank();
    doc.line("### Indexes");
    doc.blank();
    doc.line("<!-- Define indexes for query optimization -->");
    doc.blank();
    doc.rule();

    doc.line("## Request/Response Contracts");
    doc.blank();
    doc.line("<!-- Define API payloads and Event DTOs -->");
    doc.line("<!-- Tip: Use Task-Based naming (e.g. GenerateCustomCatRequest) -->");
    doc.blank();
    for heading in ["### Request", "### Response"] {
        doc.line(heading);
        doc.blank();
        doc.line("```json");
        doc.line("{");
        doc.line("  ...");
        doc.line("}");
        doc.line("```");
        doc.blank();
    }
    doc.rule();
}

fn architecture_section(
    doc: &mut Document,
    blueprint: &Blueprint,
    capability: &Capability,
    component_id: &str,
) {
    doc.line("## Architecture");
    doc.blank();
    doc.line("### Capability Flow Diagram");
    doc.blank();
    doc.line("```mermaid");
    doc.line(capability_diagram(blueprint, capability, component_id).source);
    doc.line("```");
    doc.blank();

    doc.line("### Application Layer");
    doc.blank();
    doc.line("**Services:**");
    doc.bullets(&capability.orchestrates);
    doc.blank();

    doc.line("### Domain Layer");
    doc.blank();
    let mut seen: Vec<&str> = Vec::new();
    for aggregate in capability
        .orchestrates
        .iter()
        .filter_map(|s| blueprint.service(s))
        .filter_map(|s| s.orchestrates.as_deref())
        .filter_map(|name| blueprint.aggregate(name))
    {
        if seen.contains(&aggregate.name.as_str()) {
            continue;
        }
        seen.push(&aggregate.name);
        doc.line(format!("**Aggregate:** {}", aggregate.name));
        if !aggregate.invariants.is_empty() {
            doc.blank();
            doc.line("**Invariants:**");
            doc.bullets(&aggregate.invariants);
        }
        if !aggregate.lifecycle.is_empty() {
            doc.blank();
            doc.line(format!("**Lifecycle:** {}", aggregate.lifecycle.join(" → ")));
        }
        doc.blank();
    }
    if !capability.emits.is_empty() {
        doc.line("**Events Emitted:**");
        doc.bullets(&capability.emits);
        doc.blank();
    }

    doc.line("### Infrastructure Layer");
    doc.blank();
    doc.line("**Ports Used:**");
    doc.bullets(&capability.uses_ports);
    doc.blank();

    let adapters: Vec<String> = capability
        .uses_ports
        .iter()
        .flat_map(|port| {
            blueprint
                .adapters()
                .filter(move |(_, a)| &a.implements == port)
                .map(move |(_, a)| format!("{} → {}", a.name, port))
        })
        .collect();
    if !adapters.is_empty() {
        doc.line("**Adapters:**");
        doc.bullets(&adapters);
        doc.blank();
    }
    doc.rule();
}

/// What happened to one spec file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecWriteOutcome {
    Written,
    Overwritten,
    /// Existing file preserved
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldedSpec {
    pub capability: String,
    pub path: PathBuf,
    pub outcome: SpecWriteOutcome,
}

/// Write one spec per capability into `specs_dir`.
///
/// Existing spec files are preserved unless `force` is set, so hand-written
/// planning and status changes survive regeneration.
pub fn write_specs(
    blueprint: &Blueprint,
    component_id: &str,
    source: &str,
    specs_dir: &Path,
    force: bool,
) -> Result<Vec<ScaffoldedSpec>> {
    fs::create_dir_all(specs_dir)?;
    let mut written = Vec::new();

    for capability in blueprint.capabilities() {
        let path = specs_dir.join(spec_file_name(&slugify(&capability.name)));
        let exists = path.exists();
        let outcome = match (exists, force) {
            (true, false) => {
                tracing::info!("Keeping existing spec {}", path.display());
                SpecWriteOutcome::Skipped
            }
            _ => {
                let content = render_capability_spec(blueprint, capability, component_id, source);
                fs::write(&path, content)?;
                tracing::info!("Wrote spec {}", path.display());
                if exists {
                    SpecWriteOutcome::Overwritten
                } else {
                    SpecWriteOutcome::Written
                }
            }
        };
        written.push(ScaffoldedSpec {
            capability: capability.name.clone(),
            path,
            outcome,
        });
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CATALOG_BLUEPRINT;
    use tempfile::TempDir;

    fn blueprint() -> Blueprint {
        Blueprint::from_json(CATALOG_BLUEPRINT, Path::new("cat_content.json")).unwrap()
    }

    fn render(blueprint: &Blueprint) -> String {
        render_capability_spec(
            blueprint,
            &blueprint.capabilities()[0],
            "cat_content",
            "architecture/cat_content.json",
        )
    }

    #[test]
    fn test_spec_has_single_template_marker() {
        let spec = render(&blueprint());
        assert!(spec.starts_with("# Browse Catalog — Capability Spec\n"));
        assert_eq!(spec.matches("**Status:**").count(), 1);
        assert_eq!(SpecStatus::parse(&spec), SpecStatus::Template);
        assert!(spec.contains("**Source:** `architecture/cat_content.json`"));
    }

    #[test]
    fn test_spec_resolves_aggregate_through_service() {
        let spec = render(&blueprint());
        assert!(spec.contains("#### CatListing\n> No description\n\n**Key Attributes:**\n- `id`\n- `slug`"));
        assert!(spec.contains("**Lifecycle:** draft -> published"));
        assert!(spec.contains("**Aggregate:** CatListing"));
        assert!(spec.contains("**Lifecycle:** draft → published"));
        assert!(spec.contains("- SqlCatListingRepository → CatListingRepository"));
        assert!(spec.contains("**Outputs:** PaginatedResult"));
        assert!(!spec.contains("## Open Questions"));
    }

    #[test]
    fn test_spec_embeds_flow_diagram() {
        let spec = render(&blueprint());
        assert!(spec.contains("```mermaid\nflowchart TB\n    Visitor[\"Visitor\"]"));
    }

    #[test]
    fn test_unknown_event_is_listed() {
        let blueprint = Blueprint::from_json(
            r#"{"name": "Orders", "profile": "core", "layers": {"application": {"capabilities": [{
                "name": "Checkout",
                "emits": ["OrderPlaced"]
            }]}}}"#,
            Path::new("orders.json"),
        )
        .unwrap();
        let spec = render_capability_spec(&blueprint, &blueprint.capabilities()[0], "orders", "orders.json");

        assert!(spec.contains("### Domain Events Emitted\n\n- OrderPlaced (definition not found)"));
        assert!(spec.contains("_No specific aggregates identified in architecture._"));
        assert!(spec.contains("**Actors:** N/A"));
        assert!(spec.contains("## Open Questions\n\n- Capability 'Checkout' emits 'OrderPlaced', which is not declared"));
    }

    #[test]
    fn test_rendering_is_byte_identical() {
        let blueprint = blueprint();
        assert_eq!(render(&blueprint), render(&blueprint));
    }

    #[test]
    fn test_write_specs_preserves_existing() {
        let temp = TempDir::new().unwrap();
        let specs_dir = temp.path().join("docs/specs/cat_content");
        let blueprint = blueprint();

        let first = write_specs(&blueprint, "cat_content", "bp.json", &specs_dir, false).unwrap();
        assert_eq!(first[0].outcome, SpecWriteOutcome::Written);
        assert_eq!(first[0].path, specs_dir.join("browse_catalog.spec.md"));

        fs::write(&first[0].path, "# Edited\n\n**Status:** planned\n").unwrap();
        let second = write_specs(&blueprint, "cat_content", "bp.json", &specs_dir, false).unwrap();
        assert_eq!(second[0].outcome, SpecWriteOutcome::Skipped);
        assert_eq!(SpecStatus::read(&first[0].path), SpecStatus::Planned);

        let forced = write_specs(&blueprint, "cat_content", "bp.json", &specs_dir, true).unwrap();
        assert_eq!(forced[0].outcome, SpecWriteOutcome::Overwritten);
        assert_eq!(SpecStatus::read(&first[0].path), SpecStatus::Template);
    }
}
