//! Mermaid flowchart synthesis from a blueprint.
//!
//! Everything here is a pure function of the blueprint, so regenerating an
//! unchanged blueprint yields byte-identical text.

use super::text::{alnum_id, compact_id, sanitize, slugify, wrap_text, LABEL_BREAK};
use crate::config::{DiagramConfig, ImageFormat};
use crate::domain::blueprint::Adapter;
use crate::domain::{AdapterRole, Blueprint, Capability};
use serde::Serialize;

/// Label separator between a node title and its details
const RULE: &str = "─────";

/// Mermaid source for one diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MermaidDiagram {
    /// Stable file name without extension
    pub name: String,
    pub title: String,
    pub source: String,
}

impl MermaidDiagram {
    pub fn image_file(&self, format: ImageFormat) -> String {
        format!("{}.{}", self.name, format.extension())
    }
}

/// Name of the Markdown document wrapping all diagrams of a component
pub fn architecture_document_name(component_id: &str) -> String {
    format!("{component_id}_architecture.md")
}

struct Flowchart {
    lines: Vec<String>,
}

impl Flowchart {
    fn new() -> Self {
        Self {
            lines: vec!["flowchart TB".to_string()],
        }
    }

    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(format!("    {}", line.into()));
    }

    fn push_nested(&mut self, line: impl Into<String>) {
        self.lines.push(format!("        {}", line.into()));
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

/// `search` -> `Search BC`
fn neighbour_label(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => format!("{}{} BC", first.to_uppercase(), chars.as_str()),
        None => "BC".to_string(),
    }
}

/// Context diagram: actors, the component, its neighbours and external systems
pub fn context_diagram(
    blueprint: &Blueprint,
    component_id: &str,
    config: &DiagramConfig,
) -> MermaidDiagram {
    let mut chart = Flowchart::new();

    if !blueprint.actors.is_empty() {
        chart.push("subgraph Actors");
        for actor in &blueprint.actors {
            chart.push_nested(format!("{}[{}]", compact_id(&actor.name), actor.name));
        }
        chart.push("end");
    }

    let mut label = blueprint.name.clone();
    if let Some(description) = blueprint.description.as_deref().filter(|d| !d.is_empty()) {
        label.push_str(&format!(
            "{LABEL_BREAK}{RULE}{LABEL_BREAK}{}",
            wrap_text(description, config.wrap_width)
        ));
    }
    chart.push(format!("BC[\"{}\"]", sanitize(&label)));

    for actor in &blueprint.actors {
        let id = compact_id(&actor.name);
        match actor.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => chart.push(format!(
                "{id} -->|\"{}\"| BC",
                sanitize(&wrap_text(description, config.actor_wrap_width))
            )),
            None => chart.push(format!("{id} --> BC")),
        }
    }

    let relationships = &blueprint.relationships;
    let mut neighbours: Vec<&str> = Vec::new();
    for target in relationships
        .publishes_to
        .iter()
        .map(|r| r.target_component.as_str())
        .chain(relationships.consumed_by.iter().map(|r| r.target_component.as_str()))
    {
        if !neighbours.contains(&target) {
            neighbours.push(target);
        }
    }

    if !neighbours.is_empty() {
        chart.push("subgraph Downstream[\"Neighboring BCs\"]");
        for id in &neighbours {
            chart.push_nested(format!("{}[{}]", alnum_id(id), neighbour_label(id)));
        }
        chart.push("end");

        for published in &relationships.publishes_to {
            chart.push(format!(
                "BC -->|\"{}\"| {}",
                sanitize(&published.events.join(LABEL_BREAK)),
                alnum_id(&published.target_component)
            ));
        }
        for consumer in &relationships.consumed_by {
            chart.push(format!(
                "BC -.->|\"consumed by\"| {}",
                alnum_id(&consumer.target_component)
            ));
        }
    }

    if !blueprint.external_systems.is_empty() {
        chart.push("subgraph External[\"External Systems\"]");
        for system in &blueprint.external_systems {
            let id = alnum_id(&system.name);
            let mut label = system.name.clone();
            if !system.providers.is_empty() {
                label.push_str(&format!("{LABEL_BREAK}{}", system.providers.join(", ")));
            }
            if system.is_database() {
                chart.push_nested(format!("{id}[(\"{}\")]", sanitize(&label)));
            } else {
                chart.push_nested(format!("{id}[{}]", sanitize(&label)));
            }
            chart.push(format!("BC --> {id}"));
        }
        chart.push("end");
    }

    MermaidDiagram {
        name: format!("{component_id}_l1_context"),
        title: "System Context".to_string(),
        source: chart.finish(),
    }
}

/// Capability diagram: actor to entrypoint to service, with ports, adapters,
/// the orchestrated aggregate and its emitted events
pub fn capability_diagram(
    blueprint: &Blueprint,
    capability: &Capability,
    component_id: &str,
) -> MermaidDiagram {
    let mut chart = Flowchart::new();

    for actor in &capability.actors {
        chart.push(format!("{}[\"{}\"]", compact_id(actor), sanitize(actor)));
    }

    if let Some(entrypoint) = capability.entrypoints.first() {
        let (controller, action) = match entrypoint.split_once('#') {
            Some((controller, action)) => (controller, Some(action)),
            None => (entrypoint.as_str(), None),
        };

        if let Some(actor) = capability.actors.first() {
            let route = blueprint
                .http_entrypoint(controller)
                .and_then(|e| e.routes.as_deref())
                .or(action)
                .unwrap_or(entrypoint.as_str());
            chart.push(format!(
                "{} -->|\"{}\"| Controller",
                compact_id(actor),
                sanitize(route)
            ));
        }
        chart.push(format!("Controller[\"{}\"]", sanitize(entrypoint)));

        if let Some(service) = capability.orchestrates.first() {
            chart.push("Controller -->|invokes| Service");
            chart.push(format!("Service[\"{}\"]", sanitize(service)));

            for (idx, port) in capability.uses_ports.iter().enumerate() {
                chart.push(format!(
                    "Service -->|uses port| Port{idx}[\"{}{LABEL_BREAK}(port)\"]",
                    sanitize(port)
                ));
                if let Some((role, adapter)) = blueprint.adapter_for_port(port) {
                    chart.push(format!(
                        "Port{idx} -.->|impl| Adapter{idx}[\"{}\"]",
                        sanitize(&adapter.name)
                    ));
                    adapter_target(&mut chart, blueprint, idx, role, adapter);
                }
            }

            let aggregate = blueprint
                .service(service)
                .and_then(|s| s.orchestrates.as_deref())
                .and_then(|name| blueprint.aggregate(name));
            if let Some(aggregate) = aggregate {
                chart.push(format!(
                    "Service -->|orchestrates| Aggregate[\"{}\"]",
                    sanitize(&format!("{} Aggregate", aggregate.name))
                ));
                for (idx, event) in capability.emits.iter().enumerate() {
                    let mut label = event.clone();
                    if let Some(def) = blueprint.event(event).filter(|e| !e.payload_intent.is_empty()) {
                        label.push_str(&format!(
                            "{LABEL_BREAK}{RULE}{LABEL_BREAK}{}",
                            def.payload_intent.join(LABEL_BREAK)
                        ));
                    }
                    chart.push(format!(
                        "Aggregate -->|emits| Event{idx}[\"{}\"]",
                        sanitize(&label)
                    ));
                    chart.push(format!("Event{idx} --> EventBus[Event Bus]"));
                }
            }
        }
    }

    MermaidDiagram {
        name: format!("{component_id}_l3_{}", slugify(&capability.name)),
        title: capability.name.clone(),
        source: chart.finish(),
    }
}

/// Connect an adapter to the external system it most likely talks to
fn adapter_target(
    chart: &mut Flowchart,
    blueprint: &Blueprint,
    idx: usize,
    role: AdapterRole,
    adapter: &Adapter,
) {
    let systems = &blueprint.external_systems;
    match role {
        AdapterRole::Persistence => {
            let database = systems.iter().find(|s| {
                let name = s.name.to_lowercase();
                s.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains("persistence"))
                    || name.contains("postgres")
                    || name.contains("db")
            });
            match database {
                Some(system) => chart.push(format!(
                    "Adapter{idx} --> {}[(\"{}\")]",
                    alnum_id(&system.name),
                    sanitize(&system.name)
                )),
                None => chart.push(format!("Adapter{idx} --> DB[(\"(Database)\")]")),
            }
        }
        AdapterRole::External => {
            let external = systems.iter().find(|s| {
                adapter
                    .technology
                    .as_deref()
                    .is_some_and(|t| !t.is_empty() && s.name.contains(t))
                    || s.providers.iter().any(|p| adapter.name.contains(p.as_str()))
            });
            if let Some(system) = external {
                chart.push(format!(
                    "Adapter{idx} --> {}[\"{}\"]",
                    alnum_id(&system.name),
                    sanitize(&system.name)
                ));
            }
        }
    }
}

/// The context diagram followed by one diagram per capability
pub fn all_diagrams(
    blueprint: &Blueprint,
    component_id: &str,
    config: &DiagramConfig,
) -> Vec<MermaidDiagram> {
    std::iter::once(context_diagram(blueprint, component_id, config))
        .chain(
            blueprint
                .capabilities()
                .iter()
                .map(|c| capability_diagram(blueprint, c, component_id)),
        )
        .collect()
}

fn diagram_section(out: &mut String, heading: &str, diagram: &MermaidDiagram, format: ImageFormat) {
    out.push_str(&format!("{heading} {}\n\n", diagram.title));
    out.push_str(&format!(
        "![{}](images/{})\n\n",
        diagram.title,
        diagram.image_file(format)
    ));
    out.push_str("```mermaid\n");
    out.push_str(&diagram.source);
    out.push_str("\n```\n\n");
}

/// Markdown document embedding every diagram's source and a link to its image
pub fn architecture_document(
    blueprint: &Blueprint,
    component_id: &str,
    blueprint_source: &str,
    diagrams: &[MermaidDiagram],
    format: ImageFormat,
) -> String {
    let mut out = format!("# {} Architecture Diagrams\n\n", blueprint.name);
    out.push_str(&format!("**Bounded Context:** `{component_id}`\n"));
    out.push_str(&format!("**Source:** `{blueprint_source}`\n\n"));
    out.push_str(
        "<!-- Generated from the blueprint. Edit the blueprint and regenerate instead of editing this file. -->\n\n",
    );

    let (context, capabilities) = match diagrams.split_first() {
        Some((first, rest)) => (Some(first), rest),
        None => (None, diagrams),
    };
    if let Some(context) = context {
        diagram_section(&mut out, "##", context, format);
    }
    if !capabilities.is_empty() {
        out.push_str("## Capabilities\n\n");
        for diagram in capabilities {
            diagram_section(&mut out, "###", diagram, format);
        }
    }

    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}
