//! Services operating on blueprints and implementation roots.
//!
//! This module contains:
//! - discovery: type graph and component inventory of an implementation root
//! - conformance: blueprint/implementation assertions
//! - diagram: Mermaid flowchart synthesis
//! - scaffold: capability spec documents
//! - workflow: next-step suggestions across components
//! - render: external diagram rendering

pub mod conformance;
pub mod diagram;
pub mod discovery;
pub mod render;
pub mod scaffold;
pub mod text;
pub mod workflow;

pub use conformance::{compare_names, ConformanceChecker, DriftMode};
pub use diagram::{
    all_diagrams, architecture_document, architecture_document_name, capability_diagram,
    context_diagram, MermaidDiagram,
};
pub use discovery::{discover, Inventory, TypeGraph};
pub use render::{render_all, DiagramRenderer, MermaidCli};
pub use scaffold::{render_capability_spec, write_specs, ScaffoldedSpec, SpecWriteOutcome};
pub use text::slugify;
pub use workflow::{analyze_component, analyze_components, prioritize, suggestions_for};
