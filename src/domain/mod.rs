//! Domain entities for rampart.
//!
//! This module contains the core data types:
//! - Blueprint: The declared architecture of one component
//! - DiscoveredComponent: An implementation artifact found in source
//! - ConformanceFinding: One result of comparing the two
//! - CapabilitySpecState / ComponentWorkflowState: Workflow progress
//! - Project: The overall repository context

pub mod blueprint;
mod component;
mod finding;
mod project;
mod spec;
mod workflow;

pub use blueprint::{
    component_module_name, derive_component_id, find_project_root, AdapterRole, Blueprint,
    Capability, OpenQuestion,
};
pub use component::{
    type_name_matches, BaseTypeRegistry, ComponentKind, DiscoveredComponent, SourceLocation,
};
pub use finding::{Category, ConformanceFinding, ConformanceReport, Severity};
pub use project::{
    catalog_not_found, resolve_blueprint_arg, CatalogEntry, Project, SystemCatalog,
};
pub use spec::{spec_file_name, CapabilitySpecState, SpecStatus, SPEC_FILE_SUFFIX};
pub use workflow::{ComponentWorkflowState, SuggestionAction, WorkflowSuggestion};
