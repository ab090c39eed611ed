//! rampart: architecture conformance and workflow engine
//!
//! This crate compares a component's declared architecture (a JSON blueprint)
//! with its Ruby implementation, synthesizes Mermaid diagrams and capability
//! spec documents from the blueprint, and tracks per-component workflow state.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod scanner;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::App;
pub use config::ProjectConfig;
pub use error::{AppError, Result};
