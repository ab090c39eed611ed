//! Unified error types for rampart.

use crate::domain::ConformanceReport;
use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Blueprint error: {0}")]
    Blueprint(#[from] BlueprintError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Conformance(#[from] ConformanceError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Blueprint loading and validation errors
#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("Blueprint file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid JSON in blueprint {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("Blueprint {path} is missing required field '{field}'")]
    SchemaViolation { path: PathBuf, field: &'static str },

    #[error("Cannot derive a component id from {0}")]
    UnnamedComponent(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors locating a component on disk
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Could not find {file} in {start} or any parent directory")]
    SystemCatalogNotFound { start: PathBuf, file: String },

    #[error("Component '{0}' not found in the system catalog")]
    ComponentNotFound(String),

    #[error("Component '{0}' in the system catalog is missing 'architecture_file'")]
    MissingArchitectureFile(String),

    #[error("Invalid system catalog {path}: {message}")]
    InvalidCatalog { path: PathBuf, message: String },

    #[error("Implementation root not found: {0}")]
    ImplementationRootNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Static source scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to initialise Ruby parser: {0}")]
    ParserInit(String),

    #[error("Could not parse {0}")]
    ParseDegradation(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised by the assertion API when a report holds `fail` findings
#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("{count} conformance failure(s):\n{report}")]
    Failed {
        count: usize,
        report: ConformanceReport,
    },
}

/// External diagram renderer errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to spawn renderer '{program}': {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Renderer exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for blueprint operations
pub type BlueprintResult<T> = std::result::Result<T, BlueprintError>;

/// Result type alias for component resolution
pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

/// Result type alias for scanner operations
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Result type alias for renderer operations
pub type RenderResult<T> = std::result::Result<T, RenderError>;
