//! Configuration management for rampart.
//!
//! Supports layered configuration: defaults → project → user → env

use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project-level configuration file
pub const PROJECT_CONFIG_FILE: &str = ".rampart.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub conformance: ConformanceConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub diagram: DiagramConfig,
}

impl ProjectConfig {
    /// Load configuration with hierarchy: defaults → project → user → env
    pub fn load(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Environment, File};

        let mut builder = Self::project_sources(project_root);

        // 3. User config (~/.config/rampart/config.toml)
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "rampart", "rampart") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (RAMPART__*)
        builder = builder.add_source(
            Environment::with_prefix("RAMPART")
                .separator("__")
                .try_parsing(true),
        );

        Self::from_sources(builder)
    }

    /// Embedded defaults overlaid with the project's `.rampart.toml`
    pub(crate) fn project_sources(project_root: Option<&Path>) -> ConfigBuilder<DefaultState> {
        use config::{Config, File, FileFormat};

        // 1. Start with defaults
        let mut builder = Config::builder().add_source(
            File::from_str(include_str!("../default_config.toml"), FileFormat::Toml)
                .required(false),
        );

        // 2. Project-specific config (.rampart.toml in project root)
        if let Some(root) = project_root {
            let project_config = root.join(PROJECT_CONFIG_FILE);
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }
        builder
    }

    pub(crate) fn from_sources(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings that would make every command meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conformance.lookup_call.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "conformance.lookup_call must not be empty".to_string(),
            ));
        }
        if self.diagram.wrap_width == 0 || self.diagram.actor_wrap_width == 0 {
            return Err(ConfigError::Invalid(
                "diagram wrap widths must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where things live relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Directory holding blueprints and the system catalog
    #[serde(default = "default_architecture_dir")]
    pub architecture_dir: PathBuf,
    /// System catalog file name inside `architecture_dir`
    #[serde(default = "default_system_file")]
    pub system_file: String,
    /// Directory holding one implementation root per component
    #[serde(default = "default_engines_dir")]
    pub engines_dir: PathBuf,
    /// Directory holding generated spec documents, one subdirectory per component
    #[serde(default = "default_specs_dir")]
    pub specs_dir: PathBuf,
    /// Directory holding generated diagram documents
    #[serde(default = "default_diagrams_dir")]
    pub diagrams_dir: PathBuf,
    /// File whose presence marks an implementation root as created. `{id}` is substituted.
    #[serde(default = "default_implementation_marker")]
    pub implementation_marker: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            architecture_dir: default_architecture_dir(),
            system_file: default_system_file(),
            engines_dir: default_engines_dir(),
            specs_dir: default_specs_dir(),
            diagrams_dir: default_diagrams_dir(),
            implementation_marker: default_implementation_marker(),
        }
    }
}

fn default_architecture_dir() -> PathBuf {
    PathBuf::from("architecture")
}

fn default_system_file() -> String {
    "system.json".to_string()
}

fn default_engines_dir() -> PathBuf {
    PathBuf::from("engines")
}

fn default_specs_dir() -> PathBuf {
    PathBuf::from("docs/specs")
}

fn default_diagrams_dir() -> PathBuf {
    PathBuf::from("docs/diagrams")
}

fn default_implementation_marker() -> String {
    "{id}.gemspec".to_string()
}

/// Conformance checker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceConfig {
    /// Downgrade blueprint-only names to warnings
    #[serde(default)]
    pub permit_unimplemented: bool,
    /// Name of the dependency-lookup call scanned in entrypoints
    #[serde(default = "default_lookup_call")]
    pub lookup_call: String,
    /// Name of the container registration call
    #[serde(default = "default_register_call")]
    pub register_call: String,
    /// Registered keys an entrypoint may look up, by suffix
    #[serde(default = "default_allowed_key_suffixes")]
    pub allowed_key_suffixes: Vec<String>,
    /// Suffix identifying application service registrations
    #[serde(default = "default_service_key_suffix")]
    pub service_key_suffix: String,
    /// Persistence-engine base types services must never hold directly
    #[serde(default = "default_persistence_bases")]
    pub persistence_bases: Vec<String>,
    /// Name of the designated constructor
    #[serde(default = "default_constructor")]
    pub constructor: String,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            permit_unimplemented: false,
            lookup_call: default_lookup_call(),
            register_call: default_register_call(),
            allowed_key_suffixes: default_allowed_key_suffixes(),
            service_key_suffix: default_service_key_suffix(),
            persistence_bases: default_persistence_bases(),
            constructor: default_constructor(),
        }
    }
}

fn default_lookup_call() -> String {
    "resolve".to_string()
}

fn default_register_call() -> String {
    "register".to_string()
}

fn default_allowed_key_suffixes() -> Vec<String> {
    vec!["_service".to_string(), "_query".to_string()]
}

fn default_service_key_suffix() -> String {
    "_service".to_string()
}

fn default_persistence_bases() -> Vec<String> {
    vec![
        "ActiveRecord::Base".to_string(),
        "ApplicationRecord".to_string(),
    ]
}

fn default_constructor() -> String {
    "initialize".to_string()
}

/// One base contract: the framework types a kind must descend from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Fully qualified base type names
    #[serde(default)]
    pub bases: Vec<String>,
    /// Conventional directory name for this kind, if any
    #[serde(default)]
    pub directory: Option<String>,
}

impl ContractConfig {
    fn new(bases: &[&str], directory: Option<&str>) -> Self {
        Self {
            bases: bases.iter().map(|b| b.to_string()).collect(),
            directory: directory.map(str::to_string),
        }
    }
}

/// Base contracts per component kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub aggregate: ContractConfig,
    pub entity: ContractConfig,
    pub value_object: ContractConfig,
    pub event: ContractConfig,
    pub service: ContractConfig,
    pub query: ContractConfig,
    pub command: ContractConfig,
    pub port: ContractConfig,
    pub controller: ContractConfig,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            aggregate: ContractConfig::new(
                &["Rampart::Domain::AggregateRoot", "HexDDD::Domain::AggregateRoot"],
                Some("aggregates"),
            ),
            entity: ContractConfig::new(
                &["Rampart::Domain::Entity", "HexDDD::Domain::Entity"],
                Some("entities"),
            ),
            value_object: ContractConfig::new(
                &["Rampart::Domain::ValueObject", "HexDDD::Domain::ValueObject"],
                Some("value_objects"),
            ),
            event: ContractConfig::new(
                &["Rampart::Domain::DomainEvent", "HexDDD::Domain::DomainEvent"],
                Some("events"),
            ),
            service: ContractConfig::new(
                &["Rampart::Application::Service", "HexDDD::Application::Service"],
                Some("services"),
            ),
            query: ContractConfig::new(
                &["Rampart::Application::Query", "HexDDD::Application::Query"],
                Some("queries"),
            ),
            command: ContractConfig::new(
                &["Rampart::Application::Command", "HexDDD::Application::Command"],
                Some("commands"),
            ),
            port: ContractConfig::new(
                &["Rampart::Ports::SecondaryPort", "HexDDD::Ports::SecondaryPort"],
                Some("ports"),
            ),
            controller: ContractConfig::new(
                &["ActionController::API", "ActionController::Base"],
                None,
            ),
        }
    }
}

/// Workflow suggestion commands. `{id}` and `{spec}` are substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_create_root_command")]
    pub create_root_command: String,
    #[serde(default = "default_generate_specs_command")]
    pub generate_specs_command: String,
    #[serde(default = "default_plan_command")]
    pub plan_command: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            create_root_command: default_create_root_command(),
            generate_specs_command: default_generate_specs_command(),
            plan_command: default_plan_command(),
        }
    }
}

fn default_create_root_command() -> String {
    "rails plugin new engines/{id} --mountable && rampart init {id}".to_string()
}

fn default_generate_specs_command() -> String {
    "rampart spec {id}".to_string()
}

fn default_plan_command() -> String {
    "/rampart.plan with {spec}".to_string()
}

/// Diagram synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Column budget for the component description
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    /// Column budget for actor edge labels
    #[serde(default = "default_actor_wrap_width")]
    pub actor_wrap_width: usize,
    /// Image format produced by the external renderer
    #[serde(default)]
    pub format: ImageFormat,
    /// External renderer executable
    #[serde(default = "default_renderer")]
    pub renderer: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            actor_wrap_width: default_actor_wrap_width(),
            format: ImageFormat::default(),
            renderer: default_renderer(),
        }
    }
}

fn default_wrap_width() -> usize {
    40
}

fn default_actor_wrap_width() -> usize {
    20
}

fn default_renderer() -> String {
    "mmdc".to_string()
}

/// Rendered image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.layout.architecture_dir, PathBuf::from("architecture"));
        assert_eq!(config.layout.system_file, "system.json");
        assert_eq!(config.layout.specs_dir, PathBuf::from("docs/specs"));
        assert_eq!(config.conformance.lookup_call, "resolve");
        assert!(!config.conformance.permit_unimplemented);
        assert_eq!(config.diagram.wrap_width, 40);
        assert_eq!(config.diagram.format, ImageFormat::Svg);
        assert!(config
            .contracts
            .aggregate
            .bases
            .contains(&"HexDDD::Domain::AggregateRoot".to_string()));
    }

    #[test]
    fn test_embedded_defaults_match_code_defaults() {
        let config = ProjectConfig::from_sources(ProjectConfig::project_sources(None)).unwrap();
        let defaults = ProjectConfig::default();
        assert_eq!(config.layout.engines_dir, defaults.layout.engines_dir);
        assert_eq!(
            config.conformance.allowed_key_suffixes,
            defaults.conformance.allowed_key_suffixes
        );
        assert_eq!(
            config.contracts.port.bases,
            defaults.contracts.port.bases
        );
        assert_eq!(
            config.workflow.create_root_command,
            defaults.workflow.create_root_command
        );
    }

    #[test]
    fn test_project_file_overrides_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[conformance]\npermit_unimplemented = true\n\n[layout]\nengines_dir = \"components\"\n",
        )
        .unwrap();

        let sources = ProjectConfig::project_sources(Some(temp.path()));
        let config = ProjectConfig::from_sources(sources).unwrap();
        assert!(config.conformance.permit_unimplemented);
        assert_eq!(config.layout.engines_dir, PathBuf::from("components"));
        assert_eq!(config.layout.specs_dir, PathBuf::from("docs/specs"));
    }

    #[test]
    fn test_invalid_project_file_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[diagram]\nwrap_width = 0\n",
        )
        .unwrap();

        let err = ProjectConfig::from_sources(ProjectConfig::project_sources(Some(temp.path())))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_zero_wrap() {
        let mut config = ProjectConfig::default();
        config.diagram.wrap_width = 0;
        assert!(config.validate().is_err());
    }
}
