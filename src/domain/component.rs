//! Discovered implementation artifacts and the base contracts that classify them.

use crate::config::{ContractConfig, ContractsConfig};
use serde::Serialize;
use std::path::PathBuf;

/// Kind of architectural artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Aggregate,
    Entity,
    ValueObject,
    Event,
    Service,
    Query,
    Command,
    Port,
    Adapter,
    Controller,
}

impl ComponentKind {
    /// Every kind, in report order
    pub const ALL: [ComponentKind; 10] = [
        Self::Aggregate,
        Self::Entity,
        Self::ValueObject,
        Self::Event,
        Self::Service,
        Self::Query,
        Self::Command,
        Self::Port,
        Self::Adapter,
        Self::Controller,
    ];

    /// Kinds compared against the blueprint by name
    pub const DRIFT_CHECKED: [ComponentKind; 8] = [
        Self::Aggregate,
        Self::Event,
        Self::Port,
        Self::Service,
        Self::Adapter,
        Self::Controller,
        Self::Query,
        Self::Command,
    ];

    /// Kinds whose instances must never change after construction
    pub const IMMUTABLE: [ComponentKind; 2] = [Self::Aggregate, Self::ValueObject];

    /// Kinds living in the domain layer
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::Aggregate | Self::Entity | Self::ValueObject | Self::Event | Self::Port
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Entity => "entity",
            Self::ValueObject => "value_object",
            Self::Event => "event",
            Self::Service => "service",
            Self::Query => "query",
            Self::Command => "command",
            Self::Port => "port",
            Self::Adapter => "adapter",
            Self::Controller => "controller",
        }
    }

    /// Plural, human-readable name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aggregate => "Aggregates",
            Self::Entity => "Entities",
            Self::ValueObject => "Value objects",
            Self::Event => "Domain events",
            Self::Service => "Services",
            Self::Query => "Queries",
            Self::Command => "Commands",
            Self::Port => "Ports",
            Self::Adapter => "Adapters",
            Self::Controller => "Controllers",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a type is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// One concrete implementation artifact found in source
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredComponent {
    /// Unqualified type name, the join key against blueprint names
    pub name: String,
    pub qualified_name: String,
    pub kind: ComponentKind,
    pub location: SourceLocation,
    /// Ancestors from the direct superclass upwards
    pub base_type_chain: Vec<String>,
}

impl DiscoveredComponent {
    pub fn inherits_from(&self, base: &str) -> bool {
        self.base_type_chain.iter().any(|b| type_name_matches(b, base))
    }
}

/// Whether a written type name refers to `qualified`.
///
/// Accepts a leading `::` and unresolved relative spellings of two or more
/// segments that end with the qualified name's trailing segments. A bare
/// single segment only matches a single-segment name.
pub fn type_name_matches(written: &str, qualified: &str) -> bool {
    let written = written.trim_start_matches("::");
    let qualified = qualified.trim_start_matches("::");
    written == qualified
        || (written.contains("::") && qualified.ends_with(&format!("::{written}")))
}

/// Known base contracts, one per kind.
///
/// Built from configuration once per command invocation.
#[derive(Debug, Clone)]
pub struct BaseTypeRegistry {
    contracts: Vec<(ComponentKind, ContractConfig)>,
}

impl BaseTypeRegistry {
    pub fn new(config: &ContractsConfig) -> Self {
        let contracts = vec![
            (ComponentKind::Aggregate, config.aggregate.clone()),
            (ComponentKind::Entity, config.entity.clone()),
            (ComponentKind::ValueObject, config.value_object.clone()),
            (ComponentKind::Event, config.event.clone()),
            (ComponentKind::Service, config.service.clone()),
            (ComponentKind::Query, config.query.clone()),
            (ComponentKind::Command, config.command.clone()),
            (ComponentKind::Port, config.port.clone()),
            (ComponentKind::Controller, config.controller.clone()),
        ];
        Self { contracts }
    }

    /// Base names required for `kind`. Adapters share the port contract.
    pub fn bases_for(&self, kind: ComponentKind) -> &[String] {
        let lookup = if kind == ComponentKind::Adapter {
            ComponentKind::Port
        } else {
            kind
        };
        self.contracts
            .iter()
            .find(|(k, _)| *k == lookup)
            .map(|(_, c)| c.bases.as_slice())
            .unwrap_or(&[])
    }

    /// Kind whose contract includes `type_name`, if any
    pub fn kind_of_base(&self, type_name: &str) -> Option<ComponentKind> {
        self.contracts
            .iter()
            .find(|(_, c)| c.bases.iter().any(|b| type_name_matches(type_name, b)))
            .map(|(k, _)| *k)
    }

    /// Kind decided by the nearest contract in an ancestry chain
    pub fn classify(&self, chain: &[String]) -> Option<ComponentKind> {
        chain.iter().find_map(|ancestor| self.kind_of_base(ancestor))
    }

    /// Kind whose conventional directory appears in `path`
    pub fn kind_for_directory(&self, path: &std::path::Path) -> Option<ComponentKind> {
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        self.contracts.iter().find_map(|(kind, contract)| {
            let dir = contract.directory.as_deref()?;
            components.contains(&dir).then_some(*kind)
        })
    }

    /// Whether `type_name` is one of the registry's own bases
    pub fn is_contract(&self, type_name: &str) -> bool {
        self.kind_of_base(type_name).is_some()
    }
}
