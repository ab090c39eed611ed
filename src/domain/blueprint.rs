//! Blueprint: the declared architecture of one bounded component.

use super::ComponentKind;
use crate::error::{BlueprintError, BlueprintResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Fields every blueprint must carry, in validation order
const REQUIRED_FIELDS: [&str; 3] = ["name", "profile", "layers"];

/// Authoritative declaration for one bounded component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    pub profile: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub relationships: Relationships,
    pub layers: Layers,
    #[serde(default, alias = "externalSystems")]
    pub external_systems: Vec<ExternalSystem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, rename = "in")]
    pub included: Vec<String>,
    #[serde(default, rename = "out")]
    pub excluded: Vec<String>,
}

/// External role interacting with the component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default, alias = "publishesTo")]
    pub publishes_to: Vec<PublishesTo>,
    #[serde(default, alias = "consumedBy")]
    pub consumed_by: Vec<ConsumedBy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishesTo {
    #[serde(rename = "bc", alias = "targetComponent")]
    pub target_component: String,
    #[serde(default, rename = "via", alias = "transport")]
    pub transport: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumedBy {
    #[serde(rename = "bc", alias = "targetComponent")]
    pub target_component: String,
    #[serde(default)]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layers {
    #[serde(default)]
    pub domain: DomainLayer,
    #[serde(default)]
    pub application: ApplicationLayer,
    #[serde(default)]
    pub infrastructure: InfrastructureLayer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainLayer {
    #[serde(default)]
    pub aggregates: Vec<Aggregate>,
    #[serde(default)]
    pub events: Vec<DomainEvent>,
    #[serde(default)]
    pub ports: Ports,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Root entity backing the aggregate, when named separately
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default, alias = "keyAttributes")]
    pub key_attributes: Vec<String>,
    #[serde(default)]
    pub invariants: Vec<String>,
    #[serde(default)]
    pub lifecycle: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "payloadIntent")]
    pub payload_intent: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ports {
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub external: Vec<ExternalPort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalPort {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationLayer {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Only drift-checked when declared
    #[serde(default)]
    pub queries: Option<Vec<NamedEntry>>,
    /// Only drift-checked when declared
    #[serde(default)]
    pub commands: Option<Vec<NamedEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Aggregate this service operates on
    #[serde(default)]
    pub orchestrates: Option<String>,
    #[serde(default, alias = "usesPorts")]
    pub uses_ports: Vec<String>,
    #[serde(default)]
    pub publishes: Vec<String>,
    #[serde(default)]
    pub operations: Option<ServiceOperations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOperations {
    #[serde(default)]
    pub consumer: Vec<String>,
    #[serde(default)]
    pub admin: Vec<String>,
}

/// One end-to-end use case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub entrypoints: Vec<String>,
    #[serde(default)]
    pub orchestrates: Vec<String>,
    #[serde(default, alias = "usesPorts")]
    pub uses_ports: Vec<String>,
    #[serde(default)]
    pub emits: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Query or command entry, written either as a bare name or as `{ "name": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedEntry {
    Name(String),
    Object { name: String },
}

impl NamedEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfrastructureLayer {
    #[serde(default)]
    pub constraint: Option<String>,
    #[serde(default)]
    pub adapters: Adapters,
    #[serde(default)]
    pub entrypoints: Entrypoints,
    #[serde(default)]
    pub wiring: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adapters {
    #[serde(default)]
    pub persistence: Vec<Adapter>,
    #[serde(default)]
    pub external: Vec<Adapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adapter {
    pub name: String,
    /// Port this adapter implements
    #[serde(default)]
    pub implements: String,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entrypoints {
    #[serde(default)]
    pub http: Vec<HttpEntrypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpEntrypoint {
    pub name: String,
    #[serde(default)]
    pub routes: Option<String>,
    #[serde(default)]
    pub invokes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSystem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub providers: Vec<String>,
}

impl ExternalSystem {
    pub fn is_database(&self) -> bool {
        self.kind.as_deref() == Some("database")
    }
}

/// Which adapter collection an adapter was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterRole {
    Persistence,
    External,
}

/// A capability reference that names nothing in the blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenQuestion {
    pub capability: String,
    /// Capability field holding the reference
    pub field: &'static str,
    pub reference: String,
}

impl std::fmt::Display for OpenQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Capability '{}' {} '{}', which is not declared",
            self.capability, self.field, self.reference
        )
    }
}

impl Blueprint {
    /// Load and validate a blueprint document
    pub fn parse(path: &Path) -> BlueprintResult<Self> {
        if !path.is_file() {
            return Err(BlueprintError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content, path)
    }

    /// Validate and decode blueprint text. `path` is only used for error messages.
    pub fn from_json(content: &str, path: &Path) -> BlueprintResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| BlueprintError::InvalidJson {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        for field in REQUIRED_FIELDS {
            let present = match value.get(field) {
                Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
                Some(serde_json::Value::Object(_)) => field == "layers",
                _ => false,
            };
            if !present {
                return Err(BlueprintError::SchemaViolation {
                    path: path.to_path_buf(),
                    field,
                });
            }
        }

        serde_json::from_value(value).map_err(|e| BlueprintError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.layers.application.capabilities
    }

    pub fn aggregate(&self, name: &str) -> Option<&Aggregate> {
        self.layers.domain.aggregates.iter().find(|a| a.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&DomainEvent> {
        self.layers.domain.events.iter().find(|e| e.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.layers.application.services.iter().find(|s| s.name == name)
    }

    pub fn http_entrypoint(&self, name: &str) -> Option<&HttpEntrypoint> {
        self.layers
            .infrastructure
            .entrypoints
            .http
            .iter()
            .find(|e| e.name == name)
    }

    /// Repository ports followed by external ports
    pub fn port_names(&self) -> Vec<String> {
        let ports = &self.layers.domain.ports;
        ports
            .repositories
            .iter()
            .cloned()
            .chain(ports.external.iter().map(|p| p.name.clone()))
            .collect()
    }

    /// Every declared adapter, persistence adapters first
    pub fn adapters(&self) -> impl Iterator<Item = (AdapterRole, &Adapter)> {
        let adapters = &self.layers.infrastructure.adapters;
        adapters
            .persistence
            .iter()
            .map(|a| (AdapterRole::Persistence, a))
            .chain(adapters.external.iter().map(|a| (AdapterRole::External, a)))
    }

    /// The adapter implementing `port`, preferring persistence adapters
    pub fn adapter_for_port(&self, port: &str) -> Option<(AdapterRole, &Adapter)> {
        self.adapters().find(|(_, a)| a.implements == port)
    }

    /// Names the blueprint declares for a component kind.
    ///
    /// `None` means the blueprint says nothing about that kind, so it is not
    /// drift-checked.
    pub fn declared_names(&self, kind: ComponentKind) -> Option<BTreeSet<String>> {
        let app = &self.layers.application;
        let names: BTreeSet<String> = match kind {
            ComponentKind::Aggregate => self
                .layers
                .domain
                .aggregates
                .iter()
                .map(|a| a.name.clone())
                .collect(),
            ComponentKind::Event => self
                .layers
                .domain
                .events
                .iter()
                .map(|e| e.name.clone())
                .collect(),
            ComponentKind::Port => self.port_names().into_iter().collect(),
            ComponentKind::Service => app.services.iter().map(|s| s.name.clone()).collect(),
            ComponentKind::Adapter => self.adapters().map(|(_, a)| a.name.clone()).collect(),
            ComponentKind::Controller => self
                .layers
                .infrastructure
                .entrypoints
                .http
                .iter()
                .map(|e| e.name.clone())
                .collect(),
            ComponentKind::Query => app
                .queries
                .as_ref()?
                .iter()
                .map(|q| q.name().to_string())
                .collect(),
            ComponentKind::Command => app
                .commands
                .as_ref()?
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            ComponentKind::Entity | ComponentKind::ValueObject => return None,
        };
        Some(names)
    }

    /// Aggregates a capability touches, directly or through an orchestrated service
    pub fn aggregates_for_capability(&self, capability: &Capability) -> Vec<&Aggregate> {
        let mut found: Vec<&Aggregate> = Vec::new();
        for name in &capability.orchestrates {
            let aggregate = self.aggregate(name).or_else(|| {
                self.service(name)
                    .and_then(|s| s.orchestrates.as_deref())
                    .and_then(|agg| self.aggregate(agg))
            });
            if let Some(aggregate) = aggregate {
                if !found.iter().any(|a| a.name == aggregate.name) {
                    found.push(aggregate);
                }
            }
        }
        found
    }

    /// Capability references that resolve to nothing in their layer
    pub fn open_questions(&self) -> Vec<OpenQuestion> {
        let ports: BTreeSet<String> = self.port_names().into_iter().collect();
        let mut questions = Vec::new();

        for capability in self.capabilities() {
            let mut unresolved = |field: &'static str, reference: &String| {
                questions.push(OpenQuestion {
                    capability: capability.name.clone(),
                    field,
                    reference: reference.clone(),
                });
            };

            for name in &capability.orchestrates {
                if self.service(name).is_none() && self.aggregate(name).is_none() {
                    unresolved("orchestrates", name);
                }
            }
            for name in &capability.uses_ports {
                if !ports.contains(name) {
                    unresolved("uses port", name);
                }
            }
            for name in &capability.emits {
                if self.event(name).is_none() {
                    unresolved("emits", name);
                }
            }
            if !self.actors.is_empty() {
                for name in &capability.actors {
                    if !self.actors.iter().any(|a| &a.name == name) {
                        unresolved("names actor", name);
                    }
                }
            }
        }

        questions
    }
}

/// Stable component id from a blueprint location.
///
/// `architecture/<id>/architecture.json` yields `<id>`; any other file yields its stem.
pub fn derive_component_id(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem == "architecture" {
        let parent = path.parent()?.file_name()?.to_str()?;
        return Some(parent.to_string());
    }
    Some(stem.to_string())
}

/// `cat_content` -> `CatContent`
pub fn component_module_name(id: &str) -> String {
    id.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Project root for a blueprint: above the `architecture` directory if the
/// blueprint lives in one, otherwise the blueprint's own directory.
pub fn find_project_root(blueprint_path: &Path, architecture_dir: &Path) -> PathBuf {
    let dir_name = architecture_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("architecture");
    let parent = blueprint_path.parent().unwrap_or_else(|| Path::new("."));

    for candidate in parent.ancestors().take(2) {
        if candidate.file_name().and_then(|n| n.to_str()) == Some(dir_name) {
            if let Some(root) = candidate.parent() {
                return root.to_path_buf();
            }
        }
    }
    parent.to_path_buf()
}
