//! Conformance checks between a blueprint and a discovered implementation.
//!
//! Each check is independent and returns findings; `ConformanceChecker::run`
//! collects all of them into one report.

use super::discovery::{chain_includes, Inventory};
use super::text::slugify;
use crate::config::ConformanceConfig;
use crate::domain::{
    type_name_matches, BaseTypeRegistry, Blueprint, Category, ComponentKind, ConformanceFinding,
    ConformanceReport, DiscoveredComponent,
};
use crate::scanner::{lookup_calls, mutations_outside_constructor, DependencyKey};
use std::collections::BTreeSet;
use std::path::Path;

/// How blueprint-only names are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftMode {
    /// Declared but unimplemented names fail
    Strict,
    /// Declared but unimplemented names only warn
    PermitUnimplemented,
}

impl DriftMode {
    pub fn from_permit(permit_unimplemented: bool) -> Self {
        if permit_unimplemented {
            Self::PermitUnimplemented
        } else {
            Self::Strict
        }
    }
}

fn join_names<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = names.into_iter().map(String::as_str).collect();
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined.join(", ")
    }
}

fn located(component: &DiscoveredComponent) -> String {
    format!("{} ({})", component.qualified_name, component.location)
}

/// Compare declared and discovered names for one kind.
///
/// Code-only names always fail. Blueprint-only names fail in strict mode and
/// warn when unimplemented names are permitted.
pub fn compare_names(
    kind: ComponentKind,
    declared: &BTreeSet<String>,
    discovered: &BTreeSet<String>,
    mode: DriftMode,
) -> Vec<ConformanceFinding> {
    let code_only: Vec<String> = discovered.difference(declared).cloned().collect();
    let blueprint_only: Vec<String> = declared.difference(discovered).cloned().collect();
    let sets = format!(
        "blueprint: [{}]; code: [{}]",
        join_names(declared),
        join_names(discovered)
    );
    let mut findings = Vec::new();

    if !code_only.is_empty() {
        findings.push(
            ConformanceFinding::fail(
                Category::Drift,
                kind.display_name(),
                format!(
                    "found in code but not declared in blueprint: {} ({sets})",
                    join_names(&code_only)
                ),
            )
            .with_names(code_only),
        );
    }

    if !blueprint_only.is_empty() {
        let message = format!(
            "declared in blueprint but not implemented: {} ({sets})",
            join_names(&blueprint_only)
        );
        let finding = match mode {
            DriftMode::Strict => ConformanceFinding::fail(Category::Missing, kind.display_name(), message),
            DriftMode::PermitUnimplemented => {
                tracing::warn!("{}: {}", kind.display_name(), message);
                ConformanceFinding::warn(Category::Missing, kind.display_name(), message)
            }
        };
        findings.push(finding.with_names(blueprint_only));
    }

    findings
}

/// Bidirectional name drift for every kind the blueprint declares
pub fn check_drift(
    blueprint: &Blueprint,
    inventory: &Inventory,
    mode: DriftMode,
) -> Vec<ConformanceFinding> {
    let pending: BTreeSet<String> = blueprint
        .adapters()
        .filter(|(_, a)| a.pending)
        .map(|(_, a)| a.name.clone())
        .collect();
    let mut findings = Vec::new();

    for kind in ComponentKind::DRIFT_CHECKED {
        let Some(mut declared) = blueprint.declared_names(kind) else {
            continue;
        };
        let discovered = inventory.names(kind);

        if kind == ComponentKind::Adapter {
            // Pending adapters are expected to be missing
            let waiting: Vec<String> = pending
                .iter()
                .filter(|name| !discovered.contains(*name))
                .cloned()
                .collect();
            for name in &waiting {
                declared.remove(name);
            }
            if !waiting.is_empty() {
                findings.push(
                    ConformanceFinding::warn(
                        Category::Missing,
                        kind.display_name(),
                        format!("pending adapters not yet implemented: {}", join_names(&waiting)),
                    )
                    .with_names(waiting),
                );
            }
        }

        findings.extend(compare_names(kind, &declared, &discovered, mode));
    }
    findings
}

/// Every component must carry its kind's base contract
pub fn check_base_classes(
    inventory: &Inventory,
    registry: &BaseTypeRegistry,
) -> Vec<ConformanceFinding> {
    inventory
        .components
        .iter()
        .filter_map(|component| {
            let bases = registry.bases_for(component.kind);
            if bases.is_empty() || chain_includes(component, bases) {
                return None;
            }
            Some(ConformanceFinding::fail(
                Category::BaseClass,
                component.name.clone(),
                format!(
                    "{} is a {} but does not inherit from {}; ancestry: [{}]",
                    located(component),
                    component.kind,
                    bases.join(" or "),
                    join_names(&component.base_type_chain)
                ),
            ))
        })
        .collect()
}

/// Domain types must not inherit from persistence or web framework types
pub fn check_framework_independence(
    inventory: &Inventory,
    framework_bases: &[String],
) -> Vec<ConformanceFinding> {
    inventory
        .components
        .iter()
        .filter(|c| c.kind.is_domain())
        .filter_map(|component| {
            let framework = component
                .base_type_chain
                .iter()
                .find(|a| framework_bases.iter().any(|b| type_name_matches(a, b)))?;
            Some(ConformanceFinding::fail(
                Category::BaseClass,
                component.name.clone(),
                format!(
                    "{} is a domain {} but depends on framework type {}",
                    located(component),
                    component.kind,
                    framework
                ),
            ))
        })
        .collect()
}

/// Operations a port declares: `abstract_method` names plus methods in its body
fn port_operations(inventory: &Inventory, port: &DiscoveredComponent) -> BTreeSet<String> {
    inventory
        .graph
        .get(&port.qualified_name)
        .map(|entry| {
            entry
                .decl
                .abstract_operations
                .iter()
                .cloned()
                .chain(entry.decl.instance_methods().map(|m| m.name.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `adapter`, or an ancestor strictly below `port`, defines `operation`
fn implements(
    inventory: &Inventory,
    adapter: &DiscoveredComponent,
    port: &DiscoveredComponent,
    operation: &str,
) -> bool {
    let Some(definer) = inventory.graph.definer_of(&adapter.qualified_name, operation) else {
        return false;
    };
    definer == adapter.qualified_name
        || adapter
            .base_type_chain
            .iter()
            .take_while(|a| **a != port.qualified_name)
            .any(|a| *a == definer)
}

/// Every port needs an adapter, and every adapter must implement all of its
/// port's operations itself
pub fn check_port_implementations(inventory: &Inventory) -> Vec<ConformanceFinding> {
    let mut findings = Vec::new();

    for port in inventory.of_kind(ComponentKind::Port) {
        let adapters = inventory.adapters_of(port);
        if adapters.is_empty() {
            findings.push(ConformanceFinding::fail(
                Category::BaseClass,
                port.name.clone(),
                format!("{} has no adapter implementing it", located(port)),
            ));
            continue;
        }

        let operations = port_operations(inventory, port);
        for adapter in adapters {
            let missing: Vec<String> = operations
                .iter()
                .filter(|op| !implements(inventory, adapter, port, op))
                .cloned()
                .collect();
            if !missing.is_empty() {
                findings.push(
                    ConformanceFinding::fail(
                        Category::BaseClass,
                        adapter.name.clone(),
                        format!(
                            "{} does not implement {} operations: {}",
                            located(adapter),
                            port.name,
                            join_names(&missing)
                        ),
                    )
                    .with_names(missing),
                );
            }
        }
    }
    findings
}

/// Aggregates and value objects never assign fields after construction and
/// expose no public mutators
pub fn check_immutability(inventory: &Inventory, constructor: &str) -> Vec<ConformanceFinding> {
    let mut findings = Vec::new();

    for kind in ComponentKind::IMMUTABLE {
        for component in inventory.of_kind(kind) {
            let writes: Vec<String> = inventory
                .units
                .iter()
                .flat_map(|unit| mutations_outside_constructor(unit, constructor))
                .filter(|w| w.owner.as_deref() == Some(component.qualified_name.as_str()))
                .map(|w| {
                    let place = w.method.as_deref().unwrap_or("class body");
                    format!("{} in {} (line {})", w.variable, place, w.line)
                })
                .collect();
            if !writes.is_empty() {
                findings.push(ConformanceFinding::fail(
                    Category::Immutability,
                    component.name.clone(),
                    format!(
                        "{} assigns fields outside {}: {}",
                        located(component),
                        constructor,
                        writes.join(", ")
                    ),
                ));
            }

            let mutators = inventory
                .graph
                .get(&component.qualified_name)
                .map(|entry| entry.decl.public_mutators())
                .unwrap_or_default();
            if !mutators.is_empty() {
                findings.push(
                    ConformanceFinding::fail(
                        Category::Immutability,
                        component.name.clone(),
                        format!(
                            "{} exposes public mutators: {}",
                            located(component),
                            mutators.join(", ")
                        ),
                    )
                    .with_names(mutators),
                );
            }
        }
    }
    findings
}

/// Services registered in the container, or every service when nothing is registered
fn registered_services<'a>(
    inventory: &'a Inventory,
    config: &ConformanceConfig,
) -> Vec<&'a DiscoveredComponent> {
    let keys: BTreeSet<String> = inventory
        .registered_keys(&config.register_call)
        .into_iter()
        .map(|k| k.as_str().to_string())
        .filter(|k| k.ends_with(&config.service_key_suffix))
        .collect();

    if keys.is_empty() {
        return inventory.of_kind(ComponentKind::Service).collect();
    }
    for key in &keys {
        if !inventory
            .of_kind(ComponentKind::Service)
            .any(|s| &slugify(&s.name) == key)
        {
            tracing::debug!("Registered service key :{} has no discovered service", key);
        }
    }
    inventory
        .of_kind(ComponentKind::Service)
        .filter(|s| keys.contains(&slugify(&s.name)))
        .collect()
}

/// Whether a constant, resolved from `scopes`, is or descends from a persistence base
fn persistence_type(
    inventory: &Inventory,
    written: &str,
    scopes: &[String],
    persistence_bases: &[String],
) -> Option<String> {
    let is_base = |name: &str| persistence_bases.iter().any(|b| type_name_matches(name, b));
    match inventory.graph.resolve(written, scopes) {
        Some(resolved) => {
            let chain = inventory.graph.ancestry(&resolved);
            (is_base(&resolved) || chain.iter().any(|a| is_base(a))).then_some(resolved)
        }
        None => is_base(written).then(|| written.to_string()),
    }
}

/// Registered services may hold primitives and ports, never persistence types
pub fn check_service_dependencies(
    inventory: &Inventory,
    config: &ConformanceConfig,
) -> Vec<ConformanceFinding> {
    let mut findings = Vec::new();

    for service in registered_services(inventory, config) {
        let Some(entry) = inventory.graph.get(&service.qualified_name) else {
            continue;
        };
        let mut scopes = entry.decl.lexical_scopes.clone();
        scopes.push(service.qualified_name.clone());

        let assigned = inventory
            .units
            .iter()
            .flat_map(|u| u.field_writes.iter())
            .filter(|w| {
                w.owner.as_deref() == Some(service.qualified_name.as_str())
                    && w.method.as_deref() == Some(config.constructor.as_str())
            })
            .filter_map(|w| Some((w.variable.clone(), w.value_constant.clone()?)));
        let defaults = entry
            .decl
            .method(&config.constructor)
            .map(|m| m.constant_defaults.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|(param, constant)| (format!("keyword default `{param}`"), constant));

        let mut held: Vec<(String, String)> = assigned.chain(defaults).collect();
        held.sort();
        held.dedup();

        for (holder, constant) in held {
            if let Some(persistence) =
                persistence_type(inventory, &constant, &scopes, &config.persistence_bases)
            {
                findings.push(ConformanceFinding::fail(
                    Category::Wiring,
                    service.name.clone(),
                    format!(
                        "{} holds persistence type {} directly via {}; depend on a port instead",
                        located(service),
                        persistence,
                        holder
                    ),
                ));
            }
        }
    }
    findings
}

fn is_entrypoint_file(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|c| c.as_os_str() == "controllers")
}

/// Entrypoints may only look up registered service and query keys
pub fn check_entrypoint_lookups(
    inventory: &Inventory,
    config: &ConformanceConfig,
) -> Vec<ConformanceFinding> {
    let has_allowed_suffix = |key: &DependencyKey| {
        config
            .allowed_key_suffixes
            .iter()
            .any(|s| key.as_str().ends_with(s.as_str()))
    };
    let registered = inventory.registered_keys(&config.register_call);
    let allowed: BTreeSet<&str> = registered
        .iter()
        .filter(|k| has_allowed_suffix(k))
        .map(DependencyKey::as_str)
        .collect();

    let mut findings = Vec::new();
    for unit in inventory
        .units
        .iter()
        .filter(|u| is_entrypoint_file(&inventory.root, &u.path))
    {
        let relative = unit.path.strip_prefix(&inventory.root).unwrap_or(&unit.path);
        for call in lookup_calls(unit, &config.lookup_call) {
            let permitted = if registered.is_empty() {
                has_allowed_suffix(&call.key)
            } else {
                allowed.contains(call.key.as_str())
            };
            if permitted {
                continue;
            }
            let subject = call
                .owner
                .clone()
                .unwrap_or_else(|| relative.display().to_string());
            let allow_list = if registered.is_empty() {
                format!("keys ending in {}", config.allowed_key_suffixes.join(" or "))
            } else {
                allowed.iter().copied().collect::<Vec<_>>().join(", ")
            };
            findings.push(ConformanceFinding::fail(
                Category::Wiring,
                subject,
                format!(
                    "{}:{} looks up {} via {}; allowed: {}",
                    relative.display(),
                    call.line,
                    call.key,
                    config.lookup_call,
                    allow_list
                ),
            ));
        }
    }
    findings
}

/// Unresolved capability references, reported as warnings
pub fn check_open_questions(blueprint: &Blueprint) -> Vec<ConformanceFinding> {
    blueprint
        .open_questions()
        .into_iter()
        .map(|q| {
            tracing::warn!("Open question: {}", q);
            ConformanceFinding::warn(Category::Missing, q.capability.clone(), q.to_string())
        })
        .collect()
}

/// Runs every check for one component
pub struct ConformanceChecker<'a> {
    blueprint: &'a Blueprint,
    inventory: &'a Inventory,
    registry: &'a BaseTypeRegistry,
    config: &'a ConformanceConfig,
    framework_bases: Vec<String>,
}

impl<'a> ConformanceChecker<'a> {
    pub fn new(
        blueprint: &'a Blueprint,
        inventory: &'a Inventory,
        registry: &'a BaseTypeRegistry,
        config: &'a ConformanceConfig,
    ) -> Self {
        let framework_bases = config
            .persistence_bases
            .iter()
            .chain(registry.bases_for(ComponentKind::Controller))
            .cloned()
            .collect();
        Self {
            blueprint,
            inventory,
            registry,
            config,
            framework_bases,
        }
    }

    pub fn mode(&self) -> DriftMode {
        DriftMode::from_permit(self.config.permit_unimplemented)
    }

    /// All findings, sorted by category then subject
    pub fn run(&self) -> ConformanceReport {
        let mut report = ConformanceReport::new();
        report.extend(check_base_classes(self.inventory, self.registry));
        report.extend(check_framework_independence(self.inventory, &self.framework_bases));
        report.extend(check_port_implementations(self.inventory));
        report.extend(check_immutability(self.inventory, &self.config.constructor));
        report.extend(check_service_dependencies(self.inventory, self.config));
        report.extend(check_entrypoint_lookups(self.inventory, self.config));
        report.extend(check_drift(self.blueprint, self.inventory, self.mode()));
        report.extend(check_open_questions(self.blueprint));
        report.sort();

        tracing::info!(
            "Conformance: {} failure(s), {} warning(s)",
            report.failures().count(),
            report.warnings().count()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractsConfig;
    use crate::domain::Severity;
    use crate::services::discovery::discover;
    use tempfile::TempDir;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn inventory(files: &[(&str, &str)]) -> (TempDir, Inventory) {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            write(temp.path(), path, content);
        }
        let registry = BaseTypeRegistry::new(&ContractsConfig::default());
        let inventory = discover(temp.path(), &registry).unwrap();
        (temp, inventory)
    }

    #[test]
    fn test_identical_sets_have_no_findings() {
        let set = names(&["Order", "Invoice"]);
        for mode in [DriftMode::Strict, DriftMode::PermitUnimplemented] {
            assert!(compare_names(ComponentKind::Aggregate, &set, &set, mode).is_empty());
        }
    }

    #[test]
    fn test_disjoint_sets_report_both_directions() {
        let declared = names(&["Order"]);
        let discovered = names(&["Invoice"]);
        let findings =
            compare_names(ComponentKind::Aggregate, &declared, &discovered, DriftMode::Strict);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].category, Category::Drift);
        assert_eq!(findings[0].names, vec!["Invoice"]);
        assert_eq!(findings[1].category, Category::Missing);
        assert_eq!(findings[1].names, vec!["Order"]);
        assert!(findings[0].message.contains("blueprint: [Order]; code: [Invoice]"));
    }

    #[test]
    fn test_permissive_mode_only_softens_blueprint_only() {
        let declared = names(&["X"]);
        let empty = BTreeSet::new();

        let strict = compare_names(ComponentKind::Service, &declared, &empty, DriftMode::Strict);
        assert_eq!(strict[0].severity, Severity::Fail);

        let permissive = compare_names(
            ComponentKind::Service,
            &declared,
            &empty,
            DriftMode::PermitUnimplemented,
        );
        assert_eq!(permissive[0].severity, Severity::Warn);

        let code = names(&["Y"]);
        for mode in [DriftMode::Strict, DriftMode::PermitUnimplemented] {
            let findings = compare_names(ComponentKind::Service, &empty, &code, mode);
            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].severity, Severity::Fail);
        }
    }

    #[test]
    fn test_undocumented_aggregate_is_drift() {
        let blueprint = Blueprint::from_json(
            r#"{"name": "Orders", "profile": "core", "layers": {"domain": {"aggregates": [{"name": "Order"}]}}}"#,
            Path::new("orders.json"),
        )
        .unwrap();
        let (_temp, inventory) = inventory(&[
            (
                "app/domain/orders/aggregates/order.rb",
                "module Orders\n  class Order < HexDDD::Domain::AggregateRoot\n  end\nend\n",
            ),
            (
                "app/domain/orders/aggregates/order_draft.rb",
                "module Orders\n  class OrderDraft < HexDDD::Domain::AggregateRoot\n  end\nend\n",
            ),
        ]);

        let findings = check_drift(&blueprint, &inventory, DriftMode::Strict);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Fail);
        assert_eq!(findings[0].category, Category::Drift);
        assert_eq!(findings[0].names, vec!["OrderDraft"]);
    }

    #[test]
    fn test_base_class_violation() {
        let (_temp, inventory) = inventory(&[(
            "app/domain/orders/value_objects/money.rb",
            "module Orders\n  class Money\n  end\nend\n",
        )]);
        let registry = BaseTypeRegistry::new(&ContractsConfig::default());
        let findings = check_base_classes(&inventory, &registry);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_name, "Money");
        assert_eq!(findings[0].category, Category::BaseClass);
    }

    #[test]
    fn test_unresolved_short_base_is_not_a_contract() {
        let (_temp, inventory) = inventory(&[(
            "app/domain/shop/value_objects/price.rb",
            "module Shop\n  module ValueObjects\n    class Price < Base\n    end\n  end\nend\n",
        )]);
        let price = inventory.find(ComponentKind::ValueObject, "Price").unwrap();
        assert_eq!(price.qualified_name, "Shop::ValueObjects::Price");
        assert_eq!(price.base_type_chain, vec!["Base"]);

        let registry = BaseTypeRegistry::new(&ContractsConfig::default());
        let findings = check_base_classes(&inventory, &registry);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_name, "Price");
        assert_eq!(findings[0].severity, Severity::Fail);
        assert_eq!(findings[0].category, Category::BaseClass);
    }

    #[test]
    fn test_domain_type_on_framework_base() {
        let (_temp, inventory) = inventory(&[(
            "app/domain/orders/aggregates/order.rb",
            "module Orders\n  class Order < ActiveRecord::Base\n  end\nend\n",
        )]);
        let findings = check_framework_independence(&inventory, &["ActiveRecord::Base".to_string()]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("ActiveRecord::Base"));
    }

    const PORT: (&str, &str) = (
        "app/domain/orders/ports/order_repository.rb",
        "module Orders\n  module Ports\n    class OrderRepository < HexDDD::Ports::SecondaryPort\n      abstract_method :add, :find\n    end\n  end\nend\n",
    );

    #[test]
    fn test_adapter_must_define_every_operation() {
        let (_temp, inventory) = inventory(&[
            PORT,
            (
                "app/infrastructure/orders/sql_order_repository.rb",
                "module Orders\n  class SqlOrderRepository < Ports::OrderRepository\n    def add(order); end\n  end\nend\n",
            ),
        ]);
        let findings = check_port_implementations(&inventory);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_name, "SqlOrderRepository");
        assert_eq!(findings[0].names, vec!["find"]);
    }

    #[test]
    fn test_intermediate_ancestor_counts_as_implementation() {
        let (_temp, inventory) = inventory(&[
            PORT,
            (
                "app/infrastructure/orders/base_repository.rb",
                "module Orders\n  class BaseRepository < Ports::OrderRepository\n    def find(id); end\n  end\nend\n",
            ),
            (
                "app/infrastructure/orders/sql_order_repository.rb",
                "module Orders\n  class SqlOrderRepository < BaseRepository\n    def add(order); end\n  end\nend\n",
            ),
        ]);
        let findings = check_port_implementations(&inventory);
        let subjects: Vec<_> = findings.iter().map(|f| f.subject_name.as_str()).collect();
        assert_eq!(subjects, vec!["BaseRepository"]);
    }

    #[test]
    fn test_port_without_adapter() {
        let (_temp, inventory) = inventory(&[PORT]);
        let findings = check_port_implementations(&inventory);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("has no adapter"));
    }

    #[test]
    fn test_value_object_mutation() {
        let (_temp, inventory) = inventory(&[(
            "app/domain/orders/value_objects/money.rb",
            "module Orders\n  class Money < HexDDD::Domain::ValueObject\n    attr_writer :amount\n\n    def initialize(amount)\n      @amount = amount\n    end\n\n    def add!(other)\n      @amount += other\n    end\n  end\nend\n",
        )]);
        let findings = check_immutability(&inventory, "initialize");
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("@amount in add! (line 10)"));
        assert_eq!(findings[1].names, vec!["amount="]);
    }

    #[test]
    fn test_service_holding_persistence_model() {
        let (_temp, inventory) = inventory(&[
            (
                "app/models/order_record.rb",
                "class OrderRecord < ApplicationRecord\nend\n",
            ),
            (
                "app/application/orders/services/order_service.rb",
                "module Orders\n  class OrderService < HexDDD::Application::Service\n    def initialize(repo:, model: ::OrderRecord)\n      @repo = repo\n      @records = OrderRecord\n    end\n  end\nend\n",
            ),
            (
                "app/infrastructure/orders/wiring/container.rb",
                "module Orders\n  class Container\n    register(:order_service) { OrderService.new }\n  end\nend\n",
            ),
        ]);
        let config = ConformanceConfig::default();
        let findings = check_service_dependencies(&inventory, &config);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.subject_name == "OrderService"));
        assert!(findings.iter().any(|f| f.message.contains("via @records")));
        assert!(findings.iter().any(|f| f.message.contains("keyword default `model`")));
    }

    #[test]
    fn test_controller_lookups_against_allow_list() {
        let (_temp, inventory) = inventory(&[
            (
                "app/infrastructure/orders/wiring/container.rb",
                "module Orders\n  class Container\n    register(:order_repo) { 1 }\n    register(:order_service) { 2 }\n  end\nend\n",
            ),
            (
                "app/controllers/orders/orders_controller.rb",
                "module Orders\n  class OrdersController < ActionController::API\n    def index\n      Container.resolve(:order_service)\n      Container.resolve(:order_repo)\n    end\n  end\nend\n",
            ),
        ]);
        let config = ConformanceConfig::default();
        let findings = check_entrypoint_lookups(&inventory, &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject_name, "Orders::OrdersController");
        assert!(findings[0].message.contains(":order_repo"));
        assert!(findings[0].message.contains("allowed: order_service"));
    }

    #[test]
    fn test_checker_report_is_sorted() {
        let blueprint = Blueprint::from_json(
            r#"{"name": "Orders", "profile": "core", "layers": {"domain": {"aggregates": [{"name": "Order"}]}}}"#,
            Path::new("orders.json"),
        )
        .unwrap();
        let (_temp, inventory) = inventory(&[(
            "app/domain/orders/value_objects/money.rb",
            "module Orders\n  class Money\n  end\nend\n",
        )]);
        let registry = BaseTypeRegistry::new(&ContractsConfig::default());
        let config = ConformanceConfig::default();
        let report = ConformanceChecker::new(&blueprint, &inventory, &registry, &config).run();

        let categories: Vec<_> = report.findings.iter().map(|f| f.category).collect();
        assert_eq!(categories, vec![Category::BaseClass, Category::Missing]);
        assert!(report.into_result().is_err());
    }
}
