//! Component discovery: a static pass over an implementation root.
//!
//! Every `*.rb` file under the root is scanned, class declarations are joined
//! into a type graph, superclass constants are resolved, and each class whose
//! ancestry reaches a known base contract becomes a discovered component.

use super::text::slugify;
use crate::domain::{
    type_name_matches, BaseTypeRegistry, ComponentKind, DiscoveredComponent, SourceLocation,
};
use crate::error::{ResolutionError, Result};
use crate::scanner::{DependencyKey, ScanDiagnostic, SourceScanner, SourceUnit, TypeDecl};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never scanned for implementation types
const SKIPPED_DIRS: [&str; 7] = ["spec", "test", "vendor", "node_modules", "tmp", "log", "db"];

/// A declared type and the file it came from
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub decl: TypeDecl,
    pub path: PathBuf,
}

/// All types declared under one root, keyed by qualified name
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    types: BTreeMap<String, TypeEntry>,
}

impl TypeGraph {
    pub fn from_units(units: &[SourceUnit]) -> Self {
        let mut types: BTreeMap<String, TypeEntry> = BTreeMap::new();
        for unit in units {
            for decl in &unit.types {
                match types.get_mut(&decl.qualified_name) {
                    // Reopened class: merge bodies, first declared superclass wins
                    Some(existing) => {
                        let merged = &mut existing.decl;
                        if merged.superclass.is_none() {
                            merged.superclass = decl.superclass.clone();
                        }
                        if merged.is_module && !decl.is_module {
                            merged.is_module = false;
                            existing.path = unit.path.clone();
                        }
                        merged.methods.extend(decl.methods.iter().cloned());
                        merged
                            .abstract_operations
                            .extend(decl.abstract_operations.iter().cloned());
                        merged.attr_writers.extend(decl.attr_writers.iter().cloned());
                    }
                    None => {
                        types.insert(
                            decl.qualified_name.clone(),
                            TypeEntry {
                                decl: decl.clone(),
                                path: unit.path.clone(),
                            },
                        );
                    }
                }
            }
        }
        Self { types }
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeEntry> {
        self.types.get(qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    /// Resolve a constant as written inside `scopes` (outermost first).
    ///
    /// Tries each lexical scope from the innermost outwards, then the name as
    /// written, then a unique suffix match among known types.
    pub fn resolve(&self, written: &str, scopes: &[String]) -> Option<String> {
        if let Some(absolute) = written.strip_prefix("::") {
            return self.types.contains_key(absolute).then(|| absolute.to_string());
        }
        for scope in scopes.iter().rev() {
            let candidate = format!("{scope}::{written}");
            if self.types.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        if self.types.contains_key(written) {
            return Some(written.to_string());
        }

        let suffix = format!("::{written}");
        let mut matches = self.types.keys().filter(|k| k.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }

    /// Ancestors of a type from its direct superclass upwards.
    ///
    /// Resolved ancestors are qualified; the first unresolved one is kept as
    /// written and ends the chain.
    pub fn ancestry(&self, qualified_name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = qualified_name.to_string();
        seen.insert(current.clone());

        while let Some(entry) = self.types.get(&current) {
            let Some(written) = entry.decl.superclass.as_deref() else {
                break;
            };
            match self.resolve(written, &entry.decl.lexical_scopes) {
                Some(resolved) if seen.insert(resolved.clone()) => {
                    chain.push(resolved.clone());
                    current = resolved;
                }
                Some(cyclic) => {
                    tracing::warn!("Inheritance cycle through {}", cyclic);
                    break;
                }
                None => {
                    chain.push(written.trim_start_matches("::").to_string());
                    break;
                }
            }
        }
        chain
    }

    /// Nearest type in `qualified_name`'s ancestry (itself included) that defines `method`
    pub fn definer_of(&self, qualified_name: &str, method: &str) -> Option<String> {
        std::iter::once(qualified_name.to_string())
            .chain(self.ancestry(qualified_name))
            .find(|t| self.get(t).is_some_and(|e| e.decl.defines(method)))
    }
}

/// Everything discovery learned about one implementation root
#[derive(Debug, Clone)]
pub struct Inventory {
    pub root: PathBuf,
    pub components: Vec<DiscoveredComponent>,
    pub graph: TypeGraph,
    pub units: Vec<SourceUnit>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl Inventory {
    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &DiscoveredComponent> {
        self.components.iter().filter(move |c| c.kind == kind)
    }

    pub fn names(&self, kind: ComponentKind) -> BTreeSet<String> {
        self.of_kind(kind).map(|c| c.name.clone()).collect()
    }

    /// Adapters whose ancestry includes `port`
    pub fn adapters_of(&self, port: &DiscoveredComponent) -> Vec<&DiscoveredComponent> {
        self.of_kind(ComponentKind::Adapter)
            .filter(|a| a.base_type_chain.iter().any(|b| b == &port.qualified_name))
            .collect()
    }

    pub fn find(&self, kind: ComponentKind, name: &str) -> Option<&DiscoveredComponent> {
        self.of_kind(kind).find(|c| c.name == name)
    }

    /// Literal keys passed to `register_call` anywhere under the root
    pub fn registered_keys(&self, register_call: &str) -> BTreeSet<DependencyKey> {
        self.units
            .iter()
            .flat_map(|u| crate::scanner::lookup_calls(u, register_call))
            .map(|c| c.key.clone())
            .collect()
    }
}

fn is_scanned_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
}

/// Ruby files under `root`, in a stable order
pub fn source_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(is_scanned_dir)
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "rb"))
        .collect()
}

fn has_dir(path: &Path, dir: &str) -> bool {
    path.components().any(|c| c.as_os_str() == dir)
}

/// Discover every implementation artifact under `root`
pub fn discover(root: &Path, registry: &BaseTypeRegistry) -> Result<Inventory> {
    if !root.is_dir() {
        return Err(ResolutionError::ImplementationRootNotFound(root.to_path_buf()).into());
    }

    let mut scanner = SourceScanner::new()?;
    let mut units = Vec::new();
    let mut diagnostics = Vec::new();
    for path in source_files(root) {
        let scanned = scanner.scan_file(&path);
        units.push(scanned.unit);
        diagnostics.extend(scanned.diagnostic);
    }
    tracing::debug!("Scanned {} source files under {}", units.len(), root.display());

    let graph = TypeGraph::from_units(&units);
    let components = classify(&graph, registry, root);
    tracing::debug!("Discovered {} components", components.len());

    Ok(Inventory {
        root: root.to_path_buf(),
        components,
        graph,
        units,
        diagnostics,
    })
}

fn classify(
    graph: &TypeGraph,
    registry: &BaseTypeRegistry,
    root: &Path,
) -> Vec<DiscoveredComponent> {
    let mut components = Vec::new();

    for entry in graph.iter().filter(|e| !e.decl.is_module) {
        let decl = &entry.decl;
        if registry.is_contract(&decl.qualified_name) {
            continue;
        }
        let relative = entry.path.strip_prefix(root).unwrap_or(&entry.path);
        let chain = graph.ancestry(&decl.qualified_name);

        let kind = match registry.classify(&chain) {
            Some(ComponentKind::Port) => {
                if has_dir(relative, "infrastructure") {
                    ComponentKind::Adapter
                } else if has_dir(relative, "domain") {
                    ComponentKind::Port
                } else if chain.first().is_some_and(|s| graph.get(s).is_some()) {
                    ComponentKind::Adapter
                } else {
                    ComponentKind::Port
                }
            }
            Some(ComponentKind::Controller) => {
                if !has_dir(relative, "controllers")
                    || decl.name.ends_with("ApplicationController")
                {
                    continue;
                }
                ComponentKind::Controller
            }
            Some(kind) => kind,
            // Conventional location without the contract: kept so the
            // base-class check can report it
            None => match registry.kind_for_directory(relative) {
                Some(kind) if file_declares(&entry.path, &decl.name) => kind,
                _ => continue,
            },
        };

        components.push(DiscoveredComponent {
            name: decl.name.clone(),
            qualified_name: decl.qualified_name.clone(),
            kind,
            location: SourceLocation {
                path: entry.path.clone(),
                line: decl.line,
            },
            base_type_chain: chain,
        });
    }

    components.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
    components
}

/// Whether a file is named after the type, as autoloading expects
fn file_declares(path: &Path, type_name: &str) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem == slugify(type_name))
}

/// Whether any ancestor of `component` matches one of `bases`
pub fn chain_includes(component: &DiscoveredComponent, bases: &[String]) -> bool {
    component
        .base_type_chain
        .iter()
        .any(|ancestor| bases.iter().any(|b| type_name_matches(ancestor, b)))
}
