//! Project entity: the repository holding blueprints, engines and generated docs.

use crate::config::{LayoutConfig, ProjectConfig, PROJECT_CONFIG_FILE};
use crate::error::{ConfigError, ResolutionError, ResolutionResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One entry of the system catalog
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub architecture_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogEngines {
    #[serde(default)]
    items: Vec<CatalogEntry>,
}

/// The system catalog listing every known component
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemCatalog {
    #[serde(default)]
    engines: CatalogEngines,
}

impl SystemCatalog {
    pub fn load(path: &Path) -> ResolutionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ResolutionError::InvalidCatalog {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.engines.items
    }

    pub fn find(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries().iter().find(|e| e.id == id)
    }
}

/// Represents the project repository context
#[derive(Debug, Clone)]
pub struct Project {
    /// Repository root path
    pub root_path: PathBuf,
    /// Loaded configuration
    pub config: ProjectConfig,
}

impl Project {
    /// Create a new Project from a root path and configuration
    pub fn new(root_path: PathBuf, config: ProjectConfig) -> Self {
        Self { root_path, config }
    }

    /// Walk up from `start` to the first directory whose own layout points at
    /// a system catalog. `load` yields a directory's configuration, so a
    /// `.rampart.toml` that moves the architecture directory is honoured.
    pub fn locate<F>(start: &Path, mut load: F) -> Result<Option<Project>, ConfigError>
    where
        F: FnMut(Option<&Path>) -> Result<ProjectConfig, ConfigError>,
    {
        let base = load(None)?;
        for dir in start.ancestors() {
            let config = if dir.join(PROJECT_CONFIG_FILE).is_file() {
                load(Some(dir))?
            } else {
                base.clone()
            };
            let catalog = dir
                .join(&config.layout.architecture_dir)
                .join(&config.layout.system_file);
            if catalog.is_file() {
                return Ok(Some(Project::new(dir.to_path_buf(), config)));
            }
        }
        Ok(None)
    }

    fn layout(&self) -> &LayoutConfig {
        &self.config.layout
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root_path
            .join(&self.layout().architecture_dir)
            .join(&self.layout().system_file)
    }

    /// Load the system catalog; a project without one has no components
    pub fn catalog(&self) -> ResolutionResult<SystemCatalog> {
        let path = self.catalog_path();
        if !path.is_file() {
            return Ok(SystemCatalog::default());
        }
        SystemCatalog::load(&path)
    }

    /// Blueprint path for a catalog entry, relative paths taken from the project root
    pub fn blueprint_path(&self, entry: &CatalogEntry) -> ResolutionResult<PathBuf> {
        let file = entry
            .architecture_file
            .as_deref()
            .ok_or_else(|| ResolutionError::MissingArchitectureFile(entry.id.clone()))?;
        Ok(self.root_path.join(file))
    }

    /// Blueprint path for a component id
    pub fn resolve_component(&self, id: &str) -> ResolutionResult<PathBuf> {
        let catalog_path = self.catalog_path();
        if !catalog_path.is_file() {
            return Err(ResolutionError::SystemCatalogNotFound {
                start: self.root_path.clone(),
                file: self.layout().system_file.clone(),
            });
        }
        let catalog = SystemCatalog::load(&catalog_path)?;
        let entry = catalog
            .find(id)
            .ok_or_else(|| ResolutionError::ComponentNotFound(id.to_string()))?;
        self.blueprint_path(entry)
    }

    /// Implementation root of a component
    pub fn engine_root(&self, id: &str) -> PathBuf {
        self.root_path.join(&self.layout().engines_dir).join(id)
    }

    /// Whether the implementation root has been created
    pub fn has_implementation_root(&self, id: &str) -> bool {
        let marker = self.layout().implementation_marker.replace("{id}", id);
        self.engine_root(id).join(marker).is_file()
    }

    pub fn specs_dir(&self, id: &str) -> PathBuf {
        self.root_path.join(&self.layout().specs_dir).join(id)
    }

    pub fn diagrams_dir(&self) -> PathBuf {
        self.root_path.join(&self.layout().diagrams_dir)
    }

    /// Path relative to the project root when possible
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root_path).unwrap_or(path)
    }
}

/// Resolve a command argument: a `.json` argument is a blueprint path, anything
/// else a component id looked up in the catalog of the located `project`.
/// `layout` names the catalog when no project was found.
pub fn resolve_blueprint_arg(
    arg: &str,
    cwd: &Path,
    project: Option<&Project>,
    layout: &LayoutConfig,
) -> ResolutionResult<PathBuf> {
    if arg.ends_with(".json") {
        let path = PathBuf::from(arg);
        return Ok(if path.is_absolute() { path } else { cwd.join(path) });
    }

    let project = project.ok_or_else(|| catalog_not_found(cwd, layout))?;
    project.resolve_component(arg)
}

pub fn catalog_not_found(start: &Path, layout: &LayoutConfig) -> ResolutionError {
    ResolutionError::SystemCatalogNotFound {
        start: start.to_path_buf(),
        file: layout
            .architecture_dir
            .join(&layout.system_file)
            .display()
            .to_string(),
    }
}
