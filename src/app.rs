//! Command layer: one method per CLI verb.
//!
//! Each command resolves its component, runs the services, and returns an
//! outcome that the binary prints as text or JSON.

use crate::config::{ImageFormat, ProjectConfig};
use crate::domain::{
    catalog_not_found, derive_component_id, find_project_root, resolve_blueprint_arg,
    BaseTypeRegistry, Blueprint, ConformanceReport, Project, WorkflowSuggestion,
};
use crate::error::{BlueprintError, ResolutionError, Result};
use crate::scanner::ScanDiagnostic;
use crate::services::{
    all_diagrams, analyze_components, architecture_document, architecture_document_name, discover,
    prioritize, render_all, write_specs, ConformanceChecker, MermaidCli, ScaffoldedSpec,
    SpecWriteOutcome,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A blueprint resolved from a command argument, with its project
#[derive(Debug)]
pub struct ResolvedComponent {
    pub id: String,
    pub blueprint_path: PathBuf,
    pub blueprint: Blueprint,
    pub project: Project,
}

impl ResolvedComponent {
    /// Blueprint location as shown in generated documents
    pub fn source_label(&self) -> String {
        self.project.relative(&self.blueprint_path).display().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    pub component_id: String,
    pub implementation_root: PathBuf,
    pub report: ConformanceReport,
    pub diagnostics: Vec<ScanDiagnostic>,
}

#[derive(Debug, Serialize)]
pub struct DiagramOutcome {
    pub component_id: String,
    pub document: PathBuf,
    pub diagrams: Vec<String>,
    pub images: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SpecOutcome {
    pub component_id: String,
    pub specs_dir: PathBuf,
    pub specs: Vec<ScaffoldedSpec>,
}

#[derive(Debug, Serialize)]
pub struct NextOutcome {
    /// Component the suggestions were limited to
    pub scope: Option<String>,
    /// Number of components in the catalog
    pub components: usize,
    pub suggestions: Vec<WorkflowSuggestion>,
}

/// Entry point for every command
pub struct App {
    cwd: PathBuf,
}

impl App {
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd }
    }

    /// Configuration for a project root, or defaults plus user/env layers
    fn load_config(root: Option<&Path>) -> Result<ProjectConfig> {
        Ok(ProjectConfig::load(root)?)
    }

    /// Project whose catalog is found above the working directory
    fn locate(&self) -> Result<Option<Project>> {
        Ok(Project::locate(&self.cwd, ProjectConfig::load)?)
    }

    /// Resolve a component id or blueprint path and load the blueprint
    pub fn resolve(&self, target: &str) -> Result<ResolvedComponent> {
        let located = self.locate()?;
        let config = match &located {
            Some(project) => project.config.clone(),
            None => Self::load_config(None)?,
        };

        let blueprint_path =
            resolve_blueprint_arg(target, &self.cwd, located.as_ref(), &config.layout)?;
        let root = find_project_root(&blueprint_path, &config.layout.architecture_dir);
        let project = match located {
            Some(project) if project.root_path == root => project,
            _ => Project::new(root.clone(), Self::load_config(Some(&root))?),
        };

        let blueprint = Blueprint::parse(&blueprint_path)?;
        let id = derive_component_id(&blueprint_path)
            .ok_or_else(|| BlueprintError::UnnamedComponent(blueprint_path.clone()))?;
        tracing::info!("Resolved {} to {}", id, blueprint_path.display());

        Ok(ResolvedComponent {
            id,
            blueprint_path,
            blueprint,
            project,
        })
    }

    /// Run every conformance check for one component
    pub fn check(
        &self,
        target: &str,
        implementation_root: Option<PathBuf>,
        permit_unimplemented: bool,
    ) -> Result<CheckOutcome> {
        let mut component = self.resolve(target)?;
        if permit_unimplemented {
            component.project.config.conformance.permit_unimplemented = true;
        }
        let root = match implementation_root {
            Some(root) if root.is_absolute() => root,
            Some(root) => self.cwd.join(root),
            None => component.project.engine_root(&component.id),
        };

        let config = &component.project.config;
        let registry = BaseTypeRegistry::new(&config.contracts);
        let inventory = discover(&root, &registry)?;
        for diagnostic in &inventory.diagnostics {
            tracing::warn!("{}", diagnostic);
        }

        let report =
            ConformanceChecker::new(&component.blueprint, &inventory, &registry, &config.conformance)
                .run();

        Ok(CheckOutcome {
            component_id: component.id,
            implementation_root: root,
            report,
            diagnostics: inventory.diagnostics,
        })
    }

    /// Write the diagram document and optionally render images
    pub fn diagram(
        &self,
        target: &str,
        output: Option<PathBuf>,
        format: Option<ImageFormat>,
        render: bool,
    ) -> Result<DiagramOutcome> {
        let component = self.resolve(target)?;
        let config = &component.project.config.diagram;
        let format = format.unwrap_or(config.format);

        let document = match output {
            Some(path) if path.is_absolute() => path,
            Some(path) => self.cwd.join(path),
            None => component
                .project
                .diagrams_dir()
                .join(architecture_document_name(&component.id)),
        };
        let out_dir = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone());

        let diagrams = all_diagrams(&component.blueprint, &component.id, config);
        let markdown = architecture_document(
            &component.blueprint,
            &component.id,
            &component.source_label(),
            &diagrams,
            format,
        );
        std::fs::create_dir_all(&out_dir)?;
        std::fs::write(&document, markdown)?;
        tracing::info!("Wrote {}", document.display());

        let images = if render {
            let renderer = MermaidCli::from_config(config);
            render_all(&renderer, &diagrams, &out_dir.join("images"), format)?
        } else {
            Vec::new()
        };

        Ok(DiagramOutcome {
            component_id: component.id,
            document,
            diagrams: diagrams.into_iter().map(|d| d.name).collect(),
            images,
        })
    }

    /// Scaffold one spec per capability
    pub fn spec(&self, target: &str, output: Option<PathBuf>, force: bool) -> Result<SpecOutcome> {
        let component = self.resolve(target)?;
        let specs_dir = match output {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => self.cwd.join(dir),
            None => component.project.specs_dir(&component.id),
        };

        let specs = write_specs(
            &component.blueprint,
            &component.id,
            &component.source_label(),
            &specs_dir,
            force,
        )?;

        Ok(SpecOutcome {
            component_id: component.id,
            specs_dir,
            specs,
        })
    }

    /// Prioritised next steps across the catalog
    pub async fn next(&self, scope: Option<String>, limit: Option<usize>) -> Result<NextOutcome> {
        let Some(project) = self.locate()? else {
            let layout = Self::load_config(None)?.layout;
            return Err(catalog_not_found(&self.cwd, &layout).into());
        };

        let mut entries = project.catalog()?.entries().to_vec();
        if let Some(id) = scope.as_deref() {
            entries.retain(|e| e.id == id);
            if entries.is_empty() {
                return Err(ResolutionError::ComponentNotFound(id.to_string()).into());
            }
        }
        let components = entries.len();

        let workflow = project.config.workflow.clone();
        let states = analyze_components(Arc::new(project), entries).await?;
        let suggestions = prioritize(&states, &workflow, limit);

        Ok(NextOutcome {
            scope,
            components,
            suggestions,
        })
    }
}

/// Human-readable conformance report
pub fn format_check(outcome: &CheckOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Conformance of {} ({})",
        outcome.component_id,
        outcome.implementation_root.display()
    );
    let _ = writeln!(out);

    if outcome.report.is_empty() {
        let _ = writeln!(out, "No findings: implementation matches the blueprint.");
    } else {
        let _ = write!(out, "{}", outcome.report);
    }
    for diagnostic in &outcome.diagnostics {
        let _ = writeln!(out, "[DIAG] {diagnostic}");
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} failure(s), {} warning(s)",
        outcome.report.failures().count(),
        outcome.report.warnings().count()
    );
    out
}

pub fn format_diagram(outcome: &DiagramOutcome) -> String {
    let mut out = format!(
        "Generated {} diagram(s) for {} at {}\n",
        outcome.diagrams.len(),
        outcome.component_id,
        outcome.document.display()
    );
    for image in &outcome.images {
        let _ = writeln!(out, "Rendered {}", image.display());
    }
    out
}

pub fn format_spec(outcome: &SpecOutcome) -> String {
    if outcome.specs.is_empty() {
        return "No capabilities found in blueprint.\n".to_string();
    }
    let mut out = String::new();
    for spec in &outcome.specs {
        let verb = match spec.outcome {
            SpecWriteOutcome::Written => "Generated",
            SpecWriteOutcome::Overwritten => "Regenerated",
            SpecWriteOutcome::Skipped => "Kept existing",
        };
        let _ = writeln!(out, "{verb}: {}", spec.path.display());
    }
    out
}

/// `N. message` lines with their command or spec
pub fn format_suggestions(outcome: &NextOutcome) -> String {
    if outcome.components == 0 {
        return "No bounded contexts found in system.json.\n".to_string();
    }
    if outcome.suggestions.is_empty() {
        return match outcome.scope.as_deref() {
            Some(id) => format!("Bounded context '{id}' is up to date!\n"),
            None => "All bounded contexts are up to date!\n".to_string(),
        };
    }

    let mut out = match outcome.scope.as_deref() {
        Some(id) => format!("Suggested next steps for {id}:\n\n"),
        None => "Suggested next steps:\n\n".to_string(),
    };
    for (i, suggestion) in outcome.suggestions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, suggestion.message);
        match (&suggestion.command, &suggestion.spec_path) {
            (Some(command), _) => {
                let _ = writeln!(out, "   Run: {command}");
            }
            (None, Some(spec)) => {
                let _ = writeln!(out, "   Spec: {}", spec.display());
            }
            (None, None) => {}
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SuggestionAction;
    use crate::test_support::CATALOG_BLUEPRINT;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "architecture/system.json",
            r#"{"engines": {"items": [{"id": "cat_content", "architecture_file": "architecture/cat_content.json"}]}}"#,
        );
        write(temp.path(), "architecture/cat_content.json", CATALOG_BLUEPRINT);
        temp
    }

    #[test]
    fn test_resolve_by_id_and_path() {
        let temp = project();
        let app = App::new(temp.path().join("docs"));

        let by_id = app.resolve("cat_content").unwrap();
        assert_eq!(by_id.id, "cat_content");
        assert_eq!(by_id.project.root_path, temp.path());
        assert_eq!(by_id.source_label(), "architecture/cat_content.json");

        let path = temp.path().join("architecture/cat_content.json");
        let by_path = App::new(temp.path().to_path_buf())
            .resolve(path.to_str().unwrap())
            .unwrap();
        assert_eq!(by_path.blueprint.name, "Cat Content");
    }

    #[tokio::test]
    async fn test_project_file_moves_the_catalog() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".rampart.toml", "[layout]\narchitecture_dir = \"arch\"\n");
        write(
            temp.path(),
            "arch/system.json",
            r#"{"engines": {"items": [{"id": "cat_content", "architecture_file": "arch/cat_content.json"}]}}"#,
        );
        write(temp.path(), "arch/cat_content.json", CATALOG_BLUEPRINT);
        let app = App::new(temp.path().join("engines"));

        let resolved = app.resolve("cat_content").unwrap();
        assert_eq!(resolved.project.root_path, temp.path());
        assert_eq!(resolved.source_label(), "arch/cat_content.json");

        let next = app.next(None, None).await.unwrap();
        assert_eq!(next.components, 1);
    }

    #[tokio::test]
    async fn test_spec_then_next() {
        let temp = project();
        write(temp.path(), "engines/cat_content/cat_content.gemspec", "");
        let app = App::new(temp.path().to_path_buf());

        let outcome = app.spec("cat_content", None, false).unwrap();
        assert_eq!(outcome.specs.len(), 1);
        assert!(temp
            .path()
            .join("docs/specs/cat_content/browse_catalog.spec.md")
            .is_file());

        let next = app.next(None, None).await.unwrap();
        assert_eq!(next.suggestions.len(), 1);
        assert_eq!(next.suggestions[0].action, SuggestionAction::CompletePlanning);

        let text = format_suggestions(&next);
        assert!(text.starts_with("Suggested next steps:\n\n1. Complete planning for Browse Catalog\n   Run: /rampart.plan with "));
    }

    #[test]
    fn test_diagram_writes_document() {
        let temp = project();
        let app = App::new(temp.path().to_path_buf());
        let outcome = app.diagram("cat_content", None, None, false).unwrap();

        assert_eq!(
            outcome.document,
            temp.path().join("docs/diagrams/cat_content_architecture.md")
        );
        assert_eq!(
            outcome.diagrams,
            vec!["cat_content_l1_context", "cat_content_l3_browse_catalog"]
        );
        let text = std::fs::read_to_string(&outcome.document).unwrap();
        assert!(text.contains("images/cat_content_l1_context.svg"));
    }

    #[test]
    fn test_check_missing_root_is_error() {
        let temp = project();
        let app = App::new(temp.path().to_path_buf());
        let err = app.check("cat_content", None, false).unwrap_err();
        assert!(err.to_string().contains("Implementation root not found"));
    }

    #[test]
    fn test_format_suggestions_states() {
        let empty_catalog = NextOutcome {
            scope: None,
            components: 0,
            suggestions: Vec::new(),
        };
        assert_eq!(
            format_suggestions(&empty_catalog),
            "No bounded contexts found in system.json.\n"
        );

        let done = NextOutcome {
            scope: Some("orders".to_string()),
            components: 1,
            suggestions: Vec::new(),
        };
        assert_eq!(format_suggestions(&done), "Bounded context 'orders' is up to date!\n");

        let implement = NextOutcome {
            scope: None,
            components: 1,
            suggestions: vec![WorkflowSuggestion {
                component_id: "orders".to_string(),
                action: SuggestionAction::Implement,
                message: "Implement Checkout".to_string(),
                command: None,
                spec_path: Some(PathBuf::from("docs/specs/orders/checkout.spec.md")),
            }],
        };
        assert_eq!(
            format_suggestions(&implement),
            "Suggested next steps:\n\n1. Implement Checkout\n   Spec: docs/specs/orders/checkout.spec.md\n\n"
        );
    }

    #[tokio::test]
    async fn test_next_without_catalog() {
        let temp = TempDir::new().unwrap();
        let err = App::new(temp.path().to_path_buf())
            .next(None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("system.json"));
    }
}
