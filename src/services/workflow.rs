//! Workflow engine: per-component lifecycle state and prioritised next steps.

use super::text::slugify;
use crate::config::WorkflowConfig;
use crate::domain::{
    Blueprint, CapabilitySpecState, CatalogEntry, ComponentWorkflowState, Project, SpecStatus,
    SuggestionAction, WorkflowSuggestion,
};
use crate::error::{AppError, Result};
use std::cmp::Reverse;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Compute the workflow state of one catalog entry from the filesystem.
///
/// Absent or unreadable blueprints are a state, not an error.
pub fn analyze_component(project: &Project, entry: &CatalogEntry) -> ComponentWorkflowState {
    let implementation_root = project.engine_root(&entry.id);
    let blueprint_path = match project.blueprint_path(entry) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("{}", e);
            return ComponentWorkflowState::without_blueprint(
                &entry.id,
                PathBuf::new(),
                implementation_root,
            );
        }
    };

    if !blueprint_path.is_file() {
        tracing::debug!("No blueprint for {} at {}", entry.id, blueprint_path.display());
        return ComponentWorkflowState::without_blueprint(
            &entry.id,
            blueprint_path,
            implementation_root,
        );
    }

    let blueprint = match Blueprint::parse(&blueprint_path) {
        Ok(blueprint) => blueprint,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", entry.id, e);
            return ComponentWorkflowState::without_blueprint(
                &entry.id,
                blueprint_path,
                implementation_root,
            );
        }
    };

    let specs_dir = project.specs_dir(&entry.id);
    let capabilities = blueprint
        .capabilities()
        .iter()
        .map(|c| CapabilitySpecState::scan(&c.name, &slugify(&c.name), &specs_dir))
        .collect();

    ComponentWorkflowState {
        component_id: entry.id.clone(),
        blueprint_path,
        has_blueprint: true,
        has_implementation_root: project.has_implementation_root(&entry.id),
        implementation_root,
        capabilities,
    }
}

/// Analyse every entry concurrently; results keep catalog order
pub async fn analyze_components(
    project: Arc<Project>,
    entries: Vec<CatalogEntry>,
) -> Result<Vec<ComponentWorkflowState>> {
    let mut tasks = JoinSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let project = Arc::clone(&project);
        tasks.spawn_blocking(move || (index, analyze_component(&project, &entry)));
    }

    let mut states = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, state) =
            joined.map_err(|e| AppError::Task(format!("workflow analysis failed: {e}")))?;
        states.push((index, state));
    }
    states.sort_by_key(|(index, _)| *index);
    Ok(states.into_iter().map(|(_, state)| state).collect())
}

fn capability_noun(count: usize) -> &'static str {
    if count == 1 {
        "capability"
    } else {
        "capabilities"
    }
}

/// Suggestions for one component, in intrinsic order
pub fn suggestions_for(
    state: &ComponentWorkflowState,
    config: &WorkflowConfig,
) -> Vec<WorkflowSuggestion> {
    let id = state.component_id.as_str();
    let suggestion = |action, message: String, command: Option<String>, spec: Option<PathBuf>| {
        WorkflowSuggestion {
            component_id: id.to_string(),
            action,
            message,
            command,
            spec_path: spec,
        }
    };

    if !state.has_blueprint {
        return Vec::new();
    }
    if !state.has_implementation_root {
        return vec![suggestion(
            SuggestionAction::CreateRoot,
            format!("Create implementation root for {id}"),
            Some(config.create_root_command.replace("{id}", id)),
            None,
        )];
    }

    let mut suggestions = Vec::new();
    let missing = state.capabilities.iter().filter(|c| !c.spec_exists).count();
    if missing > 0 {
        suggestions.push(suggestion(
            SuggestionAction::GenerateSpecs,
            format!(
                "Generate spec templates for {id} ({missing} {})",
                capability_noun(missing)
            ),
            Some(config.generate_specs_command.replace("{id}", id)),
            None,
        ));
    }
    for capability in state.capabilities.iter().filter(|c| c.status == SpecStatus::Template) {
        let spec = capability.spec_path.display().to_string();
        suggestions.push(suggestion(
            SuggestionAction::CompletePlanning,
            format!("Complete planning for {}", capability.capability_name),
            Some(
                config
                    .plan_command
                    .replace("{id}", id)
                    .replace("{spec}", &spec),
            ),
            Some(capability.spec_path.clone()),
        ));
    }
    for capability in state.capabilities.iter().filter(|c| c.status == SpecStatus::Planned) {
        suggestions.push(suggestion(
            SuggestionAction::Implement,
            format!("Implement {}", capability.capability_name),
            None,
            Some(capability.spec_path.clone()),
        ));
    }
    suggestions
}

/// All suggestions across components, best first.
///
/// Components further along come first, then lower intrinsic priority, then
/// component id. `limit` of `None` keeps everything.
pub fn prioritize(
    states: &[ComponentWorkflowState],
    config: &WorkflowConfig,
    limit: Option<usize>,
) -> Vec<WorkflowSuggestion> {
    let mut ranked: Vec<(u32, WorkflowSuggestion)> = states
        .iter()
        .flat_map(|state| {
            let score = state.progress_score();
            suggestions_for(state, config)
                .into_iter()
                .map(move |s| (score, s))
        })
        .collect();

    // Stable sort keeps per-component order among equal keys
    ranked.sort_by(|(score_a, a), (score_b, b)| {
        (Reverse(*score_a), a.priority(), &a.component_id).cmp(&(
            Reverse(*score_b),
            b.priority(),
            &b.component_id,
        ))
    });

    let suggestions = ranked.into_iter().map(|(_, s)| s);
    match limit {
        Some(n) => suggestions.take(n).collect(),
        None => suggestions.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::test_support::CATALOG_BLUEPRINT;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    const TWO_CAPABILITIES: &str = r#"{"name": "Orders", "profile": "core", "layers": {"application": {
        "capabilities": [{"name": "Checkout"}, {"name": "Refund Order"}]
    }}}"#;

    fn entry(id: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            architecture_file: Some(format!("architecture/{id}.json")),
        }
    }

    fn project(temp: &TempDir) -> Project {
        Project::new(temp.path().to_path_buf(), ProjectConfig::default())
    }

    #[test]
    fn test_missing_blueprint_is_terminal() {
        let temp = TempDir::new().unwrap();
        let state = analyze_component(&project(&temp), &entry("orders"));
        assert!(!state.has_blueprint);
        assert!(suggestions_for(&state, &WorkflowConfig::default()).is_empty());
    }

    #[test]
    fn test_missing_root_gates_everything() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "architecture/orders.json", TWO_CAPABILITIES);

        let state = analyze_component(&project(&temp), &entry("orders"));
        assert_eq!(state.capabilities.len(), 2);

        let suggestions = suggestions_for(&state, &WorkflowConfig::default());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].action, SuggestionAction::CreateRoot);
        assert_eq!(
            suggestions[0].command.as_deref(),
            Some("rails plugin new engines/orders --mountable && rampart init orders")
        );
    }

    #[test]
    fn test_suggestions_follow_spec_state() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "architecture/orders.json", TWO_CAPABILITIES);
        write(temp.path(), "engines/orders/orders.gemspec", "");
        write(
            temp.path(),
            "docs/specs/orders/checkout.spec.md",
            "# Checkout\n\n**Status:** template\n",
        );

        let state = analyze_component(&project(&temp), &entry("orders"));
        let suggestions = suggestions_for(&state, &WorkflowConfig::default());
        let messages: Vec<&str> = suggestions.iter().map(|s| s.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Generate spec templates for orders (1 capability)",
                "Complete planning for Checkout",
            ]
        );
        let spec = temp.path().join("docs/specs/orders/checkout.spec.md");
        assert_eq!(
            suggestions[1].command,
            Some(format!("/rampart.plan with {}", spec.display()))
        );

        write(
            temp.path(),
            "docs/specs/orders/checkout.spec.md",
            "# Checkout\n\n**Status:** planned\n",
        );
        let state = analyze_component(&project(&temp), &entry("orders"));
        let implement = suggestions_for(&state, &WorkflowConfig::default())
            .into_iter()
            .find(|s| s.action == SuggestionAction::Implement)
            .unwrap();
        assert_eq!(implement.message, "Implement Checkout");
        assert!(implement.command.is_none());
        assert_eq!(implement.spec_path, Some(spec));
    }

    fn state_with(id: &str, statuses: &[SpecStatus]) -> ComponentWorkflowState {
        ComponentWorkflowState {
            component_id: id.to_string(),
            blueprint_path: PathBuf::from(format!("architecture/{id}.json")),
            has_blueprint: true,
            has_implementation_root: true,
            implementation_root: PathBuf::from(format!("engines/{id}")),
            capabilities: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| CapabilitySpecState {
                    capability_name: format!("Cap{i}"),
                    slug: format!("cap{i}"),
                    spec_exists: *status != SpecStatus::NotGenerated,
                    spec_path: PathBuf::from(format!("docs/specs/{id}/cap{i}.spec.md")),
                    status: *status,
                })
                .collect(),
        }
    }

    #[test]
    fn test_planned_component_ranks_first() {
        let states = vec![
            state_with("alpha", &[SpecStatus::Template]),
            state_with("beta", &[SpecStatus::Planned]),
        ];
        let suggestions = prioritize(&states, &WorkflowConfig::default(), None);
        assert_eq!(suggestions[0].component_id, "beta");
        assert_eq!(suggestions[0].action, SuggestionAction::Implement);
        assert_eq!(suggestions[1].component_id, "alpha");
    }

    #[test]
    fn test_ties_break_by_priority_then_id() {
        let states = vec![
            state_with("zeta", &[SpecStatus::Template, SpecStatus::NotGenerated]),
            state_with("alpha", &[SpecStatus::Template]),
        ];
        let suggestions = prioritize(&states, &WorkflowConfig::default(), None);
        let order: Vec<(&str, SuggestionAction)> = suggestions
            .iter()
            .map(|s| (s.component_id.as_str(), s.action))
            .collect();
        assert_eq!(
            order,
            vec![
                ("zeta", SuggestionAction::GenerateSpecs),
                ("alpha", SuggestionAction::CompletePlanning),
                ("zeta", SuggestionAction::CompletePlanning),
            ]
        );
    }

    #[test]
    fn test_limit_truncates() {
        let states = vec![state_with("a", &[SpecStatus::Template, SpecStatus::Template])];
        assert_eq!(prioritize(&states, &WorkflowConfig::default(), Some(1)).len(), 1);
        assert_eq!(prioritize(&states, &WorkflowConfig::default(), None).len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_components_keeps_catalog_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "architecture/cat_content.json", CATALOG_BLUEPRINT);
        write(temp.path(), "architecture/orders.json", TWO_CAPABILITIES);
        write(temp.path(), "engines/orders/orders.gemspec", "");

        let project = Arc::new(project(&temp));
        let entries = vec![entry("orders"), entry("missing"), entry("cat_content")];
        let states = analyze_components(project, entries).await.unwrap();

        let ids: Vec<&str> = states.iter().map(|s| s.component_id.as_str()).collect();
        assert_eq!(ids, vec!["orders", "missing", "cat_content"]);
        assert!(states[0].has_implementation_root);
        assert!(!states[1].has_blueprint);
        assert!(!states[2].has_implementation_root);
    }
}
