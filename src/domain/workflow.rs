//! Workflow state of a component and the suggestions derived from it.

use super::{CapabilitySpecState, SpecStatus};
use serde::Serialize;
use std::path::PathBuf;

/// Progress bonus for a component with any planned capability
pub const PLANNED_BONUS: u32 = 100;
/// Progress bonus for a component with any template capability
pub const TEMPLATE_BONUS: u32 = 50;
/// Progress bonus for a component whose implementation root exists
pub const ROOT_BONUS: u32 = 10;

/// Lifecycle state of one component, recomputed on every run
#[derive(Debug, Clone, Serialize)]
pub struct ComponentWorkflowState {
    pub component_id: String,
    pub blueprint_path: PathBuf,
    pub has_blueprint: bool,
    pub has_implementation_root: bool,
    pub implementation_root: PathBuf,
    pub capabilities: Vec<CapabilitySpecState>,
}

impl ComponentWorkflowState {
    /// State of a component whose blueprint is absent or unusable
    pub fn without_blueprint(
        component_id: impl Into<String>,
        blueprint_path: PathBuf,
        implementation_root: PathBuf,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            blueprint_path,
            has_blueprint: false,
            has_implementation_root: false,
            implementation_root,
            capabilities: Vec::new(),
        }
    }

    pub fn has_status(&self, status: SpecStatus) -> bool {
        self.capabilities.iter().any(|c| c.status == status)
    }

    /// Higher means further along; finishing work in flight ranks first
    pub fn progress_score(&self) -> u32 {
        let mut score = 0;
        if self.has_status(SpecStatus::Planned) {
            score += PLANNED_BONUS;
        }
        if self.has_status(SpecStatus::Template) {
            score += TEMPLATE_BONUS;
        }
        if self.has_implementation_root {
            score += ROOT_BONUS;
        }
        score
    }
}

/// Kind of next step, ordered by intrinsic priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionAction {
    CreateRoot,
    GenerateSpecs,
    CompletePlanning,
    Implement,
}

impl SuggestionAction {
    pub fn priority(&self) -> u8 {
        match self {
            Self::CreateRoot => 1,
            Self::GenerateSpecs => 2,
            Self::CompletePlanning => 3,
            Self::Implement => 4,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CreateRoot => "Create implementation root",
            Self::GenerateSpecs => "Generate specs",
            Self::CompletePlanning => "Complete planning",
            Self::Implement => "Implement",
        }
    }
}

impl std::fmt::Display for SuggestionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One prioritised next step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSuggestion {
    pub component_id: String,
    pub action: SuggestionAction,
    pub message: String,
    /// Command to run, absent for manual steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_path: Option<PathBuf>,
}

impl WorkflowSuggestion {
    pub fn priority(&self) -> u8 {
        self.action.priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability(status: SpecStatus) -> CapabilitySpecState {
        CapabilitySpecState {
            capability_name: "Checkout".to_string(),
            slug: "checkout".to_string(),
            spec_exists: status != SpecStatus::NotGenerated,
            spec_path: PathBuf::from("docs/specs/orders/checkout.spec.md"),
            status,
        }
    }

    fn state(root: bool, statuses: &[SpecStatus]) -> ComponentWorkflowState {
        ComponentWorkflowState {
            component_id: "orders".to_string(),
            blueprint_path: PathBuf::from("architecture/orders.json"),
            has_blueprint: true,
            has_implementation_root: root,
            implementation_root: PathBuf::from("engines/orders"),
            capabilities: statuses.iter().copied().map(capability).collect(),
        }
    }

    #[test]
    fn test_progress_score() {
        assert_eq!(state(false, &[]).progress_score(), 0);
        assert_eq!(state(true, &[SpecStatus::NotGenerated]).progress_score(), 10);
        assert_eq!(state(true, &[SpecStatus::Template]).progress_score(), 60);
        assert_eq!(
            state(true, &[SpecStatus::Template, SpecStatus::Planned]).progress_score(),
            160
        );
    }

    #[test]
    fn test_action_priority_order() {
        assert!(SuggestionAction::CreateRoot < SuggestionAction::GenerateSpecs);
        assert_eq!(SuggestionAction::Implement.priority(), 4);
    }
}
