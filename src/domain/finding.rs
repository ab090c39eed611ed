//! Conformance findings and the report that collects them.

use crate::error::ConformanceError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fail,
    Warn,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fail => "FAIL",
            Self::Warn => "WARN",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    BaseClass,
    Immutability,
    Wiring,
    Drift,
    Missing,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseClass => "baseClass",
            Self::Immutability => "immutability",
            Self::Wiring => "wiring",
            Self::Drift => "drift",
            Self::Missing => "missing",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured result of comparing blueprint and implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceFinding {
    pub severity: Severity,
    pub category: Category,
    pub subject_name: String,
    pub message: String,
    /// Full name set behind a drift or missing finding
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl ConformanceFinding {
    pub fn fail(category: Category, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fail,
            category,
            subject_name: subject.into(),
            message: message.into(),
            names: Vec::new(),
        }
    }

    pub fn warn(category: Category, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            ..Self::fail(category, subject, message)
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Fail
    }
}

impl std::fmt::Display for ConformanceFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity, self.category, self.subject_name, self.message
        )
    }
}

/// Findings from one conformance run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConformanceReport {
    pub findings: Vec<ConformanceFinding>,
}

impl ConformanceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: ConformanceFinding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = ConformanceFinding>) {
        self.findings.extend(findings);
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConformanceFinding> {
        self.findings.iter().filter(|f| f.is_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConformanceFinding> {
        self.findings.iter().filter(|f| !f.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Order findings by category then subject
    pub fn sort(&mut self) {
        self.findings.sort_by(|a, b| {
            (a.category, &a.subject_name, a.severity).cmp(&(b.category, &b.subject_name, b.severity))
        });
    }

    /// Assertion form: any `fail` finding turns the report into an error
    pub fn into_result(self) -> Result<Self, ConformanceError> {
        let count = self.failures().count();
        if count > 0 {
            Err(ConformanceError::Failed {
                count,
                report: self,
            })
        } else {
            Ok(self)
        }
    }
}

impl std::fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{finding}")?;
            if !finding.names.is_empty() {
                writeln!(f, "    {}", finding.names.join(", "))?;
            }
        }
        Ok(())
    }
}
