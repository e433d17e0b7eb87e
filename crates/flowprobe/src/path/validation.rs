//! Step list checks run when a test case is built.

use super::step::Step;
use std::collections::HashMap;
use std::fmt;

/// Severity of a step issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reported, does not block execution
    Warning,
    /// Blocks execution
    Error,
}

/// A problem found in a resolved step list. Step numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum StepIssue {
    /// Warning
    #[error("Step #{step} ('{trigger}') does not have an ID defined")]
    MissingId { step: usize, trigger: String },

    /// Error
    #[error("Step ID '{id}' is not unique (steps {})", format_numbers(.steps))]
    DuplicateId { id: String, steps: Vec<usize> },
}

impl StepIssue {
    /// Issue severity.
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingId { .. } => Severity::Warning,
            Self::DuplicateId { .. } => Severity::Error,
        }
    }
}

fn format_numbers(steps: &[usize]) -> String {
    steps
        .iter()
        .map(|n| format!("#{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of [`validate_steps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathValidation {
    /// Every issue found, warnings included
    pub issues: Vec<StepIssue>,
}

impl PathValidation {
    /// True when no error-level issue was found.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Error-level issues.
    pub fn errors(&self) -> impl Iterator<Item = &StepIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    /// Warning-level issues.
    pub fn warnings(&self) -> impl Iterator<Item = &StepIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }
}

impl fmt::Display for PathValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Check a single step. `number` is the 1-based position used in messages.
pub fn validate_step(number: usize, step: &Step) -> Option<StepIssue> {
    if step.expectations.is_empty() {
        tracing::debug!(trigger = %step.trigger, "Step does not have any expectations");
    }
    step.id.is_none().then(|| StepIssue::MissingId {
        step: number,
        trigger: step.trigger.clone(),
    })
}

/// Check a step list for missing and duplicate identifiers.
pub fn validate_steps(steps: &[Step]) -> PathValidation {
    let mut issues = Vec::new();
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let number = index + 1;
        if let Some(issue) = validate_step(number, step) {
            tracing::warn!("{issue}");
            issues.push(issue);
        }
        if let Some(id) = step.id.as_deref() {
            let entry = positions.entry(id).or_default();
            if entry.is_empty() {
                order.push(id);
            }
            entry.push(number);
        }
    }

    for id in order {
        let numbers = &positions[id];
        if numbers.len() > 1 {
            let issue = StepIssue::DuplicateId {
                id: id.to_string(),
                steps: numbers.clone(),
            };
            tracing::error!("{issue}");
            issues.push(issue);
        }
    }

    let validation = PathValidation { issues };
    if !validation.is_valid() {
        let requested: Vec<String> = steps
            .iter()
            .map(|s| format!("{} ({})", s.trigger, s.id_str()))
            .collect();
        tracing::error!(path = %requested.join(", "), "Errors found in the requested test path");
    }
    validation
}
