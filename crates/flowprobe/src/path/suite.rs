//! Path files: test suites of named test cases.

use super::reference::{CompositionError, ReferentialComposer};
use super::step::{Step, StepDefinition, StepId};
use super::validation::{validate_steps, StepIssue};
use crate::loader::{is_empty_document, nullable, DocumentLoader};
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Path file errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum PathError {
    /// Unreadable file or malformed YAML
    #[error("Failed to parse path file: {0}")]
    ParseError(String),

    #[error("Test suite '{suite}' not found. Known test suites: {}", .known.join(", "))]
    UnknownSuite { suite: String, known: Vec<String> },

    #[error("The test case '{case}' was not found in suite '{suite}'")]
    UnknownCase { suite: String, case: String },

    /// Duplicate step ids in the resolved case
    #[error("Errors found in the path definition of {suite}:{case}:\n{}", format_issues(.issues))]
    InvalidSteps {
        suite: String,
        case: String,
        issues: Vec<StepIssue>,
    },

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

fn format_issues(issues: &[StepIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One test case as written in a path file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCaseDefinition {
    /// Free text shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `<file>:<test_suite>:<test_case>` to inherit steps from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Steps to insert next to a landmark step
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub add_steps: Vec<StepDefinition>,
    /// Replacement data/expectations for steps matched by id
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub mod_steps: Vec<StepDefinition>,
    /// Ids of steps to drop
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub del_steps: Vec<StepId>,
    /// Own steps, or the composed result once resolved
    #[serde(default, deserialize_with = "nullable")]
    pub steps: Vec<StepDefinition>,
}

impl TestCaseDefinition {
    /// Drop the reference and patch directives, leaving the plain steps.
    pub fn strip_directives(&mut self) {
        self.reference = None;
        self.add_steps.clear();
        self.mod_steps.clear();
        self.del_steps.clear();
    }
}

/// A named group of test cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<BTreeMap<String, Option<TestCaseDefinition>>>>",
    into = "BTreeMap<String, BTreeMap<String, TestCaseDefinition>>"
)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Test cases by name
    pub cases: BTreeMap<String, TestCaseDefinition>,
}

impl TryFrom<BTreeMap<String, Option<BTreeMap<String, Option<TestCaseDefinition>>>>> for TestSuite {
    type Error = String;

    fn try_from(
        map: BTreeMap<String, Option<BTreeMap<String, Option<TestCaseDefinition>>>>,
    ) -> Result<Self, Self::Error> {
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((name, cases)), None) => Ok(Self {
                name,
                cases: cases
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(case, definition)| (case, definition.unwrap_or_default()))
                    .collect(),
            }),
            _ => Err("each test suite entry must map exactly one suite name to its test cases".into()),
        }
    }
}

impl From<TestSuite> for BTreeMap<String, BTreeMap<String, TestCaseDefinition>> {
    fn from(suite: TestSuite) -> Self {
        BTreeMap::from([(suite.name, suite.cases)])
    }
}

/// A loaded path file with every referential test case resolved.
#[derive(Debug, Clone)]
pub struct PathFile {
    source: PathBuf,
    suites: Vec<TestSuite>,
}

impl PathFile {
    /// Load and resolve the path file at `path`.
    pub fn load(path: &Path, loader: &dyn DocumentLoader) -> Result<Self, PathError> {
        let document = loader.load(path);
        if is_empty_document(&document) {
            return Err(PathError::ParseError(format!(
                "{}: file is empty or unreadable",
                path.display()
            )));
        }
        Self::from_value(document, path, loader)
    }

    /// Parse and resolve path YAML. References resolve relative to `source`.
    pub fn from_yaml(
        yaml: &str,
        source: &Path,
        loader: &dyn DocumentLoader,
    ) -> Result<Self, PathError> {
        let document: Value =
            serde_yaml_ng::from_str(yaml).map_err(|e| PathError::ParseError(e.to_string()))?;
        Self::from_value(document, source, loader)
    }

    fn from_value(
        document: Value,
        source: &Path,
        loader: &dyn DocumentLoader,
    ) -> Result<Self, PathError> {
        let mut suites: Vec<TestSuite> = serde_yaml_ng::from_value(document)
            .map_err(|e| PathError::ParseError(format!("{}: {e}", source.display())))?;

        let resolved = ReferentialComposer::new(loader, source).resolve(&mut suites)?;
        tracing::debug!(file = %source.display(), suites = suites.len(), resolved, "Loaded path file");

        Ok(Self {
            source: source.to_path_buf(),
            suites,
        })
    }

    /// File the suites were loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Resolved test suites.
    pub fn test_suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Suite names in file order.
    pub fn suites(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.name.as_str()).collect()
    }

    fn suite(&self, suite: &str) -> Result<&TestSuite, PathError> {
        self.suites
            .iter()
            .find(|s| s.name == suite)
            .ok_or_else(|| PathError::UnknownSuite {
                suite: suite.to_string(),
                known: self.suites().into_iter().map(String::from).collect(),
            })
    }

    /// Test case names of `suite`.
    pub fn cases(&self, suite: &str) -> Result<Vec<&str>, PathError> {
        Ok(self.suite(suite)?.cases.keys().map(String::as_str).collect())
    }

    /// Resolved definition of `suite:case`.
    pub fn case(&self, suite: &str, case: &str) -> Result<&TestCaseDefinition, PathError> {
        self.suite(suite)?
            .cases
            .get(case)
            .ok_or_else(|| PathError::UnknownCase {
                suite: suite.to_string(),
                case: case.to_string(),
            })
    }

    /// Build the executable step list for `suite:case`.
    ///
    /// Duplicate step ids fail the build; missing ids are only logged.
    pub fn build_test_case(&self, suite: &str, case: &str) -> Result<Vec<Step>, PathError> {
        let definition = self.case(suite, case).map_err(|e| {
            tracing::error!("{e}");
            e
        })?;
        let steps: Vec<Step> = definition.steps.iter().map(Step::from).collect();

        let validation = validate_steps(&steps);
        if !validation.is_valid() {
            return Err(PathError::InvalidSteps {
                suite: suite.to_string(),
                case: case.to_string(),
                issues: validation.errors().cloned().collect(),
            });
        }
        Ok(steps)
    }

    /// Sorted listing of suites and their test cases, optionally limited to
    /// one suite.
    pub fn list_test_info(&self, suite: Option<&str>) -> String {
        let header = format!(
            "List of Test Suites & Test Cases in '{}':",
            self.source.display()
        );
        let mut out = format!("{header}\n{}", "-".repeat(header.len()));

        let mut names = self.suites();
        names.sort_unstable();
        let mut found = false;
        for name in names {
            if suite.is_some_and(|wanted| wanted != name) {
                continue;
            }
            found = true;
            let mut cases = self.cases(name).unwrap_or_default();
            cases.sort_unstable();
            let _ = write!(out, "\n{name}:");
            for case in cases {
                let _ = write!(out, "\n\t{case}");
            }
        }

        if !found {
            let _ = write!(
                out,
                "\nTest suite '{}' not found.\nKnown test suites: {}",
                suite.unwrap_or_default(),
                self.suites().join(", ")
            );
        }
        out.push('\n');
        out
    }

    /// Serialize the resolved document. Unless `full`, references and patch
    /// directives are stripped so the output stands alone.
    pub fn to_yaml(&self, full: bool) -> Result<String, PathError> {
        let mut suites = self.suites.clone();
        if !full {
            for case in suites.iter_mut().flat_map(|s| s.cases.values_mut()) {
                case.strip_directives();
            }
        }
        serde_yaml_ng::to_string(&suites).map_err(|e| PathError::ParseError(e.to_string()))
    }
}
