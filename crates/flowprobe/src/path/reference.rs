//! Referential test cases.
//!
//! A test case may inherit the steps of a test case in another file and
//! then patch them:
//!
//! ```yaml
//! - smoke:
//!     reboot_twice:
//!       reference: "base_paths.yaml:smoke:reboot"
//!       add_steps:
//!         - reboot: {id: R2, after_id: 4}
//!       mod_steps:
//!         - create: {id: 1, data: {flavor: 4}}
//!       del_steps: [6]
//! ```
//!
//! Directives are always applied ADD, then MODIFY, then DELETE. Step ids are
//! compared in their string form.

use super::step::{StepDefinition, StepId};
use super::suite::TestSuite;
use crate::loader::{is_empty_document, DocumentLoader};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Separator between the parts of a reference string.
pub const REFERENCE_DELIMITER: char = ':';

const ADD_DIRECTIVE: &str = "add_steps";
const MOD_DIRECTIVE: &str = "mod_steps";

/// Errors raised while composing a referential test case. `suite` and
/// `case` always name the test case being composed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum CompositionError {
    #[error("{suite}:{case}: unable to split reference '{reference}' using delimiter '{REFERENCE_DELIMITER}' (expected <file>:<test_suite>:<test_case>)")]
    ReferenceParse {
        suite: String,
        case: String,
        reference: String,
    },

    #[error("{suite}:{case}: referenced test case '{ref_suite}:{ref_case}' not found in '{file}'")]
    ReferenceNotFound {
        suite: String,
        case: String,
        file: String,
        ref_suite: String,
        ref_case: String,
    },

    #[error("{suite}:{case}: {directive} entry for trigger '{trigger}' has no id")]
    MissingStepId {
        suite: String,
        case: String,
        directive: &'static str,
        trigger: String,
    },

    #[error("{suite}:{case}: step ids already exist: {}", .ids.join(", "))]
    IdAlreadyExists {
        suite: String,
        case: String,
        ids: Vec<String>,
    },

    #[error("{suite}:{case}: {directive} refers to undefined step ids: {}", .ids.join(", "))]
    UndefinedId {
        suite: String,
        case: String,
        directive: &'static str,
        ids: Vec<String>,
    },

    #[error("{suite}:{case}: cannot delete undefined step ids: {}", .ids.join(", "))]
    UndefinedStep {
        suite: String,
        case: String,
        ids: Vec<String>,
    },

    #[error("{suite}:{case}: added step '{id}' has neither before_id nor after_id")]
    MissingLandmark {
        suite: String,
        case: String,
        id: String,
    },
}

/// A parsed `<file>:<test_suite>:<test_case>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Referenced file, relative to the referencing file's directory
    pub file: String,
    /// Referenced test suite
    pub suite: String,
    /// Referenced test case
    pub case: String,
}

/// A reference string that does not have three non-empty parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid reference '{0}'")]
pub struct InvalidReference(pub String);

impl FromStr for Reference {
    type Err = InvalidReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(REFERENCE_DELIMITER).map(str::trim).collect();
        match parts.as_slice() {
            [file, suite, case] if !file.is_empty() && !suite.is_empty() && !case.is_empty() => {
                Ok(Self {
                    file: (*file).to_string(),
                    suite: (*suite).to_string(),
                    case: (*case).to_string(),
                })
            }
            _ => Err(InvalidReference(s.to_string())),
        }
    }
}

/// Applies add/modify/delete directives to one test case's step list.
#[derive(Debug, Clone)]
pub struct StepSplicer {
    suite: String,
    case: String,
    steps: Vec<StepDefinition>,
}

impl StepSplicer {
    /// Start from the (referenced) step list of `suite:case`.
    pub fn new(
        suite: impl Into<String>,
        case: impl Into<String>,
        steps: Vec<StepDefinition>,
    ) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
            steps,
        }
    }

    /// Current steps.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Finish and return the steps.
    pub fn into_steps(self) -> Vec<StepDefinition> {
        self.steps
    }

    /// Current step ids in list order.
    pub fn ids(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| step.id().map(StepId::as_str))
            .collect()
    }

    fn id_map(&self) -> HashMap<String, usize> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| step.id().map(|id| (id.as_str().to_string(), index)))
            .collect()
    }

    fn require_id<'s>(
        &self,
        directive: &'static str,
        step: &'s StepDefinition,
    ) -> Result<&'s str, CompositionError> {
        step.id()
            .map(StepId::as_str)
            .ok_or_else(|| CompositionError::MissingStepId {
                suite: self.suite.clone(),
                case: self.case.clone(),
                directive,
                trigger: step.trigger.clone(),
            })
    }

    /// Insert new steps relative to existing (or already inserted) ids.
    ///
    /// When a directive names both landmarks, `after_id` decides placement.
    pub fn add(&mut self, directives: &[StepDefinition]) -> Result<(), CompositionError> {
        if directives.is_empty() {
            return Ok(());
        }

        let mut added = Vec::with_capacity(directives.len());
        for directive in directives {
            added.push(self.require_id(ADD_DIRECTIVE, directive)?.to_string());
        }

        let mut seen = HashSet::new();
        let mut duplicates: BTreeSet<String> = added
            .iter()
            .filter(|id| !seen.insert(id.as_str()))
            .cloned()
            .collect();
        let mapping = self.id_map();
        duplicates.extend(added.iter().filter(|id| mapping.contains_key(*id)).cloned());
        if !duplicates.is_empty() {
            return Err(CompositionError::IdAlreadyExists {
                suite: self.suite.clone(),
                case: self.case.clone(),
                ids: duplicates.into_iter().collect(),
            });
        }

        let undefined: BTreeSet<String> = directives
            .iter()
            .flat_map(|d| [d.body.before_id.as_ref(), d.body.after_id.as_ref()])
            .flatten()
            .map(|id| id.as_str().to_string())
            .filter(|id| !mapping.contains_key(id) && !added.contains(id))
            .collect();
        if !undefined.is_empty() {
            return Err(self.undefined(ADD_DIRECTIVE, undefined));
        }

        let mut placements = Vec::with_capacity(directives.len());
        for (position, (directive, id)) in directives.iter().zip(&added).enumerate() {
            let (landmark, offset) = match (&directive.body.after_id, &directive.body.before_id) {
                (Some(after), _) => (after.as_str(), 1),
                (None, Some(before)) => (before.as_str(), 0),
                (None, None) => {
                    return Err(CompositionError::MissingLandmark {
                        suite: self.suite.clone(),
                        case: self.case.clone(),
                        id: id.clone(),
                    })
                }
            };
            if !mapping.contains_key(landmark) && !added[..position].iter().any(|a| a == landmark) {
                return Err(self.undefined(ADD_DIRECTIVE, [landmark.to_string()]));
            }
            placements.push((landmark, offset));
        }

        tracing::debug!(suite = %self.suite, case = %self.case, ids = %added.join(", "), "Adding steps");

        let mut mapping = mapping;
        for ((directive, id), (landmark, offset)) in directives.iter().zip(&added).zip(placements) {
            let Some(&index) = mapping.get(landmark) else {
                return Err(self.undefined(ADD_DIRECTIVE, [landmark.to_string()]));
            };

            let mut step = directive.clone();
            step.body.before_id = None;
            step.body.after_id = None;
            tracing::debug!(id = %id, landmark = %landmark, index = index + offset, "Inserting step");
            self.steps.insert(index + offset, step);
            mapping = self.id_map();
        }
        Ok(())
    }

    /// Replace existing steps by id, keeping each step's original trigger.
    pub fn modify(&mut self, directives: &[StepDefinition]) -> Result<(), CompositionError> {
        if directives.is_empty() {
            return Ok(());
        }

        let mapping = self.id_map();
        let mut targets = Vec::with_capacity(directives.len());
        for directive in directives {
            targets.push(self.require_id(MOD_DIRECTIVE, directive)?.to_string());
        }
        let undefined: BTreeSet<String> = targets
            .iter()
            .filter(|id| !mapping.contains_key(*id))
            .cloned()
            .collect();
        if !undefined.is_empty() {
            return Err(self.undefined(MOD_DIRECTIVE, undefined));
        }

        for (directive, id) in directives.iter().zip(&targets) {
            let index = mapping[id];
            let original = &mut self.steps[index];
            if original.trigger != directive.trigger {
                tracing::warn!(
                    suite = %self.suite,
                    case = %self.case,
                    id = %id,
                    requested = %directive.trigger,
                    "Trigger name does not match the referenced step; using reference target name: {} (list index: {index})",
                    original.trigger
                );
            }
            original.body = directive.body.clone();
        }
        Ok(())
    }

    /// Remove steps by id. Repeated ids are removed once.
    pub fn delete(&mut self, ids: &[StepId]) -> Result<(), CompositionError> {
        let requested: BTreeSet<&str> = ids.iter().map(StepId::as_str).collect();
        if requested.is_empty() {
            return Ok(());
        }

        let mapping = self.id_map();
        let undefined: Vec<String> = requested
            .iter()
            .filter(|id| !mapping.contains_key(**id))
            .map(|id| (*id).to_string())
            .collect();
        if !undefined.is_empty() {
            return Err(CompositionError::UndefinedStep {
                suite: self.suite.clone(),
                case: self.case.clone(),
                ids: undefined,
            });
        }

        let mut indices: Vec<usize> = requested.iter().map(|id| mapping[*id]).collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in indices {
            let removed = self.steps.remove(index);
            tracing::debug!(index, trigger = %removed.trigger, "Removed step");
        }
        Ok(())
    }

    fn undefined(
        &self,
        directive: &'static str,
        ids: impl IntoIterator<Item = String>,
    ) -> CompositionError {
        CompositionError::UndefinedId {
            suite: self.suite.clone(),
            case: self.case.clone(),
            directive,
            ids: ids.into_iter().collect(),
        }
    }
}

/// Resolves every referential test case in a path file.
pub struct ReferentialComposer<'a> {
    loader: &'a dyn DocumentLoader,
    base_dir: PathBuf,
    span: tracing::Span,
}

impl<'a> ReferentialComposer<'a> {
    /// Create a composer for the file at `source_file`; references are
    /// resolved relative to its directory.
    pub fn new(loader: &'a dyn DocumentLoader, source_file: &Path) -> Self {
        let base_dir = source_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            loader,
            base_dir,
            span: tracing::info_span!("composer", file = %source_file.display()),
        }
    }

    /// Use a caller-provided logging span.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Replace the steps of every referencing test case with the composed
    /// step list. Returns the number of test cases resolved.
    pub fn resolve(&self, suites: &mut [TestSuite]) -> Result<usize, CompositionError> {
        let _guard = self.span.enter();
        let mut resolved = 0;

        for suite in suites.iter_mut() {
            for (case_name, case) in &mut suite.cases {
                let Some(reference) = case.reference.as_deref() else {
                    continue;
                };
                let reference: Reference = reference.parse().map_err(|InvalidReference(raw)| {
                    tracing::error!(suite = %suite.name, case = %case_name, reference = %raw, "Unable to parse reference");
                    CompositionError::ReferenceParse {
                        suite: suite.name.clone(),
                        case: case_name.clone(),
                        reference: raw,
                    }
                })?;

                let steps = self.referenced_steps(&suite.name, case_name, &reference)?;
                let mut splicer = StepSplicer::new(suite.name.clone(), case_name.clone(), steps);
                splicer.add(&case.add_steps)?;
                splicer.modify(&case.mod_steps)?;
                splicer.delete(&case.del_steps)?;
                case.steps = splicer.into_steps();

                tracing::info!(
                    suite = %suite.name,
                    case = %case_name,
                    reference = %format!("{}:{}:{}", reference.file, reference.suite, reference.case),
                    steps = case.steps.len(),
                    "Resolved referenced test case"
                );
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    fn referenced_steps(
        &self,
        suite: &str,
        case: &str,
        reference: &Reference,
    ) -> Result<Vec<StepDefinition>, CompositionError> {
        let path = self.base_dir.join(&reference.file);
        let not_found = || CompositionError::ReferenceNotFound {
            suite: suite.to_string(),
            case: case.to_string(),
            file: path.display().to_string(),
            ref_suite: reference.suite.clone(),
            ref_case: reference.case.clone(),
        };

        let document = self.loader.load(&path);
        if is_empty_document(&document) {
            tracing::error!(file = %path.display(), "Referenced file is empty or unreadable");
            return Err(not_found());
        }
        let suites: Vec<TestSuite> = serde_yaml_ng::from_value(document).map_err(|e| {
            tracing::error!(file = %path.display(), error = %e, "Referenced file is not a path file");
            not_found()
        })?;

        suites
            .into_iter()
            .find(|s| s.name == reference.suite)
            .and_then(|mut s| s.cases.remove(&reference.case))
            .map(|c| c.steps)
            .ok_or_else(|| {
                tracing::error!(
                    file = %path.display(),
                    suite = %reference.suite,
                    case = %reference.case,
                    "Requested test case not found"
                );
                not_found()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::path::step::StepBody;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    fn step(trigger: &str, id: &str) -> StepDefinition {
        StepDefinition::new(
            trigger,
            StepBody {
                id: Some(StepId::new(id)),
                ..StepBody::default()
            },
        )
    }

    fn add_before(trigger: &str, id: &str, before: &str) -> StepDefinition {
        let mut s = step(trigger, id);
        s.body.before_id = Some(StepId::new(before));
        s
    }

    fn add_after(trigger: &str, id: &str, after: &str) -> StepDefinition {
        let mut s = step(trigger, id);
        s.body.after_id = Some(StepId::new(after));
        s
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn splicer() -> StepSplicer {
        StepSplicer::new(
            "suite",
            "case",
            vec![step("a", "1"), step("b", "2"), step("c", "3")],
        )
    }

    #[test]
    fn test_reference_parse() {
        let reference: Reference = " base.yaml : smoke : reboot ".parse().expect("parse");
        assert_eq!(reference.file, "base.yaml");
        assert_eq!(reference.suite, "smoke");
        assert_eq!(reference.case, "reboot");
    }

    #[test]
    fn test_reference_parse_rejects_malformed() {
        for bad in ["base.yaml:smoke", "a:b:c:d", "base.yaml::reboot", ""] {
            assert!(bad.parse::<Reference>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_add_before() {
        let mut splicer = splicer();
        splicer
            .add(&[add_before("x", "ADDED_1", "2")])
            .expect("add");
        assert_eq!(splicer.ids(), vec!["1", "ADDED_1", "2", "3"]);
        let added = &splicer.steps()[1];
        assert!(added.body.before_id.is_none());
        assert!(added.body.after_id.is_none());
    }

    #[test]
    fn test_add_after() {
        let mut splicer = splicer();
        splicer.add(&[add_after("x", "A", "3")]).expect("add");
        assert_eq!(splicer.ids(), vec!["1", "2", "3", "A"]);
    }

    #[test]
    fn test_after_wins_over_before() {
        let mut directive = add_before("x", "A", "1");
        directive.body.after_id = Some(StepId::new("3"));
        let mut splicer = splicer();
        splicer.add(&[directive]).expect("add");
        assert_eq!(splicer.ids(), vec!["1", "2", "3", "A"]);
    }

    #[test]
    fn test_add_relative_to_added_step() {
        let mut splicer = splicer();
        splicer
            .add(&[add_after("x", "A", "1"), add_after("y", "B", "A")])
            .expect("add");
        assert_eq!(splicer.ids(), vec!["1", "A", "B", "2", "3"]);
    }

    #[test]
    fn test_add_relative_to_later_added_step_fails() {
        let mut splicer = splicer();
        let err = splicer
            .add(&[add_after("y", "B", "A"), add_after("x", "A", "1")])
            .expect_err("landmark not yet inserted");
        assert!(matches!(err, CompositionError::UndefinedId { ids, .. } if ids == vec!["A"]));
        assert_eq!(splicer.ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_add_existing_id_fails() {
        let mut splicer = splicer();
        let err = splicer.add(&[add_after("x", "2", "1")]).expect_err("dup");
        assert!(matches!(err, CompositionError::IdAlreadyExists { ids, .. } if ids == vec!["2"]));
    }

    #[test]
    fn test_add_duplicate_in_batch_fails() {
        let mut splicer = splicer();
        let err = splicer
            .add(&[add_after("x", "A", "1"), add_before("y", "A", "3")])
            .expect_err("dup");
        assert!(matches!(err, CompositionError::IdAlreadyExists { ids, .. } if ids == vec!["A"]));
    }

    #[test]
    fn test_add_undefined_landmark_fails() {
        let mut splicer = splicer();
        let err = splicer.add(&[add_after("x", "A", "9")]).expect_err("undefined");
        assert!(matches!(
            err,
            CompositionError::UndefinedId { directive: "add_steps", ids, .. } if ids == vec!["9"]
        ));
    }

    #[test]
    fn test_add_missing_landmark_fails() {
        let mut splicer = splicer();
        let err = splicer.add(&[step("x", "A")]).expect_err("no landmark");
        assert!(matches!(err, CompositionError::MissingLandmark { id, .. } if id == "A"));
        assert_eq!(splicer.ids(), vec!["1", "2", "3"]);

        let err = splicer
            .add(&[add_after("y", "B", "1"), step("x", "A")])
            .expect_err("second directive has no landmark");
        assert!(matches!(err, CompositionError::MissingLandmark { id, .. } if id == "A"));
        assert_eq!(splicer.ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_add_missing_id_fails() {
        let mut splicer = splicer();
        let directive = StepDefinition::new(
            "x",
            StepBody {
                after_id: Some(StepId::new("1")),
                ..StepBody::default()
            },
        );
        let err = splicer.add(&[directive]).expect_err("no id");
        assert!(matches!(err, CompositionError::MissingStepId { trigger, .. } if trigger == "x"));
    }

    #[test]
    fn test_modify_keeps_trigger_name() {
        let mut splicer = splicer();
        let mut directive = step("renamed", "2");
        directive.body.description = Some("updated".into());

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, || splicer.modify(&[directive]))
            .expect("modify");

        let modified = &splicer.steps()[1];
        assert_eq!(modified.trigger, "b");
        assert_eq!(modified.body.description.as_deref(), Some("updated"));

        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("using reference target name: b"));
        assert!(output.contains("requested=renamed"));
    }

    #[test]
    fn test_modify_matching_trigger_logs_nothing() {
        let mut splicer = splicer();
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, || splicer.modify(&[step("b", "2")]))
            .expect("modify");
        assert!(logs.contents().is_empty());
    }

    #[test]
    fn test_modify_undefined_fails() {
        let mut splicer = splicer();
        let err = splicer.modify(&[step("b", "7")]).expect_err("undefined");
        assert!(matches!(
            err,
            CompositionError::UndefinedId { directive: "mod_steps", ids, .. } if ids == vec!["7"]
        ));
    }

    #[test]
    fn test_delete_dedupes() {
        let mut splicer = splicer();
        splicer
            .delete(&[StepId::new("3"), StepId::new("3"), StepId::new("1")])
            .expect("delete");
        assert_eq!(splicer.ids(), vec!["2"]);
    }

    #[test]
    fn test_delete_undefined_fails() {
        let mut splicer = splicer();
        let err = splicer
            .delete(&[StepId::new("1"), StepId::new("9")])
            .expect_err("undefined");
        assert!(matches!(err, CompositionError::UndefinedStep { ids, .. } if ids == vec!["9"]));
        assert_eq!(splicer.ids(), vec!["1", "2", "3"]);
    }

    const BASE: &str = r"
- smoke:
    reboot:
      steps:
        - create: {id: 1}
        - build: {id: 2}
        - reboot: {id: 3}
";

    #[test]
    fn test_composer_resolves_reference() {
        let loader = MemoryLoader::new().with_document("/paths/base.yaml", BASE);
        let mut suites: Vec<TestSuite> = serde_yaml_ng::from_str(
            r"
- derived:
    twice:
      reference: base.yaml:smoke:reboot
      add_steps:
        - reboot: {id: R2, after_id: 3}
      mod_steps:
        - create: {id: 1, data: {flavor: 4}}
      del_steps: [2]
",
        )
        .expect("parse");

        let composer = ReferentialComposer::new(&loader, Path::new("/paths/derived.yaml"));
        assert_eq!(composer.resolve(&mut suites).expect("resolve"), 1);

        let steps = &suites[0].cases["twice"].steps;
        let ids: Vec<_> = steps.iter().filter_map(|s| s.id()).map(StepId::as_str).collect();
        assert_eq!(ids, vec!["1", "3", "R2"]);
        assert!(steps[0].body.data.is_some());
    }

    #[test]
    fn test_composer_missing_case() {
        let loader = MemoryLoader::new().with_document("/paths/base.yaml", BASE);
        let mut suites: Vec<TestSuite> =
            serde_yaml_ng::from_str("- derived:\n    x:\n      reference: base.yaml:smoke:nope\n")
                .expect("parse");
        let composer = ReferentialComposer::new(&loader, Path::new("/paths/derived.yaml"));
        let err = composer.resolve(&mut suites).expect_err("missing");
        assert!(matches!(err, CompositionError::ReferenceNotFound { ref_case, .. } if ref_case == "nope"));
    }

    #[test]
    fn test_composer_missing_file() {
        let loader = MemoryLoader::new();
        let mut suites: Vec<TestSuite> =
            serde_yaml_ng::from_str("- derived:\n    x:\n      reference: base.yaml:smoke:reboot\n")
                .expect("parse");
        let composer = ReferentialComposer::new(&loader, Path::new("/paths/derived.yaml"));
        assert!(matches!(
            composer.resolve(&mut suites),
            Err(CompositionError::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn test_composer_bad_reference() {
        let loader = MemoryLoader::new();
        let mut suites: Vec<TestSuite> =
            serde_yaml_ng::from_str("- derived:\n    x:\n      reference: base.yaml-smoke\n")
                .expect("parse");
        let composer = ReferentialComposer::new(&loader, Path::new("derived.yaml"));
        let err = composer.resolve(&mut suites).expect_err("parse");
        assert!(matches!(
            err,
            CompositionError::ReferenceParse { suite, case, .. } if suite == "derived" && case == "x"
        ));
    }

    fn base_steps(n: usize) -> Vec<StepDefinition> {
        (0..n).map(|i| step("t", &i.to_string())).collect()
    }

    proptest! {
        #[test]
        fn prop_add_places_each_step_next_to_its_landmark(
            n in 1usize..10,
            raw in proptest::collection::vec((0usize..10, any::<bool>()), 0..10),
        ) {
            let mut seen = HashSet::new();
            let picks: Vec<(usize, bool)> = raw
                .into_iter()
                .map(|(i, after)| (i % n, after))
                .filter(|pick| seen.insert(*pick))
                .collect();
            let directives: Vec<StepDefinition> = picks
                .iter()
                .enumerate()
                .map(|(k, (landmark, after))| {
                    let id = format!("A{k}");
                    let landmark = landmark.to_string();
                    if *after { add_after("x", &id, &landmark) } else { add_before("x", &id, &landmark) }
                })
                .collect();

            let mut splicer = StepSplicer::new("s", "c", base_steps(n));
            splicer.add(&directives).expect("add");
            let ids = splicer.ids();
            prop_assert_eq!(ids.len(), n + directives.len());

            for (k, (landmark, after)) in picks.iter().enumerate() {
                let id = format!("A{k}");
                let landmark = landmark.to_string();
                let pos = ids.iter().position(|x| *x == id).expect("added");
                let mark = ids.iter().position(|x| *x == landmark).expect("landmark");
                if *after {
                    prop_assert_eq!(pos, mark + 1);
                } else {
                    prop_assert_eq!(pos + 1, mark);
                }
            }
        }

        #[test]
        fn prop_delete_with_duplicates_is_idempotent(
            n in 1usize..10,
            raw in proptest::collection::vec(0usize..10, 0..12),
        ) {
            let requested: Vec<StepId> = raw.iter().map(|i| StepId::new((i % n).to_string())).collect();
            let unique: BTreeSet<&str> = requested.iter().map(StepId::as_str).collect();

            let mut splicer = StepSplicer::new("s", "c", base_steps(n));
            splicer.delete(&requested).expect("delete");
            let ids = splicer.ids();
            prop_assert_eq!(ids.len(), n - unique.len());
            prop_assert!(ids.iter().all(|id| !unique.contains(id)));
        }
    }
}
