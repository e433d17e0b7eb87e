//! Starter YAML files for new state models and path files.
//!
//! Templates are filled with `<placeholder>` strings and are meant to be
//! edited by hand; they do not load as-is.

use crate::model::MULTI_TRIGGERS_KEY;
use serde_yaml_ng::{Mapping, Value};
use std::path::{Path, PathBuf};

/// File extension added to template file names that lack it.
pub const EXTENSION: &str = ".yaml";

/// Transitions per templated state.
pub const TRANSITIONS_PER_STATE: usize = 4;

/// Validations per templated state.
pub const VALIDATIONS_PER_STATE: usize = 2;

/// Entries in the templated multi-trigger section.
pub const MULTI_TRIGGER_ENTRIES: usize = 2;

/// Suites in a path template.
pub const PATH_SUITES: usize = 2;

/// Steps per templated test case.
pub const STEPS_PER_CASE: usize = 5;

const ROUTINE: &str = "<dotted.path.to.routine>";
const DESCRIPTION: &str = "<description>";
const NAME: &str = "<name>";
const STATE: &str = "<state_name>";
const TRIGGER: &str = "<trigger_name>";

/// Errors from building or writing a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// YAML serialization failed
    #[error("Failed to serialize template: {0}")]
    Serialize(String),

    /// The template file could not be written
    #[error("Failed to write template '{path}': {source}")]
    Io {
        /// Target file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let mut map = Mapping::new();
    for (key, value) in entries {
        map.insert(Value::from(key), value);
    }
    Value::Mapping(map)
}

fn text(value: &str) -> Value {
    Value::from(value)
}

fn to_yaml(value: &Value) -> Result<String, TemplateError> {
    serde_yaml_ng::to_string(value).map_err(|e| TemplateError::Serialize(e.to_string()))
}

/// Template for a state model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTemplate {
    states: usize,
    multi_trigger: bool,
}

impl ModelTemplate {
    /// Template with `states` states (at least one).
    #[must_use]
    pub fn new(states: usize) -> Self {
        Self {
            states: states.max(1),
            multi_trigger: false,
        }
    }

    /// Include a `__MULTI_TRIGGERS__` section.
    #[must_use]
    pub fn with_multi_trigger(mut self, multi_trigger: bool) -> Self {
        self.multi_trigger = multi_trigger;
        self
    }

    /// Number of templated states.
    pub fn states(&self) -> usize {
        self.states
    }

    /// Build the template document.
    pub fn build(&self) -> Value {
        let validation = || mapping([("name", text(NAME)), ("routine", text(ROUTINE))]);
        let transition = || {
            mapping([
                ("trigger_name", text(TRIGGER)),
                ("destination_state", text(STATE)),
                ("routine_to_change_state", text(ROUTINE)),
            ])
        };

        let mut definition: Vec<Value> = (1..=self.states)
            .map(|number| {
                let body = mapping([
                    ("description", text(DESCRIPTION)),
                    (
                        "validations",
                        Value::Sequence((0..VALIDATIONS_PER_STATE).map(|_| validation()).collect()),
                    ),
                    (
                        "transitions",
                        Value::Sequence((0..TRANSITIONS_PER_STATE).map(|_| transition()).collect()),
                    ),
                ]);
                mapping([(format!("STATE_{number}").as_str(), body)])
            })
            .collect();

        if self.multi_trigger {
            let entry = || {
                mapping([
                    ("trigger_name", text(TRIGGER)),
                    ("description", text(DESCRIPTION)),
                    ("routine_to_change_state", text(ROUTINE)),
                    ("destination_state", text(STATE)),
                    ("source_states", text("<Wildcard ('*') or list of states>")),
                ])
            };
            definition.push(mapping([(
                MULTI_TRIGGERS_KEY,
                Value::Sequence((0..MULTI_TRIGGER_ENTRIES).map(|_| entry()).collect()),
            )]));
        }

        mapping([
            ("model", text(NAME)),
            ("description", text("<model description>")),
            ("initial_state", text(STATE)),
            ("definition", Value::Sequence(definition)),
        ])
    }

    /// Render the template as YAML.
    pub fn to_yaml(&self) -> Result<String, TemplateError> {
        to_yaml(&self.build())
    }
}

/// Template for a path file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate {
    cases: usize,
}

impl PathTemplate {
    /// Template with `cases` test cases in each suite.
    #[must_use]
    pub fn new(cases: usize) -> Self {
        Self { cases }
    }

    /// Build the template document.
    pub fn build(&self) -> Value {
        let step = |number: usize| {
            let data = mapping([("<arg_1>", text("<value>")), ("<arg_2>", text("<value>"))]);
            let expectations = mapping([
                ("<validation_id_1>", text("<boolean result>")),
                ("<validation_id_2>", text("<boolean result>")),
            ]);
            let body = mapping([
                ("id", text("<unique_step_id>")),
                ("data", data),
                ("expectations", expectations),
            ]);
            mapping([(format!("<step_name_{number}>").as_str(), body)])
        };

        let suites = (1..=PATH_SUITES)
            .map(|suite| {
                let mut cases = Mapping::new();
                for case in 1..=self.cases {
                    let body = mapping([
                        ("description", text(DESCRIPTION)),
                        ("steps", Value::Sequence((1..=STEPS_PER_CASE).map(step).collect())),
                    ]);
                    cases.insert(Value::from(format!("<test_name_{case}>")), body);
                }
                mapping([(format!("<test_suite_{suite}>").as_str(), Value::Mapping(cases))])
            })
            .collect();
        Value::Sequence(suites)
    }

    /// Render the template as YAML.
    pub fn to_yaml(&self) -> Result<String, TemplateError> {
        to_yaml(&self.build())
    }
}

/// `path` with `.yaml` appended unless it already ends with it.
pub fn template_path(path: &Path) -> PathBuf {
    let name = path.to_string_lossy();
    if name.to_lowercase().ends_with(EXTENSION) {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{name}{EXTENSION}"))
    }
}

/// Write `yaml` to `path` (with the extension fixed up), returning the file
/// actually written.
pub fn write_template(yaml: &str, path: &Path) -> Result<PathBuf, TemplateError> {
    let target = template_path(path);
    std::fs::write(&target, yaml).map_err(|source| TemplateError::Io {
        path: target.clone(),
        source,
    })?;
    tracing::info!(path = %target.display(), "Wrote template");
    Ok(target)
}
