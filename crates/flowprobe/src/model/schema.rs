//! State model YAML schema.
//!
//! A model names its initial state and lists state definitions, each with
//! validations and outgoing transitions. A reserved `__MULTI_TRIGGERS__`
//! entry carries transitions whose source is a set of states.

use super::validate::{ModelIssue, ModelValidator};
use crate::loader::{nullable, nullable_seq};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Definition key holding multi-source transitions.
pub const MULTI_TRIGGERS_KEY: &str = "__MULTI_TRIGGERS__";

/// Prefix/suffix marking definition entries that are not states.
pub const NON_STATE_MARKER: &str = "__";

/// Routine placeholder meaning "no callback".
pub const NO_ROUTINE: &str = "None";

/// Source-state tokens that select every defined state.
pub const WILDCARD_TOKENS: [&str; 2] = ["*", "="];

/// Parsed state machine definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStateModel", into = "RawStateModel")]
pub struct StateModel {
    name: String,
    description: Option<String>,
    initial_state: String,
    states: Vec<(String, StateDefinition)>,
    multi_triggers: Vec<MultiTransitionDefinition>,
}

/// Per-state definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Human-readable description
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Validations run after entering this state, in declared order
    #[serde(default, deserialize_with = "nullable_seq")]
    pub validations: Vec<ValidationDefinition>,
    /// Outgoing transitions; empty means the state is terminal
    #[serde(default, deserialize_with = "nullable_seq")]
    pub transitions: Vec<TransitionDefinition>,
}

/// Validation attached to a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDefinition {
    /// Validation identifier, referenced by step expectations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Registered validator routine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine: Option<String>,
}

/// Single-source transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    /// Trigger name (unique within the source state)
    pub trigger_name: String,
    /// Destination state name; missing values are reported by validation
    #[serde(default, deserialize_with = "nullable")]
    pub destination_state: String,
    /// Callback routine run before the state changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_to_change_state: Option<String>,
    /// Optional free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransitionDefinition {
    /// Callback routine, if one is configured.
    pub fn routine(&self) -> Option<&str> {
        routine_name(self.routine_to_change_state.as_deref())
    }
}

/// Transition available from a set of source states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTransitionDefinition {
    /// Trigger name
    pub trigger_name: String,
    /// Optional free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Callback routine (required for multi-triggers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_to_change_state: Option<String>,
    /// Destination state name
    #[serde(default, deserialize_with = "nullable")]
    pub destination_state: String,
    /// Explicit state list or wildcard token
    #[serde(default)]
    pub source_states: SourceStates,
}

impl MultiTransitionDefinition {
    /// Callback routine, if one is configured.
    pub fn routine(&self) -> Option<&str> {
        routine_name(self.routine_to_change_state.as_deref())
    }
}

/// Source set of a multi-trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceStates {
    /// Explicit list of state names
    States(Vec<String>),
    /// Wildcard token (`*` or `=`)
    Token(String),
}

impl Default for SourceStates {
    fn default() -> Self {
        Self::States(Vec::new())
    }
}

impl SourceStates {
    /// Whether this is a recognized wildcard token.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Token(token) if WILDCARD_TOKENS.contains(&token.trim()))
    }

    /// Whether the set includes `state`.
    pub fn covers(&self, state: &str) -> bool {
        match self {
            Self::States(states) => states.iter().any(|s| s == state),
            Self::Token(_) => self.is_wildcard(),
        }
    }
}

impl fmt::Display for SourceStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::States(states) => write!(f, "[{}]", states.join(", ")),
            Self::Token(token) => f.write_str(token),
        }
    }
}

/// A transition as seen from one source state, with its origin resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionInfo {
    /// Trigger name
    pub trigger: String,
    /// Source state
    pub source: String,
    /// Destination state
    pub destination: String,
    /// Callback routine, if any
    pub routine: Option<String>,
    /// Optional free text
    pub description: Option<String>,
    /// Whether the transition came from the multi-trigger section
    pub multi: bool,
}

impl StateModel {
    /// Parse a model from YAML.
    ///
    /// Parsing only checks shape; call [`StateModel::validate`] before
    /// building an engine.
    pub fn from_yaml(yaml: &str) -> Result<Self, ModelError> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ModelError::ParseError(e.to_string()))
    }

    /// Build a model from an already loaded YAML document.
    pub fn from_value(value: serde_yaml_ng::Value) -> Result<Self, ModelError> {
        serde_yaml_ng::from_value(value).map_err(|e| ModelError::ParseError(e.to_string()))
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ModelError> {
        serde_yaml_ng::to_string(self).map_err(|e| ModelError::ParseError(e.to_string()))
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model description, if provided.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared initial state.
    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    /// Ordered state names, excluding reserved `__X__` entries.
    pub fn list_states(&self) -> Vec<&str> {
        self.states
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !name.starts_with(NON_STATE_MARKER) && !name.ends_with(NON_STATE_MARKER))
            .collect()
    }

    /// Whether `state` is a declared state.
    pub fn has_state(&self, state: &str) -> bool {
        self.list_states().contains(&state)
    }

    /// Full definition of a state.
    pub fn state(&self, state: &str) -> Option<&StateDefinition> {
        self.states
            .iter()
            .find(|(name, _)| name == state)
            .map(|(_, definition)| definition)
    }

    pub(crate) fn raw_states(&self) -> &[(String, StateDefinition)] {
        &self.states
    }

    /// Transitions declared on `state`.
    pub fn transitions_for(&self, state: &str) -> Result<&[TransitionDefinition], ModelError> {
        self.state(state)
            .map(|definition| definition.transitions.as_slice())
            .ok_or_else(|| ModelError::UnknownState(state.to_string()))
    }

    /// Validations declared on `state` (empty for unknown states).
    pub fn validations_for(&self, state: &str) -> &[ValidationDefinition] {
        self.state(state)
            .map(|definition| definition.validations.as_slice())
            .unwrap_or_default()
    }

    /// Multi-source transitions.
    pub fn multi_triggers(&self) -> &[MultiTransitionDefinition] {
        &self.multi_triggers
    }

    /// Every trigger name in the model, including multi-triggers.
    pub fn all_trigger_names(&self) -> BTreeSet<&str> {
        self.states
            .iter()
            .flat_map(|(_, definition)| definition.transitions.iter())
            .map(|t| t.trigger_name.as_str())
            .chain(self.multi_triggers.iter().map(|t| t.trigger_name.as_str()))
            .collect()
    }

    /// Transitions leaving `state`: declared ones first, then every
    /// multi-trigger whose source set covers the state.
    pub fn outgoing(&self, state: &str) -> Vec<TransitionInfo> {
        let declared = self
            .state(state)
            .map(|definition| definition.transitions.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|t| TransitionInfo {
                trigger: t.trigger_name.clone(),
                source: state.to_string(),
                destination: t.destination_state.clone(),
                routine: t.routine().map(str::to_string),
                description: t.description.clone(),
                multi: false,
            });

        let multi = self
            .multi_triggers
            .iter()
            .filter(|t| t.source_states.covers(state))
            .map(|t| TransitionInfo {
                trigger: t.trigger_name.clone(),
                source: state.to_string(),
                destination: t.destination_state.clone(),
                routine: t.routine().map(str::to_string),
                description: t.description.clone(),
                multi: true,
            });

        declared.chain(multi).collect()
    }

    /// Look up the transition taken by `trigger` from `state`.
    pub fn transition_info(&self, state: &str, trigger: &str) -> Option<TransitionInfo> {
        self.outgoing(state).into_iter().find(|t| t.trigger == trigger)
    }

    /// Triggers in `path` that the model does not define.
    pub fn unknown_triggers<S: AsRef<str>>(&self, path: &[S]) -> Vec<String> {
        let known = self.all_trigger_names();
        let mut unknown: Vec<String> = path
            .iter()
            .map(AsRef::as_ref)
            .filter(|trigger| !known.contains(trigger))
            .map(str::to_string)
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }

    /// Check that every trigger in `path` is defined, logging the unknown ones.
    pub fn validate_path<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let unknown = self.unknown_triggers(path);
        for trigger in &unknown {
            tracing::error!(trigger = %trigger, model = %self.name, "Unknown trigger in path");
        }
        unknown.is_empty()
    }

    /// Run the static model checks, reporting every issue at once.
    pub fn validate(&self) -> Result<(), ModelError> {
        let issues = ModelValidator::new(self).issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Invalid { issues })
        }
    }
}

/// Errors raised while parsing or validating a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Malformed YAML or an entry of the wrong shape
    #[error("Failed to parse state model: {0}")]
    ParseError(String),

    /// Lookup of a state the model does not define
    #[error("State '{0}' is not defined in the model")]
    UnknownState(String),

    /// Static validation failed
    #[error("State model is invalid:\n{}", format_issues(.issues))]
    Invalid {
        /// Every issue found
        issues: Vec<ModelIssue>,
    },
}

fn format_issues(issues: &[ModelIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn routine_name(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|routine| !routine.is_empty() && *routine != NO_ROUTINE)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawStateModel {
    model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    initial_state: String,
    #[serde(default, deserialize_with = "nullable")]
    definition: Vec<BTreeMap<String, DefinitionBody>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DefinitionBody {
    MultiTriggers(Vec<MultiTransitionDefinition>),
    State(Option<StateDefinition>),
}

impl TryFrom<RawStateModel> for StateModel {
    type Error = ModelError;

    fn try_from(raw: RawStateModel) -> Result<Self, Self::Error> {
        let mut states = Vec::new();
        let mut multi_triggers = Vec::new();

        for (key, body) in raw.definition.into_iter().flatten() {
            match body {
                DefinitionBody::MultiTriggers(triggers) if key == MULTI_TRIGGERS_KEY => {
                    multi_triggers.extend(triggers);
                }
                DefinitionBody::MultiTriggers(_) => {
                    return Err(ModelError::ParseError(format!(
                        "definition entry '{key}' must be a mapping"
                    )));
                }
                DefinitionBody::State(_) if key.starts_with(NON_STATE_MARKER) => {
                    tracing::debug!(entry = %key, "Skipping reserved definition entry");
                }
                DefinitionBody::State(definition) => {
                    states.push((key, definition.unwrap_or_default()));
                }
            }
        }

        Ok(Self {
            name: raw.model,
            description: raw.description,
            initial_state: raw.initial_state,
            states,
            multi_triggers,
        })
    }
}

impl From<StateModel> for RawStateModel {
    fn from(model: StateModel) -> Self {
        let mut definition: Vec<BTreeMap<String, DefinitionBody>> = model
            .states
            .into_iter()
            .map(|(name, state)| BTreeMap::from([(name, DefinitionBody::State(Some(state)))]))
            .collect();
        if !model.multi_triggers.is_empty() {
            definition.push(BTreeMap::from([(
                MULTI_TRIGGERS_KEY.to_string(),
                DefinitionBody::MultiTriggers(model.multi_triggers),
            )]));
        }
        Self {
            model: model.name,
            description: model.description,
            initial_state: model.initial_state,
            definition,
        }
    }
}
