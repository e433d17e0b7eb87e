//! Test path steps.
//!
//! In a path file each step is a single-key mapping from trigger name to
//! the step body:
//!
//! ```yaml
//! - create:
//!     id: 1
//!     data: {flavor: 3}
//!     expectations: {exists: false}
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Key/value data handed to a transition callback.
pub type Payload = Mapping;

/// Step identifier, always compared in its string form.
///
/// YAML integers, floats and booleans are accepted and coerced, so `id: 3`
/// and `id: '3'` name the same step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct StepId(String);

impl StepId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<Value> for StepId {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self(s.trim().to_string())),
            Value::Number(n) => Ok(Self(n.to_string())),
            Value::Bool(b) => Ok(Self(b.to_string())),
            other => Err(format!("step id must be a scalar, got {other:?}")),
        }
    }
}

impl From<StepId> for String {
    fn from(id: StepId) -> Self {
        id.0
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a step entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepBody {
    /// Unique step identifier within the resolved path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StepId>,
    /// Optional free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Callback data; `null` or `none` means no data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Validation id -> expected result overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectations: Option<BTreeMap<String, bool>>,
    /// Insert-before landmark (add directives only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_id: Option<StepId>,
    /// Insert-after landmark (add directives only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_id: Option<StepId>,
}

/// A step as written in a path file: trigger name plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<StepBody>>",
    into = "BTreeMap<String, StepBody>"
)]
pub struct StepDefinition {
    /// Trigger name
    pub trigger: String,
    /// Step body
    pub body: StepBody,
}

impl StepDefinition {
    /// Create a definition.
    pub fn new(trigger: impl Into<String>, body: StepBody) -> Self {
        Self {
            trigger: trigger.into(),
            body,
        }
    }

    /// Step identifier, if set.
    pub fn id(&self) -> Option<&StepId> {
        self.body.id.as_ref()
    }
}

impl TryFrom<BTreeMap<String, Option<StepBody>>> for StepDefinition {
    type Error = String;

    fn try_from(map: BTreeMap<String, Option<StepBody>>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "a step must map exactly one trigger name to its body, found {} keys",
                map.len()
            ));
        }
        let (trigger, body) = map
            .into_iter()
            .next()
            .ok_or_else(|| "empty step entry".to_string())?;
        Ok(Self {
            trigger,
            body: body.unwrap_or_default(),
        })
    }
}

impl From<StepDefinition> for BTreeMap<String, StepBody> {
    fn from(step: StepDefinition) -> Self {
        BTreeMap::from([(step.trigger, step.body)])
    }
}

/// One requested trigger invocation, ready for execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    /// Trigger name
    pub trigger: String,
    /// Step identifier
    pub id: Option<String>,
    /// Callback data
    pub data: Payload,
    /// Validation id -> expected result overrides
    pub expectations: BTreeMap<String, bool>,
}

impl Step {
    /// Create a step with no data and default expectations.
    pub fn new(trigger: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set the callback data.
    #[must_use]
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }

    /// Add an expectation override.
    #[must_use]
    pub fn with_expectation(mut self, validation_id: impl Into<String>, expected: bool) -> Self {
        self.expectations.insert(validation_id.into(), expected);
        self
    }

    /// Expected result for a validation; `true` unless overridden.
    pub fn expectation(&self, validation_id: &str) -> bool {
        self.expectations.get(validation_id).copied().unwrap_or(true)
    }

    /// Identifier text, or an empty string.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

impl From<&StepDefinition> for Step {
    fn from(definition: &StepDefinition) -> Self {
        Self {
            trigger: definition.trigger.clone(),
            id: definition.body.id.as_ref().map(|id| id.as_str().to_string()),
            data: payload_from(&definition.trigger, definition.body.data.as_ref()),
            expectations: definition.body.expectations.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.trigger)?;
        if let Some(id) = &self.id {
            write!(f, " (id: {id})")?;
        }
        if !self.expectations.is_empty() {
            let expectations: Vec<String> = self
                .expectations
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, " [{}]", expectations.join(", "))?;
        }
        Ok(())
    }
}

fn payload_from(trigger: &str, data: Option<&Value>) -> Payload {
    match data {
        None | Some(Value::Null) => Payload::new(),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("none") => Payload::new(),
        Some(Value::Mapping(map)) => map.clone(),
        Some(other) => {
            tracing::warn!(trigger = %trigger, data = ?other, "Step data is not a mapping; ignoring it");
            Payload::new()
        }
    }
}

/// Trigger names of `steps`, in order.
pub fn traversal_path(steps: &[Step]) -> Vec<String> {
    steps.iter().map(|step| step.trigger.clone()).collect()
}

/// Per-step expectation overrides, in order.
pub fn validation_expectations(steps: &[Step]) -> Vec<(String, BTreeMap<String, bool>)> {
    steps
        .iter()
        .map(|step| (step.trigger.clone(), step.expectations.clone()))
        .collect()
}
