//! Routine registry.
//!
//! Model files refer to transition callbacks and state validators by name.
//! The registry maps those names to closures over a domain object `M`, and
//! the engine checks every name the model uses when it is built.

use crate::model::StateModel;
use crate::path::Payload;
use serde_yaml_ng::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Error returned by a transition callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RoutineError(pub String);

impl RoutineError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Transition callback: runs before the state changes.
pub type Callback<M> = Box<dyn Fn(&mut Context<M>, &Payload) -> Result<Value, RoutineError>>;

/// State validator: runs after the state changes.
pub type Validator<M> = Box<dyn Fn(&Context<M>, &Payload) -> bool>;

/// Which registry table a routine name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoutineKind {
    /// `routine_to_change_state`
    Callback,
    /// Validation `routine`
    Validator,
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback => f.write_str("callback"),
            Self::Validator => f.write_str("validator"),
        }
    }
}

/// What a routine sees: the domain object plus the trigger being handled.
#[derive(Debug)]
pub struct Context<M> {
    object: M,
    state: String,
    trigger: String,
    step_id: String,
}

impl<M> Context<M> {
    /// Wrap a domain object; `state` is the machine's initial state.
    pub fn new(object: M, state: impl Into<String>) -> Self {
        Self {
            object,
            state: state.into(),
            trigger: String::new(),
            step_id: String::new(),
        }
    }

    /// Domain object.
    pub fn object(&self) -> &M {
        &self.object
    }

    /// Mutable domain object.
    pub fn object_mut(&mut self) -> &mut M {
        &mut self.object
    }

    /// Take back the domain object.
    pub fn into_object(self) -> M {
        self.object
    }

    /// Machine state. Callbacks see the source state, validators the
    /// destination.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Trigger being handled.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Id of the step being executed.
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub(crate) fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
    }

    pub(crate) fn begin_step(&mut self, trigger: &str, step_id: &str) {
        self.trigger = trigger.to_string();
        self.step_id = step_id.to_string();
    }
}

/// Named callbacks and validators for a domain object `M`.
pub struct RoutineRegistry<M> {
    callbacks: BTreeMap<String, Callback<M>>,
    validators: BTreeMap<String, Validator<M>>,
}

impl<M> Default for RoutineRegistry<M> {
    fn default() -> Self {
        Self {
            callbacks: BTreeMap::new(),
            validators: BTreeMap::new(),
        }
    }
}

impl<M> fmt::Debug for RoutineRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineRegistry")
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<M> RoutineRegistry<M> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transition callback.
    pub fn register_callback<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&mut Context<M>, &Payload) -> Result<Value, RoutineError> + 'static,
    {
        self.callbacks.insert(name.into(), Box::new(callback));
        self
    }

    /// Register a state validator.
    pub fn register_validator<F>(&mut self, name: impl Into<String>, validator: F) -> &mut Self
    where
        F: Fn(&Context<M>, &Payload) -> bool + 'static,
    {
        self.validators.insert(name.into(), Box::new(validator));
        self
    }

    /// Builder form of [`register_callback`](Self::register_callback).
    #[must_use]
    pub fn with_callback<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut Context<M>, &Payload) -> Result<Value, RoutineError> + 'static,
    {
        self.register_callback(name, callback);
        self
    }

    /// Builder form of [`register_validator`](Self::register_validator).
    #[must_use]
    pub fn with_validator<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Context<M>, &Payload) -> bool + 'static,
    {
        self.register_validator(name, validator);
        self
    }

    /// Look up a callback.
    pub fn callback(&self, name: &str) -> Option<&Callback<M>> {
        self.callbacks.get(name)
    }

    /// Look up a validator.
    pub fn validator(&self, name: &str) -> Option<&Validator<M>> {
        self.validators.get(name)
    }

    /// Registered callback names.
    pub fn callback_names(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    /// Registered validator names.
    pub fn validator_names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Routine names used by `model` that have no registration, sorted.
    pub fn missing_routines(&self, model: &StateModel) -> Vec<(RoutineKind, String)> {
        let mut missing = Vec::new();
        for state in model.list_states() {
            for transition in model.outgoing(state) {
                if let Some(routine) = transition.routine {
                    if !self.callbacks.contains_key(&routine) {
                        missing.push((RoutineKind::Callback, routine));
                    }
                }
            }
            for validation in model.validations_for(state) {
                if let Some(routine) = &validation.routine {
                    if !self.validators.contains_key(routine) {
                        missing.push((RoutineKind::Validator, routine.clone()));
                    }
                }
            }
        }
        missing.sort();
        missing.dedup();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r"
model: counter
initial_state: ZERO
definition:
  - ZERO:
      validations:
        - name: is_zero
          routine: object_model.is_zero
      transitions:
        - trigger_name: inc
          destination_state: ONE
          routine_to_change_state: object_model.increment
  - ONE:
      validations:
        - name: is_one
          routine: object_model.is_one
      transitions:
        - trigger_name: noop
          destination_state: ONE
          routine_to_change_state: None
";

    #[test]
    fn test_register_and_call() {
        let registry = RoutineRegistry::<u32>::new()
            .with_callback("inc", |ctx, _| {
                *ctx.object_mut() += 1;
                Ok(Value::Null)
            })
            .with_validator("is_one", |ctx, _| *ctx.object() == 1);

        let mut ctx = Context::new(0_u32, "ZERO");
        let inc = registry.callback("inc").expect("registered");
        inc(&mut ctx, &Payload::new()).expect("callback");
        let is_one = registry.validator("is_one").expect("registered");
        assert!(is_one(&ctx, &Payload::new()));
        assert!(registry.callback("dec").is_none());
    }

    #[test]
    fn test_missing_routines() {
        let model = StateModel::from_yaml(MODEL).expect("model");
        let registry = RoutineRegistry::<u32>::new()
            .with_callback("object_model.increment", |_, _| Ok(Value::Null))
            .with_validator("object_model.is_zero", |_, _| true);

        assert_eq!(
            registry.missing_routines(&model),
            vec![(RoutineKind::Validator, "object_model.is_one".to_string())]
        );
    }

    #[test]
    fn test_none_routine_needs_no_registration() {
        let model = StateModel::from_yaml(MODEL).expect("model");
        let registry = RoutineRegistry::<u32>::new()
            .with_callback("object_model.increment", |_, _| Ok(Value::Null))
            .with_validator("object_model.is_zero", |_, _| true)
            .with_validator("object_model.is_one", |_, _| true);
        assert!(registry.missing_routines(&model).is_empty());
    }

    #[test]
    fn test_context_tracks_step() {
        let mut ctx = Context::new((), "A");
        ctx.begin_step("go", "7");
        ctx.set_state("B");
        assert_eq!(ctx.state(), "B");
        assert_eq!(ctx.trigger(), "go");
        assert_eq!(ctx.step_id(), "7");
    }
}
