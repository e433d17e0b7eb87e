//! Static validation of a state model.
//!
//! Checks run in full and report every issue found, so a broken model file
//! can be fixed in one pass.

use super::schema::{SourceStates, StateModel};
use std::collections::HashSet;

/// A single problem found in a model definition. The message names every
/// offending state and trigger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum ModelIssue {
    #[error("No states are defined")]
    NoStates,

    #[error("State '{state}' is defined more than once")]
    DuplicateState { state: String },

    #[error("State '{state}': trigger '{trigger}' targets undefined state '{destination}'")]
    UndefinedDestination {
        state: String,
        trigger: String,
        destination: String,
    },

    #[error("State '{state}': trigger '{trigger}' is defined more than once")]
    DuplicateTrigger { state: String, trigger: String },

    #[error("Initial state '{state}' is not defined")]
    UndefinedInitialState { state: String },

    #[error("Initial state '{state}' has no outgoing transitions")]
    TerminalInitialState { state: String },

    #[error("Multi-trigger '{trigger}' targets undefined state '{destination}'")]
    MultiTriggerUndefinedDestination { trigger: String, destination: String },

    #[error("Multi-trigger '{trigger}' has no routine_to_change_state")]
    MultiTriggerMissingCallback { trigger: String },

    #[error("Multi-trigger '{trigger}' has no source_states")]
    MultiTriggerNoSources { trigger: String },

    #[error("Multi-trigger '{trigger}' lists undefined source states: {}", .states.join(", "))]
    MultiTriggerUnknownSources { trigger: String, states: Vec<String> },

    #[error("Multi-trigger '{trigger}' has unrecognized source token '{token}' (expected '*' or '=')")]
    MultiTriggerInvalidWildcard { trigger: String, token: String },
}

/// Model validator.
pub struct ModelValidator<'a> {
    model: &'a StateModel,
}

impl<'a> ModelValidator<'a> {
    /// Create a validator for the given model.
    pub fn new(model: &'a StateModel) -> Self {
        Self { model }
    }

    /// Run every check and collect the issues.
    pub fn issues(&self) -> Vec<ModelIssue> {
        let mut issues = Vec::new();
        let defined: HashSet<&str> = self.model.list_states().into_iter().collect();

        self.check_states(&mut issues);
        self.check_transitions(&defined, &mut issues);
        self.check_initial_state(&defined, &mut issues);
        self.check_multi_triggers(&defined, &mut issues);

        for issue in &issues {
            tracing::error!(model = %self.model.name(), "{issue}");
        }
        issues
    }

    fn check_states(&self, issues: &mut Vec<ModelIssue>) {
        let states = self.model.list_states();
        if states.is_empty() {
            issues.push(ModelIssue::NoStates);
        }

        let mut seen = HashSet::new();
        for state in states {
            if !seen.insert(state) {
                issues.push(ModelIssue::DuplicateState {
                    state: state.to_string(),
                });
            }
        }
    }

    fn check_transitions(&self, defined: &HashSet<&str>, issues: &mut Vec<ModelIssue>) {
        for (state, definition) in self.model.raw_states() {
            let mut triggers = HashSet::new();
            for transition in &definition.transitions {
                if !defined.contains(transition.destination_state.as_str()) {
                    issues.push(ModelIssue::UndefinedDestination {
                        state: state.clone(),
                        trigger: transition.trigger_name.clone(),
                        destination: transition.destination_state.clone(),
                    });
                }
                if !triggers.insert(transition.trigger_name.as_str()) {
                    issues.push(ModelIssue::DuplicateTrigger {
                        state: state.clone(),
                        trigger: transition.trigger_name.clone(),
                    });
                }
            }
        }
    }

    fn check_initial_state(&self, defined: &HashSet<&str>, issues: &mut Vec<ModelIssue>) {
        let initial = self.model.initial_state();
        if !defined.contains(initial) {
            issues.push(ModelIssue::UndefinedInitialState {
                state: initial.to_string(),
            });
        } else if self
            .model
            .transitions_for(initial)
            .is_ok_and(<[_]>::is_empty)
        {
            issues.push(ModelIssue::TerminalInitialState {
                state: initial.to_string(),
            });
        }
    }

    fn check_multi_triggers(&self, defined: &HashSet<&str>, issues: &mut Vec<ModelIssue>) {
        for trigger in self.model.multi_triggers() {
            if !defined.contains(trigger.destination_state.as_str()) {
                issues.push(ModelIssue::MultiTriggerUndefinedDestination {
                    trigger: trigger.trigger_name.clone(),
                    destination: trigger.destination_state.clone(),
                });
            }

            if trigger.routine_to_change_state.is_none() {
                issues.push(ModelIssue::MultiTriggerMissingCallback {
                    trigger: trigger.trigger_name.clone(),
                });
            }

            match &trigger.source_states {
                SourceStates::States(states) if states.is_empty() => {
                    issues.push(ModelIssue::MultiTriggerNoSources {
                        trigger: trigger.trigger_name.clone(),
                    });
                }
                SourceStates::States(states) => {
                    let unknown: Vec<String> = states
                        .iter()
                        .filter(|s| !defined.contains(s.as_str()))
                        .cloned()
                        .collect();
                    if !unknown.is_empty() {
                        issues.push(ModelIssue::MultiTriggerUnknownSources {
                            trigger: trigger.trigger_name.clone(),
                            states: unknown,
                        });
                    }
                }
                SourceStates::Token(token) => {
                    if !trigger.source_states.is_wildcard() {
                        issues.push(ModelIssue::MultiTriggerInvalidWildcard {
                            trigger: trigger.trigger_name.clone(),
                            token: token.clone(),
                        });
                    }
                }
            }
        }
    }
}
