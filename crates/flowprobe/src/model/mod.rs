//! Declarative state model.
//!
//! The model file describes states, per-state validations and transitions,
//! plus transitions shared by several source states:
//!
//! ```yaml
//! model: server
//! initial_state: DNE
//! definition:
//!   - DNE:
//!       description: Server does not exist
//!       validations:
//!         - name: exists
//!           routine: object_model.does_server_exist
//!       transitions:
//!         - trigger_name: create
//!           destination_state: BUILDING
//!           routine_to_change_state: object_model.create_server
//!   - BUILDING:
//!       transitions: []
//!   - __MULTI_TRIGGERS__:
//!       - trigger_name: error
//!         routine_to_change_state: object_model.go_into_error
//!         destination_state: BUILDING
//!         source_states: '*'
//! ```

pub mod schema;
pub mod validate;

pub use schema::{
    ModelError, MultiTransitionDefinition, SourceStates, StateDefinition, StateModel,
    TransitionDefinition, TransitionInfo, ValidationDefinition, MULTI_TRIGGERS_KEY,
    NON_STATE_MARKER, NO_ROUTINE, WILDCARD_TOKENS,
};
pub use validate::{ModelIssue, ModelValidator};
