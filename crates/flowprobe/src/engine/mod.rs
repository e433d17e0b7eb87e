//! State machine execution.
//!
//! [`Engine`] walks a [`StateModel`](crate::model::StateModel) through a
//! list of [`Step`](crate::path::Step)s, calling routines from a
//! [`RoutineRegistry`] and recording every state it enters in an
//! [`ExecutionTracker`](crate::tracker::ExecutionTracker).

pub mod machine;
pub mod registry;

pub use machine::{
    Engine, EngineConfig, EngineError, IllegalTransition, RunResult, StepOutcome, StepStatus,
    DEFAULT_BORDER_WIDTH, DEFAULT_ITEMS_PER_LINE,
};
pub use registry::{Callback, Context, RoutineError, RoutineKind, RoutineRegistry, Validator};
