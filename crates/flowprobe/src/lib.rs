//! Flowprobe: YAML-driven finite-state-machine test executor
//!
//! A state model file declares the states of a system under test, the
//! triggers that move it between them and the validations that must hold in
//! each state. Path files list test cases as ordered trigger sequences; a
//! test case may reference a case in another file and patch it with
//! add/modify/delete directives. The engine walks the model through a path,
//! calling registered routines, and records what happened for reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ StateModel   │────►│                  │────►│ ExecutionTracker │
//! │ (model.yaml) │     │      Engine      │     └────────┬─────────┘
//! └──────────────┘     │  + Registry<M>   │              │
//! ┌──────────────┐     │                  │     ┌────────▼─────────┐
//! │ PathFile     │────►│                  │     │ report: summary, │
//! │ + Composer   │     └──────────────────┘     │ diagram, table   │
//! └──────────────┘                              └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use flowprobe::prelude::*;
//!
//! let model = StateModel::from_yaml(
//!     r"
//! model: door
//! initial_state: CLOSED
//! definition:
//!   - CLOSED:
//!       transitions:
//!         - {trigger_name: open, destination_state: OPEN}
//!   - OPEN:
//!       transitions: []
//! ",
//! )?;
//! let mut engine = Engine::new(model, RoutineRegistry::new(), ())?;
//! let result = engine.execute(&[Step::new("open", "1")], None)?;
//! assert_eq!(result.final_state, "OPEN");
//! assert_eq!(engine.path(), vec!["CLOSED", "OPEN"]);
//! # Ok::<(), flowprobe::FlowError>(())
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod loader;
pub mod model;
pub mod path;
pub mod report;
mod result;
pub mod template;
pub mod tracker;

pub use engine::{Context, Engine, EngineConfig, EngineError, RoutineError, RoutineRegistry};
pub use loader::{DocumentLoader, FsLoader, MemoryLoader};
pub use model::{ModelError, StateModel};
pub use path::{CompositionError, PathError, PathFile, Payload, Step};
pub use result::{FlowError, FlowResult};
pub use tracker::{ExecutionRecord, ExecutionTracker, TrackerError};

/// Commonly used types.
pub mod prelude {
    pub use super::engine::{
        Context, Engine, EngineConfig, EngineError, RoutineError, RoutineKind, RoutineRegistry,
        RunResult, StepOutcome, StepStatus,
    };
    pub use super::loader::{DocumentLoader, FsLoader, MemoryLoader};
    pub use super::model::{ModelError, StateModel};
    pub use super::path::{
        traversal_path, validate_steps, CompositionError, PathError, PathFile, Payload, Step,
        StepId,
    };
    pub use super::report::{describe_model, render_summary, to_dot, TraversalDiagram};
    pub use super::result::{FlowError, FlowResult};
    pub use super::template::{ModelTemplate, PathTemplate};
    pub use super::tracker::{ExecutionRecord, ExecutionTracker};
}
