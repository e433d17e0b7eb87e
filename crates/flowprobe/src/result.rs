//! Result and error types for flowprobe.

use crate::engine::EngineError;
use crate::model::ModelError;
use crate::path::{CompositionError, PathError};
use crate::template::TemplateError;
use crate::tracker::TrackerError;
use thiserror::Error;

/// Result type for flowprobe operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur in flowprobe
#[derive(Debug, Error)]
pub enum FlowError {
    /// State model could not be parsed or failed validation
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Path file could not be loaded or a test case could not be built
    #[error(transparent)]
    Path(#[from] PathError),

    /// Referenced test case could not be composed
    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// Engine could not be built or a run was aborted
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Execution record misuse
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Template could not be written
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Path references triggers the model does not define
    #[error("Path uses undefined triggers: {}", .triggers.join(", "))]
    UnknownTriggers {
        /// Undefined trigger names
        triggers: Vec<String>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_errors_convert() {
        let err: FlowError = ModelError::UnknownState("LIMBO".to_string()).into();
        assert!(matches!(err, FlowError::Model(_)));
        assert_eq!(err.to_string(), "State 'LIMBO' is not defined in the model");

        let err: FlowError = TrackerError::UnknownRecord(3).into();
        assert!(matches!(err, FlowError::Tracker(TrackerError::UnknownRecord(3))));
    }

    #[test]
    fn test_unknown_triggers_message() {
        let err = FlowError::UnknownTriggers {
            triggers: vec!["fly".to_string(), "swim".to_string()],
        };
        assert_eq!(err.to_string(), "Path uses undefined triggers: fly, swim");
    }
}
