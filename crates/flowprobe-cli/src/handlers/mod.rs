//! Command handlers
//!
//! Each handler module holds the execution logic for one CLI command plus
//! the pure helpers it is built from, with tests against temp files.

pub mod config;
pub mod describe;
pub mod list;
pub mod resolve;
pub mod run;
pub mod template;
pub mod validate;

pub use config::execute_config;
pub use describe::{execute_describe, execute_graph};
pub use list::execute_list;
pub use resolve::execute_resolve;
pub use run::execute_run;
pub use template::execute_template;
pub use validate::execute_validate;

use crate::error::{CliError, CliResult};
use flowprobe::{FlowError, FsLoader, PathFile, StateModel};
use std::path::Path;

/// Read and parse a state model file.
pub fn load_model(path: &Path) -> CliResult<StateModel> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        CliError::invalid_argument(format!("cannot read model '{}': {e}", path.display()))
    })?;
    StateModel::from_yaml(&yaml).map_err(CliError::flow)
}

/// Load a path file, resolving references from disk.
pub fn load_paths(path: &Path) -> CliResult<PathFile> {
    PathFile::load(path, &FsLoader).map_err(CliError::flow)
}

/// Write `content` to `output`, or print it when no file is given.
pub fn emit(content: &str, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            tracing::info!(path = %path.display(), "Wrote output");
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// Fail when `triggers` names triggers the model does not define.
pub fn check_triggers(model: &StateModel, triggers: &[String]) -> CliResult<()> {
    if model.validate_path(triggers) {
        Ok(())
    } else {
        Err(CliError::flow(FlowError::UnknownTriggers {
            triggers: model.unknown_triggers(triggers),
        }))
    }
}
