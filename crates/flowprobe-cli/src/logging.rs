//! Log subscriber setup.
//!
//! `RUST_LOG` takes precedence; otherwise the verbosity flags pick the
//! level. Logs go to stderr unless a log file is configured.

use crate::config::{CliConfig, LogFormat, Verbosity};
use crate::error::{CliError, CliResult};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the verbosity level.
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()))
}

/// Open (appending) the log file, creating parent directories.
pub fn open_log_file(path: &Path) -> CliResult<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CliError::config(format!("cannot open log file '{}': {e}", path.display())))
}

/// Install the global subscriber.
pub fn init(config: &CliConfig) -> CliResult<()> {
    let (writer, ansi) = match &config.log_file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(std::io::stderr), config.color.should_color()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.verbosity))
        .with_writer(writer)
        .with_target(config.verbosity.is_debug());

    let installed = match config.log_format {
        LogFormat::Text => builder.with_ansi(ansi).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| CliError::config(format!("cannot install logger: {e}")))
}
