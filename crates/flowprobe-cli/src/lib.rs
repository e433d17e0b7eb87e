//! Flowprobe CLI Library
//!
//! Command-line front end for the flowprobe state-machine test executor:
//! argument parsing, configuration, log setup, command handlers and the VM
//! lifecycle demo object model that `flowprobe run` drives.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;
pub mod vm;

pub use commands::{
    CaseArgs, Cli, ColorArg, Commands, DescribeArgs, GraphArgs, ListArgs, LogFormatArg,
    ModelTemplateArgs, PathTemplateArgs, ReportFormat, ResolveArgs, RunArgs, TemplateCommand,
    ValidateArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{failure_counts, step_line, StatusPrinter};
