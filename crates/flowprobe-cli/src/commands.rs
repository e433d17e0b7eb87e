//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Flowprobe: run YAML state-machine test paths against an object model
#[derive(Parser, Debug)]
#[command(name = "flowprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log line format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Configuration file (YAML)
    #[arg(long, global = true, env = "FLOWPROBE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one test case against the VM demo object model
    Run(RunArgs),

    /// List the test suites and test cases of a path file
    List(ListArgs),

    /// Validate a state model, and optionally a test case against it
    Validate(ValidateArgs),

    /// Print the model description table
    Describe(DescribeArgs),

    /// Export the model as a Graphviz DOT graph
    Graph(GraphArgs),

    /// Write a path file with every reference resolved
    Resolve(ResolveArgs),

    /// Write a starter model or path file
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Show the effective configuration
    Config,
}

/// Test case selector shared by `run` and `validate`
#[derive(Args, Debug, Clone)]
pub struct CaseArgs {
    /// Test suite name
    #[arg(short = 's', long)]
    pub suite: String,

    /// Test case name
    #[arg(short = 't', long = "test-case")]
    pub case: String,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// State model file
    pub model: PathBuf,

    /// Path file holding the test case
    pub paths: PathBuf,

    /// Test case to execute
    #[command(flatten)]
    pub case: CaseArgs,

    /// Leave step ids out of the execution summary
    #[arg(long)]
    pub brief: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Also write the model as a DOT graph
    #[arg(long, value_name = "FILE")]
    pub dot: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Path file
    pub paths: PathBuf,

    /// Only list this test suite
    #[arg(short = 's', long)]
    pub suite: Option<String>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// State model file
    pub model: PathBuf,

    /// Path file to check against the model
    #[arg(requires = "suite")]
    pub paths: Option<PathBuf>,

    /// Test suite name
    #[arg(short = 's', long, requires_all = ["paths", "case"])]
    pub suite: Option<String>,

    /// Test case name
    #[arg(short = 't', long = "test-case", requires = "suite")]
    pub case: Option<String>,
}

/// Arguments for the describe command
#[derive(Parser, Debug)]
pub struct DescribeArgs {
    /// State model file
    pub model: PathBuf,
}

/// Arguments for the graph command
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// State model file
    pub model: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Path file
    pub paths: PathBuf,

    /// Keep reference and add/mod/del directive keys
    #[arg(long)]
    pub full: bool,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Template subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// State model template
    Model(ModelTemplateArgs),

    /// Path file template
    Paths(PathTemplateArgs),
}

/// Arguments for `template model`
#[derive(Parser, Debug)]
pub struct ModelTemplateArgs {
    /// Number of states
    pub states: usize,

    /// Output file (`.yaml` is appended if missing)
    pub output: PathBuf,

    /// Include a multi-trigger section
    #[arg(long)]
    pub multi_trigger: bool,
}

/// Arguments for `template paths`
#[derive(Parser, Debug)]
pub struct PathTemplateArgs {
    /// Number of test cases per suite
    pub cases: usize,

    /// Output file (`.yaml` is appended if missing)
    pub output: PathBuf,
}

/// Report format for the run command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Tables and the traversal diagram
    #[default]
    Text,
    /// Execution records as JSON
    Json,
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
