//! Flowprobe CLI: run YAML state-machine test paths
//!
//! ## Usage
//!
//! ```bash
//! flowprobe run demos/vm_model.yaml demos/vm_paths.yaml -s smoke -t create_delete
//! flowprobe list demos/vm_paths.yaml
//! flowprobe validate demos/vm_model.yaml
//! flowprobe resolve demos/vm_paths_referential.yaml -o resolved.yaml
//! flowprobe template model 4 my_model --multi-trigger
//! ```

use clap::Parser;
use flowprobe_cli::{
    handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, LogFormat, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from the config file and CLI args
    let config = build_config(&cli)?;
    logging::init(&config)?;

    match &cli.command {
        Commands::Run(args) => handlers::execute_run(&config, args),
        Commands::List(args) => handlers::execute_list(args),
        Commands::Validate(args) => handlers::execute_validate(&config, args),
        Commands::Describe(args) => handlers::execute_describe(args),
        Commands::Graph(args) => handlers::execute_graph(args),
        Commands::Resolve(args) => handlers::execute_resolve(args),
        Commands::Template(command) => handlers::execute_template(command).map(|_| ()),
        Commands::Config => handlers::execute_config(&config),
    }
}

fn build_config(cli: &Cli) -> CliResult<CliConfig> {
    let base = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::new(),
    };

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => base.verbosity,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();
    let log_format: LogFormat = cli.log_format.map_or(base.log_format, Into::into);

    let mut config = base
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_format(log_format);
    if let Some(path) = &cli.log_file {
        config = config.with_log_file(path);
    }
    Ok(config)
}
