//! Config command handler

use crate::config::CliConfig;
use crate::error::CliResult;

/// Execute the config command
pub fn execute_config(config: &CliConfig) -> CliResult<()> {
    println!("Current configuration:");
    print!("{}", config.to_yaml()?);
    Ok(())
}
