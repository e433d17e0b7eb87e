//! Describe and graph command handlers

use super::{emit, load_model};
use crate::commands::{DescribeArgs, GraphArgs};
use crate::error::{CliError, CliResult};
use flowprobe::report::{describe_model, to_dot};

/// Execute the describe command
pub fn execute_describe(args: &DescribeArgs) -> CliResult<()> {
    let model = load_model(&args.model)?;
    print!("{}", describe_model(&model));
    Ok(())
}

/// DOT graph of a validated model.
pub fn render_graph(args: &GraphArgs) -> CliResult<String> {
    let model = load_model(&args.model)?;
    model.validate().map_err(CliError::flow)?;
    Ok(to_dot(&model))
}

/// Execute the graph command
pub fn execute_graph(args: &GraphArgs) -> CliResult<()> {
    emit(&render_graph(args)?, args.output.as_deref())
}
