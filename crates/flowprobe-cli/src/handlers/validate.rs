//! Validate command handler

use super::{check_triggers, load_model, load_paths};
use crate::commands::ValidateArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::StatusPrinter;
use flowprobe::path::{traversal_path, validate_steps};

/// Findings of a successful validation, one line each.
pub fn validate(args: &ValidateArgs) -> CliResult<Vec<String>> {
    let model = load_model(&args.model)?;
    model.validate().map_err(CliError::flow)?;

    let mut report = vec![format!(
        "Model '{}' is valid: {} states, {} triggers",
        model.name(),
        model.list_states().len(),
        model.all_trigger_names().len()
    )];

    if let (Some(paths), Some(suite), Some(case)) = (&args.paths, &args.suite, &args.case) {
        let steps = load_paths(paths)?
            .build_test_case(suite, case)
            .map_err(CliError::flow)?;
        check_triggers(&model, &traversal_path(&steps))?;

        report.extend(validate_steps(&steps).warnings().map(|w| format!("warning: {w}")));
        report.push(format!(
            "Test case '{suite}:{case}' is valid: {} steps",
            steps.len()
        ));
    }
    Ok(report)
}

/// Execute the validate command
pub fn execute_validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    let printer = StatusPrinter::new(config.color.should_color(), config.verbosity.is_quiet());
    for line in validate(args)? {
        printer.success(&line);
    }
    Ok(())
}
