//! Run command handler

use super::{check_triggers, load_model, load_paths};
use crate::commands::{ReportFormat, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{failure_counts, StatusPrinter};
use crate::vm::{self, VmModel};
use flowprobe::engine::{Engine, RunResult};
use flowprobe::path::traversal_path;
use flowprobe::report::{describe_model, to_dot};

/// Everything a run produced, ready to print.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `(<suite>:<case>)`
    pub description: String,
    /// Per-step outcomes
    pub result: RunResult,
    /// Model description table
    pub model_table: String,
    /// Traversal diagram
    pub diagram: String,
    /// Execution summary table
    pub summary: String,
    /// Execution records as JSON
    pub records: String,
}

impl RunReport {
    /// Text rendering of the report
    #[must_use]
    pub fn to_text(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.model_table, self.diagram, self.summary
        )
    }
}

/// Execute the selected test case against the VM object model.
pub fn run_case(config: &CliConfig, args: &RunArgs) -> CliResult<RunReport> {
    let (suite, case) = (args.case.suite.as_str(), args.case.case.as_str());
    tracing::info!(model = %args.model.display(), paths = %args.paths.display(), "Input files");

    let model = load_model(&args.model)?;
    model.validate().map_err(CliError::flow)?;

    if let Some(dot) = &args.dot {
        std::fs::write(dot, to_dot(&model))?;
        tracing::info!(path = %dot.display(), "Wrote model graph");
    }

    let mut engine = Engine::new(model, vm::registry(), VmModel::new())
        .map_err(CliError::flow)?
        .with_config(config.engine_config());
    let model_table = describe_model(engine.model());
    tracing::debug!("\n{model_table}");

    let steps = load_paths(&args.paths)?
        .build_test_case(suite, case)
        .map_err(CliError::flow)?;
    if steps.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "test case '{suite}:{case}' has no steps"
        )));
    }
    check_triggers(engine.model(), &traversal_path(&steps))?;

    let description = format!("({suite}:{case})");
    let result = engine
        .execute(&steps, Some(description.as_str()))
        .map_err(CliError::flow)?;

    tracing::info!("Final State: {}", engine.state());
    tracing::info!("Final Object:\n{}", engine.object());

    let detailed = config.detailed && !args.brief;
    Ok(RunReport {
        description,
        model_table,
        diagram: engine.traversal_diagram().to_string(),
        summary: engine.execution_summary(detailed),
        records: engine.tracker().to_json().map_err(CliError::flow)?,
        result,
    })
}

/// Execute the run command. Fails when any step missed its expectations or
/// was rejected.
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let report = run_case(config, args)?;
    let printer = StatusPrinter::new(config.color.should_color(), config.verbosity.is_quiet());

    match args.format {
        ReportFormat::Text => {
            printer.block(&report.to_text());
            printer.steps(&report.result);
        }
        ReportFormat::Json => println!("{}", report.records),
    }

    let (failed, illegal) = failure_counts(&report.result);
    if failed == 0 && illegal == 0 {
        printer.success(&format!(
            "{} passed in {} step(s), final state '{}'",
            report.description,
            report.result.steps.len(),
            report.result.final_state
        ));
        Ok(())
    } else {
        Err(CliError::execution(format!(
            "{}: {failed} step(s) failed validation expectations, {illegal} illegal transition(s)",
            report.description
        )))
    }
}
