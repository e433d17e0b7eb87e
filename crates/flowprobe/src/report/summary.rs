//! Execution summary table.

use super::table::{Align, TextTable};
use crate::tracker::{ExecutionRecord, ValidationRecord};

/// Placeholder for missing values.
pub const BLANK: &str = "--";

const INDEX: &str = "Index";
const STATE: &str = "State";
const TRANSITION: &str = "Transition";
const TRANSITION_ID: &str = "Trans ID";
const ROUTINE: &str = "Validation Routine";
const VALIDATION_ID: &str = "Validation ID";
const EXPECTATION: &str = "Expectation";
const RESPONSE: &str = "Response";
const RESULT: &str = "Result";
const ERRORS: &str = "Errors";

/// Render execution records as a table, one row per validation.
///
/// Records without validations get a single row with `--` in the validation
/// columns. Extra validation rows of the same record leave the state columns
/// blank. `detailed` adds the step id of each transition.
pub fn render_summary(
    records: &[ExecutionRecord],
    description: Option<&str>,
    detailed: bool,
) -> String {
    let mut headers = vec![INDEX, STATE, TRANSITION];
    if detailed {
        headers.push(TRANSITION_ID);
    }
    headers.extend([ROUTINE, VALIDATION_ID, EXPECTATION, RESPONSE, RESULT, ERRORS]);

    let title = match description {
        Some(description) => format!("Execution Summary for {description}"),
        None => "Execution Summary".to_string(),
    };
    let mut table = TextTable::new(headers)
        .with_title(&title)
        .with_align(INDEX, Align::Right);

    for (number, record) in records.iter().enumerate() {
        let state_cells = || {
            let mut cells = vec![
                (number + 1).to_string(),
                record.state.clone(),
                record.transition.clone(),
            ];
            if detailed {
                cells.push(record.transition_id.clone());
            }
            cells
        };

        if record.validations.is_empty() {
            let mut row = state_cells();
            row.extend(std::iter::repeat(BLANK.to_string()).take(5));
            row.push(record.errors.join("\n"));
            table.add_row(row);
            continue;
        }

        for (index, validation) in record.validations.iter().enumerate() {
            let mut row = if index == 0 {
                state_cells()
            } else {
                vec![String::new(); if detailed { 4 } else { 3 }]
            };
            row.extend(validation_cells(validation));
            row.push(if index == 0 {
                record.errors.join("\n")
            } else {
                String::new()
            });
            table.add_row(row);
        }
    }

    tracing::debug!(records = records.len(), rows = table.len(), "Rendered execution summary");
    format!("{}\n", table.render())
}

fn validation_cells(validation: &ValidationRecord) -> [String; 5] {
    let optional = |value: Option<bool>| value.map_or_else(|| BLANK.to_string(), |v| v.to_string());
    [
        validation.routine.clone(),
        validation.key.clone(),
        validation.expectation.to_string(),
        optional(validation.actual),
        if validation.passed() { "Pass" } else { "FAIL" }.to_string(),
    ]
}
