//! Model description table.

use super::summary::BLANK;
use super::table::{Align, TextTable};
use crate::model::{StateModel, ValidationDefinition};

/// Note on the row of the model's initial state.
pub const INITIAL_STATE_NOTE: &str = "INITIAL STATE";
/// Note on rows whose state has no way out.
pub const END_STATE_NOTE: &str = "END STATE";

const HEADERS: [&str; 7] = [
    "Origin State",
    "Trigger",
    "Expected State",
    "Trigger Method",
    "Validation ID",
    "Validation Routine",
    "Notes",
];

struct RowSpec<'a> {
    origin: String,
    trigger: &'a str,
    destination: &'a str,
    method: Option<&'a str>,
    validations: &'a [ValidationDefinition],
    notes: Vec<&'static str>,
}

fn or_blank(value: Option<&str>) -> String {
    value.unwrap_or(BLANK).to_string()
}

fn push_rows(table: &mut TextTable, spec: RowSpec<'_>) {
    let first = spec.validations.first();
    table.add_row([
        spec.origin,
        spec.trigger.to_string(),
        spec.destination.to_string(),
        spec.method.unwrap_or("None").to_string(),
        or_blank(first.and_then(|v| v.name.as_deref())),
        or_blank(first.and_then(|v| v.routine.as_deref())),
        if spec.notes.is_empty() {
            BLANK.to_string()
        } else {
            spec.notes.join(", ")
        },
    ]);
    for validation in spec.validations.iter().skip(1) {
        table.add_row([
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            or_blank(validation.name.as_deref()),
            or_blank(validation.routine.as_deref()),
            String::new(),
        ]);
    }
}

/// Table of every transition in the model with the validations run on
/// arrival. Terminal states get a row of their own.
pub fn describe_model(model: &StateModel) -> String {
    let mut table = TextTable::new(HEADERS)
        .with_title(&format!("Model Description: {}", model.name()))
        .with_align("Validation Routine", Align::Left);

    let is_terminal = |state: &str| {
        model
            .state(state)
            .map_or(true, |definition| definition.transitions.is_empty())
    };

    for state in model.list_states() {
        let mut notes = Vec::new();
        if state == model.initial_state() {
            notes.push(INITIAL_STATE_NOTE);
        }
        let transitions = model.transitions_for(state).unwrap_or_default();

        if transitions.is_empty() {
            notes.push(END_STATE_NOTE);
            push_rows(
                &mut table,
                RowSpec {
                    origin: state.to_string(),
                    trigger: BLANK,
                    destination: BLANK,
                    method: Some(BLANK),
                    validations: model.validations_for(state),
                    notes,
                },
            );
            continue;
        }

        for (index, transition) in transitions.iter().enumerate() {
            let destination = transition.destination_state.as_str();
            let mut row_notes = if index == 0 { notes.clone() } else { Vec::new() };
            if is_terminal(destination) {
                row_notes.push(END_STATE_NOTE);
            }
            push_rows(
                &mut table,
                RowSpec {
                    origin: state.to_string(),
                    trigger: &transition.trigger_name,
                    destination,
                    method: transition.routine(),
                    validations: model.validations_for(destination),
                    notes: row_notes,
                },
            );
        }
    }

    for trigger in model.multi_triggers() {
        let destination = trigger.destination_state.as_str();
        let notes = if is_terminal(destination) {
            vec![END_STATE_NOTE]
        } else {
            Vec::new()
        };
        push_rows(
            &mut table,
            RowSpec {
                origin: trigger.source_states.to_string(),
                trigger: &trigger.trigger_name,
                destination,
                method: trigger.routine(),
                validations: model.validations_for(destination),
                notes,
            },
        );
    }

    format!("{}\n", table.render())
}
