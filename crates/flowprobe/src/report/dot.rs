//! Graphviz export of a state model.

use crate::model::StateModel;
use std::fmt::Write as _;

fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}

/// Generate the model's state diagram in DOT format.
///
/// States with no way out are drawn as double circles. Transitions that come
/// from the multi-trigger section are dashed, one edge per covered source.
pub fn to_dot(model: &StateModel) -> String {
    let mut dot = String::new();
    let _ = writeln!(dot, "digraph {} {{", quoted(model.name()));
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [shape=ellipse];\n");

    let _ = writeln!(
        dot,
        "  __start [shape=point];\n  __start -> {};",
        quoted(model.initial_state())
    );

    let states = model.list_states();
    for state in &states {
        let shape = if model.outgoing(state).is_empty() {
            "doublecircle"
        } else {
            "ellipse"
        };
        let _ = writeln!(dot, "  {} [shape={shape}];", quoted(state));
    }

    for state in &states {
        for transition in model.outgoing(state) {
            let style = if transition.multi { ", style=dashed" } else { "" };
            let _ = writeln!(
                dot,
                "  {} -> {} [label={}{style}];",
                quoted(&transition.source),
                quoted(&transition.destination),
                quoted(&transition.trigger)
            );
        }
    }

    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r"
model: lamp
initial_state: OFF
definition:
  - OFF:
      transitions:
        - trigger_name: switch_on
          destination_state: ON
  - ON:
      transitions:
        - trigger_name: switch_off
          destination_state: OFF
  - BROKEN:
  - __MULTI_TRIGGERS__:
      - trigger_name: break
        routine_to_change_state: object_model.smash
        destination_state: BROKEN
        source_states: [OFF, ON]
";

    #[test]
    fn test_to_dot() {
        let model = StateModel::from_yaml(MODEL).expect("model");
        let dot = to_dot(&model);

        assert!(dot.starts_with("digraph \"lamp\" {"));
        assert!(dot.contains("__start -> \"OFF\";"));
        assert!(dot.contains("\"BROKEN\" [shape=doublecircle];"));
        assert!(dot.contains("\"ON\" [shape=ellipse];"));
        assert!(dot.contains("\"OFF\" -> \"ON\" [label=\"switch_on\"];"));
        assert!(dot.contains("\"ON\" -> \"BROKEN\" [label=\"break\", style=dashed];"));
        assert!(dot.ends_with("}\n"));
    }
}
