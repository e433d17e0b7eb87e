//! Status lines for step outcomes and command results

use console::{style, Term};
use flowprobe::engine::{RunResult, StepOutcome, StepStatus};

/// Prints PASS/FAIL status lines to stdout.
#[derive(Debug)]
pub struct StatusPrinter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for StatusPrinter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl StatusPrinter {
    /// Create a new printer
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    fn prefix(&self, passed: bool) -> String {
        match (self.use_color, passed) {
            (true, true) => style("✓").green().bold().to_string(),
            (true, false) => style("✗").red().bold().to_string(),
            (false, true) => "PASS".to_string(),
            (false, false) => "FAIL".to_string(),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(&format!("{} {message}", self.prefix(true)));
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        let _ = self.term.write_line(&format!("{} {message}", self.prefix(false)));
    }

    /// Print a plain block of text
    pub fn block(&self, text: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(text.trim_end());
    }

    /// One line per step of `result`
    pub fn steps(&self, result: &RunResult) {
        for (number, outcome) in result.steps.iter().enumerate() {
            let line = step_line(number + 1, outcome);
            if outcome.passed() {
                self.success(&line);
            } else {
                self.failure(&line);
            }
        }
    }
}

/// Describe one step outcome.
#[must_use]
pub fn step_line(number: usize, outcome: &StepOutcome) -> String {
    let head = format!("step {number} [{}] {}", outcome.id, outcome.trigger);
    match &outcome.status {
        StepStatus::Transitioned {
            expectations_met: true,
            ..
        } => format!("{head}: {} -> {}", outcome.from, outcome.to),
        StepStatus::Transitioned { .. } => format!(
            "{head}: {} -> {} (validation expectations not met)",
            outcome.from, outcome.to
        ),
        StepStatus::Illegal(illegal) => format!("{head}: {illegal}"),
    }
}

/// Count of failed steps and illegal transitions in `result`.
#[must_use]
pub fn failure_counts(result: &RunResult) -> (usize, usize) {
    result
        .steps
        .iter()
        .fold((0, 0), |(failed, illegal), step| match step.status {
            StepStatus::Illegal(_) => (failed, illegal + 1),
            StepStatus::Transitioned {
                expectations_met: false,
                ..
            } => (failed + 1, illegal),
            StepStatus::Transitioned { .. } => (failed, illegal),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flowprobe::engine::IllegalTransition;
    use serde_yaml_ng::Value;

    fn outcome(id: &str, status: StepStatus) -> StepOutcome {
        StepOutcome {
            trigger: "pause".to_string(),
            id: id.to_string(),
            from: "ACTIVE".to_string(),
            to: "PAUSED".to_string(),
            status,
        }
    }

    fn transitioned(expectations_met: bool) -> StepStatus {
        StepStatus::Transitioned {
            response: Value::Bool(true),
            validations: true,
            expectations_met,
        }
    }

    #[test]
    fn test_step_lines() {
        assert_eq!(
            step_line(3, &outcome("7", transitioned(true))),
            "step 3 [7] pause: ACTIVE -> PAUSED"
        );
        assert!(step_line(3, &outcome("7", transitioned(false))).ends_with("(validation expectations not met)"));

        let illegal = StepStatus::Illegal(IllegalTransition {
            trigger: "pause".to_string(),
            state: "DELETED".to_string(),
        });
        assert_eq!(
            step_line(1, &outcome("1", illegal)),
            "step 1 [1] pause: Can't trigger event 'pause' from state 'DELETED'"
        );
    }

    #[test]
    fn test_failure_counts() {
        let result = RunResult {
            final_state: "PAUSED".to_string(),
            steps: vec![
                outcome("1", transitioned(true)),
                outcome("2", transitioned(false)),
                outcome(
                    "3",
                    StepStatus::Illegal(IllegalTransition {
                        trigger: "pause".to_string(),
                        state: "PAUSED".to_string(),
                    }),
                ),
            ],
        };
        assert_eq!(failure_counts(&result), (1, 1));
    }

    #[test]
    fn test_prefix_without_color() {
        let printer = StatusPrinter::new(false, false);
        assert_eq!(printer.prefix(true), "PASS");
        assert_eq!(printer.prefix(false), "FAIL");
    }
}
