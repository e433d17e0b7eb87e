//! Execution tracking.
//!
//! The tracker is an append-only list of [`ExecutionRecord`]s, one per
//! visited state. Only the newest record accepts writes, and writes go
//! through the [`RecordHandle`] returned when that record was created. Once
//! a new state is added, handles to earlier records are rejected.

use serde::{Deserialize, Serialize};

/// Tracker errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// Handle does not refer to any record
    #[error("No execution record #{0}")]
    UnknownRecord(usize),

    /// Handle refers to a record that is no longer current
    #[error("Execution record #{record} ('{state}') has been superseded")]
    Superseded {
        /// Record index
        record: usize,
        /// State of the stale record
        state: String,
    },

    /// Validation handle does not refer to a registered validation
    #[error("No validation #{index} on execution record #{record}")]
    UnknownValidation {
        /// Record index
        record: usize,
        /// Validation index
        index: usize,
    },
}

/// Write access to the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHandle(usize);

impl RecordHandle {
    /// Record index (0-based).
    pub fn index(self) -> usize {
        self.0
    }
}

/// Write access to one validation of the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationHandle {
    record: RecordHandle,
    index: usize,
}

/// One validation run against a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Validation id from the model
    pub key: String,
    /// Routine name
    pub routine: String,
    /// Expected result
    pub expectation: bool,
    /// Value returned by the routine
    pub actual: Option<bool>,
    /// `actual == expectation`
    pub result: Option<bool>,
}

impl ValidationRecord {
    /// True when the validation ran and matched its expectation.
    pub fn passed(&self) -> bool {
        self.result == Some(true)
    }
}

/// Everything recorded for one visited state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// State name
    pub state: String,
    /// Trigger that led here (empty for the initial state)
    pub transition: String,
    /// Step id of that trigger
    pub transition_id: String,
    /// Validations, in execution order
    pub validations: Vec<ValidationRecord>,
    /// Errors caught while handling the trigger
    pub errors: Vec<String>,
}

impl ExecutionRecord {
    /// No failed validation and no error.
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.validations.iter().all(ValidationRecord::passed)
    }
}

/// Append-only log of execution records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTracker {
    records: Vec<ExecutionRecord>,
}

impl ExecutionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record for `state`. It becomes the only writable record.
    pub fn add_state(&mut self, state: impl Into<String>) -> RecordHandle {
        self.records.push(ExecutionRecord {
            state: state.into(),
            ..ExecutionRecord::default()
        });
        RecordHandle(self.records.len() - 1)
    }

    fn current(&mut self, handle: RecordHandle) -> Result<&mut ExecutionRecord, TrackerError> {
        let last = self.records.len().checked_sub(1);
        match last {
            Some(last) if handle.0 == last => Ok(&mut self.records[last]),
            Some(last) if handle.0 < last => Err(TrackerError::Superseded {
                record: handle.0,
                state: self.records[handle.0].state.clone(),
            }),
            _ => Err(TrackerError::UnknownRecord(handle.0)),
        }
    }

    /// Record the trigger (and step id) that led to the record's state.
    /// Replaces any transition and validations already recorded.
    pub fn record_transition(
        &mut self,
        handle: RecordHandle,
        trigger: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<(), TrackerError> {
        let record = self.current(handle)?;
        record.transition = trigger.into();
        record.transition_id = id.into();
        record.validations.clear();
        Ok(())
    }

    /// Register a validation about to run.
    pub fn add_validation(
        &mut self,
        handle: RecordHandle,
        key: impl Into<String>,
        routine: impl Into<String>,
        expectation: bool,
    ) -> Result<ValidationHandle, TrackerError> {
        let record = self.current(handle)?;
        record.validations.push(ValidationRecord {
            key: key.into(),
            routine: routine.into(),
            expectation,
            actual: None,
            result: None,
        });
        Ok(ValidationHandle {
            record: handle,
            index: record.validations.len() - 1,
        })
    }

    /// Store the routine's response; the pass flag is derived from the
    /// expectation. Returns the pass flag.
    pub fn add_result(
        &mut self,
        validation: ValidationHandle,
        actual: bool,
    ) -> Result<bool, TrackerError> {
        let record = self.current(validation.record)?;
        let entry = record
            .validations
            .get_mut(validation.index)
            .ok_or(TrackerError::UnknownValidation {
                record: validation.record.0,
                index: validation.index,
            })?;
        let passed = actual == entry.expectation;
        entry.actual = Some(actual);
        entry.result = Some(passed);
        Ok(passed)
    }

    /// Attach an error message to the record.
    pub fn add_error(
        &mut self,
        handle: RecordHandle,
        error: impl Into<String>,
    ) -> Result<(), TrackerError> {
        self.current(handle)?.errors.push(error.into());
        Ok(())
    }

    /// All records in visit order.
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// Visited state names in order.
    pub fn path(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.state.as_str()).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when every record passed.
    pub fn passed(&self) -> bool {
        self.records.iter().all(ExecutionRecord::passed)
    }

    /// Records as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_state_and_transition() {
        let mut tracker = ExecutionTracker::new();
        tracker.add_state("DNE");
        let building = tracker.add_state("BUILDING");
        tracker
            .record_transition(building, "create", "1")
            .expect("current");

        assert_eq!(tracker.path(), vec!["DNE", "BUILDING"]);
        assert_eq!(tracker.records()[0].transition, "");
        assert_eq!(tracker.records()[1].transition, "create");
        assert_eq!(tracker.records()[1].transition_id, "1");
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut tracker = ExecutionTracker::new();
        let first = tracker.add_state("A");
        tracker.add_state("B");
        let err = tracker.add_error(first, "late").expect_err("superseded");
        assert_eq!(
            err,
            TrackerError::Superseded {
                record: 0,
                state: "A".into()
            }
        );
        assert!(tracker.records()[0].errors.is_empty());
    }

    #[test]
    fn test_unknown_record() {
        let mut tracker = ExecutionTracker::new();
        assert_eq!(
            tracker.add_error(RecordHandle(3), "x"),
            Err(TrackerError::UnknownRecord(3))
        );
    }

    #[test]
    fn test_validation_results() {
        let mut tracker = ExecutionTracker::new();
        let record = tracker.add_state("ACTIVE");
        let active = tracker
            .add_validation(record, "active", "is_active", true)
            .expect("add");
        let exists = tracker
            .add_validation(record, "exists", "does_exist", false)
            .expect("add");

        assert!(tracker.add_result(active, true).expect("result"));
        assert!(!tracker.add_result(exists, true).expect("result"));

        let validations = &tracker.records()[0].validations;
        assert_eq!(validations[0].result, Some(true));
        assert_eq!(validations[1].actual, Some(true));
        assert_eq!(validations[1].result, Some(false));
        assert!(!tracker.passed());
    }

    #[test]
    fn test_transition_resets_validations() {
        let mut tracker = ExecutionTracker::new();
        let record = tracker.add_state("A");
        tracker.add_validation(record, "v", "r", true).expect("add");
        tracker.record_transition(record, "go", "1").expect("transition");
        assert!(tracker.records()[0].validations.is_empty());
    }

    #[test]
    fn test_errors_fail_record() {
        let mut tracker = ExecutionTracker::new();
        let record = tracker.add_state("A");
        assert!(tracker.passed());
        tracker.add_error(record, "boom").expect("error");
        assert!(!tracker.records()[0].passed());
    }

    #[test]
    fn test_to_json() {
        let mut tracker = ExecutionTracker::new();
        tracker.add_state("A");
        let json = tracker.to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value[0]["state"], "A");
    }
}
