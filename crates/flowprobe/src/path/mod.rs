//! Test paths: ordered trigger sequences grouped into suites and cases.
//!
//! A path file is a list of test suites, each mapping test case names to
//! their steps:
//!
//! ```yaml
//! - smoke:
//!     create_delete:
//!       steps:
//!         - create: {id: 1, data: {flavor: 3}}
//!         - building: {id: 2}
//!         - delete: {id: 3, expectations: {exists: false}}
//! ```
//!
//! Test cases may instead reference a test case in another file and patch
//! it; see [`reference`].

pub mod reference;
pub mod step;
pub mod suite;
pub mod validation;

pub use reference::{
    CompositionError, InvalidReference, Reference, ReferentialComposer, StepSplicer,
    REFERENCE_DELIMITER,
};
pub use step::{
    traversal_path, validation_expectations, Payload, Step, StepBody, StepDefinition, StepId,
};
pub use suite::{PathError, PathFile, TestCaseDefinition, TestSuite};
pub use validation::{validate_step, validate_steps, PathValidation, Severity, StepIssue};
