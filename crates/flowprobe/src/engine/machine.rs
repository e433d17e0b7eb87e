//! The state machine engine.

use super::registry::{Context, RoutineKind, RoutineRegistry};
use crate::model::{ModelError, StateModel, TransitionInfo};
use crate::path::{traversal_path, Payload, Step};
use crate::report::TraversalDiagram;
use crate::tracker::{ExecutionTracker, RecordHandle, TrackerError};
use serde_yaml_ng::Value;

/// Default width of the star border logged around each step.
pub const DEFAULT_BORDER_WIDTH: usize = 120;

/// Default number of states per line in the traversal diagram.
pub const DEFAULT_ITEMS_PER_LINE: usize = 4;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Width of the star border around each step in the log
    pub border_width: usize,
    /// States per line in the traversal diagram
    pub items_per_line: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            border_width: DEFAULT_BORDER_WIDTH,
            items_per_line: DEFAULT_ITEMS_PER_LINE,
        }
    }
}

/// Errors that abort engine construction or a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The model failed validation
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A routine named by the model has no registration
    #[error("Unable to find {kind} routine '{routine}'")]
    UnresolvedRoutine {
        /// Routine name
        routine: String,
        /// Callback or validator
        kind: RoutineKind,
    },

    /// A transition callback returned an error
    #[error("Routine '{routine}' failed: {message}")]
    RoutineFailed {
        /// Routine name
        routine: String,
        /// Error reported by the routine
        message: String,
    },

    /// The execution tracker rejected a write
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// A trigger that is not available from the current state. Recorded against
/// the run, never returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Can't trigger event '{trigger}' from state '{state}'")]
pub struct IllegalTransition {
    /// Requested trigger
    pub trigger: String,
    /// State the machine stayed in
    pub state: String,
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    /// The transition fired.
    Transitioned {
        /// Value returned by the callback (`Null` when there is none)
        response: Value,
        /// AND of the validators' responses; `true` when there are none
        validations: bool,
        /// Every validator response matched its expectation
        expectations_met: bool,
    },
    /// The trigger was rejected and the state did not change.
    Illegal(IllegalTransition),
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Trigger requested
    pub trigger: String,
    /// Step id
    pub id: String,
    /// State before the step
    pub from: String,
    /// State after the step
    pub to: String,
    /// Outcome
    pub status: StepStatus,
}

impl StepOutcome {
    /// Transition fired and every expectation held.
    pub fn passed(&self) -> bool {
        matches!(
            self.status,
            StepStatus::Transitioned {
                expectations_met: true,
                ..
            }
        )
    }
}

/// Result of [`Engine::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// State the machine ended in
    pub final_state: String,
    /// One outcome per requested step
    pub steps: Vec<StepOutcome>,
}

impl RunResult {
    /// Every step fired and met its expectations.
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepOutcome::passed)
    }

    /// Steps that were rejected.
    pub fn illegal_transitions(&self) -> impl Iterator<Item = &IllegalTransition> {
        self.steps.iter().filter_map(|step| match &step.status {
            StepStatus::Illegal(illegal) => Some(illegal),
            StepStatus::Transitioned { .. } => None,
        })
    }
}

/// Drives a [`StateModel`] through test paths against a domain object `M`.
///
/// Each accepted trigger runs its callback on the source state, moves the
/// machine to the destination, then runs the destination's validators and
/// compares each response against the step's expectation. Rejected triggers
/// are recorded and the run carries on from the same state.
pub struct Engine<M> {
    model: StateModel,
    registry: RoutineRegistry<M>,
    context: Context<M>,
    tracker: ExecutionTracker,
    config: EngineConfig,
    description: String,
    trigger_list: Vec<String>,
    span: tracing::Span,
}

impl<M> std::fmt::Debug for Engine<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("model", &self.model.name())
            .field("state", &self.context.state())
            .field("records", &self.tracker.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M> Engine<M> {
    /// Build an engine. Fails if the model is invalid or names a routine the
    /// registry does not provide.
    pub fn new(
        model: StateModel,
        registry: RoutineRegistry<M>,
        object: M,
    ) -> Result<Self, EngineError> {
        model.validate()?;

        if let Some((kind, routine)) = registry.missing_routines(&model).into_iter().next() {
            tracing::error!(routine = %routine, kind = %kind, "Unable to find routine");
            return Err(EngineError::UnresolvedRoutine { routine, kind });
        }

        for state in model.list_states() {
            for transition in model.outgoing(state) {
                tracing::debug!(
                    trigger = %transition.trigger,
                    source = %state,
                    destination = %transition.destination,
                    routine = %transition.routine.as_deref().unwrap_or("None"),
                    multi = transition.multi,
                    "Adding trigger"
                );
            }
        }

        let span = tracing::info_span!("engine", model = %model.name());
        let context = Context::new(object, model.initial_state());
        let description = model.name().to_string();
        Ok(Self {
            model,
            registry,
            context,
            tracker: ExecutionTracker::new(),
            config: EngineConfig::default(),
            description,
            trigger_list: Vec::new(),
            span,
        })
    }

    /// Replace the engine settings.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a caller-provided logging span.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// The model being executed.
    pub fn model(&self) -> &StateModel {
        &self.model
    }

    /// Current state.
    pub fn state(&self) -> &str {
        self.context.state()
    }

    /// Domain object.
    pub fn object(&self) -> &M {
        self.context.object()
    }

    /// Execution records.
    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    /// Engine settings.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Model name plus the description of the last run.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Visited states, in order.
    pub fn path(&self) -> Vec<&str> {
        self.tracker.path()
    }

    /// Triggers requested by the last run.
    pub fn trigger_list(&self) -> &[String] {
        &self.trigger_list
    }

    /// Consume the engine, returning the domain object and the records.
    pub fn into_parts(self) -> (M, ExecutionTracker) {
        (self.context.into_object(), self.tracker)
    }

    fn set_description(&mut self, description: Option<&str>) {
        self.description = match description {
            Some(description) => format!("{} {description}", self.model.name()),
            None => self.model.name().to_string(),
        };
        tracing::debug!(description = %self.description, "Setting execution description");
    }

    fn border(&self, topic: &str) {
        let stars = "*".repeat(self.config.border_width / 2);
        tracing::info!("{stars} {topic} {stars}");
    }

    /// Execute `steps` in order from the current state.
    ///
    /// Illegal triggers are recorded and skipped. Only callback failures and
    /// tracker misuse abort the run.
    pub fn execute(
        &mut self,
        steps: &[Step],
        description: Option<&str>,
    ) -> Result<RunResult, EngineError> {
        let span = self.span.clone();
        let _guard = span.enter();

        self.set_description(description);
        self.trigger_list = traversal_path(steps);
        tracing::debug!(path = ?self.trigger_list, "Requested path");

        self.tracker.add_state(self.context.state());
        let mut outcomes = Vec::with_capacity(steps.len());

        for step in steps {
            self.border(&format!("START ACTION: '{}'", step.trigger.to_uppercase()));
            tracing::info!(trigger = %step.trigger, id = %step.id_str(), "Requested Transition: {}", step.trigger.to_uppercase());
            tracing::info!(data = ?step.data, "Trigger Data");

            outcomes.push(self.fire(step)?);
        }

        tracing::info!("Path traversal complete.");
        Ok(RunResult {
            final_state: self.context.state().to_string(),
            steps: outcomes,
        })
    }

    fn fire(&mut self, step: &Step) -> Result<StepOutcome, EngineError> {
        let from = self.context.state().to_string();
        self.context.begin_step(&step.trigger, step.id_str());

        let Some(transition) = self.model.transition_info(&from, &step.trigger) else {
            let illegal = IllegalTransition {
                trigger: step.trigger.clone(),
                state: from.clone(),
            };
            let record = self.tracker.add_state(&from);
            self.tracker
                .record_transition(record, &step.trigger, step.id_str())?;
            self.tracker.add_error(record, illegal.to_string())?;
            tracing::error!("ERROR: {illegal}");
            tracing::error!("Remaining in '{}' state.", from.to_uppercase());

            return Ok(StepOutcome {
                trigger: step.trigger.clone(),
                id: step.id_str().to_string(),
                to: from.clone(),
                from,
                status: StepStatus::Illegal(illegal),
            });
        };

        let response = self.run_callback(&transition, &step.data)?;
        tracing::info!(response = ?response, "Result of Trigger");

        self.context.set_state(&transition.destination);
        let record = self.tracker.add_state(&transition.destination);
        self.tracker
            .record_transition(record, &step.trigger, step.id_str())?;
        let (validations, expectations_met) = self.run_validations(record, step)?;

        let status = if validations { "PASSED" } else { "FAILED" };
        self.border(&format!("END STEP - {status}"));

        Ok(StepOutcome {
            trigger: step.trigger.clone(),
            id: step.id_str().to_string(),
            from,
            to: transition.destination,
            status: StepStatus::Transitioned {
                response,
                validations,
                expectations_met,
            },
        })
    }

    fn run_callback(
        &mut self,
        transition: &TransitionInfo,
        payload: &Payload,
    ) -> Result<Value, EngineError> {
        let Some(routine) = transition.routine.as_deref() else {
            tracing::debug!(trigger = %transition.trigger, "No transition routine configured");
            return Ok(Value::Null);
        };
        let callback =
            self.registry
                .callback(routine)
                .ok_or_else(|| EngineError::UnresolvedRoutine {
                    routine: routine.to_string(),
                    kind: RoutineKind::Callback,
                })?;

        tracing::debug!(routine = %routine, source = %transition.source, "Executing transition routine");
        callback(&mut self.context, payload).map_err(|e| {
            tracing::error!(routine = %routine, error = %e, "Transition routine failed");
            EngineError::RoutineFailed {
                routine: routine.to_string(),
                message: e.to_string(),
            }
        })
    }

    fn run_validations(
        &mut self,
        record: RecordHandle,
        step: &Step,
    ) -> Result<(bool, bool), EngineError> {
        let state = self.context.state().to_string();
        let mut overall = true;
        let mut expectations_met = true;

        for definition in self.model.validations_for(&state) {
            let (Some(key), Some(routine)) = (&definition.name, &definition.routine) else {
                tracing::info!(state = %state, "No state validations defined");
                continue;
            };
            let expectation = step.expectation(key);
            let handle = self
                .tracker
                .add_validation(record, key, routine, expectation)?;

            let validator =
                self.registry
                    .validator(routine)
                    .ok_or_else(|| EngineError::UnresolvedRoutine {
                        routine: routine.clone(),
                        kind: RoutineKind::Validator,
                    })?;
            let actual = validator(&self.context, &step.data);
            let passed = self.tracker.add_result(handle, actual)?;
            tracing::debug!(validation = %key, routine = %routine, expectation, actual, passed, "Validation");

            overall &= actual;
            expectations_met &= passed;
        }
        Ok((overall, expectations_met))
    }

    /// ASCII chain of the states visited so far.
    pub fn traversal_diagram(&self) -> TraversalDiagram {
        TraversalDiagram::new(self.tracker.path(), &self.trigger_list)
            .items_per_line(self.config.items_per_line)
            .add_index(true)
    }

    /// Tabular summary of the execution records.
    pub fn execution_summary(&self, detailed: bool) -> String {
        crate::report::render_summary(self.tracker.records(), Some(&self.description), detailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::RoutineError;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MODEL: &str = r"
model: server
initial_state: DNE
definition:
  - DNE:
      transitions:
        - trigger_name: create
          destination_state: BUILDING
          routine_to_change_state: object_model.create
  - BUILDING:
      validations:
        - name: exists
          routine: object_model.exists
        - name: building
          routine: object_model.building
      transitions:
        - trigger_name: finish
          destination_state: ACTIVE
          routine_to_change_state: None
  - ACTIVE:
      transitions: []
  - ERROR:
  - __MULTI_TRIGGERS__:
      - trigger_name: error
        routine_to_change_state: object_model.fail
        destination_state: ERROR
        source_states: [BUILDING, ACTIVE]
";

    #[derive(Debug, Default)]
    struct Server {
        exists: bool,
        building: bool,
        created_from: Vec<String>,
    }

    fn registry() -> RoutineRegistry<Server> {
        RoutineRegistry::<Server>::new()
            .with_callback("object_model.create", |ctx, data| {
                let source = ctx.state().to_string();
                let server = ctx.object_mut();
                server.exists = true;
                server.building = true;
                server.created_from.push(source);
                Ok(Value::Number(data.len().into()))
            })
            .with_callback("object_model.fail", |ctx, _| {
                ctx.object_mut().building = false;
                Ok(Value::Null)
            })
            .with_validator("object_model.exists", |ctx, _| ctx.object().exists)
            .with_validator("object_model.building", |ctx, _| {
                ctx.state() == "BUILDING" && ctx.object().building
            })
    }

    fn engine() -> Engine<Server> {
        let model = StateModel::from_yaml(MODEL).expect("model");
        Engine::new(model, registry(), Server::default()).expect("engine")
    }

    #[test]
    fn test_single_transition_scenario() {
        let mut engine = engine();
        let result = engine
            .execute(&[Step::new("create", "1")], None)
            .expect("run");

        assert_eq!(engine.path(), vec!["DNE", "BUILDING"]);
        let records = engine.tracker().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].transition, "");
        assert_eq!(records[1].transition, "create");
        assert_eq!(records[1].transition_id, "1");
        assert_eq!(records[1].validations.len(), 2);
        assert_eq!(result.final_state, "BUILDING");
        assert!(result.passed());
    }

    #[test]
    fn test_callback_runs_on_source_state() {
        let mut engine = engine();
        engine
            .execute(&[Step::new("create", "1")], None)
            .expect("run");
        assert_eq!(engine.object().created_from, vec!["DNE"]);
    }

    #[test]
    fn test_callback_receives_payload() {
        let mut data = Payload::new();
        data.insert(Value::String("flavor".into()), Value::Number(3.into()));
        let mut engine = engine();
        let result = engine
            .execute(&[Step::new("create", "1").with_data(data)], None)
            .expect("run");
        assert!(matches!(
            &result.steps[0].status,
            StepStatus::Transitioned { response, .. } if *response == Value::Number(1.into())
        ));
    }

    #[test]
    fn test_illegal_transition_duplicates_state() {
        let mut engine = engine();
        let steps = [
            Step::new("create", "1"),
            Step::new("create", "2"),
            Step::new("finish", "3"),
        ];
        let result = engine.execute(&steps, None).expect("run");

        assert_eq!(engine.path(), vec!["DNE", "BUILDING", "BUILDING", "ACTIVE"]);
        let illegal = &engine.tracker().records()[2];
        assert_eq!(illegal.transition, "create");
        assert_eq!(
            illegal.errors,
            vec!["Can't trigger event 'create' from state 'BUILDING'".to_string()]
        );
        assert!(illegal.validations.is_empty());

        assert!(!result.passed());
        assert_eq!(result.illegal_transitions().count(), 1);
        assert_eq!(result.final_state, "ACTIVE");
    }

    #[test]
    fn test_state_without_validations_is_vacuous_pass() {
        let mut engine = engine();
        let result = engine
            .execute(&[Step::new("create", "1"), Step::new("finish", "2")], None)
            .expect("run");
        assert!(matches!(
            result.steps[1].status,
            StepStatus::Transitioned {
                validations: true,
                expectations_met: true,
                ..
            }
        ));
        assert!(engine.tracker().records()[2].validations.is_empty());
    }

    #[test]
    fn test_expectation_override() {
        let mut engine = engine();
        let steps = [
            Step::new("create", "1").with_expectation("exists", false),
        ];
        let result = engine.execute(&steps, None).expect("run");
        let validations = &engine.tracker().records()[1].validations;
        assert!(!validations[0].expectation);
        assert_eq!(validations[0].actual, Some(true));
        assert_eq!(validations[0].result, Some(false));
        assert!(validations[1].passed());
        assert!(matches!(
            result.steps[0].status,
            StepStatus::Transitioned {
                validations: true,
                expectations_met: false,
                ..
            }
        ));
    }

    #[test]
    fn test_multi_trigger_from_listed_source() {
        let mut engine = engine();
        let steps = [
            Step::new("create", "1"),
            Step::new("error", "2"),
        ];
        let result = engine.execute(&steps, None).expect("run");
        assert_eq!(result.final_state, "ERROR");
        assert!(result.passed());
    }

    #[test]
    fn test_multi_trigger_respects_sources() {
        let mut engine = engine();
        let result = engine
            .execute(&[Step::new("error", "1")], None)
            .expect("run");
        assert_eq!(result.final_state, "DNE");
        assert_eq!(result.illegal_transitions().count(), 1);
    }

    #[test]
    fn test_unregistered_routine_fails_build() {
        let model = StateModel::from_yaml(MODEL).expect("model");
        let registry = RoutineRegistry::<Server>::new()
            .with_callback("object_model.create", |_, _| Ok(Value::Null))
            .with_callback("object_model.fail", |_, _| Ok(Value::Null));
        let err = Engine::new(model, registry, Server::default()).expect_err("missing");
        assert!(matches!(
            err,
            EngineError::UnresolvedRoutine { ref routine, kind: RoutineKind::Validator }
                if routine == "object_model.building"
        ));
    }

    #[test]
    fn test_invalid_model_fails_build() {
        let model = StateModel::from_yaml(&MODEL.replace("initial_state: DNE", "initial_state: NOPE"))
            .expect("model");
        assert!(matches!(
            Engine::new(model, registry(), Server::default()),
            Err(EngineError::Model(_))
        ));
    }

    #[test]
    fn test_callback_error_aborts_run() {
        let model = StateModel::from_yaml(MODEL).expect("model");
        let registry = registry().with_callback("object_model.create", |_, _| {
            Err(RoutineError::new("quota exceeded"))
        });
        let mut engine = Engine::new(model, registry, Server::default()).expect("engine");
        let err = engine
            .execute(&[Step::new("create", "1"), Step::new("finish", "2")], None)
            .expect_err("callback failure");
        assert_eq!(
            err,
            EngineError::RoutineFailed {
                routine: "object_model.create".into(),
                message: "quota exceeded".into()
            }
        );
        assert_eq!(engine.state(), "DNE");
    }

    #[test]
    fn test_description_and_triggers() {
        let mut engine = engine();
        engine
            .execute(&[Step::new("create", "1")], Some("(smoke:create)"))
            .expect("run");
        assert_eq!(engine.description(), "server (smoke:create)");
        assert_eq!(engine.trigger_list().to_vec(), vec!["create".to_string()]);
        assert!(engine.execution_summary(true).contains("Execution Summary for server (smoke:create)"));
    }

    #[test]
    fn test_validators_see_shared_state() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);
        let model = StateModel::from_yaml(MODEL).expect("model");
        let registry = registry().with_validator("object_model.exists", move |ctx, _| {
            seen.borrow_mut().push(format!("{}:{}", ctx.trigger(), ctx.step_id()));
            true
        });
        let mut engine = Engine::new(model, registry, Server::default()).expect("engine");
        engine
            .execute(&[Step::new("create", "A1")], None)
            .expect("run");
        assert_eq!(*calls.borrow(), vec!["create:A1".to_string()]);
    }
}
