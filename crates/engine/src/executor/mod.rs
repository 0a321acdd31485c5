//! The executor: walks a workflow definition in dependency order, resolves
//! each step's parameters, dispatches to the registered handler, and records
//! outcomes.
//!
//! A run moves through `Validating → Running → {Completed, Failed, Exited}`:
//!
//! - **Validating** checks dependency-graph acyclicity, plugin resolvability
//!   for every step, and every `${variables.*}` reference — any violation is
//!   an [`EngineError`] returned before a single handler runs, so a broken
//!   workflow has no side effects.
//! - **Running** executes steps one at a time, synchronously, in a
//!   deterministic topological order (ties broken by definition order). The
//!   first handler error or parameter-resolution failure halts the run with
//!   the failing step named; the exit step's outcome halts it with a status
//!   code. There is no cancellation, timeout, or preemption.
//!
//! Telemetry events are published to an optional notifier as the run
//! progresses; the executor itself never subscribes.

mod planning;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use renderflow_bus::EventBus;
use renderflow_types::{Event, EventKind, StepDefinition, WorkflowDefinition};

use crate::context::RunContext;
use crate::error::EngineError;
use crate::params::ResolvedStep;
use crate::registry::{StepOutcome, StepRegistry};
use crate::resolve;

/// Final status of one executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// The handler completed without error.
    Succeeded,
    /// The handler (or parameter resolution) reported an error.
    Failed,
    /// The step requested run termination with a status code.
    Exited,
}

/// Record of one executed step, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step identifier.
    pub id: String,
    /// How the step ended.
    pub status: StepStatus,
    /// Failure or exit message, when one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Terminal state of a run that got past validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every step ran to success.
    Completed,
    /// The exit step selected a termination code.
    Exited {
        /// Status code for the process exit surface.
        code: i32,
        /// Diagnostic message supplied by the exit step, if any.
        message: Option<String>,
    },
    /// A step failed and the run halted.
    Failed {
        /// Identifier of the failing step.
        step_id: String,
        /// Human-readable failure description.
        message: String,
    },
}

/// Outcome plus the per-step records of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Terminal state of the run.
    pub outcome: RunOutcome,
    /// One record per step that was attempted, in execution order.
    pub records: Vec<StepRecord>,
}

/// Drives workflow definitions against a step registry.
///
/// The registry is borrowed, not owned: construct it once at startup and
/// share it across runs. Each run gets its own [`RunContext`].
pub struct Executor<'a> {
    registry: &'a StepRegistry,
    notifier: Option<&'a EventBus>,
}

impl<'a> Executor<'a> {
    /// Creates an executor over the given registry, with no notifier.
    pub fn new(registry: &'a StepRegistry) -> Self {
        Self { registry, notifier: None }
    }

    /// Attaches a notifier; telemetry events are published synchronously as
    /// the run progresses.
    pub fn with_notifier(mut self, notifier: &'a EventBus) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Pre-flight validation: dependency planning, batch plugin resolution,
    /// and static reference checks. Returns the execution order on success.
    ///
    /// This performs no side effects, so a workflow that fails validation
    /// leaves the context and all collaborators untouched.
    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<Vec<usize>, EngineError> {
        let order = planning::order_steps(workflow)?;
        self.registry.validate(workflow)?;
        for step in &workflow.steps {
            for (name, value) in &step.parameters {
                resolve::check_static_refs(value, workflow).map_err(|source| EngineError::Resolution {
                    step_id: step.id.clone(),
                    parameter: name.clone(),
                    source,
                })?;
            }
        }
        Ok(order)
    }

    /// Validates and runs a workflow to its terminal state.
    ///
    /// Load-time violations surface as `Err` before any step executes;
    /// runtime failures surface as a report whose outcome names the failing
    /// step. The context is owned by this run: callers may seed it with
    /// overrides beforehand and inspect it afterwards.
    pub fn run(&self, workflow: &WorkflowDefinition, context: &mut RunContext) -> Result<RunReport, EngineError> {
        let order = self.validate(workflow)?;
        let workflow_name = workflow.name.as_deref().unwrap_or("unnamed");

        info!(workflow = workflow_name, step_count = order.len(), "workflow run started");
        self.publish(EventKind::RunStarted, json!({ "workflow": workflow_name, "step_count": order.len() }));

        let mut records = Vec::with_capacity(order.len());

        for index in order {
            let definition = &workflow.steps[index];
            debug!(step_id = %definition.id, plugin = %definition.plugin, "step execution started");
            self.publish(
                EventKind::StepStarted,
                json!({ "step_id": definition.id, "plugin": definition.plugin }),
            );

            let resolved = match self.resolve_step(definition, workflow, context) {
                Ok(resolved) => resolved,
                Err(error) => {
                    let message = error.to_string();
                    return Ok(self.fail_run(workflow_name, definition, message, records));
                }
            };

            let Some(handler) = self.registry.get(&definition.plugin) else {
                // Unreachable after validation; kept so a registry mutated
                // between validate and run cannot panic the executor.
                let message = format!("unknown plugin '{}'", definition.plugin);
                return Ok(self.fail_run(workflow_name, definition, message, records));
            };

            match handler.execute(context, &resolved) {
                Ok(StepOutcome::Continue) => {
                    debug!(step_id = %definition.id, "step execution succeeded");
                    self.publish(EventKind::StepFinished, json!({ "step_id": definition.id }));
                    records.push(StepRecord {
                        id: definition.id.clone(),
                        status: StepStatus::Succeeded,
                        message: None,
                    });
                }
                Ok(StepOutcome::Exit { code, message }) => {
                    info!(workflow = workflow_name, step_id = %definition.id, code, "run exited by step");
                    self.publish(EventKind::StepFinished, json!({ "step_id": definition.id }));
                    self.publish(
                        EventKind::RunExited,
                        json!({ "workflow": workflow_name, "step_id": definition.id, "code": code, "message": message }),
                    );
                    records.push(StepRecord {
                        id: definition.id.clone(),
                        status: StepStatus::Exited,
                        message: message.clone(),
                    });
                    return Ok(RunReport {
                        outcome: RunOutcome::Exited { code, message },
                        records,
                    });
                }
                Err(error) => {
                    let message = format!("{error:#}");
                    return Ok(self.fail_run(workflow_name, definition, message, records));
                }
            }
        }

        info!(workflow = workflow_name, steps = records.len(), "workflow run completed");
        self.publish(EventKind::RunCompleted, json!({ "workflow": workflow_name, "steps": records.len() }));
        Ok(RunReport {
            outcome: RunOutcome::Completed,
            records,
        })
    }

    fn resolve_step(
        &self,
        definition: &StepDefinition,
        workflow: &WorkflowDefinition,
        context: &RunContext,
    ) -> Result<ResolvedStep, EngineError> {
        let mut parameters = indexmap::IndexMap::with_capacity(definition.parameters.len());
        for (name, value) in &definition.parameters {
            let resolved = resolve::resolve_value(value, workflow, context).map_err(|source| EngineError::Resolution {
                step_id: definition.id.clone(),
                parameter: name.clone(),
                source,
            })?;
            parameters.insert(name.clone(), resolved);
        }
        Ok(ResolvedStep {
            id: definition.id.clone(),
            plugin: definition.plugin.clone(),
            parameters,
        })
    }

    fn fail_run(&self, workflow_name: &str, definition: &StepDefinition, message: String, mut records: Vec<StepRecord>) -> RunReport {
        warn!(workflow = workflow_name, step_id = %definition.id, %message, "step execution failed");
        self.publish(
            EventKind::StepFailed,
            json!({ "step_id": definition.id, "message": message }),
        );
        self.publish(
            EventKind::RunFailed,
            json!({ "workflow": workflow_name, "step_id": definition.id, "message": message }),
        );
        records.push(StepRecord {
            id: definition.id.clone(),
            status: StepStatus::Failed,
            message: Some(message.clone()),
        });
        RunReport {
            outcome: RunOutcome::Failed {
                step_id: definition.id.clone(),
                message,
            },
            records,
        }
    }

    fn publish(&self, kind: EventKind, payload: serde_json::Value) {
        if let Some(notifier) = self.notifier {
            notifier.publish(&Event::new(kind, payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StepHandler;
    use anyhow::bail;
    use renderflow_types::VariableDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Appends its own id to the context under `trace` so tests can observe
    /// execution order.
    struct TraceStep;

    impl StepHandler for TraceStep {
        fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> anyhow::Result<StepOutcome> {
            let mut trace = context.text_or("trace", "");
            if !trace.is_empty() {
                trace.push(',');
            }
            trace.push_str(&step.id);
            context.set("trace", trace);
            Ok(StepOutcome::Continue)
        }
    }

    struct FailStep;

    impl StepHandler for FailStep {
        fn execute(&self, _context: &mut RunContext, _step: &ResolvedStep) -> anyhow::Result<StepOutcome> {
            bail!("boom")
        }
    }

    struct CountStep(Arc<AtomicUsize>);

    impl StepHandler for CountStep {
        fn execute(&self, _context: &mut RunContext, _step: &ResolvedStep) -> anyhow::Result<StepOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::Continue)
        }
    }

    fn trace_registry() -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry.register("debug.trace", TraceStep);
        registry.register("debug.fail", FailStep);
        registry.register("system.exit", crate::steps::exit::ExitStep);
        registry
    }

    #[test]
    fn runs_steps_in_dependency_order_and_completes() {
        let registry = trace_registry();
        let workflow = WorkflowDefinition {
            name: Some("ordered".into()),
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("last", "debug.trace").with_dependency("middle"),
                StepDefinition::new("first", "debug.trace"),
                StepDefinition::new("middle", "debug.trace").with_dependency("first"),
            ],
        };

        let mut context = RunContext::new();
        let report = Executor::new(&registry).run(&workflow, &mut context).expect("run");

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(context.text_or("trace", ""), "first,middle,last");
        assert!(report.records.iter().all(|record| record.status == StepStatus::Succeeded));
    }

    #[test]
    fn first_failure_halts_the_run_and_names_the_step() {
        let registry = trace_registry();
        let workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("ok", "debug.trace"),
                StepDefinition::new("broken", "debug.fail"),
                StepDefinition::new("never", "debug.trace"),
            ],
        };

        let mut context = RunContext::new();
        let report = Executor::new(&registry).run(&workflow, &mut context).expect("run");

        match &report.outcome {
            RunOutcome::Failed { step_id, message } => {
                assert_eq!(step_id, "broken");
                assert!(message.contains("boom"));
            }
            other => panic!("expected failed outcome, got {other:?}"),
        }
        // The step after the failure never ran.
        assert_eq!(context.text_or("trace", ""), "ok");
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn exit_outcome_stops_the_run_with_the_chosen_code() {
        let registry = trace_registry();
        let workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("work", "debug.trace"),
                StepDefinition::new("finish", "system.exit").with_parameter("status_code", 4.0),
                StepDefinition::new("unreachable", "debug.trace"),
            ],
        };

        let mut context = RunContext::new();
        let report = Executor::new(&registry).run(&workflow, &mut context).expect("run");

        assert_eq!(
            report.outcome,
            RunOutcome::Exited {
                code: 4,
                message: None
            }
        );
        assert_eq!(context.text_or("trace", ""), "work");
    }

    #[test]
    fn unresolved_context_reference_fails_the_step_at_runtime() {
        let registry = trace_registry();
        let workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("needs_capture", "debug.trace").with_parameter("path", "${context.capture_path}"),
            ],
        };

        let mut context = RunContext::new();
        let report = Executor::new(&registry).run(&workflow, &mut context).expect("run");

        match &report.outcome {
            RunOutcome::Failed { step_id, message } => {
                assert_eq!(step_id, "needs_capture");
                assert!(message.contains("capture_path"));
            }
            other => panic!("expected failed outcome, got {other:?}"),
        }
    }

    #[test]
    fn validation_failures_run_no_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = StepRegistry::new();
        registry.register("debug.count", CountStep(Arc::clone(&calls)));

        let cyclic = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("first", "debug.count").with_dependency("second"),
                StepDefinition::new("second", "debug.count").with_dependency("first"),
            ],
        };

        let mut context = RunContext::new();
        let error = Executor::new(&registry).run(&cyclic, &mut context).expect_err("cycle");
        assert!(matches!(error, EngineError::DependencyCycle(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(context.is_empty());
    }

    #[test]
    fn missing_variable_reference_fails_validation_before_any_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = StepRegistry::new();
        registry.register("debug.count", CountStep(Arc::clone(&calls)));

        let workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![StepDefinition::new("only", "debug.count").with_parameter("frames", "${variables.num_frames}")],
        };

        let mut context = RunContext::new();
        let error = Executor::new(&registry).run(&workflow, &mut context).expect_err("missing variable");
        assert!(matches!(error, EngineError::Resolution { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn parameters_resolve_against_the_variable_table() {
        struct AssertParamsStep;

        impl StepHandler for AssertParamsStep {
            fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> anyhow::Result<StepOutcome> {
                assert_eq!(step.require_number("frames")?, 120.0);
                assert_eq!(step.require_text("label")?, "run of 120 frames");
                context.set("asserted", true);
                Ok(StepOutcome::Continue)
            }
        }

        let mut registry = StepRegistry::new();
        registry.register("debug.assert_params", AssertParamsStep);

        let mut workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("check", "debug.assert_params")
                    .with_parameter("frames", "${variables.num_frames}")
                    .with_parameter("label", "run of ${variables.num_frames} frames"),
            ],
        };
        workflow.variables.insert("num_frames".into(), VariableDefinition::new(120.0));

        let mut context = RunContext::new();
        let report = Executor::new(&registry).run(&workflow, &mut context).expect("run");
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(context.bool_or("asserted", false));
    }

    #[test]
    fn reruns_produce_identical_step_order() {
        let registry = trace_registry();
        let workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("root", "debug.trace"),
                StepDefinition::new("left", "debug.trace").with_dependency("root"),
                StepDefinition::new("right", "debug.trace").with_dependency("root"),
                StepDefinition::new("join", "debug.trace").with_dependency("left").with_dependency("right"),
            ],
        };

        let mut first = RunContext::new();
        Executor::new(&registry).run(&workflow, &mut first).expect("first run");
        let mut second = RunContext::new();
        Executor::new(&registry).run(&workflow, &mut second).expect("second run");

        assert_eq!(first.text_or("trace", ""), "root,left,right,join");
        assert_eq!(first.text_or("trace", ""), second.text_or("trace", ""));
    }

    #[test]
    fn unregistered_plugin_is_rejected_before_execution() {
        let registry = trace_registry();
        let workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![StepDefinition::new("mystery", "debug.unknown")],
        };

        let mut context = RunContext::new();
        let error = Executor::new(&registry).run(&workflow, &mut context).expect_err("unknown plugin");
        match error {
            EngineError::UnknownPlugin { step_id, plugin } => {
                assert_eq!(step_id, "mystery");
                assert_eq!(plugin, "debug.unknown");
            }
            other => panic!("expected unknown plugin, got {other:?}"),
        }
    }

    #[test]
    fn exit_message_appears_in_outcome_and_record() {
        let registry = trace_registry();
        let mut workflow = WorkflowDefinition {
            name: None,
            variables: Default::default(),
            steps: vec![
                StepDefinition::new("finish", "system.exit")
                    .with_parameter("status_code", 0.0)
                    .with_parameter("message", "all frames verified"),
            ],
        };
        workflow.name = Some("exit-message".into());

        let mut context = RunContext::new();
        let report = Executor::new(&registry).run(&workflow, &mut context).expect("run");
        match &report.outcome {
            RunOutcome::Exited { code, message } => {
                assert_eq!(*code, 0);
                assert_eq!(message.as_deref(), Some("all frames verified"));
            }
            other => panic!("expected exited outcome, got {other:?}"),
        }
        assert_eq!(report.records[0].status, StepStatus::Exited);
        assert_eq!(report.records[0].message.as_deref(), Some("all frames verified"));
    }
}
