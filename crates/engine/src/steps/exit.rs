//! The conditional exit step: the one step type permitted to terminate a run
//! early.

use anyhow::Result;
use renderflow_types::ParamValue;
use tracing::info;

use crate::context::RunContext;
use crate::params::ResolvedStep;
use crate::registry::{StepHandler, StepOutcome};

/// Plugin name the exit step registers under.
pub const PLUGIN: &str = "system.exit";

/// Terminates the run with a status code.
///
/// Two parameter shapes are accepted:
///
/// - `status_code` (default 0) — unconditional exit with that code;
/// - `condition` + `code_on_true` (default 0) + `code_on_false` (default 1)
///   — `condition` names a context key holding a boolean; a missing or
///   non-boolean value counts as false, and the matching code is chosen.
///
/// An optional `message` parameter is carried on the outcome for diagnostics
/// and never affects control flow.
pub struct ExitStep;

impl StepHandler for ExitStep {
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let message = step.parameter("message").map(ParamValue::as_text);

        let code = match step.parameter("condition") {
            Some(condition) => {
                let key = condition.as_text();
                let satisfied = matches!(context.get(&key), Some(ParamValue::Bool(true)));
                info!(step_id = %step.id, condition = %key, satisfied, "exit condition evaluated");
                if satisfied {
                    step.number_or("code_on_true", 0.0)
                } else {
                    step.number_or("code_on_false", 1.0)
                }
            }
            None => step.number_or("status_code", 0.0),
        } as i32;

        Ok(StepOutcome::Exit { code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn resolved(parameters: &[(&str, ParamValue)]) -> ResolvedStep {
        let mut map = IndexMap::new();
        for (name, value) in parameters {
            map.insert((*name).to_string(), value.clone());
        }
        ResolvedStep {
            id: "finish".into(),
            plugin: PLUGIN.into(),
            parameters: map,
        }
    }

    fn exit_code(context: &mut RunContext, step: &ResolvedStep) -> i32 {
        match ExitStep.execute(context, step).expect("execute") {
            StepOutcome::Exit { code, .. } => code,
            other => panic!("expected exit outcome, got {other:?}"),
        }
    }

    #[test]
    fn unconditional_status_code_defaults_to_zero() {
        let mut context = RunContext::new();
        assert_eq!(exit_code(&mut context, &resolved(&[])), 0);
        assert_eq!(exit_code(&mut context, &resolved(&[("status_code", ParamValue::from(5.0))])), 5);
    }

    #[test]
    fn condition_true_selects_code_on_true() {
        let mut context = RunContext::new();
        context.set("capture_verified", true);
        let step = resolved(&[
            ("condition", ParamValue::from("capture_verified")),
            ("code_on_true", ParamValue::from(0.0)),
            ("code_on_false", ParamValue::from(1.0)),
        ]);
        assert_eq!(exit_code(&mut context, &step), 0);
    }

    #[test]
    fn condition_false_or_absent_selects_code_on_false() {
        let step = resolved(&[
            ("condition", ParamValue::from("capture_verified")),
            ("code_on_true", ParamValue::from(0.0)),
            ("code_on_false", ParamValue::from(3.0)),
        ]);

        let mut context = RunContext::new();
        context.set("capture_verified", false);
        assert_eq!(exit_code(&mut context, &step), 3);

        let mut absent = RunContext::new();
        assert_eq!(exit_code(&mut absent, &step), 3);
    }

    #[test]
    fn non_boolean_condition_values_count_as_false() {
        let step = resolved(&[
            ("condition", ParamValue::from("capture_verified")),
            ("code_on_false", ParamValue::from(7.0)),
        ]);

        let mut context = RunContext::new();
        context.set("capture_verified", "true");
        assert_eq!(exit_code(&mut context, &step), 7);
    }

    #[test]
    fn message_rides_along_without_changing_the_code() {
        let mut context = RunContext::new();
        let step = resolved(&[
            ("status_code", ParamValue::from(2.0)),
            ("message", ParamValue::from("shutting down gracefully")),
        ]);
        match ExitStep.execute(&mut context, &step).expect("execute") {
            StepOutcome::Exit { code, message } => {
                assert_eq!(code, 2);
                assert_eq!(message.as_deref(), Some("shutting down gracefully"));
            }
            other => panic!("expected exit outcome, got {other:?}"),
        }
    }
}
