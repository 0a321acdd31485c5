//! Telemetry event types published over the notifier bus.
//!
//! The engine publishes these as a run progresses; it never subscribes to
//! its own output. Payloads are free-form JSON so subscribers (loggers,
//! harnesses, dashboards) can evolve without schema churn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminates the telemetry events a run can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A run entered the running state after validation.
    RunStarted,
    /// Every step ran to success.
    RunCompleted,
    /// A step failed (or failed to resolve) and the run halted.
    RunFailed,
    /// The exit step requested termination with a status code.
    RunExited,
    /// A step is about to execute with resolved parameters.
    StepStarted,
    /// A step executed successfully.
    StepFinished,
    /// A step reported an error.
    StepFailed,
}

/// A single telemetry event: a type tag, a timestamp, and a JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// When it happened (UTC, stamped at construction).
    pub at: DateTime<Utc>,
    /// Event-specific details, such as the step id or a status code.
    pub payload: Value,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self {
            kind,
            at: Utc::now(),
            payload,
        }
    }
}
