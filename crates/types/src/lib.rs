//! # Renderflow Types
//!
//! Shared type definitions for the Renderflow workflow engine: the parameter
//! value variant exchanged between workflow documents, the run context, and
//! step handlers; the workflow/step definition schema; and the telemetry
//! event types published over the notifier bus.
//!
//! These types are deliberately free of execution logic so that the engine,
//! the notifier, and any embedding host can agree on a schema without
//! depending on each other.

pub mod event;
pub mod value;
pub mod workflow;

pub use event::{Event, EventKind};
pub use value::ParamValue;
pub use workflow::{StepDefinition, VariableDefinition, WorkflowDefinition};
