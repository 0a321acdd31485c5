//! # Renderflow Engine
//!
//! A declarative step-orchestration engine that drives a real-time rendering
//! host from externally supplied workflow definitions: a graph of typed
//! steps, each identified by a plugin name, carrying parameters that may
//! reference shared variables, connected by explicit dependencies.
//!
//! ## Architecture
//!
//! - [`context`] — the mutable, run-scoped key/value store shared by steps
//! - [`resolve`] — `${variables.*}` / `${context.*}` token substitution
//! - [`registry`] — plugin-name → handler dispatch with batch validation
//! - [`executor`] — dependency-ordered, single-threaded step execution
//! - [`steps`] — built-in graphics, validation, and exit steps
//! - [`host`] — the seam to the graphics subsystem
//!
//! ## Execution model
//!
//! Steps run to completion synchronously, one at a time, in a deterministic
//! topological order. Graphics work has single-thread affinity, so there is
//! no worker-pool parallelism and no async boundary inside a handler; a
//! workflow terminates early only through the `system.exit` step.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use renderflow_engine::{Executor, RunContext, default_registry, host::NullGraphicsHost};
//! use renderflow_types::{StepDefinition, WorkflowDefinition};
//!
//! let registry = default_registry(Arc::new(NullGraphicsHost::new()));
//! let workflow = WorkflowDefinition {
//!     name: Some("smoke".into()),
//!     variables: Default::default(),
//!     steps: vec![StepDefinition::new("finish", "system.exit").with_parameter("status_code", 0.0)],
//! };
//!
//! let mut context = RunContext::new();
//! let _report = Executor::new(&registry).run(&workflow, &mut context)?;
//! # Ok::<(), renderflow_engine::EngineError>(())
//! ```

use std::fs;
use std::path::Path;

use renderflow_types::WorkflowDefinition;

pub mod context;
pub mod error;
pub mod executor;
pub mod host;
pub mod params;
pub mod registry;
pub mod resolve;
pub mod steps;

pub use context::RunContext;
pub use error::{EngineError, ResolveError};
pub use executor::{Executor, RunOutcome, RunReport, StepRecord, StepStatus};
pub use params::ResolvedStep;
pub use registry::{StepHandler, StepOutcome, StepRegistry, default_registry};

/// Loads a workflow definition from a JSON or YAML file.
///
/// Both formats are parsed through the YAML front end (JSON is a subset of
/// the YAML the engine accepts), so the file extension does not matter.
/// Errors name the offending path.
pub fn parse_workflow_file(path: impl AsRef<Path>) -> Result<WorkflowDefinition, EngineError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|error| EngineError::Load {
        path: path.display().to_string(),
        detail: error.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|error| EngineError::Load {
        path: path.display().to_string(),
        detail: error.to_string(),
    })
}
