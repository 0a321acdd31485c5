//! Step registry: name → handler dispatch with batch pre-validation.
//!
//! The registry is an explicit object constructed once at startup and passed
//! by reference into the executor — there is no ambient global handler table.
//! Every step's plugin name is checked against the registry as a batch before
//! execution starts, so a workflow with one bad step name fails immediately
//! rather than after partial side effects.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use renderflow_types::WorkflowDefinition;

use crate::context::RunContext;
use crate::error::EngineError;
use crate::host::GraphicsHost;
use crate::params::ResolvedStep;
use crate::steps;

/// What a step handler asks the executor to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step succeeded; advance to the next step.
    Continue,
    /// Terminate the run with a status code. Only the exit step produces
    /// this by design; every other step signals success or error.
    Exit {
        /// Status code handed to the process exit surface.
        code: i32,
        /// Optional diagnostic message; never affects control flow.
        message: Option<String>,
    },
}

/// A registered step implementation.
///
/// Handlers receive the shared run context and their resolved parameters;
/// they mutate the context and/or drive external collaborators, and report
/// failure by returning an error.
pub trait StepHandler: Send + Sync {
    /// Executes one step to completion, synchronously.
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome>;
}

/// Maps plugin identifier strings to registered step handlers.
#[derive(Default)]
pub struct StepRegistry {
    handlers: HashMap<String, Box<dyn StepHandler>>,
}

impl StepRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a plugin name with a handler, replacing any previous
    /// registration for that name.
    pub fn register(&mut self, plugin: impl Into<String>, handler: impl StepHandler + 'static) {
        self.handlers.insert(plugin.into(), Box::new(handler));
    }

    /// Looks up the handler for a plugin name.
    pub fn get(&self, plugin: &str) -> Option<&dyn StepHandler> {
        self.handlers.get(plugin).map(Box::as_ref)
    }

    /// True when a handler is registered under `plugin`.
    pub fn contains(&self, plugin: &str) -> bool {
        self.handlers.contains_key(plugin)
    }

    /// Checks every step's plugin name against the registry, erroring with
    /// the first step whose plugin is unknown.
    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<(), EngineError> {
        for step in &workflow.steps {
            if !self.contains(&step.plugin) {
                return Err(EngineError::UnknownPlugin {
                    step_id: step.id.clone(),
                    plugin: step.plugin.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut plugins: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        plugins.sort_unstable();
        formatter.debug_struct("StepRegistry").field("plugins", &plugins).finish()
    }
}

/// Builds a registry wired with every built-in step over the given graphics
/// host. The binary and tests share this single wiring point.
pub fn default_registry(host: Arc<dyn GraphicsHost>) -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry.register(steps::graphics::INIT, steps::graphics::InitStep::new(Arc::clone(&host)));
    registry.register(steps::graphics::LOAD_SHADERS, steps::graphics::LoadShadersStep::new(Arc::clone(&host)));
    registry.register(steps::graphics::RENDER_FRAMES, steps::graphics::RenderFramesStep::new(Arc::clone(&host)));
    registry.register(steps::graphics::CAPTURE_CSV, steps::graphics::CaptureCsvStep::new(host));
    registry.register(steps::validation::CSV_HAS_COLORS, steps::validation::CsvHasColorsStep);
    registry.register(steps::validation::CSV_NOT_EMPTY, steps::validation::CsvNotEmptyStep);
    registry.register(steps::validation::CSV_DIMENSIONS, steps::validation::CsvDimensionsStep);
    registry.register(steps::exit::PLUGIN, steps::exit::ExitStep);
    registry
}
