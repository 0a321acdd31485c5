//! Workflow and step definition schema.
//!
//! A workflow document is data, not code: an ordered list of step
//! definitions, each naming the plugin that implements it and carrying a
//! parameter map, plus a table of named variables with default values.
//! Documents are authored in JSON or YAML; authoring order is preserved via
//! `IndexMap` so the engine's definition-order tie-breaking is stable.
//!
//! The schema accepts the legacy field spellings `nodes` (for `steps`) and
//! `type` (for `plugin`) so documents written for the original authoring
//! tools load unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// A complete workflow: ordered steps plus a variable table with defaults.
///
/// Immutable once loaded. The variable table supplies *defaults*; runtime
/// overrides live in the run context and never mutate the definition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowDefinition {
    /// Optional human-readable workflow name, used in logs and telemetry.
    #[serde(default)]
    pub name: Option<String>,
    /// Named default values referenced by `${variables.name}` tokens.
    #[serde(default)]
    pub variables: IndexMap<String, VariableDefinition>,
    /// Ordered step definitions. `nodes` is accepted as an alias.
    #[serde(default, alias = "nodes")]
    pub steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    /// Looks up a variable's default value by name.
    pub fn variable(&self, name: &str) -> Option<&ParamValue> {
        self.variables.get(name).map(|definition| &definition.value)
    }

    /// Looks up a step definition by id.
    pub fn step(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.id == id)
    }
}

/// A named default value in the workflow's variable table.
///
/// The authoring format wraps each default in an object with a `value` field
/// and an optional declared `type` tag; the tag is kept for round-trips with
/// authoring tools but the engine trusts the value's own variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Declared type tag from the authoring tool, if any.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    /// The default value.
    pub value: ParamValue,
}

impl VariableDefinition {
    /// Convenience constructor for a plain default value.
    pub fn new(value: impl Into<ParamValue>) -> Self {
        Self {
            declared_type: None,
            value: value.into(),
        }
    }
}

/// One node in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique identifier within the workflow.
    pub id: String,
    /// Name of the registered step type that executes this step, for example
    /// `graphics.init` or `system.exit`. `type` is accepted as an alias.
    #[serde(alias = "type")]
    pub plugin: String,
    /// Parameter map; values may contain unresolved `${namespace.key}`
    /// tokens that the engine resolves immediately before the step runs.
    #[serde(default)]
    pub parameters: IndexMap<String, ParamValue>,
    /// Ids of steps that must complete before this step runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl StepDefinition {
    /// Creates a step with no parameters and no dependencies.
    pub fn new(id: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugin: plugin.into(),
            parameters: IndexMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Adds a parameter, builder style.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Adds a dependency, builder style.
    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }
}
