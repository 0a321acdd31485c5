//! Engine error taxonomy.
//!
//! Load-time errors (duplicate ids, bad dependencies, unknown plugins,
//! unresolvable variable references) are raised by pre-flight validation and
//! prevent any step from running. Resolution and step failures surface
//! through the executor's failed outcome with the offending step named.

use thiserror::Error;

/// Errors raised while loading, validating, or driving a workflow.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A workflow file could not be read or parsed.
    #[error("cannot load workflow from '{path}': {detail}")]
    Load {
        /// Path of the offending file.
        path: String,
        /// What went wrong.
        detail: String,
    },

    /// Two steps share the same identifier.
    #[error("duplicate step identifier detected: '{0}'")]
    DuplicateStep(String),

    /// A step depends on an id that names no step in the workflow.
    #[error("step '{step_id}' depends on unknown step '{dependency}'")]
    UnknownDependency {
        /// Step declaring the dependency.
        step_id: String,
        /// The id that could not be found.
        dependency: String,
    },

    /// A step depends on itself.
    #[error("step '{0}' cannot depend on itself")]
    SelfDependency(String),

    /// The dependency relation contains a cycle.
    #[error("cycle detected in workflow steps involving: {0}")]
    DependencyCycle(String),

    /// A step names a plugin no handler is registered for.
    #[error("step '{step_id}' references unknown plugin '{plugin}'")]
    UnknownPlugin {
        /// Step whose plugin could not be dispatched.
        step_id: String,
        /// The unregistered plugin name.
        plugin: String,
    },

    /// A parameter token could not be resolved.
    #[error("step '{step_id}' parameter '{parameter}': {source}")]
    Resolution {
        /// Step whose parameter failed to resolve.
        step_id: String,
        /// Name of the offending parameter.
        parameter: String,
        /// The underlying resolution failure.
        #[source]
        source: ResolveError,
    },
}

/// Failures produced by the variable resolver for a single value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A token carried no `.` separator between namespace and key.
    #[error("malformed reference token '${{{0}}}'")]
    MalformedToken(String),

    /// The token's namespace is neither `variables` nor `context`.
    #[error("unknown namespace '{namespace}' in token '${{{token}}}'")]
    UnknownNamespace {
        /// The unrecognized namespace.
        namespace: String,
        /// The full token text.
        token: String,
    },

    /// The referenced key does not exist in its namespace.
    #[error("unresolved reference '${{{token}}}': no '{key}' in {namespace}")]
    UnresolvedKey {
        /// Namespace the key was looked up in.
        namespace: String,
        /// The missing key.
        key: String,
        /// The full token text.
        token: String,
    },
}
