//! A step with fully resolved parameters, ready for dispatch.
//!
//! Handlers read their parameters through the typed accessors here. The
//! `require_*` accessors are strict about the stored variant and produce
//! errors naming the step and parameter; the `*_or` accessors follow the
//! parameter value's total coercion table and fall back to a default when
//! the parameter is absent.

use anyhow::{Result, bail};
use indexmap::IndexMap;
use renderflow_types::ParamValue;

/// A step definition whose parameters have been materialized against the
/// variable table and run context.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    /// Step identifier from the definition.
    pub id: String,
    /// Plugin name the step was dispatched by.
    pub plugin: String,
    /// Fully resolved parameters in authoring order.
    pub parameters: IndexMap<String, ParamValue>,
}

impl ResolvedStep {
    /// Looks up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Returns the named parameter or an error naming the step.
    pub fn require(&self, name: &str) -> Result<&ParamValue> {
        match self.parameter(name) {
            Some(value) => Ok(value),
            None => bail!("step '{}' missing parameter '{}'", self.id, name),
        }
    }

    /// Returns the named parameter as text, erroring when it is absent or
    /// not stored as text.
    pub fn require_text(&self, name: &str) -> Result<String> {
        match self.require(name)? {
            ParamValue::Text(value) => Ok(value.clone()),
            other => bail!("step '{}' parameter '{}' must be text, found {}", self.id, name, other.kind()),
        }
    }

    /// Returns the named parameter as a number, erroring when it is absent
    /// or not stored as a number.
    pub fn require_number(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            ParamValue::Number(value) => Ok(*value),
            other => bail!("step '{}' parameter '{}' must be a number, found {}", self.id, name, other.kind()),
        }
    }

    /// Returns the named parameter as a boolean, erroring when it is absent
    /// or not stored as a boolean.
    pub fn require_bool(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            ParamValue::Bool(value) => Ok(*value),
            other => bail!("step '{}' parameter '{}' must be a bool, found {}", self.id, name, other.kind()),
        }
    }

    /// Returns the named parameter as a list, erroring when it is absent or
    /// not stored as a list.
    pub fn require_list(&self, name: &str) -> Result<&[ParamValue]> {
        match self.require(name)? {
            ParamValue::List(values) => Ok(values.as_slice()),
            other => bail!("step '{}' parameter '{}' must be a list, found {}", self.id, name, other.kind()),
        }
    }

    /// Text under `name`, coerced, or `default` when absent.
    pub fn text_or(&self, name: &str, default: &str) -> String {
        self.parameter(name).map_or_else(|| default.to_string(), ParamValue::as_text)
    }

    /// Number under `name`, coerced, or `default` when absent.
    pub fn number_or(&self, name: &str, default: f64) -> f64 {
        self.parameter(name).map_or(default, ParamValue::as_number)
    }

    /// Boolean under `name`, coerced, or `default` when absent.
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.parameter(name).map_or(default, ParamValue::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> ResolvedStep {
        let mut parameters = IndexMap::new();
        parameters.insert("path".to_string(), ParamValue::from("out/frame.csv"));
        parameters.insert("frames".to_string(), ParamValue::from(120.0));
        parameters.insert("enabled".to_string(), ParamValue::from(true));
        ResolvedStep {
            id: "render".into(),
            plugin: "graphics.render_frames".into(),
            parameters,
        }
    }

    #[test]
    fn required_accessors_check_the_stored_variant() {
        let step = step();
        assert_eq!(step.require_text("path").expect("text"), "out/frame.csv");
        assert_eq!(step.require_number("frames").expect("number"), 120.0);
        assert!(step.require_bool("enabled").expect("bool"));

        let error = step.require_number("path").expect_err("wrong variant");
        assert!(error.to_string().contains("must be a number"));
    }

    #[test]
    fn missing_required_parameters_name_the_step() {
        let error = step().require_text("missing").expect_err("absent");
        assert!(error.to_string().contains("step 'render' missing parameter 'missing'"));
    }

    #[test]
    fn defaulted_accessors_coerce_present_values() {
        let step = step();
        assert_eq!(step.number_or("missing", 30.0), 30.0);
        assert_eq!(step.text_or("frames", "-"), "120");
        assert!(!step.bool_or("missing", false));
    }
}
