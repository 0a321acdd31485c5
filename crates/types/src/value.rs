//! The parameter value variant used throughout workflow definitions, the run
//! context, and step parameters.
//!
//! Workflow documents are authored with loosely typed literals — a boolean is
//! sometimes spelled `"true"`, a count sometimes arrives as text. Rather than
//! rejecting those documents, [`ParamValue`] keeps a closed set of variants
//! and offers *total* conversion accessors: every accessor returns a
//! documented default when the stored variant does not match, and none of
//! them panic. Callers must treat a mismatched read as "absent", not as a
//! hard error.

use serde::{Deserialize, Serialize};

/// A single workflow parameter or context value.
///
/// Deserializes untagged from plain JSON/YAML literals, so `42`, `"text"`,
/// `true`, and `[1, 2]` all map directly onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Double-precision number. Integral authoring literals land here too.
    Number(f64),
    /// Boolean flag.
    Bool(bool),
    /// Text, possibly containing unresolved `${namespace.key}` tokens.
    Text(String),
    /// Ordered list of nested values.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Returns the stored number, or `0.0` for any non-numeric variant.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(value) => *value,
            _ => 0.0,
        }
    }

    /// Returns a text rendering of the value.
    ///
    /// Numbers stringify canonically (integral values print without a
    /// fractional part), booleans as `"true"`/`"false"`, and lists join
    /// their elements' text forms with `","`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(value) => format_number(*value),
            Self::Bool(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::List(values) => values.iter().map(ParamValue::as_text).collect::<Vec<_>>().join(","),
        }
    }

    /// Returns the stored boolean; text `"true"` is true, any other text is
    /// false, non-zero numbers are true, and lists are always false.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(value) => value == "true",
            Self::Number(value) => *value != 0.0,
            Self::List(_) => false,
        }
    }

    /// Returns the stored list as a slice, or an empty slice for scalar
    /// variants.
    pub fn as_list(&self) -> &[ParamValue] {
        match self {
            Self::List(values) => values.as_slice(),
            _ => &[],
        }
    }

    /// Name of the stored variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    /// True when the stored variant is text.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(values: Vec<ParamValue>) -> Self {
        Self::List(values)
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
