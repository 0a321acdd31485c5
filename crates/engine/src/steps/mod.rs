//! Built-in step implementations.
//!
//! Steps fall into three families: graphics steps that drive the
//! [`crate::host::GraphicsHost`] seam, validation steps that inspect captured
//! pixel artifacts, and the exit step that terminates a run with a status
//! code. [`crate::registry::default_registry`] wires all of them.

pub mod exit;
pub mod graphics;
pub mod validation;
