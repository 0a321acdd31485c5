//! # Renderflow Pixel
//!
//! Loading and analysis of pixel data captured from rendered frames.
//!
//! A rendering run proves itself by dumping its framebuffer to a CSV
//! artifact; validation steps load that artifact into a [`PixelBuffer`] and
//! query it (color counts, brightness statistics, opacity) to assert that
//! the frame actually contains what the workflow promised. Two on-disk
//! representations are supported:
//!
//! - **standard**: a `x,y,r,g,b[,a]` header row followed by one data row
//!   per pixel;
//! - **row-major**: one line per pixel row, each a comma-separated list of
//!   color tokens in `R###G###B###` or `#RRGGBB` form.
//!
//! All queries are read-only; the engine never mutates a loaded buffer.

mod buffer;
mod pixel;

pub use buffer::{BrightnessStats, CsvFormat, PixelBuffer};
pub use pixel::Pixel;

/// Errors raised while loading a pixel CSV artifact.
#[derive(Debug, thiserror::Error)]
pub enum PixelCsvError {
    /// The file could not be opened or read.
    #[error("cannot read pixel data from '{path}': {source}")]
    Io {
        /// Path that failed to open or read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file contained no data rows after stripping comments and blanks.
    #[error("pixel data file '{0}' is empty")]
    Empty(String),

    /// The first line matched neither supported representation.
    #[error("pixel data file '{0}' is in an unrecognized format")]
    UnrecognizedFormat(String),

    /// A data row could not be parsed under the detected format.
    #[error("malformed pixel row {line} in '{path}': {detail}")]
    MalformedRow {
        /// Path of the offending file.
        path: String,
        /// One-based line number of the bad row.
        line: usize,
        /// What went wrong.
        detail: String,
    },
}
