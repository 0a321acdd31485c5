//! Validation steps: assert properties of captured pixel artifacts.
//!
//! A rendering pipeline that produced an empty or wrong image must not
//! silently pass, so every predicate failure here is a step error that halts
//! the run.

use anyhow::{Context, Result, bail};
use renderflow_pixel::{Pixel, PixelBuffer};
use tracing::debug;

use crate::context::RunContext;
use crate::params::ResolvedStep;
use crate::registry::{StepHandler, StepOutcome};

/// Plugin name for the colored-pixel assertion.
pub const CSV_HAS_COLORS: &str = "validation.csv_has_colors";
/// Plugin name for the mostly-empty assertion.
pub const CSV_NOT_EMPTY: &str = "validation.csv_not_empty";
/// Plugin name for the dimension assertion.
pub const CSV_DIMENSIONS: &str = "validation.csv_dimensions";

/// Asserts that a capture contains enough colored pixels.
///
/// With a `target_color` parameter (`#RRGGBB`), counts pixels within
/// `tolerance` (default 5) of that color and requires at least `min_count`
/// (default 1). Without one, counts pixels whose brightest channel exceeds
/// `channel_floor` (default 50) and requires at least `min_non_black_pixels`
/// (default 1). The observed count is recorded in the context under
/// `<step_id>.colored_pixels`.
pub struct CsvHasColorsStep;

impl StepHandler for CsvHasColorsStep {
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let path = step.require_text("path")?;
        let buffer = load_buffer(&path)?;

        let found = match step.parameter("target_color") {
            Some(target) => {
                let color = parse_hex_color(&target.as_text())
                    .with_context(|| format!("step '{}' parameter 'target_color' is not a #RRGGBB color", step.id))?;
                let tolerance = step.number_or("tolerance", 5.0) as u8;
                let minimum = step.number_or("min_count", 1.0) as u32;
                let found = buffer.count_pixels_with_tolerance(color, tolerance);
                debug!(step_id = %step.id, target = %color.to_hex(), tolerance, found, "target color counted");
                if found < minimum {
                    bail!(
                        "capture '{path}' has {found} pixels within {tolerance} of #{}, expected at least {minimum}",
                        color.to_hex()
                    );
                }
                found
            }
            None => {
                let floor = step.number_or("channel_floor", 50.0) as u8;
                let minimum = step.number_or("min_non_black_pixels", 1.0) as u32;
                let found = buffer.count_non_black(floor);
                debug!(step_id = %step.id, channel_floor = floor, found, "non-black pixels counted");
                if found < minimum {
                    bail!("capture '{path}' has {found} non-black pixels (channel floor {floor}), expected at least {minimum}");
                }
                found
            }
        };

        context.set(format!("{}.colored_pixels", step.id), f64::from(found));
        Ok(StepOutcome::Continue)
    }
}

/// Asserts that a capture is not mostly dark.
///
/// Fails when at least 90% of pixels have luminance strictly below
/// `brightness_threshold` (default 30).
pub struct CsvNotEmptyStep;

impl StepHandler for CsvNotEmptyStep {
    fn execute(&self, _context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let path = step.require_text("path")?;
        let threshold = step.number_or("brightness_threshold", 30.0) as u8;
        let buffer = load_buffer(&path)?;
        if buffer.is_mostly_empty(threshold) {
            let stats = buffer.brightness_stats();
            bail!(
                "capture '{path}' is mostly empty below brightness {threshold} (min {}, max {}, avg {:.1})",
                stats.min,
                stats.max,
                stats.average
            );
        }
        Ok(StepOutcome::Continue)
    }
}

/// Asserts that a capture has exactly the expected dimensions.
pub struct CsvDimensionsStep;

impl StepHandler for CsvDimensionsStep {
    fn execute(&self, _context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let path = step.require_text("path")?;
        let width = step.require_number("width")? as u32;
        let height = step.require_number("height")? as u32;
        let buffer = load_buffer(&path)?;
        if !buffer.verify_dimensions(width, height) {
            bail!(
                "capture '{path}' is {}x{}, expected {width}x{height}",
                buffer.width(),
                buffer.height()
            );
        }
        Ok(StepOutcome::Continue)
    }
}

fn load_buffer(path: &str) -> Result<PixelBuffer> {
    PixelBuffer::load(path).with_context(|| format!("cannot load pixel capture '{path}'"))
}

fn parse_hex_color(text: &str) -> Option<Pixel> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some(Pixel::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8))
}
