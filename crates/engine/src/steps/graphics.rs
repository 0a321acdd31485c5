//! Graphics steps: resolve parameters and drive the rendering host.
//!
//! Each step records what it produced into the run context so later steps
//! (validation, conditional exit) can reference it via `${context.*}`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::context::RunContext;
use crate::host::{GraphicsHost, SurfaceConfig};
use crate::params::ResolvedStep;
use crate::registry::{StepHandler, StepOutcome};

/// Plugin name for window/device initialization.
pub const INIT: &str = "graphics.init";
/// Plugin name for shader program loading.
pub const LOAD_SHADERS: &str = "graphics.load_shaders";
/// Plugin name for driving the render loop.
pub const RENDER_FRAMES: &str = "graphics.render_frames";
/// Plugin name for framebuffer capture.
pub const CAPTURE_CSV: &str = "graphics.capture_csv";

/// Creates the rendering surface.
///
/// Parameters: `window_width`, `window_height` (required numbers) and
/// `window_title` (default "renderflow"). Records `surface_width`,
/// `surface_height`, and `graphics_initialized` in the context.
pub struct InitStep {
    host: Arc<dyn GraphicsHost>,
}

impl InitStep {
    /// Wraps the given host.
    pub fn new(host: Arc<dyn GraphicsHost>) -> Self {
        Self { host }
    }
}

impl StepHandler for InitStep {
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let config = SurfaceConfig {
            width: step.require_number("window_width")? as u32,
            height: step.require_number("window_height")? as u32,
            title: step.text_or("window_title", "renderflow"),
        };
        info!(step_id = %step.id, width = config.width, height = config.height, "initializing graphics surface");
        self.host.init(&config)?;

        context.set("surface_width", f64::from(config.width));
        context.set("surface_height", f64::from(config.height));
        context.set("graphics_initialized", true);
        Ok(StepOutcome::Continue)
    }
}

/// Loads a shader program from compiled binaries.
///
/// Parameters: `vertex` and `fragment` (required paths). Records
/// `shaders_loaded` in the context.
pub struct LoadShadersStep {
    host: Arc<dyn GraphicsHost>,
}

impl LoadShadersStep {
    /// Wraps the given host.
    pub fn new(host: Arc<dyn GraphicsHost>) -> Self {
        Self { host }
    }
}

impl StepHandler for LoadShadersStep {
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let vertex = step.require_text("vertex")?;
        let fragment = step.require_text("fragment")?;
        self.host.load_shader_program(Path::new(&vertex), Path::new(&fragment))?;
        context.set("shaders_loaded", true);
        Ok(StepOutcome::Continue)
    }
}

/// Drives the render loop.
///
/// Parameters: `num_frames` (required number). Records `frames_rendered`
/// in the context.
pub struct RenderFramesStep {
    host: Arc<dyn GraphicsHost>,
}

impl RenderFramesStep {
    /// Wraps the given host.
    pub fn new(host: Arc<dyn GraphicsHost>) -> Self {
        Self { host }
    }
}

impl StepHandler for RenderFramesStep {
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let frames = step.require_number("num_frames")? as u32;
        let rendered = self.host.render_frames(frames)?;
        info!(step_id = %step.id, frames, rendered, "render loop finished");
        context.set("frames_rendered", f64::from(rendered));
        Ok(StepOutcome::Continue)
    }
}

/// Captures the framebuffer to a pixel CSV artifact.
///
/// Parameters: `path` (required); `width`/`height` default to the
/// `surface_width`/`surface_height` recorded by [`InitStep`]. Records
/// `capture_path` and `capture_written` in the context.
pub struct CaptureCsvStep {
    host: Arc<dyn GraphicsHost>,
}

impl CaptureCsvStep {
    /// Wraps the given host.
    pub fn new(host: Arc<dyn GraphicsHost>) -> Self {
        Self { host }
    }
}

impl StepHandler for CaptureCsvStep {
    fn execute(&self, context: &mut RunContext, step: &ResolvedStep) -> Result<StepOutcome> {
        let path = step.require_text("path")?;
        let width = step.number_or("width", context.number_or("surface_width", 0.0)) as u32;
        let height = step.number_or("height", context.number_or("surface_height", 0.0)) as u32;
        if width == 0 || height == 0 {
            anyhow::bail!(
                "step '{}' has no capture dimensions: pass width/height or run graphics.init first",
                step.id
            );
        }

        self.host.capture_framebuffer_csv(Path::new(&path), width, height)?;
        info!(step_id = %step.id, path = %path, width, height, "framebuffer captured");
        context.set("capture_path", path);
        context.set("capture_written", true);
        Ok(StepOutcome::Continue)
    }
}
