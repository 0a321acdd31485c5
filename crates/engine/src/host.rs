//! The seam between the engine and the graphics subsystem.
//!
//! The engine never talks to a window system or GPU directly: graphics-facing
//! steps drive this trait, and the embedding application supplies the real
//! implementation. All methods are called from the executor's thread only —
//! graphics work has single-thread affinity, which is why step execution is
//! synchronous in the first place.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Window/surface parameters for host initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Window title.
    pub title: String,
}

/// Operations the engine's graphics steps require from the rendering host.
pub trait GraphicsHost: Send + Sync {
    /// Creates the window/device/surface for the run.
    fn init(&self, config: &SurfaceConfig) -> Result<()>;

    /// Loads and links a shader program from compiled binaries.
    fn load_shader_program(&self, vertex: &Path, fragment: &Path) -> Result<()>;

    /// Drives the render loop for `frames` frames; returns the number of
    /// frames actually rendered.
    fn render_frames(&self, frames: u32) -> Result<u32>;

    /// Reads the current framebuffer back and writes it as a pixel CSV
    /// artifact at `path`.
    fn capture_framebuffer_csv(&self, path: &Path, width: u32, height: u32) -> Result<()>;
}

/// Headless host for tests and dry runs: records every invocation, performs
/// no real graphics work, and writes a synthetic capture so downstream
/// validation steps have an artifact to inspect.
#[derive(Debug, Default)]
pub struct NullGraphicsHost {
    calls: Mutex<Vec<String>>,
}

impl NullGraphicsHost {
    /// Creates a host with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations recorded so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

impl GraphicsHost for NullGraphicsHost {
    fn init(&self, config: &SurfaceConfig) -> Result<()> {
        self.record(format!("init {}x{} '{}'", config.width, config.height, config.title));
        Ok(())
    }

    fn load_shader_program(&self, vertex: &Path, fragment: &Path) -> Result<()> {
        self.record(format!("load_shader_program {} {}", vertex.display(), fragment.display()));
        Ok(())
    }

    fn render_frames(&self, frames: u32) -> Result<u32> {
        self.record(format!("render_frames {frames}"));
        Ok(frames)
    }

    fn capture_framebuffer_csv(&self, path: &Path, width: u32, height: u32) -> Result<()> {
        self.record(format!("capture_framebuffer_csv {} {}x{}", path.display(), width, height));
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| format!("cannot create capture directory {}", parent.display()))?;
        }
        std::fs::write(path, synthetic_capture(width, height)).with_context(|| format!("cannot write capture to {}", path.display()))?;
        Ok(())
    }
}

/// Synthetic frame: an orange block covering the center quarter of the
/// surface over a dark grey background, mirroring what a real capture of
/// the default scene looks like.
fn synthetic_capture(width: u32, height: u32) -> String {
    let mut csv = String::from("x,y,r,g,b,a\n");
    for y in 0..height {
        for x in 0..width {
            let centered = x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
            let (r, g, b) = if centered { (255, 128, 0) } else { (45, 45, 45) };
            csv.push_str(&format!("{x},{y},{r},{g},{b},255\n"));
        }
    }
    csv
}
