pub mod error;
pub mod parsers;
pub mod project;
pub mod render;
pub mod types;

use error::MillError;

pub use parsers::gerber::{parse_drill_file, parse_gerber_file};
pub use project::{mill_project, MilledImages, ProjectFiles};
pub use types::{max_extent, Extent, Primitive};

/// Parameters shared by the interpreters and the rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct MillOptions {
    /// Pixels per file unit.
    pub resolution: f64,
    /// Spacing between aperture stamps along a drawn line, in pixels.
    pub step: f64,
    /// Blank margin around the board, in millimeters.
    pub border_mm: f64,
}

impl Default for MillOptions {
    fn default() -> Self {
        Self {
            resolution: 1000.0,
            step: 1.0,
            border_mm: 0.5,
        }
    }
}

impl MillOptions {
    pub fn validate(&self) -> Result<(), MillError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(MillError::InvalidOption(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(MillError::InvalidOption(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        if !(self.border_mm.is_finite() && self.border_mm >= 0.0) {
            return Err(MillError::InvalidOption(format!(
                "border must not be negative, got {}",
                self.border_mm
            )));
        }
        Ok(())
    }
}
