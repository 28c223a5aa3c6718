use std::collections::HashMap;

use crate::error::MillError;
use crate::types::Primitive;

use super::coord::round_px;

/// Aperture shape from an %AD command (or a drill tool, which is always a circle).
/// Sizes are in file units.
#[derive(Debug, Clone, PartialEq)]
pub enum ApertureShape {
    Circle { diameter: f64 },
    Rectangle { x_size: f64, y_size: f64 },
    Obround { x_size: f64, y_size: f64 },
}

impl ApertureShape {
    /// Build a shape from its one-letter tag and `X`-separated modifiers.
    pub fn from_modifiers(tag: &str, modifiers: &[f64]) -> Result<Self, MillError> {
        let need = |n: usize| -> Result<(), MillError> {
            if modifiers.len() < n {
                Err(MillError::UnsupportedAperture(format!(
                    "{tag} needs {n} modifier(s), got {}",
                    modifiers.len()
                )))
            } else {
                Ok(())
            }
        };
        match tag {
            "C" => {
                need(1)?;
                Ok(ApertureShape::Circle {
                    diameter: modifiers[0],
                })
            }
            "R" => {
                need(2)?;
                Ok(ApertureShape::Rectangle {
                    x_size: modifiers[0],
                    y_size: modifiers[1],
                })
            }
            "O" => {
                need(2)?;
                Ok(ApertureShape::Obround {
                    x_size: modifiers[0],
                    y_size: modifiers[1],
                })
            }
            other => Err(MillError::UnsupportedAperture(format!(
                "shape '{other}'"
            ))),
        }
    }
}

/// A shape bound to the resolution it is stamped at.
#[derive(Debug, Clone, PartialEq)]
pub struct Aperture {
    pub shape: ApertureShape,
    pub resolution: f64,
}

impl Aperture {
    pub fn new(shape: ApertureShape, resolution: f64) -> Self {
        Self { shape, resolution }
    }

    /// Stamp the aperture centered on `(x, y)` in pixel space.
    pub fn draw(&self, x: i64, y: i64, inverted: bool) -> Vec<Primitive> {
        let px = |v: f64| round_px(v * self.resolution);
        let half = |v: i64| round_px(v as f64 / 2.0);

        match self.shape {
            ApertureShape::Circle { diameter } => {
                let diameter = px(diameter);
                vec![Primitive::Circle {
                    x: x - half(diameter),
                    y: y - half(diameter),
                    diameter,
                    inverted,
                }]
            }
            ApertureShape::Rectangle { x_size, y_size } => {
                let width = px(x_size);
                let height = px(y_size);
                vec![Primitive::Rect {
                    x: x - half(width),
                    y: y - half(height),
                    width,
                    height,
                }]
            }
            ApertureShape::Obround { x_size, y_size } => {
                obround_circles(x, y, x_size * self.resolution, y_size * self.resolution, inverted)
            }
        }
    }
}

/// Approximate an obround with three circles: one cap at each end of the
/// long axis and one at the center. The cap diameter is the short side.
fn obround_circles(x: i64, y: i64, w: f64, h: f64, inverted: bool) -> Vec<Primitive> {
    let circle = |cx: i64, cy: i64, diameter: i64| Primitive::Circle {
        x: cx,
        y: cy,
        diameter,
        inverted,
    };

    if w > h {
        let diameter = round_px(h);
        let half_diameter = round_px(h / 2.0);
        let half_width = round_px(w / 2.0);
        vec![
            circle(x - half_width, y - half_diameter, diameter),
            circle(x + half_width - diameter, y - half_diameter, diameter),
            circle(x - half_diameter, y - half_diameter, diameter),
        ]
    } else {
        let diameter = round_px(w);
        let half_diameter = round_px(w / 2.0);
        let half_height = round_px(h / 2.0);
        vec![
            circle(x - half_diameter, y - half_height, diameter),
            circle(x - half_diameter, y + half_height - diameter, diameter),
            circle(x - half_diameter, y - half_diameter, diameter),
        ]
    }
}

/// Aperture table built from %AD commands (or drill tool definitions).
#[derive(Debug, Default)]
pub struct ApertureTable {
    apertures: HashMap<u32, Aperture>,
}

impl ApertureTable {
    pub fn define(&mut self, code: u32, aperture: Aperture) {
        self.apertures.insert(code, aperture);
    }

    pub fn get(&self, code: u32) -> Option<&Aperture> {
        self.apertures.get(&code)
    }

    pub fn len(&self) -> usize {
        self.apertures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apertures.is_empty()
    }
}
