use serde::Serialize;

// ─── Primitives ──────────────────────────────────────────────────────

/// A filled shape in pixel space. Coordinates are the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Circle {
        x: i64,
        y: i64,
        diameter: i64,
        /// Always painted black, regardless of the image polarity.
        inverted: bool,
    },
    Rect {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
}

impl Primitive {
    /// Far corner of the shape (`x + size`, `y + size`).
    pub fn far_corner(&self) -> (i64, i64) {
        match *self {
            Primitive::Circle { x, y, diameter, .. } => (x + diameter, y + diameter),
            Primitive::Rect {
                x,
                y,
                width,
                height,
            } => (x + width, y + height),
        }
    }
}

// ─── Extent ──────────────────────────────────────────────────────────

/// Maximum extent of a primitive list, used to size the output canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub width: i64,
    pub height: i64,
}

impl Extent {
    pub fn expand(&mut self, primitive: &Primitive) {
        let (x, y) = primitive.far_corner();
        self.width = self.width.max(x);
        self.height = self.height.max(y);
    }
}

/// Componentwise maximum of every primitive's far corner, starting from `(0, 0)`.
pub fn max_extent(primitives: &[Primitive]) -> Extent {
    let mut extent = Extent::default();
    for p in primitives {
        extent.expand(p);
    }
    extent
}
