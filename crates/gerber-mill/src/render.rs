use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{Rgb, RgbImage};
use log::info;

use crate::error::MillError;
use crate::parsers::gerber::coord::round_px;
use crate::types::{Extent, Primitive};

const MM_PER_INCH: f64 = 25.4;

/// Paint color carried from one primitive to the next.
///
/// Circles pick their own fill; rectangles reuse whatever the last circle
/// picked (or the base fill if no circle came first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Black,
    White,
}

impl Fill {
    fn color(self) -> Rgb<u8> {
        match self {
            Fill::Black => Rgb([0, 0, 0]),
            Fill::White => Rgb([255, 255, 255]),
        }
    }
}

/// Border width in pixels for a border given in millimeters.
pub fn border_pixels(border_mm: f64, resolution: f64) -> i64 {
    round_px(border_mm / MM_PER_INCH * resolution)
}

/// Composite primitives onto a new canvas.
///
/// The canvas is `extent` plus the border on every side. A non-inverted
/// canvas keeps its zeroed (black) background; an inverted one starts white
/// and paints everything black.
pub fn rasterize(
    extent: Extent,
    resolution: f64,
    border_mm: f64,
    primitives: &[Primitive],
    inverted: bool,
) -> Result<RgbImage, MillError> {
    let border = border_pixels(border_mm, resolution);
    let width = extent.width + 2 * border;
    let height = extent.height + 2 * border;
    let invalid = || MillError::InvalidCanvas { width, height };
    let w = u32::try_from(width).map_err(|_| invalid())?;
    let h = u32::try_from(height).map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }

    let mut img = RgbImage::new(w, h);
    let mut fill = Fill::White;
    if inverted {
        fill_rect(&mut img, 0, 0, width, height, Fill::White.color());
        fill = Fill::Black;
    }

    for p in primitives {
        match *p {
            Primitive::Circle {
                x,
                y,
                diameter,
                inverted: hole,
            } => {
                fill = if hole || inverted {
                    Fill::Black
                } else {
                    Fill::White
                };
                fill_disc(&mut img, x + border, y + border, diameter, fill.color());
            }
            Primitive::Rect {
                x,
                y,
                width,
                height,
            } => {
                let (x, y) = (x + border, y + border);
                fill_rect(&mut img, x, y, x + width, y + height, fill.color());
            }
        }
    }

    Ok(img)
}

/// Rasterize and write a PNG carrying `resolution` as its pixel density.
///
/// Nothing is written unless the whole image was composited.
pub fn render(
    path: &Path,
    extent: Extent,
    resolution: f64,
    border_mm: f64,
    primitives: &[Primitive],
    inverted: bool,
) -> Result<(), MillError> {
    info!(
        "Generating {} from {} primitives",
        path.display(),
        primitives.len()
    );
    let img = rasterize(extent, resolution, border_mm, primitives, inverted)?;
    write_png(path, &img, resolution)?;
    info!("Wrote {} ({}x{})", path.display(), img.width(), img.height());
    Ok(())
}

/// Write an RGB image with a pHYs chunk. `resolution` is read as dots per inch.
pub fn write_png(path: &Path, img: &RgbImage, resolution: f64) -> Result<(), MillError> {
    let ppm = (resolution / (MM_PER_INCH / 1000.0)).round() as u32;

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), img.width(), img.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(img.as_raw())?;
    writer.finish()?;
    Ok(())
}

/// Fill the inclusive pixel span `[x0, x1]` of row `y`, clipped to the canvas.
fn fill_span(img: &mut RgbImage, y: i64, x0: i64, x1: i64, color: Rgb<u8>) {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    if y < 0 || y >= h {
        return;
    }
    let x0 = x0.max(0);
    let x1 = x1.min(w - 1);
    if x0 > x1 {
        return;
    }

    let row_start = (y * w) as usize * 3;
    let buf: &mut [u8] = &mut *img;
    let span = &mut buf[row_start + x0 as usize * 3..row_start + (x1 as usize + 1) * 3];
    for px in span.chunks_exact_mut(3) {
        px.copy_from_slice(&color.0);
    }
}

/// Fill the inclusive box `[x0, x1] × [y0, y1]`.
fn fill_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let h = i64::from(img.height());
    for y in y0.max(0)..=y1.min(h - 1) {
        fill_span(img, y, x0, x1, color);
    }
}

/// Fill the disc inscribed in the inclusive box `[x, x + d] × [y, y + d]`.
///
/// A pixel is painted when its center lies inside the disc.
fn fill_disc(img: &mut RgbImage, x: i64, y: i64, diameter: i64, color: Rgb<u8>) {
    if diameter < 0 {
        return;
    }
    let r = (diameter + 1) as f64 / 2.0;
    let cx = x as f64 + r;
    let cy = y as f64 + r;

    let h = i64::from(img.height());
    for py in y.max(0)..=(y + diameter).min(h - 1) {
        let dy = py as f64 + 0.5 - cy;
        let reach = r * r - dy * dy;
        if reach < 0.0 {
            continue;
        }
        let dx = reach.sqrt();
        let x0 = (cx - dx - 0.5).ceil() as i64;
        let x1 = (cx + dx - 0.5).floor() as i64;
        fill_span(img, py, x0, x1, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn extent(width: i64, height: i64) -> Extent {
        Extent { width, height }
    }

    fn circle(x: i64, y: i64, diameter: i64, inverted: bool) -> Primitive {
        Primitive::Circle {
            x,
            y,
            diameter,
            inverted,
        }
    }

    fn rect(x: i64, y: i64, width: i64, height: i64) -> Primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_border_pixels() {
        // 0.5 / 25.4 * 1000 = 19.685
        assert_eq!(border_pixels(0.5, 1000.0), 20);
        assert_eq!(border_pixels(0.0, 1000.0), 0);
    }

    #[test]
    fn test_canvas_size_includes_border() {
        let img = rasterize(extent(100, 50), 1000.0, 0.5, &[], false).unwrap();
        assert_eq!(img.dimensions(), (140, 90));
    }

    #[test]
    fn test_base_fill() {
        let plain = rasterize(extent(10, 10), 1000.0, 0.0, &[], false).unwrap();
        assert!(plain.pixels().all(|p| *p == BLACK));
        let inverted = rasterize(extent(10, 10), 1000.0, 0.0, &[], true).unwrap();
        assert!(inverted.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_invalid_canvas() {
        let result = rasterize(extent(0, 0), 1000.0, 0.0, &[], false);
        assert!(matches!(
            result,
            Err(MillError::InvalidCanvas {
                width: 0,
                height: 0
            })
        ));
    }

    #[test]
    fn test_circle_colors() {
        let prims = [circle(0, 0, 10, false), circle(20, 0, 10, true)];
        let img = rasterize(extent(40, 20), 1000.0, 0.0, &prims, false).unwrap();
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        // Inverted circle on a black canvas paints black
        assert_eq!(*img.get_pixel(25, 5), BLACK);
        // Corners of the bounding box stay clear
        assert_eq!(*img.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn test_global_invert_paints_black() {
        let prims = [circle(0, 0, 10, false)];
        let img = rasterize(extent(20, 20), 1000.0, 0.0, &prims, true).unwrap();
        assert_eq!(*img.get_pixel(5, 5), BLACK);
        assert_eq!(*img.get_pixel(18, 18), WHITE);
    }

    #[test]
    fn test_rect_inherits_last_circle_fill() {
        let prims = [
            circle(0, 0, 4, false),
            rect(10, 0, 4, 4),
            circle(20, 0, 4, true),
            rect(30, 0, 4, 4),
        ];
        let img = rasterize(extent(40, 10), 1000.0, 0.0, &prims, true).unwrap();
        // Global invert: every circle resolves to black, so both rects do too
        assert_eq!(*img.get_pixel(12, 2), BLACK);
        assert_eq!(*img.get_pixel(32, 2), BLACK);

        let img = rasterize(extent(40, 10), 1000.0, 0.0, &prims, false).unwrap();
        // After a plain circle the rect is white, after a hole it is black
        assert_eq!(*img.get_pixel(12, 2), WHITE);
        assert_eq!(*img.get_pixel(32, 2), BLACK);
    }

    #[test]
    fn test_rect_without_circle_uses_base_fill() {
        let prims = [rect(0, 0, 4, 4)];
        let plain = rasterize(extent(10, 10), 1000.0, 0.0, &prims, false).unwrap();
        assert_eq!(*plain.get_pixel(2, 2), WHITE);
        let inverted = rasterize(extent(10, 10), 1000.0, 0.0, &prims, true).unwrap();
        assert_eq!(*inverted.get_pixel(2, 2), BLACK);
    }

    #[test]
    fn test_rect_is_inclusive() {
        let prims = [rect(2, 2, 3, 3)];
        let img = rasterize(extent(10, 10), 1000.0, 0.0, &prims, false).unwrap();
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        assert_eq!(*img.get_pixel(6, 6), BLACK);
        assert_eq!(*img.get_pixel(1, 1), BLACK);
    }

    #[test]
    fn test_primitives_shifted_by_border() {
        let prims = [rect(0, 0, 0, 0)];
        let img = rasterize(extent(10, 10), 1000.0, 0.5, &prims, false).unwrap();
        assert_eq!(*img.get_pixel(20, 20), WHITE);
        assert_eq!(*img.get_pixel(19, 19), BLACK);
    }

    #[test]
    fn test_clipping() {
        // Shapes hanging off the canvas edge paint only the visible part
        let prims = [circle(-10, -10, 20, false), rect(5, 5, 100, 100)];
        let img = rasterize(extent(10, 10), 1000.0, 0.0, &prims, false).unwrap();
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(9, 9), WHITE);
    }

    #[test]
    fn test_write_png_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        render(&path, extent(30, 20), 1000.0, 0.0, &[circle(0, 0, 10, false)], false).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (30, 20));
        let dims = info.pixel_dims.unwrap();
        assert_eq!(dims.xppu, 39370);
        assert_eq!(dims.yppu, 39370);
        assert_eq!(dims.unit, png::Unit::Meter);

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*img.get_pixel(5, 5), WHITE);
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let result = render(&path, extent(10, 10), 1000.0, 0.0, &[], false);
        assert!(matches!(result, Err(MillError::Io(_))));
    }
}
