use std::f64::consts::TAU;

use log::{debug, info, warn};

use crate::error::MillError;
use crate::types::Primitive;
use crate::MillOptions;

use super::apertures::{Aperture, ApertureShape, ApertureTable};
use super::coord::{round_px, Units, GERBER_FORMAT, SUPPORTED_FORMAT_SPEC};

/// Angular increment between arc stamps, in radians (~0.1°).
pub const ARC_STEP: f64 = 0.00175;

/// G74/G75 arc mode. Recorded only: both modes sweep the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadrantMode {
    Single,
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    /// D01: move with the shutter open.
    Draw,
    /// D02: move with the shutter closed.
    Move,
    /// D03: single stamp.
    Flash,
}

impl Operation {
    fn from_line(line: &str) -> Option<Self> {
        if line.ends_with("D01*") {
            Some(Operation::Draw)
        } else if line.ends_with("D02*") {
            Some(Operation::Move)
        } else if line.ends_with("D03*") {
            Some(Operation::Flash)
        } else {
            None
        }
    }
}

/// Distance between two pixel-space points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Bearing from `from` to `to` in `[0, 2π)`, measured counter-clockwise with
/// the Y axis pointing down (screen space).
pub fn angle(from: (f64, f64), to: (f64, f64)) -> f64 {
    let a = (from.1 - to.1).atan2(to.0 - from.0);
    if a < 0.0 {
        TAU + a
    } else {
        a
    }
}

/// Gerber state machine. Walks lines and stamps apertures along paths.
pub struct Interpreter {
    resolution: f64,
    step: f64,
    units: Units,
    quadrant: Option<QuadrantMode>,
    apertures: ApertureTable,
    aperture: Option<Aperture>,
    last_point: (f64, f64),
    ended: bool,
    line_no: usize,
    primitives: Vec<Primitive>,
}

impl Interpreter {
    pub fn new(resolution: f64, step: f64) -> Self {
        Self {
            resolution,
            step,
            units: Units::Millimeters,
            quadrant: None,
            apertures: ApertureTable::default(),
            aperture: None,
            last_point: (0.0, 0.0),
            ended: false,
            line_no: 0,
            primitives: Vec::new(),
        }
    }

    /// Units declared by the last %MO line. Recorded only.
    pub fn units(&self) -> Units {
        self.units
    }

    pub fn quadrant(&self) -> Option<QuadrantMode> {
        self.quadrant
    }

    /// Whether an M02 line has been seen.
    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn last_point(&self) -> (f64, f64) {
        self.last_point
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn into_primitives(self) -> Vec<Primitive> {
        self.primitives
    }

    pub fn process_line(&mut self, line: &str) -> Result<(), MillError> {
        self.line_no += 1;

        if line.starts_with("G04") {
            // comment
        } else if line.starts_with("%MOIN*%") {
            info!("Dimensions in inches");
            self.units = Units::Inches;
        } else if line.starts_with("%MOMM*%") {
            info!("Dimensions in millimeters");
            self.units = Units::Millimeters;
        } else if line.starts_with("%FS") {
            if line != SUPPORTED_FORMAT_SPEC {
                return Err(MillError::UnsupportedFormat(line.to_string()));
            }
        } else if line.starts_with("%AD") {
            self.add_aperture(line)?;
        } else if line.starts_with("G54") {
            self.select_aperture(line)?;
        } else if line.starts_with("M02") {
            info!("End of program on line {}", self.line_no);
            self.ended = true;
        } else if line.starts_with('X') {
            self.draw(line)?;
        } else if line.starts_with("G74") {
            self.quadrant = Some(QuadrantMode::Single);
        } else if line.starts_with("G75") {
            self.quadrant = Some(QuadrantMode::Multi);
        } else if line.starts_with("G02") {
            self.draw_arc(line, true)?;
        } else if line.starts_with("G03") {
            self.draw_arc(line, false)?;
        } else {
            warn!("Ignoring line {}: {line}", self.line_no);
        }
        Ok(())
    }

    fn parse_error(&self, message: impl Into<String>) -> MillError {
        MillError::parse(self.line_no, message)
    }

    /// `%ADD10C,0.5*%` or `%ADD11R,1X0.5*%`
    fn add_aperture(&mut self, line: &str) -> Result<(), MillError> {
        let body = &line[3..];
        let code = body
            .get(1..3)
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| self.parse_error(format!("bad aperture number in '{line}'")))?;
        let tag = body
            .get(3..4)
            .ok_or_else(|| self.parse_error(format!("missing aperture shape in '{line}'")))?;

        let (comma, star) = match (body.find(','), body.find('*')) {
            (Some(c), Some(s)) if c < s => (c, s),
            _ => return Err(self.parse_error(format!("missing modifiers in '{line}'"))),
        };
        let modifiers = body[comma + 1..star]
            .split('X')
            .map(|m| m.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.parse_error(format!("bad modifier in '{line}': {e}")))?;

        let shape = ApertureShape::from_modifiers(tag, &modifiers)?;
        debug!("Aperture definition D{code} {shape:?}");
        self.apertures
            .define(code, Aperture::new(shape, self.resolution));
        Ok(())
    }

    /// `G54D10*`
    fn select_aperture(&mut self, line: &str) -> Result<(), MillError> {
        let code = line
            .get(4..6)
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| self.parse_error(format!("bad aperture number in '{line}'")))?;
        debug!("Selecting aperture D{code}");
        let aperture = self
            .apertures
            .get(code)
            .ok_or(MillError::UndefinedAperture(code))?;
        self.aperture = Some(aperture.clone());
        Ok(())
    }

    /// Slice the text between two marker characters.
    fn field<'a>(&self, line: &'a str, from: char, to: char) -> Result<&'a str, MillError> {
        match (line.find(from), line.find(to)) {
            (Some(a), Some(b)) if a < b => Ok(&line[a + 1..b]),
            _ => Err(self.parse_error(format!("missing {from}..{to} field in '{line}'"))),
        }
    }

    fn decode(&self, s: &str) -> Result<i64, MillError> {
        GERBER_FORMAT
            .to_pixels(s, self.resolution)
            .ok_or_else(|| self.parse_error(format!("bad coordinate '{s}'")))
    }

    fn current_aperture(&self) -> Result<&Aperture, MillError> {
        self.aperture.as_ref().ok_or(MillError::NoApertureSelected)
    }

    fn stamp(&mut self, x: i64, y: i64) -> Result<(), MillError> {
        let stamps = self.current_aperture()?.draw(x, y, false);
        self.primitives.extend(stamps);
        Ok(())
    }

    /// Linear move, draw or flash: `X<x>Y<y>D0n*`.
    fn draw(&mut self, line: &str) -> Result<(), MillError> {
        let x = self.decode(self.field(line, 'X', 'Y')?)?;
        let y = self.decode(self.field(line, 'Y', 'D')?)?;
        let target = (x as f64, y as f64);

        match Operation::from_line(line) {
            Some(Operation::Draw) => {
                self.current_aperture()?;
                // Stamp every step along the path. The remainder shorter than
                // one step is left unstamped.
                loop {
                    let remaining = distance(self.last_point, target);
                    if remaining <= self.step {
                        break;
                    }
                    let bearing = angle(self.last_point, target);
                    let next = (
                        self.last_point.0 + bearing.cos() * self.step,
                        self.last_point.1 - bearing.sin() * self.step,
                    );
                    // Steps below the float spacing at this position never move the pen.
                    if distance(next, target) >= remaining {
                        return Err(MillError::InvalidOption(format!(
                            "step {} too small to advance from ({}, {}) on line {}",
                            self.step, self.last_point.0, self.last_point.1, self.line_no
                        )));
                    }
                    self.stamp(round_px(next.0), round_px(next.1))?;
                    self.last_point = next;
                }
            }
            Some(Operation::Move) => {
                self.last_point = target;
            }
            Some(Operation::Flash) => {
                self.stamp(x, y)?;
                self.last_point = target;
            }
            None => warn!("Ignoring coordinate line {}: {line}", self.line_no),
        }
        Ok(())
    }

    /// Circular interpolation: `G0nX<x>Y<y>I<i>J<j>D0n*`.
    ///
    /// I/J are offsets from the current point to the center. The sweep always
    /// runs from the endpoint's angle up to the start point's angle, so both
    /// directions share one path.
    fn draw_arc(&mut self, line: &str, clockwise: bool) -> Result<(), MillError> {
        let x = self.decode(self.field(line, 'X', 'Y')?)?;
        let y = self.decode(self.field(line, 'Y', 'I')?)?;
        let i = self.decode(self.field(line, 'I', 'J')?)?;
        let j = self.decode(self.field(line, 'J', 'D')?)?;

        let center = (
            (self.last_point.0 + i as f64).trunc(),
            (self.last_point.1 + j as f64).trunc(),
        );
        let radius = distance(self.last_point, center);
        let start_angle = angle(center, (x as f64, y as f64));
        let mut end_angle = angle(center, self.last_point);
        // Coincident endpoints sweep a full circle.
        if start_angle >= end_angle {
            end_angle += TAU;
        }

        debug!(
            "Arc ({}) center [{}, {}] radius {radius:.3} start {:.2}° end {:.2}°",
            if clockwise { "cw" } else { "ccw" },
            center.0,
            center.1,
            start_angle.to_degrees(),
            end_angle.to_degrees(),
        );

        if Operation::from_line(line) != Some(Operation::Draw) {
            return Ok(());
        }

        self.current_aperture()?;
        let mut a = start_angle;
        while a < end_angle {
            let px = round_px(center.0 + radius * (-a).cos());
            let py = round_px(center.1 + radius * (-a).sin());
            self.stamp(px, py)?;
            self.last_point = (px as f64, py as f64);
            a += ARC_STEP;
        }
        Ok(())
    }
}

/// Interpret a whole Gerber file into stamped primitives.
pub fn interpret(content: &str, options: &MillOptions) -> Result<Vec<Primitive>, MillError> {
    options.validate()?;
    let mut interp = Interpreter::new(options.resolution, options.step);

    for line in content.lines() {
        interp.process_line(line)?;
    }

    if !interp.ended() {
        warn!("Gerber: no M02 end-of-program line");
    }
    if interp.apertures.is_empty() {
        warn!("Gerber: no apertures defined");
    } else {
        debug!("Gerber: {} apertures defined", interp.apertures.len());
    }

    Ok(interp.into_primitives())
}
