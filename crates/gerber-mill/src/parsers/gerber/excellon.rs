use log::{debug, info, warn};

use crate::error::MillError;
use crate::types::Primitive;
use crate::MillOptions;

use super::apertures::{Aperture, ApertureShape, ApertureTable};
use super::coord::DRILL_FORMAT;

/// Excellon state machine. Every hit is stamped as an inverted circle so it
/// is cut out of both the traces and the outline image.
pub struct DrillInterpreter {
    resolution: f64,
    tools: ApertureTable,
    tool: Option<Aperture>,
    line_no: usize,
    primitives: Vec<Primitive>,
}

impl DrillInterpreter {
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            tools: ApertureTable::default(),
            tool: None,
            line_no: 0,
            primitives: Vec::new(),
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn into_primitives(self) -> Vec<Primitive> {
        self.primitives
    }

    pub fn process_line(&mut self, line: &str) -> Result<(), MillError> {
        self.line_no += 1;

        if let Some(rest) = line.strip_prefix('T') {
            if rest.contains('C') {
                self.add_tool(rest)?;
            } else if line != "T0" {
                self.select_tool(rest)?;
            }
        } else if line.starts_with("M30") {
            info!("End of drill program on line {}", self.line_no);
        } else if line.starts_with('X') {
            self.drill(line)?;
        } else {
            warn!("Ignoring drill line {}: {line}", self.line_no);
        }
        Ok(())
    }

    fn parse_error(&self, message: impl Into<String>) -> MillError {
        MillError::parse(self.line_no, message)
    }

    fn tool_number(&self, s: &str) -> Result<u32, MillError> {
        s.parse::<u32>()
            .map_err(|_| self.parse_error(format!("bad tool number 'T{s}'")))
    }

    /// `T1C0.800`
    fn add_tool(&mut self, rest: &str) -> Result<(), MillError> {
        let (num, mods) = rest.split_once('C').unwrap_or((rest, ""));
        let code = self.tool_number(num)?;
        let modifiers = mods
            .split('X')
            .map(|m| m.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.parse_error(format!("bad tool diameter 'T{rest}': {e}")))?;

        let shape = ApertureShape::from_modifiers("C", &modifiers)?;
        debug!("Drill definition T{code} {shape:?}");
        self.tools.define(code, Aperture::new(shape, self.resolution));
        Ok(())
    }

    /// `T1`
    fn select_tool(&mut self, rest: &str) -> Result<(), MillError> {
        let code = self.tool_number(rest)?;
        debug!("Selecting drill T{code}");
        let tool = self.tools.get(code).ok_or(MillError::UndefinedTool(code))?;
        self.tool = Some(tool.clone());
        Ok(())
    }

    /// `X<x>Y<y>` in 2+4 format. Y is always taken as non-negative.
    fn drill(&mut self, line: &str) -> Result<(), MillError> {
        let (xs, ys) = line[1..]
            .split_once('Y')
            .ok_or_else(|| self.parse_error(format!("missing Y in '{line}'")))?;
        let ys = ys.strip_prefix('-').unwrap_or(ys);

        let decode = |s: &str| {
            DRILL_FORMAT
                .to_pixels(s, self.resolution)
                .ok_or_else(|| self.parse_error(format!("bad coordinate '{s}'")))
        };
        let x = decode(xs)?;
        let y = decode(ys)?.abs();

        let tool = self.tool.as_ref().ok_or(MillError::NoToolSelected)?;
        let stamps = tool.draw(x, y, true);
        self.primitives.extend(stamps);
        Ok(())
    }
}

/// Interpret a whole Excellon file into inverted hole primitives.
pub fn interpret(content: &str, options: &MillOptions) -> Result<Vec<Primitive>, MillError> {
    options.validate()?;
    let mut interp = DrillInterpreter::new(options.resolution);

    for line in content.lines() {
        interp.process_line(line)?;
    }

    if interp.tools.is_empty() {
        warn!("Drill: no tools defined");
    } else {
        debug!("Drill: {} tools defined", interp.tools.len());
    }

    Ok(interp.into_primitives())
}
