use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::error::MillError;
use crate::parsers::gerber::{parse_drill_file, parse_gerber_file};
use crate::render;
use crate::types::{max_extent, Extent, Primitive};
use crate::MillOptions;

/// Layer files of a KiCad-style plot, named `<prefix>-<layer>.<ext>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFiles {
    pub edge: Option<PathBuf>,
    /// Bottom copper first, then top.
    pub copper: Vec<PathBuf>,
    /// Non-plated holes first, then plated.
    pub drills: Vec<PathBuf>,
}

impl ProjectFiles {
    /// Every file name the project may use, whether or not it exists.
    pub fn candidates(prefix: &str) -> Self {
        Self {
            edge: Some(PathBuf::from(format!("{prefix}-Edge_Cuts.gbr"))),
            copper: vec![
                PathBuf::from(format!("{prefix}-B_Cu.gbl")),
                PathBuf::from(format!("{prefix}-F_Cu.gtl")),
            ],
            drills: vec![
                PathBuf::from(format!("{prefix}-NPTH.drl")),
                PathBuf::from(format!("{prefix}.drl")),
            ],
        }
    }

    /// Candidates filtered down to the files that exist.
    pub fn discover(prefix: &str) -> Self {
        let candidates = Self::candidates(prefix);
        let found = Self {
            edge: candidates.edge.filter(|p| p.is_file()),
            copper: candidates.copper.into_iter().filter(|p| p.is_file()).collect(),
            drills: candidates.drills.into_iter().filter(|p| p.is_file()).collect(),
        };
        for path in found.edge.iter().chain(&found.copper) {
            info!("Gerber found: {}", path.display());
        }
        for path in &found.drills {
            info!("Drill found: {}", path.display());
        }
        found
    }
}

/// Primitive lists of the three layers that feed the two images.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerPrimitives {
    pub edge: Vec<Primitive>,
    pub copper: Vec<Primitive>,
    pub drill: Vec<Primitive>,
}

impl LayerPrimitives {
    /// Parse the edge layer, the first copper layer and the first drill file.
    ///
    /// Edge and copper are required; a missing drill file yields no holes.
    pub fn parse(files: &ProjectFiles, opts: &MillOptions) -> Result<Self, MillError> {
        let edge_path = files
            .edge
            .as_deref()
            .ok_or_else(|| MillError::MissingInput("edge cuts layer".into()))?;
        let copper_path = files
            .copper
            .first()
            .ok_or_else(|| MillError::MissingInput("copper layer".into()))?;

        let edge = parse_gerber_file(edge_path, opts)?;
        let copper = parse_gerber_file(copper_path, opts)?;
        let drill = match files.drills.first() {
            Some(path) => parse_drill_file(path, opts)?,
            None => Vec::new(),
        };

        Ok(Self {
            edge,
            copper,
            drill,
        })
    }

    /// Canvas extent, taken from the edge layer alone.
    pub fn extent(&self) -> Extent {
        max_extent(&self.edge)
    }

    /// Copper plus holes, drawn on black.
    pub fn traces(&self) -> Vec<Primitive> {
        self.copper.iter().chain(&self.drill).copied().collect()
    }

    /// Outline plus holes, drawn black on white.
    pub fn cutout(&self) -> Vec<Primitive> {
        self.edge.iter().chain(&self.drill).copied().collect()
    }

    /// Write `edge.json`, `copper.json` and `drill.json` into `dir`.
    pub fn dump_json(&self, dir: &Path) -> Result<(), MillError> {
        std::fs::create_dir_all(dir)?;
        for (name, prims) in [
            ("edge", &self.edge),
            ("copper", &self.copper),
            ("drill", &self.drill),
        ] {
            let path = dir.join(format!("{name}.json"));
            std::fs::write(&path, serde_json::to_string(prims)?)?;
            info!("Written to {}", path.display());
        }
        Ok(())
    }
}

/// Paths of the two images produced for a project.
#[derive(Debug, Clone, PartialEq)]
pub struct MilledImages {
    pub traces: PathBuf,
    pub cutout: PathBuf,
}

impl MilledImages {
    pub fn for_prefix(prefix: &str) -> Self {
        Self {
            traces: PathBuf::from(format!("{prefix}_MILL-TRACES.png")),
            cutout: PathBuf::from(format!("{prefix}_MILL-CUTOUT.png")),
        }
    }
}

/// Render the traces image (not inverted) and the cutout image (inverted).
/// Both share the edge layer's extent, so they have identical dimensions.
pub fn render_layers(
    layers: &LayerPrimitives,
    outputs: &MilledImages,
    opts: &MillOptions,
) -> Result<(), MillError> {
    opts.validate()?;
    let extent = layers.extent();
    render::render(
        &outputs.traces,
        extent,
        opts.resolution,
        opts.border_mm,
        &layers.traces(),
        false,
    )?;
    render::render(
        &outputs.cutout,
        extent,
        opts.resolution,
        opts.border_mm,
        &layers.cutout(),
        true,
    )?;
    Ok(())
}

/// Discover, parse and render a project. Every layer is parsed before any
/// image is written.
pub fn mill_project(prefix: &str, opts: &MillOptions) -> Result<MilledImages, MillError> {
    info!("Project name: {prefix}");
    let files = ProjectFiles::discover(prefix);
    let layers = LayerPrimitives::parse(&files, opts)?;
    let outputs = MilledImages::for_prefix(prefix);
    render_layers(&layers, &outputs, opts)?;
    Ok(outputs)
}
