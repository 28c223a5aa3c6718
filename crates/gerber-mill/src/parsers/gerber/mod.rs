mod apertures;
pub mod coord;
pub mod excellon;
pub mod interpreter;

use std::path::Path;

use log::info;

use crate::error::MillError;
use crate::types::Primitive;
use crate::MillOptions;

pub use apertures::{Aperture, ApertureShape, ApertureTable};

/// Read and interpret a Gerber (RS-274X) layer file.
pub fn parse_gerber_file(path: &Path, opts: &MillOptions) -> Result<Vec<Primitive>, MillError> {
    info!("Processing Gerber: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let primitives = interpreter::interpret(&content, opts)?;
    info!("# of primitives: {}", primitives.len());
    Ok(primitives)
}

/// Read and interpret an Excellon drill file.
pub fn parse_drill_file(path: &Path, opts: &MillOptions) -> Result<Vec<Primitive>, MillError> {
    info!("Processing drill file: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let primitives = excellon::interpret(&content, opts)?;
    info!("# of primitives: {}", primitives.len());
    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let gbr = dir.path().join("board-F_Cu.gtl");
        let drl = dir.path().join("board.drl");
        fs::write(
            &gbr,
            "%FSLAX34Y34*%\r\n%MOMM*%\r\n%ADD10C,0.5*%\r\nG54D10*\r\nX10000Y10000D03*\r\nM02*\r\n",
        )
        .unwrap();
        fs::write(&drl, "M48\nT1C0.8\n%\nT1\nX010000Y-010000\nM30\n").unwrap();

        let opts = MillOptions::default();
        assert_eq!(parse_gerber_file(&gbr, &opts).unwrap().len(), 1);
        assert_eq!(parse_drill_file(&drl, &opts).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_gerber_file(&dir.path().join("nope.gbr"), &MillOptions::default());
        assert!(matches!(result, Err(MillError::Io(_))));
    }
}
