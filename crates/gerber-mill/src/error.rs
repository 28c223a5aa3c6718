use thiserror::Error;

#[derive(Error, Debug)]
pub enum MillError {
    #[error("unsupported coordinate format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported aperture: {0}")]
    UnsupportedAperture(String),

    #[error("undefined aperture D{0}")]
    UndefinedAperture(u32),

    #[error("undefined drill tool T{0}")]
    UndefinedTool(u32),

    #[error("draw or flash issued with no aperture selected")]
    NoApertureSelected,

    #[error("drill hit issued with no tool selected")]
    NoToolSelected,

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: i64, height: i64 },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG error: {0}")]
    Png(#[from] png::EncodingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MillError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
