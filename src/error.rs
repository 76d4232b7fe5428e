// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("payload has {actual} samples but header declares {cols}x{rows}")]
    SizeMismatch { cols: i32, rows: i32, actual: usize },

    #[error("grid header truncated: {0} bytes available, 24 required")]
    TruncatedHeader(usize),

    #[error("grid payload truncated: {available} bytes available, {expected} required")]
    TruncatedPayload { available: usize, expected: usize },

    #[error("invalid grid dimensions {cols}x{rows}")]
    InvalidDimensions { cols: i64, rows: i64 },

    #[error("no valid samples: every sample equals the no-data value {0}")]
    EmptyValidSet(f64),

    #[error("sample {index} value {value} does not fit into a 16-bit integer")]
    OutOfRange { index: usize, value: f64 },

    #[error("extent {x_min},{y_min},{x_max},{y_max} is degenerate for {cols}x{rows} samples")]
    DegenerateExtent { x_min: f64, y_min: f64, x_max: f64, y_max: f64, cols: i32, rows: i32 },

    #[error("invalid scale factor {0}")]
    InvalidScale(f64),

    #[error("unsupported output extension: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("input file must be a .grid file: {0}")]
    NotAGridFile(PathBuf),

    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("cannot read input file {path}: {reason}")]
    SourceOpenFailure { path: PathBuf, reason: String },

    #[error("cannot create output {path}: {reason}")]
    SinkCreateFailure { path: PathBuf, reason: String },

    #[error("band {0} not found")]
    BandNotFound(usize),

    #[error("unsupported raster sample type: {0}")]
    UnsupportedSampleKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

impl ConvertError {
    /// Process exit status reported by the command line tool.
    pub fn exit_code(&self) -> u8 {
        use ConvertError::*;
        match self {
            TruncatedHeader(_)
            | TruncatedPayload { .. }
            | InvalidDimensions { .. }
            | UnsupportedExtension(_)
            | NotAGridFile(_)
            | SourceOpenFailure { .. }
            | BandNotFound(_)
            | UnsupportedSampleKind(_) => 2,
            InputNotFound(_) => 3,
            SinkCreateFailure { .. } => 4,
            _ => 1,
        }
    }
}

pub fn source_open_failure<P: Into<PathBuf>, S: ToString>(path: P, reason: S) -> ConvertError {
    ConvertError::SourceOpenFailure { path: path.into(), reason: reason.to_string() }
}

pub fn sink_create_failure<P: Into<PathBuf>, S: ToString>(path: P, reason: S) -> ConvertError {
    ConvertError::SinkCreateFailure { path: path.into(), reason: reason.to_string() }
}
