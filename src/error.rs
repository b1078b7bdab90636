use crate::types::FileFormat;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParcelError>;

/// Everything that can go wrong between receiving a file and returning a
/// report. None of these are retried: a structurally invalid file stays
/// invalid, and the caller decides whether to prompt for a resubmission.
#[derive(Debug, Error)]
pub enum ParcelError {
    /// The declared file name's extension is not one we handle.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The `.shp` file itself is absent at the given path.
    #[error("shapefile not found: {0}")]
    MissingFile(PathBuf),

    /// The file parsed but contained no geometry of any kind.
    #[error("no geometry found in {0} file")]
    NoGeometryFound(FileFormat),

    /// The file contained geometry, but nothing polygonal.
    #[error("no polygon found in {0} file")]
    NoPolygonFound(FileFormat),

    /// The aggregator was handed zero features. The decoders already reject
    /// this, so hitting it means an internal consistency bug, but it is
    /// reported like any other failure rather than panicking.
    #[error("cannot aggregate an empty feature set")]
    EmptyFeatureSet,

    /// Malformed binary/XML structure, carrying the parser's own message.
    #[error("failed to decode {format} file: {message}")]
    Decode { format: FileFormat, message: String },
}

impl ParcelError {
    pub(crate) fn decode(format: FileFormat, err: impl std::fmt::Display) -> Self {
        ParcelError::Decode {
            format,
            message: err.to_string(),
        }
    }
}
