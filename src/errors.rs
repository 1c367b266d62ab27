//! Error types for raster standardization operations.

use std::path::PathBuf;

use gdal::errors::GdalError;

pub type Result<T> = std::result::Result<T, RasterPrepError>;

/// Failure modes of the standardization operations.
///
/// Primitive-layer failures (open, warp, write) surface as errors; non-fatal
/// post-condition mismatches are carried in the operation reports instead, so
/// a batch caller can decide whether to tolerate them.
#[derive(Debug, thiserror::Error)]
pub enum RasterPrepError {
    /// A source or target path could not be opened as a raster.
    #[error("input raster '{path}' is missing or unreadable: {source}")]
    MissingInput {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    /// Two input rasters violate a compatibility precondition.
    #[error("incompatible inputs: {reason}")]
    IncompatibleInputs { reason: String },

    /// The destination file was not produced by the wrapped GDAL call.
    #[error("destination '{path}' was not written")]
    WriteFailed { path: PathBuf },

    /// A numeric post-condition fell outside the acceptable tolerance.
    #[error("result outside tolerance: {detail}")]
    ToleranceExceeded { detail: String },

    /// A GDAL utility entry point returned a NULL dataset.
    #[error("GDAL method '{method_name}' returned a NULL pointer: {msg}")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },

    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    FfiNul(#[from] std::ffi::NulError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
