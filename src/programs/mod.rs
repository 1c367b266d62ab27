//! Safe wrappers for the GDAL utility ("app") entry points backing the
//! standardization operations.
//!
//! The high-level `gdal` crate wraps `GDALBuildVRT` but not `GDALTranslate` or
//! `GDALWarp`; the wrappers here follow the same shape: an options struct
//! owning the parsed argument list, and a function taking a source [`Dataset`]
//! and a destination path.
//!
//! [`Dataset`]: gdal::Dataset

mod translate;
mod warp;

pub use translate::{translate, TranslateOptions};
pub use warp::{warp, WarpOptions};
