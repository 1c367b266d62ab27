//! Batch GeoTIFF standardization on top of [GDAL](https://gdal.org/).
//!
//! This crate wraps the handful of GDAL operations needed to force a pile of
//! heterogeneous rasters onto one common grid: reprojection, resampling,
//! bounding-box cropping, grid alignment with validation, band merging,
//! mosaicking and single-band pixel transforms. Every operation takes and
//! produces rasters identified by
//! filesystem path, verifies a post-condition on its output, and optionally
//! deletes its source once the output has been verified.
//!
//! The centerpiece is the alignment-and-validation protocol: a "complementary"
//! raster is reprojected (when needed), warped onto the exact pixel grid of a
//! "master" raster with nearest-neighbour resampling, and the result is
//! checked field by field against the master.
//!
//! ## Use
//!
//! ```rust, no_run
//! use std::path::Path;
//! use rasterprep::{align_validate_raster, errors::Result};
//!
//! fn main() -> Result<()> {
//!     let report = align_validate_raster(
//!         Path::new("landcover_raw.tif"),
//!         Path::new("climate_master.tif"),
//!         Path::new("landcover_aligned.tif"),
//!         false,
//!     )?;
//!     assert!(report.is_aligned());
//!     Ok(())
//! }
//! ```

pub mod align;
pub mod bbox;
pub mod errors;
pub mod info;
pub mod merge;
pub mod pixels;
pub mod programs;
pub mod transform;
pub mod workflow;

mod utils;

#[cfg(test)]
mod test_utils;

pub use align::{align_raster, align_validate_raster, validate_raster_alignment, AlignmentReport};
pub use bbox::BoundingBox;
pub use errors::{RasterPrepError, Result};
pub use info::RasterInfo;
pub use merge::{merge_rasters, mosaic_rasters, MergeReport};
pub use pixels::{
    apply_land_mask, replace_nodata_with_lowest, rescale_raster_to_zero_one, MaskReport,
    NodataFillReport, RescaleReport,
};
pub use transform::{
    change_raster_res, reproject_raster, set_raster_boundbox, CropReport, ResampleReport,
    CROP_TOLERANCE,
};
pub use workflow::{
    align_rasters_to_grid, check_raster_source, set_up_blank, stage_raster, BatchEntry, GridSpec,
};
