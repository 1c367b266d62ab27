//! Single-raster transform operations: reproject, resample, crop.
//!
//! Each operation is a stateless wrapper around one GDAL utility call,
//! followed by a post-condition check on the destination and an optional,
//! gated deletion of the source file. Failures of the primitive layer surface
//! as errors; numeric post-condition misses are carried in the returned report
//! so batch callers can decide whether to tolerate them.

use std::fs;
use std::path::Path;

use gdal::GeoTransform;
use log::{debug, warn};

use crate::bbox::BoundingBox;
use crate::errors::{RasterPrepError, Result};
use crate::info::{open_raster, RasterInfo};
use crate::programs::{translate, warp, TranslateOptions, WarpOptions};

/// Normalized NW-corner placement error threshold for [`set_raster_boundbox`].
pub const CROP_TOLERANCE: f64 = 0.01;

/// Reprojects `src_raster` to `new_crs`, writing a new GeoTIFF at `dst_raster`.
///
/// `new_crs` accepts any GDAL SRS definition (`"EPSG:4326"`, `"ESRI:54028"`,
/// WKT, PROJ strings). The source is deleted only when `delete_source` is set
/// and the destination has been confirmed on disk.
pub fn reproject_raster(
    new_crs: &str,
    src_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<()> {
    debug!(
        "reprojecting {} -> {} ({new_crs})",
        src_raster.display(),
        dst_raster.display()
    );

    let src = open_raster(src_raster)?;
    let options = WarpOptions::new(["-t_srs".to_string(), new_crs.to_string()])?;
    // Dropping the returned dataset flushes the destination to disk.
    drop(warp(&src, dst_raster, Some(options))?);
    drop(src);

    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    if delete_source {
        fs::remove_file(src_raster)?;
    }
    Ok(())
}

/// Outcome of a [`change_raster_res`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleReport {
    pub target_res: f64,
    /// Absolute destination pixel sizes `(x_res, y_res)`.
    pub dst_res: (f64, f64),
}

impl ResampleReport {
    /// Whether both destination pixel sizes equal the requested resolution.
    pub fn meets_target(&self) -> bool {
        self.dst_res.0 == self.target_res && self.dst_res.1 == self.target_res
    }

    /// Promotes a missed resolution target to a hard error.
    pub fn ensure(self) -> Result<Self> {
        if self.meets_target() {
            Ok(self)
        } else {
            Err(RasterPrepError::ToleranceExceeded {
                detail: format!(
                    "destination resolution {:?} does not meet target {}",
                    self.dst_res, self.target_res
                ),
            })
        }
    }
}

/// Resamples `src_raster` to a uniform `target_res` on both axes.
///
/// The destination's pixel sizes are compared against the target; a mismatch
/// is reported, not raised, and blocks source deletion.
pub fn change_raster_res(
    target_res: f64,
    src_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<ResampleReport> {
    debug!(
        "resampling {} -> {} at {target_res}",
        src_raster.display(),
        dst_raster.display()
    );

    let src = open_raster(src_raster)?;
    let options = WarpOptions::new([
        "-tr".to_string(),
        format!("{target_res}"),
        format!("{target_res}"),
    ])?;
    drop(warp(&src, dst_raster, Some(options))?);
    drop(src);

    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    let dst_info = RasterInfo::read(dst_raster)?;
    let report = ResampleReport {
        target_res,
        dst_res: dst_info.resolution(),
    };

    if !report.meets_target() {
        warn!(
            "{}: resolution {:?} does not meet target {target_res}",
            dst_raster.display(),
            report.dst_res
        );
    } else if delete_source {
        fs::remove_file(src_raster)?;
    }
    Ok(report)
}

/// Outcome of a [`set_raster_boundbox`] call.
///
/// Errors are the offsets of the destination's NW corner from the requested
/// corner, normalized by the destination's extent on each axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CropReport {
    pub x_error: f64,
    pub y_error: f64,
}

impl CropReport {
    /// Computes the placement errors of a cropped grid against the requested
    /// bounding box. Assumes a north-up geotransform.
    pub fn from_geo_transform(
        gt: &GeoTransform,
        size: (usize, usize),
        target: &BoundingBox,
    ) -> Self {
        let dst_width = size.0 as f64 * gt[1];
        let dst_height = size.1 as f64 * -gt[5];
        CropReport {
            x_error: ((gt[0] - target.west) / dst_width).abs(),
            y_error: ((gt[3] - target.north) / dst_height).abs(),
        }
    }

    pub fn within_tolerance(&self) -> bool {
        self.x_error.max(self.y_error) < CROP_TOLERANCE
    }

    /// Promotes an out-of-tolerance crop to a hard error.
    pub fn ensure(self) -> Result<Self> {
        if self.within_tolerance() {
            Ok(self)
        } else {
            Err(RasterPrepError::ToleranceExceeded {
                detail: format!(
                    "crop placement errors ({}, {}) exceed {CROP_TOLERANCE}",
                    self.x_error, self.y_error
                ),
            })
        }
    }
}

/// Crops `src_raster` to `target_bbox`, writing a new GeoTIFF at `dst_raster`.
///
/// The destination's NW corner is checked against the request with a relative
/// tolerance of [`CROP_TOLERANCE`]; an out-of-tolerance result is reported,
/// not raised, and blocks source deletion.
pub fn set_raster_boundbox(
    target_bbox: &BoundingBox,
    src_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<CropReport> {
    debug!(
        "cropping {} -> {} to {target_bbox:?}",
        src_raster.display(),
        dst_raster.display()
    );

    let src = open_raster(src_raster)?;
    let (ulx, uly, lrx, lry) = target_bbox.to_projwin();
    let options = TranslateOptions::new([
        "-projWin".to_string(),
        format!("{ulx}"),
        format!("{uly}"),
        format!("{lrx}"),
        format!("{lry}"),
    ])?;
    drop(translate(&src, dst_raster, Some(options))?);
    drop(src);

    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    let dst_info = RasterInfo::read(dst_raster)?;
    let report = CropReport::from_geo_transform(
        &dst_info.geo_transform,
        (dst_info.width, dst_info.height),
        target_bbox,
    );

    if !report.within_tolerance() {
        warn!(
            "{}: crop placement errors ({}, {}) exceed {CROP_TOLERANCE}",
            dst_raster.display(),
            report.x_error,
            report.y_error
        );
    } else if delete_source {
        fs::remove_file(src_raster)?;
    }
    Ok(report)
}
