//! Grid alignment and alignment validation.
//!
//! The only composable guarantee in this crate lives here: `reproject →
//! align → validate` forces a complementary raster onto the exact pixel grid,
//! resolution, and projection of a master raster, and reports how well the
//! result matches.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::{RasterPrepError, Result};
use crate::info::{open_raster, RasterInfo};
use crate::programs::{warp, WarpOptions};
use crate::transform::reproject_raster;

/// Warps `source_raster` onto the exact pixel grid of `target_raster`.
///
/// The target's bounds, resolution and projection are imposed on the output;
/// resampling is nearest-neighbour so categorical or already-resampled values
/// are carried over without interpolation. Verification of the result is
/// delegated to [`validate_raster_alignment`]; this operation only confirms
/// that the destination was written before allowing source deletion.
pub fn align_raster(
    source_raster: &Path,
    target_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<()> {
    debug!(
        "aligning {} to {} -> {}",
        source_raster.display(),
        target_raster.display(),
        dst_raster.display()
    );

    let target = RasterInfo::read(target_raster)?;
    let gt = &target.geo_transform;
    let (x_res, y_res) = (gt[1], gt[5]);

    // Output bounds of the target grid as xmin/ymin/xmax/ymax; y_res is
    // negative for a north-up image.
    let xmin = gt[0];
    let ymin = gt[3] + target.height as f64 * y_res;
    let xmax = gt[0] + target.width as f64 * x_res;
    let ymax = gt[3];

    let src = open_raster(source_raster)?;
    let options = WarpOptions::new([
        "-tr".to_string(),
        format!("{}", x_res.abs()),
        format!("{}", y_res.abs()),
        "-te".to_string(),
        format!("{xmin}"),
        format!("{ymin}"),
        format!("{xmax}"),
        format!("{ymax}"),
        "-t_srs".to_string(),
        target.projection.clone(),
        "-r".to_string(),
        "near".to_string(),
    ])?;
    drop(warp(&src, dst_raster, Some(options))?);
    drop(src);

    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    if delete_source {
        fs::remove_file(source_raster)?;
    }
    Ok(())
}

/// Whether two rasters occupy identical pixel grids.
///
/// All four checks are computed independently with no short-circuiting, so a
/// caller always gets the full diagnostic. The pixel-count check is kept
/// separate from the dimension check: transposed width/height match the
/// product without matching either dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentReport {
    pub dimension_match: bool,
    pub projection_match: bool,
    pub pixel_count_match: bool,
    /// Exact equality of the six geotransform coefficients.
    pub geotransform_match: bool,
}

impl AlignmentReport {
    /// Compares two metadata snapshots. Symmetric in its arguments.
    pub fn compare(a: &RasterInfo, b: &RasterInfo) -> Self {
        AlignmentReport {
            dimension_match: a.width == b.width && a.height == b.height,
            projection_match: a.projection == b.projection,
            pixel_count_match: a.pixel_count() == b.pixel_count(),
            geotransform_match: a.geo_transform == b.geo_transform,
        }
    }

    /// All four checks passed.
    pub fn is_aligned(&self) -> bool {
        self.dimension_match
            && self.projection_match
            && self.pixel_count_match
            && self.geotransform_match
    }

    /// Promotes a partial alignment to a hard error.
    pub fn ensure_aligned(self) -> Result<Self> {
        if self.is_aligned() {
            Ok(self)
        } else {
            Err(RasterPrepError::IncompatibleInputs {
                reason: format!("rasters are not aligned: {self:?}"),
            })
        }
    }
}

/// Checks whether two rasters are aligned: same dimensions, projection, pixel
/// count and geotransform.
pub fn validate_raster_alignment(raster_1: &Path, raster_2: &Path) -> Result<AlignmentReport> {
    let info_1 = RasterInfo::read(raster_1)?;
    let info_2 = RasterInfo::read(raster_2)?;
    Ok(AlignmentReport::compare(&info_1, &info_2))
}

/// Aligns `source_raster` to `target_raster` and validates the result.
///
/// When the projections differ the source is first reprojected to the target's
/// projection through a scoped temporary file, which is removed before the
/// function returns. A partial alignment is surfaced as a warning and in the
/// returned report, not as an error: the destination file is usable, just
/// imperfect. The original source (never the intermediate) is deleted only
/// when `delete_source` is set and the destination exists.
pub fn align_validate_raster(
    source_raster: &Path,
    target_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<AlignmentReport> {
    let source = RasterInfo::read(source_raster)?;
    let target = RasterInfo::read(target_raster)?;
    let projection_match = source.projection == target.projection;

    // The temp dir must outlive the alignment warp below.
    let mut _scratch: Option<tempfile::TempDir> = None;
    let aligned_source: PathBuf = if projection_match {
        source_raster.to_path_buf()
    } else {
        debug!(
            "{}: projection differs from target, reprojecting first",
            source_raster.display()
        );
        let scratch = tempfile::tempdir()?;
        let reprojected = scratch.path().join("reprojected.tif");
        reproject_raster(&target.projection, source_raster, &reprojected, false)?;
        _scratch = Some(scratch);
        reprojected
    };

    align_raster(&aligned_source, target_raster, dst_raster, false)?;

    let report = validate_raster_alignment(dst_raster, target_raster)?;
    if !report.is_aligned() {
        warn!(
            "{}: not fully aligned to {}: {report:?}",
            dst_raster.display(),
            target_raster.display()
        );
    }

    if delete_source && dst_raster.exists() {
        fs::remove_file(source_raster)?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRaster;

    fn info(width: usize, height: usize, gt: [f64; 6], projection: &str) -> RasterInfo {
        RasterInfo {
            path: PathBuf::from("synthetic.tif"),
            width,
            height,
            bands: 1,
            geo_transform: gt,
            projection: projection.to_string(),
        }
    }

    #[test]
    fn shifted_origin_fails_only_geotransform() {
        let gt = [7.0, 0.01, 0.0, 47.0, 0.0, -0.01];
        let mut shifted = gt;
        shifted[0] += 0.01; // one pixel east
        let a = info(100, 100, gt, "WGS84");
        let b = info(100, 100, shifted, "WGS84");

        let report = AlignmentReport::compare(&a, &b);
        assert!(report.dimension_match);
        assert!(report.projection_match);
        assert!(report.pixel_count_match);
        assert!(!report.geotransform_match);
        assert!(!report.is_aligned());
    }

    #[test]
    fn transposed_dimensions_match_pixel_count_only() {
        let gt = [7.0, 0.01, 0.0, 47.0, 0.0, -0.01];
        let a = info(50, 20, gt, "WGS84");
        let b = info(20, 50, gt, "WGS84");

        let report = AlignmentReport::compare(&a, &b);
        assert!(!report.dimension_match);
        assert!(report.pixel_count_match);
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = info(100, 80, [7.0, 0.01, 0.0, 47.0, 0.0, -0.01], "WGS84");
        let b = info(100, 100, [7.0, 0.02, 0.0, 47.0, 0.0, -0.02], "ETRS89");
        assert_eq!(
            AlignmentReport::compare(&a, &b),
            AlignmentReport::compare(&b, &a)
        );
    }

    #[test]
    fn align_forces_target_grid() {
        // Source on a shifted, finer grid than the target.
        let source = TestRaster::new("source.tif", (120, 120), (6.995, 47.005), 0.005, 4326, 1);
        let target = TestRaster::new("target.tif", (50, 50), (7.0, 47.0), 0.01, 4326, 1);
        let dst = source.sibling("aligned.tif");

        align_raster(source.path(), target.path(), &dst, false).unwrap();
        let report = validate_raster_alignment(&dst, target.path()).unwrap();
        assert!(report.is_aligned(), "{report:?}");
    }

    #[test]
    fn align_is_idempotent_on_matching_grid() {
        let source = TestRaster::new("source.tif", (50, 50), (7.0, 47.0), 0.01, 4326, 1);
        let target = TestRaster::new("target.tif", (50, 50), (7.0, 47.0), 0.01, 4326, 1);
        let dst = source.sibling("aligned.tif");

        align_raster(source.path(), target.path(), &dst, false).unwrap();

        let before = RasterInfo::read(source.path()).unwrap();
        let after = RasterInfo::read(&dst).unwrap();
        assert_eq!(before.geo_transform, after.geo_transform);
        assert_eq!((before.width, before.height), (after.width, after.height));
    }

    #[test]
    fn align_validate_reprojects_across_crs() {
        let source = TestRaster::new("source.tif", (80, 80), (7.0, 47.0), 0.01, 4326, 1);
        // Target grid in web mercator over roughly the same area.
        let target = TestRaster::new(
            "target.tif",
            (50, 50),
            (779_236.0, 5_942_074.0),
            1_000.0,
            3857,
            1,
        );
        let dst = source.sibling("aligned.tif");

        let report = align_validate_raster(source.path(), target.path(), &dst, false).unwrap();
        assert!(report.projection_match, "{report:?}");
        assert!(report.is_aligned(), "{report:?}");
        // Intermediate reprojection files must not leak next to the inputs.
        assert!(source.path().exists());
    }

    #[test]
    fn align_validate_deletes_original_source() {
        let source = TestRaster::new("source.tif", (50, 50), (7.0, 47.0), 0.01, 4326, 1);
        let target = TestRaster::new("target.tif", (50, 50), (7.0, 47.0), 0.01, 4326, 1);
        let dst = source.sibling("aligned.tif");

        let report = align_validate_raster(source.path(), target.path(), &dst, true).unwrap();
        assert!(report.is_aligned());
        assert!(!source.path().exists());
        assert!(target.path().exists());
    }
}
