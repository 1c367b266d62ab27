//! Combining compatible rasters: band stacking and spatial mosaicking.

use std::fs;
use std::path::Path;

use gdal::programs::raster::build_vrt;
use gdal::DriverManager;
use log::{debug, warn};

use crate::errors::{RasterPrepError, Result};
use crate::info::{open_raster, RasterInfo};
use crate::programs::translate;

/// Outcome of a [`merge_rasters`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Sum of the band counts of the two inputs.
    pub source_bands: usize,
    /// Band count of the written destination.
    pub dst_bands: usize,
}

impl MergeReport {
    pub fn bands_match(&self) -> bool {
        self.source_bands == self.dst_bands
    }
}

/// Stacks the bands of two grid-identical rasters into one multi-band
/// Float32 GeoTIFF.
///
/// The inputs must share projection and pixel dimensions; that precondition is
/// validated up front and violated inputs are rejected instead of silently
/// producing a corrupt stack. The destination band count is compared against
/// the sum of the input band counts; a mismatch is reported, not corrected,
/// and blocks source deletion.
pub fn merge_rasters(
    raster_1: &Path,
    raster_2: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<MergeReport> {
    debug!(
        "merging bands of {} and {} -> {}",
        raster_1.display(),
        raster_2.display(),
        dst_raster.display()
    );

    let src_1 = open_raster(raster_1)?;
    let src_2 = open_raster(raster_2)?;
    let info_1 = RasterInfo::of_dataset(raster_1, &src_1)?;
    let info_2 = RasterInfo::of_dataset(raster_2, &src_2)?;

    if (info_1.width, info_1.height) != (info_2.width, info_2.height) {
        return Err(RasterPrepError::IncompatibleInputs {
            reason: format!(
                "merge requires identical dimensions: {}x{} vs {}x{}",
                info_1.width, info_1.height, info_2.width, info_2.height
            ),
        });
    }
    if info_1.projection != info_2.projection {
        return Err(RasterPrepError::IncompatibleInputs {
            reason: "merge requires identical projections".to_string(),
        });
    }

    let source_bands = info_1.bands + info_2.bands;
    let (width, height) = (info_1.width, info_1.height);

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut merged =
        driver.create_with_band_type::<f32, _>(dst_raster, width, height, source_bands)?;
    merged.set_projection(&info_1.projection)?;
    merged.set_geo_transform(&info_1.geo_transform)?;

    let mut dst_index = 1;
    for (src, bands) in [(&src_1, info_1.bands), (&src_2, info_2.bands)] {
        for src_index in 1..=bands {
            let mut buffer =
                src.rasterband(src_index)?
                    .read_as::<f32>((0, 0), (width, height), (width, height), None)?;
            let mut dst_band = merged.rasterband(dst_index)?;
            dst_band.write((0, 0), (width, height), &mut buffer)?;
            dst_index += 1;
        }
    }
    merged.flush_cache()?;
    drop(merged);
    drop(src_1);
    drop(src_2);

    let dst_bands = RasterInfo::read(dst_raster)?.bands;
    let report = MergeReport {
        source_bands,
        dst_bands,
    };

    if !report.bands_match() {
        warn!(
            "{}: has {} bands, sources have {} in total",
            dst_raster.display(),
            report.dst_bands,
            report.source_bands
        );
    } else if delete_source {
        fs::remove_file(raster_1)?;
        fs::remove_file(raster_2)?;
    }
    Ok(report)
}

/// Spatially unions two rasters of identical projection and band structure
/// into one GeoTIFF covering both extents.
///
/// Built through an in-memory VRT mosaic that is materialized with a plain
/// translate, mirroring how `gdalbuildvrt` pipelines do it. The band count of
/// the output equals that of the inputs, and the output's bounds must cover
/// both inputs or the call fails before any source deletion.
pub fn mosaic_rasters(
    raster_1: &Path,
    raster_2: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<()> {
    debug!(
        "mosaicking {} and {} -> {}",
        raster_1.display(),
        raster_2.display(),
        dst_raster.display()
    );

    let src_1 = open_raster(raster_1)?;
    let src_2 = open_raster(raster_2)?;

    if src_1.projection() != src_2.projection() {
        return Err(RasterPrepError::IncompatibleInputs {
            reason: "mosaic requires identical projections".to_string(),
        });
    }
    if src_1.raster_count() != src_2.raster_count() {
        return Err(RasterPrepError::IncompatibleInputs {
            reason: format!(
                "mosaic requires identical band counts: {} vs {}",
                src_1.raster_count(),
                src_2.raster_count()
            ),
        });
    }

    let expected = RasterInfo::of_dataset(raster_1, &src_1)?
        .bounds()
        .union(&RasterInfo::of_dataset(raster_2, &src_2)?.bounds());

    // The VRT holds references into the source datasets; they must stay open
    // until the mosaic has been materialized.
    let sources = [src_1, src_2];
    let mosaic = build_vrt(None, &sources, None)?;
    drop(translate(&mosaic, dst_raster, None)?);
    drop(mosaic);
    drop(sources);

    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    let written = RasterInfo::read(dst_raster)?.bounds();
    if !written.contains(&expected) {
        return Err(RasterPrepError::ToleranceExceeded {
            detail: format!("mosaic bounds {written:?} do not cover both inputs {expected:?}"),
        });
    }

    if delete_source {
        fs::remove_file(raster_1)?;
        fs::remove_file(raster_2)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRaster;
    use gdal::Dataset;

    #[test]
    fn merge_band_count_law() {
        let a = TestRaster::new("a.tif", (40, 40), (7.0, 47.0), 0.01, 4326, 2);
        let b = TestRaster::new("b.tif", (40, 40), (7.0, 47.0), 0.01, 4326, 3);
        let dst = a.sibling("merged.tif");

        let report = merge_rasters(a.path(), b.path(), &dst, false).unwrap();
        assert!(report.bands_match());
        assert_eq!(report.dst_bands, 5);

        let merged = RasterInfo::read(&dst).unwrap();
        assert_eq!(merged.bands, 5);
        assert_eq!(merged.geo_transform, RasterInfo::read(a.path()).unwrap().geo_transform);
    }

    #[test]
    fn merge_preserves_band_values() {
        // TestRaster fills band N with N * 10.
        let a = TestRaster::new("a.tif", (10, 10), (7.0, 47.0), 0.01, 4326, 1);
        let b = TestRaster::new("b.tif", (10, 10), (7.0, 47.0), 0.01, 4326, 2);
        let dst = a.sibling("merged.tif");

        merge_rasters(a.path(), b.path(), &dst, false).unwrap();

        let merged = Dataset::open(&dst).unwrap();
        let first = merged.rasterband(1).unwrap();
        let buf = first.read_as::<f32>((0, 0), (1, 1), (1, 1), None).unwrap();
        assert_eq!(buf.data()[0], 10.0);
        let third = merged.rasterband(3).unwrap();
        let buf = third.read_as::<f32>((0, 0), (1, 1), (1, 1), None).unwrap();
        assert_eq!(buf.data()[0], 20.0);
    }

    #[test]
    fn merge_rejects_mismatched_dimensions() {
        let a = TestRaster::new("a.tif", (40, 40), (7.0, 47.0), 0.01, 4326, 1);
        let b = TestRaster::new("b.tif", (30, 40), (7.0, 47.0), 0.01, 4326, 1);
        let dst = a.sibling("merged.tif");

        let err = merge_rasters(a.path(), b.path(), &dst, false).unwrap_err();
        assert!(matches!(err, RasterPrepError::IncompatibleInputs { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn mosaic_extent_is_union_of_inputs() {
        // Two horizontally adjacent tiles.
        let west = TestRaster::new("west.tif", (50, 50), (7.0, 47.0), 0.01, 4326, 1);
        let east = TestRaster::new("east.tif", (50, 50), (7.5, 47.0), 0.01, 4326, 1);
        let dst = west.sibling("whole.tif");

        mosaic_rasters(west.path(), east.path(), &dst, false).unwrap();

        let expected = RasterInfo::read(west.path())
            .unwrap()
            .bounds()
            .union(&RasterInfo::read(east.path()).unwrap().bounds());
        let mosaic = RasterInfo::read(&dst).unwrap();
        assert_eq!(mosaic.bounds(), expected);
        assert!(mosaic.bounds().contains(&expected));
        assert_eq!(mosaic.bands, 1);
        assert_eq!((mosaic.width, mosaic.height), (100, 50));
    }

    #[test]
    fn mosaic_rejects_mismatched_band_counts() {
        let a = TestRaster::new("a.tif", (20, 20), (7.0, 47.0), 0.01, 4326, 1);
        let b = TestRaster::new("b.tif", (20, 20), (7.2, 47.0), 0.01, 4326, 2);
        let dst = a.sibling("whole.tif");

        let err = mosaic_rasters(a.path(), b.path(), &dst, false).unwrap_err();
        assert!(matches!(err, RasterPrepError::IncompatibleInputs { .. }));
    }

    #[test]
    fn mosaic_deletes_sources_once_written() {
        let a = TestRaster::new("a.tif", (20, 20), (7.0, 47.0), 0.01, 4326, 1);
        let b = TestRaster::new("b.tif", (20, 20), (7.2, 47.0), 0.01, 4326, 1);
        let dst = a.sibling("whole.tif");

        mosaic_rasters(a.path(), b.path(), &dst, true).unwrap();
        assert!(dst.exists());
        assert!(!a.path().exists());
        assert!(!b.path().exists());
    }
}
