//! Repeatable standardization pipelines: build a master grid, stage sources,
//! and align whole batches against it.
//!
//! A batch continues past individual failures: the target audience runs
//! hundred-raster pipelines where one bad input should not stop the rest, so
//! per-raster outcomes are logged and returned instead of aborting.

use std::path::{Path, PathBuf};

use gdal::errors::GdalError;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, GeoTransform};
use log::{info, warn};

use crate::align::{align_validate_raster, AlignmentReport};
use crate::bbox::BoundingBox;
use crate::errors::{RasterPrepError, Result};
use crate::info::RasterInfo;
use crate::programs::{translate, TranslateOptions};

/// Geotransform GDAL reports for a dataset with no georeferencing at all.
const DEFAULT_GEO_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Probes whether `source` opens as a georeferenced raster.
///
/// `source` may be a local path or any GDAL-readable URL (e.g. `/vsicurl/`).
/// A source that opens but carries no projection or no geotransform is
/// rejected the same way as an unreadable one.
pub fn check_raster_source(source: &str) -> Result<()> {
    let invalid = |reason: &str| RasterPrepError::MissingInput {
        path: PathBuf::from(source),
        source: GdalError::BadArgument(reason.to_string()),
    };

    let dataset = Dataset::open(Path::new(source)).map_err(|e| RasterPrepError::MissingInput {
        path: PathBuf::from(source),
        source: e,
    })?;
    if dataset.projection().is_empty() {
        return Err(invalid("raster has no projection"));
    }
    let gt = dataset
        .geo_transform()
        .map_err(|_| invalid("raster has no geotransform"))?;
    if gt == DEFAULT_GEO_TRANSFORM {
        return Err(invalid("raster has a default geotransform"));
    }
    Ok(())
}

/// Copies a GDAL-readable source to a local GeoTIFF, optionally cropping it
/// to `bbox` on the way.
///
/// Remote protocols stay inside GDAL's virtual filesystem; this crate never
/// speaks HTTP itself.
pub fn stage_raster(source: &str, dst_raster: &Path, bbox: Option<&BoundingBox>) -> Result<()> {
    check_raster_source(source)?;
    let src = Dataset::open(Path::new(source)).map_err(|e| RasterPrepError::MissingInput {
        path: PathBuf::from(source),
        source: e,
    })?;

    let options = match bbox {
        Some(bbox) => {
            let (ulx, uly, lrx, lry) = bbox.to_projwin();
            Some(TranslateOptions::new([
                "-projWin".to_string(),
                format!("{ulx}"),
                format!("{uly}"),
                format!("{lrx}"),
                format!("{lry}"),
            ])?)
        }
        None => None,
    };
    drop(translate(&src, dst_raster, options)?);
    drop(src);

    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }
    Ok(())
}

/// Creates a blank single-band UInt16 raster covering `bbox` at `pixel_size`,
/// to serve as the master grid of an alignment batch.
///
/// `proj` accepts any GDAL SRS definition; `pixel_size` is in the units of
/// that projection. Returns the metadata of the written raster.
pub fn set_up_blank(
    bbox: &BoundingBox,
    proj: &str,
    pixel_size: f64,
    no_data: Option<f64>,
    dst_raster: &Path,
) -> Result<RasterInfo> {
    // Rounded, not truncated: extents like 0.5 degrees at 0.01 degree pixels
    // land a hair under an integral pixel count in binary floating point.
    let x_size = (bbox.width() / pixel_size).round() as usize;
    let y_size = (bbox.height() / pixel_size).round() as usize;

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut blank = driver.create_with_band_type::<u16, _>(dst_raster, x_size, y_size, 1)?;
    blank.set_geo_transform(&[bbox.west, pixel_size, 0.0, bbox.north, 0.0, -pixel_size])?;
    blank.set_spatial_ref(&SpatialRef::from_definition(proj)?)?;
    if no_data.is_some() {
        let mut band = blank.rasterband(1)?;
        band.set_no_data_value(no_data)?;
    }
    blank.flush_cache()?;
    drop(blank);

    RasterInfo::read(dst_raster)
}

/// Target grid of a standardization batch.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub bbox: BoundingBox,
    /// Any GDAL SRS definition, e.g. `"EPSG:21781"`.
    pub projection: String,
    /// Pixel edge length in projection units.
    pub pixel_size: f64,
}

/// Per-raster outcome of [`align_rasters_to_grid`].
#[derive(Debug)]
pub struct BatchEntry {
    pub source: String,
    pub dest: PathBuf,
    pub outcome: Result<AlignmentReport>,
}

/// Stages, reprojects, aligns and validates each source against a freshly
/// created blank master grid.
///
/// The blank is written to `dst_blank`; aligned outputs land at the matching
/// index of `dests`. Failures of individual rasters are logged and recorded in
/// the returned batch log without aborting the remainder.
pub fn align_rasters_to_grid(
    grid: &GridSpec,
    dst_blank: &Path,
    sources: &[String],
    dests: &[PathBuf],
) -> Result<Vec<BatchEntry>> {
    if sources.len() != dests.len() {
        return Err(RasterPrepError::IncompatibleInputs {
            reason: format!(
                "{} sources but {} destinations",
                sources.len(),
                dests.len()
            ),
        });
    }

    set_up_blank(&grid.bbox, &grid.projection, grid.pixel_size, None, dst_blank)?;

    let staging = tempfile::tempdir()?;
    let mut log = Vec::with_capacity(sources.len());
    for (i, (source, dest)) in sources.iter().zip(dests).enumerate() {
        let outcome = align_one(source, staging.path(), i, dst_blank, dest);
        match &outcome {
            Ok(report) if report.is_aligned() => {
                info!("aligned {} -> {}", source, dest.display());
            }
            Ok(report) => {
                warn!("partial alignment for {}: {report:?}", dest.display());
            }
            Err(e) => {
                warn!("skipping {source}: {e}");
            }
        }
        log.push(BatchEntry {
            source: source.clone(),
            dest: dest.clone(),
            outcome,
        });
    }
    Ok(log)
}

fn align_one(
    source: &str,
    staging: &Path,
    index: usize,
    blank: &Path,
    dest: &Path,
) -> Result<AlignmentReport> {
    let raw = staging.join(format!("raw_{index}.tif"));
    stage_raster(source, &raw, None)?;
    // The staged copy is an intermediate; deleting it on success keeps the
    // staging area small for large batches.
    align_validate_raster(&raw, blank, dest, true)
}
