//! Pixel-level transforms on single-band rasters: land masking, min-max
//! rescaling and nodata filling.
//!
//! These read the first band into a whole-raster buffer, transform it and
//! write a fresh Float32 GeoTIFF, which suits the modest tile sizes the
//! alignment workflow produces. Like the grid operations, each verifies its
//! destination and gates source deletion on the post-condition.

use std::fs;
use std::path::Path;

use gdal::raster::Buffer;
use gdal::DriverManager;
use log::{debug, warn};

use crate::errors::{RasterPrepError, Result};
use crate::info::{open_raster, RasterInfo};

/// First band of a raster as a flat buffer, with its metadata and declared
/// nodata value.
fn read_band(path: &Path) -> Result<(RasterInfo, Vec<f32>, Option<f64>)> {
    let dataset = open_raster(path)?;
    let info = RasterInfo::of_dataset(path, &dataset)?;
    let band = dataset.rasterband(1)?;
    let no_data = band.no_data_value();
    let buffer = band.read_as::<f32>(
        (0, 0),
        (info.width, info.height),
        (info.width, info.height),
        None,
    )?;
    Ok((info, buffer.data().to_vec(), no_data))
}

/// Writes `values` as a single-band Float32 GeoTIFF on the grid of `info`.
fn write_band(
    dst_raster: &Path,
    info: &RasterInfo,
    values: Vec<f32>,
    no_data: Option<f64>,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut out =
        driver.create_with_band_type::<f32, _>(dst_raster, info.width, info.height, 1)?;
    out.set_projection(&info.projection)?;
    out.set_geo_transform(&info.geo_transform)?;
    let mut band = out.rasterband(1)?;
    if no_data.is_some() {
        band.set_no_data_value(no_data)?;
    }
    let mut buffer = Buffer::new((info.width, info.height), values);
    band.write((0, 0), (info.width, info.height), &mut buffer)?;
    drop(band);
    out.flush_cache()?;
    Ok(())
}

fn is_no_data(value: f32, no_data: Option<f64>) -> bool {
    match no_data {
        Some(nd) if nd.is_nan() => value.is_nan(),
        Some(nd) => value == nd as f32,
        None => false,
    }
}

/// Outcome of an [`apply_land_mask`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskReport {
    /// Pixels zeroed because the mask did not flag them as land.
    pub masked: usize,
    pub total: usize,
}

/// Zeroes every pixel of `data_raster` that `mask_raster` does not flag as
/// land (mask value `1`), writing the result at `dst_raster`.
///
/// Both inputs are read as single-band; they must share pixel dimensions. The
/// output takes its georeferencing from the mask. `delete_source` removes the
/// data raster once the destination exists, never the mask, which is usually
/// reused across a batch.
pub fn apply_land_mask(
    mask_raster: &Path,
    data_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<MaskReport> {
    debug!(
        "masking {} with {} -> {}",
        data_raster.display(),
        mask_raster.display(),
        dst_raster.display()
    );

    let (mask_info, mask, _) = read_band(mask_raster)?;
    let (data_info, data, _) = read_band(data_raster)?;

    if (mask_info.width, mask_info.height) != (data_info.width, data_info.height) {
        return Err(RasterPrepError::IncompatibleInputs {
            reason: format!(
                "mask and data dimensions differ: {}x{} vs {}x{}",
                mask_info.width, mask_info.height, data_info.width, data_info.height
            ),
        });
    }

    let mut masked = 0usize;
    let values = mask
        .iter()
        .zip(&data)
        .map(|(&flag, &value)| {
            if flag == 1.0 {
                value
            } else {
                masked += 1;
                0.0
            }
        })
        .collect();
    let total = data.len();

    write_band(dst_raster, &mask_info, values, None)?;
    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    if delete_source {
        fs::remove_file(data_raster)?;
    }
    Ok(MaskReport { masked, total })
}

/// Outcome of a [`rescale_raster_to_zero_one`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleReport {
    /// Lowest valid input value.
    pub min: f64,
    /// Highest valid input value.
    pub max: f64,
}

impl RescaleReport {
    /// A zero-variance or all-nodata input cannot be rescaled; its values
    /// pass through unchanged.
    pub fn is_degenerate(&self) -> bool {
        !(self.min < self.max)
    }
}

/// Min-max rescales the valid pixels of `src_raster` onto `[0, 1]`, writing
/// a Float32 GeoTIFF at `dst_raster`.
///
/// Declared nodata pixels are excluded from the range and carried through
/// untouched, nodata marker included. A degenerate input is reported, not
/// raised, written unchanged, and blocks source deletion.
pub fn rescale_raster_to_zero_one(
    src_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<RescaleReport> {
    debug!(
        "rescaling {} -> {} to [0, 1]",
        src_raster.display(),
        dst_raster.display()
    );

    let (info, data, no_data) = read_band(src_raster)?;

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &value in &data {
        if !is_no_data(value, no_data) {
            min = min.min(value);
            max = max.max(value);
        }
    }
    let report = RescaleReport {
        min: min as f64,
        max: max as f64,
    };

    let values = if report.is_degenerate() {
        warn!(
            "{}: no value range to rescale, values pass through unchanged",
            src_raster.display()
        );
        data
    } else {
        let span = max - min;
        data.iter()
            .map(|&value| {
                if is_no_data(value, no_data) {
                    value
                } else {
                    (value - min) / span
                }
            })
            .collect()
    };

    write_band(dst_raster, &info, values, no_data)?;
    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    if !report.is_degenerate() && delete_source {
        fs::remove_file(src_raster)?;
    }
    Ok(report)
}

/// Outcome of a [`replace_nodata_with_lowest`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodataFillReport {
    /// The value filled in, `None` when the input declares no nodata value or
    /// holds no valid pixel.
    pub fill_value: Option<f64>,
    /// Number of pixels replaced.
    pub replaced: usize,
}

/// Replaces every nodata pixel of `src_raster` with the lowest valid value
/// and drops the nodata marker from the output's metadata.
///
/// An input with no declared nodata value passes through unchanged. Filled
/// pixels are indistinguishable from original low values downstream; callers
/// that need the distinction should mask before filling.
pub fn replace_nodata_with_lowest(
    src_raster: &Path,
    dst_raster: &Path,
    delete_source: bool,
) -> Result<NodataFillReport> {
    debug!(
        "filling nodata of {} -> {}",
        src_raster.display(),
        dst_raster.display()
    );

    let (info, mut data, no_data) = read_band(src_raster)?;

    let lowest = data
        .iter()
        .filter(|&&value| !is_no_data(value, no_data))
        .fold(f32::INFINITY, |acc, &value| acc.min(value));
    let fillable = no_data.is_some() && lowest.is_finite();

    let mut replaced = 0usize;
    if fillable {
        for value in &mut data {
            if is_no_data(*value, no_data) {
                *value = lowest;
                replaced += 1;
            }
        }
    } else if no_data.is_some() {
        warn!(
            "{}: every pixel is nodata, nothing to fill",
            src_raster.display()
        );
    }

    write_band(dst_raster, &info, data, None)?;
    if !dst_raster.exists() {
        return Err(RasterPrepError::WriteFailed {
            path: dst_raster.to_path_buf(),
        });
    }

    if delete_source {
        fs::remove_file(src_raster)?;
    }
    Ok(NodataFillReport {
        fill_value: fillable.then_some(lowest as f64),
        replaced,
    })
}
