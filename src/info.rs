//! Read-only raster metadata snapshots.

use std::path::{Path, PathBuf};

use gdal::{Dataset, GeoTransform};

use crate::bbox::BoundingBox;
use crate::errors::{RasterPrepError, Result};

/// Opens a raster for reading, mapping failures to [`RasterPrepError::MissingInput`].
pub(crate) fn open_raster(path: &Path) -> Result<Dataset> {
    Dataset::open(path).map_err(|source| RasterPrepError::MissingInput {
        path: path.to_path_buf(),
        source,
    })
}

/// The georeferencing metadata of a raster file, captured at open time.
///
/// Holding an info value does not keep the underlying dataset open; the handle
/// is released before `read` returns, so the same path can immediately be
/// reopened or rewritten by a subsequent operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub geo_transform: GeoTransform,
    /// Projection as WKT, as reported by the dataset.
    pub projection: String,
}

impl RasterInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let dataset = open_raster(path)?;
        let (width, height) = dataset.raster_size();
        Ok(RasterInfo {
            path: path.to_path_buf(),
            width,
            height,
            bands: dataset.raster_count(),
            geo_transform: dataset.geo_transform()?,
            projection: dataset.projection(),
        })
    }

    pub(crate) fn of_dataset(path: &Path, dataset: &Dataset) -> Result<Self> {
        let (width, height) = dataset.raster_size();
        Ok(RasterInfo {
            path: path.to_path_buf(),
            width,
            height,
            bands: dataset.raster_count(),
            geo_transform: dataset.geo_transform()?,
            projection: dataset.projection(),
        })
    }

    /// Absolute pixel sizes `(x_res, y_res)`.
    pub fn resolution(&self) -> (f64, f64) {
        (self.geo_transform[1].abs(), self.geo_transform[5].abs())
    }

    /// Spatial extent implied by the geotransform and pixel dimensions.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_geo_transform(&self.geo_transform, (self.width, self.height))
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}
