use std::path::{Path, PathBuf};

use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use tempfile::TempDir;

/// A small GeoTIFF in its own temporary directory, cleaned up on drop.
///
/// Band `n` is filled with the constant value `n * 10` so copies and merges
/// can be traced back to their source band.
pub(crate) struct TestRaster {
    dir: TempDir,
    path: PathBuf,
}

impl TestRaster {
    pub(crate) fn new(
        name: &str,
        size: (usize, usize),
        nw_corner: (f64, f64),
        pixel_size: f64,
        epsg: u32,
        bands: usize,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);

        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<u8, _>(&path, size.0, size.1, bands)
            .unwrap();
        dataset
            .set_geo_transform(&[
                nw_corner.0,
                pixel_size,
                0.0,
                nw_corner.1,
                0.0,
                -pixel_size,
            ])
            .unwrap();
        dataset
            .set_spatial_ref(&SpatialRef::from_epsg(epsg).unwrap())
            .unwrap();
        for band in 1..=bands {
            dataset
                .rasterband(band)
                .unwrap()
                .fill(band as f64 * 10.0, None)
                .unwrap();
        }
        dataset.flush_cache().unwrap();
        drop(dataset);

        TestRaster { dir, path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Path for an output file next to this raster, in the same temp dir.
    pub(crate) fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
