use std::ffi::{c_char, CString};
use std::path::Path;
use std::ptr::{null, null_mut};

use gdal::Dataset;
use gdal_sys::GDALWarpAppOptions;

use crate::errors::Result;
use crate::utils::{_last_null_pointer_err, _path_to_c_string};

/// Wraps a [GDALWarpAppOptions] object.
///
/// [GDALWarpAppOptions]: https://gdal.org/api/gdal_utils.html#_CPPv418GDALWarpAppOptions
#[derive(Debug)]
pub struct WarpOptions {
    c_options: *mut GDALWarpAppOptions,
}

impl WarpOptions {
    /// Parses a `gdalwarp`-style argument list.
    ///
    /// See [GDALWarpAppOptionsNew].
    ///
    /// [GDALWarpAppOptionsNew]: https://gdal.org/api/gdal_utils.html#_CPPv421GDALWarpAppOptionsNewPPcP29GDALWarpAppOptionsForBinary
    pub fn new<S: Into<Vec<u8>>, I: IntoIterator<Item = S>>(args: I) -> Result<Self> {
        // Convert args to CStrings to add terminating null bytes
        let cstr_args = args
            .into_iter()
            .map(CString::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // The C API does not modify the strings, it is just not const-correct.
        // Null-terminate the list.
        let mut c_args = cstr_args
            .iter()
            .map(|x| x.as_ptr() as *mut c_char)
            .chain(std::iter::once(null_mut()))
            .collect::<Vec<_>>();

        let c_options =
            unsafe { gdal_sys::GDALWarpAppOptionsNew(c_args.as_mut_ptr(), null_mut()) };
        if c_options.is_null() {
            return Err(_last_null_pointer_err("GDALWarpAppOptionsNew"));
        }
        Ok(Self { c_options })
    }
}

impl Drop for WarpOptions {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALWarpAppOptionsFree(self.c_options);
        }
    }
}

/// Warps a dataset into a new file, driven by `gdalwarp` arguments.
///
/// Wraps [GDALWarp].
///
/// [GDALWarp]: https://gdal.org/api/gdal_utils.html#_CPPv48GDALWarpPKc12GDALDatasetHiP12GDALDatasetHPK18GDALWarpAppOptionsPi
pub fn warp(src: &Dataset, dest: &Path, options: Option<WarpOptions>) -> Result<Dataset> {
    let c_dest = _path_to_c_string(dest)?;
    let c_options = options
        .as_ref()
        .map(|x| x.c_options as *const GDALWarpAppOptions)
        .unwrap_or(null());

    let dataset_out = unsafe {
        let mut src_handle = src.c_dataset();
        gdal_sys::GDALWarp(
            c_dest.as_ptr(),
            null_mut(),
            1,
            &mut src_handle,
            c_options,
            null_mut(),
        )
    };

    if dataset_out.is_null() {
        return Err(_last_null_pointer_err("GDALWarp"));
    }

    Ok(unsafe { Dataset::from_c_dataset(dataset_out) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRaster;

    #[test]
    fn warp_to_target_srs() {
        let raster = TestRaster::new("wgs84.tif", (60, 60), (7.0, 47.0), 0.01, 4326, 1);
        let dest = raster.sibling("utm.tif");

        let src = Dataset::open(raster.path()).unwrap();
        let options =
            WarpOptions::new(["-t_srs".to_string(), "EPSG:32632".to_string()]).unwrap();
        let out = warp(&src, &dest, Some(options)).unwrap();
        let srs = out.spatial_ref().unwrap();
        assert_eq!(srs.auth_code().unwrap(), 32632);
        drop(out);

        assert!(dest.exists());
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let err = WarpOptions::new(["-no-such-flag".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::RasterPrepError::NullPointer { .. }
        ));
    }
}
