use std::ffi::{c_char, CString};
use std::path::Path;
use std::ptr::{null, null_mut};

use gdal::Dataset;
use gdal_sys::GDALTranslateOptions;

use crate::errors::Result;
use crate::utils::{_last_null_pointer_err, _path_to_c_string};

/// Wraps a [GDALTranslateOptions] object.
///
/// [GDALTranslateOptions]: https://gdal.org/api/gdal_utils.html#_CPPv420GDALTranslateOptions
#[derive(Debug)]
pub struct TranslateOptions {
    c_options: *mut GDALTranslateOptions,
}

impl TranslateOptions {
    /// Parses a `gdal_translate`-style argument list.
    ///
    /// See [GDALTranslateOptionsNew].
    ///
    /// [GDALTranslateOptionsNew]: https://gdal.org/api/gdal_utils.html#_CPPv423GDALTranslateOptionsNewPPcP31GDALTranslateOptionsForBinary
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
            unsafe { gdal_sys::GDALTranslateOptionsNew(c_args.as_mut_ptr(), null_mut()) };
        if c_options.is_null() {
            return Err(_last_null_pointer_err("GDALTranslateOptionsNew"));
        }
        Ok(Self { c_options })
    }
}

impl Drop for TranslateOptions {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALTranslateOptionsFree(self.c_options);
        }
    }
}

/// Converts a dataset into a new file, driven by `gdal_translate` arguments.
///
/// With no options the source is copied as-is to a GeoTIFF. Wraps
/// [GDALTranslate].
///
/// [GDALTranslate]: https://gdal.org/api/gdal_utils.html#_CPPv413GDALTranslatePKc12GDALDatasetHPK20GDALTranslateOptionsPi
pub fn translate(src: &Dataset, dest: &Path, options: Option<TranslateOptions>) -> Result<Dataset> {
    let c_dest = _path_to_c_string(dest)?;
    let c_options = options
        .as_ref()
        .map(|x| x.c_options as *const GDALTranslateOptions)
        .unwrap_or(null());

    let dataset_out = unsafe {
        gdal_sys::GDALTranslate(c_dest.as_ptr(), src.c_dataset(), c_options, null_mut())
    };

    if dataset_out.is_null() {
        return Err(_last_null_pointer_err("GDALTranslate"));
    }

    Ok(unsafe { Dataset::from_c_dataset(dataset_out) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRaster;

    #[test]
    fn translate_with_projwin_crops() {
        let raster = TestRaster::new("full.tif", (100, 100), (7.0, 47.0), 0.01, 4326, 1);
        let dest = raster.sibling("cropped.tif");

        let src = Dataset::open(raster.path()).unwrap();
        let options = TranslateOptions::new(
            "-projWin 7.0 47.0 7.5 46.5".split_whitespace().map(String::from),
        )
        .unwrap();
        let out = translate(&src, &dest, Some(options)).unwrap();
        assert_eq!(out.raster_size(), (50, 50));
        drop(out);

        assert!(dest.exists());
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let err = TranslateOptions::new(["-no-such-flag".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::RasterPrepError::NullPointer { .. }
        ));
    }
}
