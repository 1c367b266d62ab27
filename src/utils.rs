use std::ffi::{c_char, CStr, CString};
use std::path::Path;

use crate::errors::{RasterPrepError, Result};

pub(crate) fn _string(raw_ptr: *const c_char) -> String {
    let c_str = unsafe { CStr::from_ptr(raw_ptr) };
    c_str.to_string_lossy().into_owned()
}

pub(crate) fn _last_null_pointer_err(method_name: &'static str) -> RasterPrepError {
    let last_err_msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    RasterPrepError::NullPointer {
        method_name,
        msg: last_err_msg,
    }
}

pub(crate) fn _path_to_c_string<P: AsRef<Path>>(path: P) -> Result<CString> {
    let path_str = path.as_ref().to_string_lossy();
    CString::new(path_str.as_ref()).map_err(Into::into)
}
