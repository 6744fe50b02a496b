use std::cell::RefCell;
use std::ffi::CString;

use mm_kernels::MatmulError;

use crate::types::MMStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `mm_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Record `err` as the last error and map it to a status code.
pub fn report(err: MatmulError) -> MMStatus {
    let status = match &err {
        MatmulError::ShapeMismatch { .. } => MMStatus::ErrorShapeMismatch,
        MatmulError::InvalidDimensions { .. } | MatmulError::InvalidConfig(_) => {
            MMStatus::ErrorInvalidArgument
        }
        MatmulError::Precondition(_) => MMStatus::ErrorPrecondition,
        MatmulError::UnknownStrategy(_) => MMStatus::ErrorUnknownStrategy,
        MatmulError::AcceleratorUnavailable(_) => MMStatus::ErrorUnavailable,
        MatmulError::ThreadPool(_) | MatmulError::Device(_) => MMStatus::ErrorInternal,
    };
    set_last_error(err.to_string());
    status
}
