mod error;
mod handle;
mod types;

pub use error::*;
pub use handle::*;
pub use types::*;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use mm_kernels::{KernelConfig, Matrix, OutputMode, Registry};

/// Execute a closure that returns an `MMStatus`, catching any panics
/// and converting them into `MMStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> MMStatus>(f: F) -> MMStatus {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            MMStatus::ErrorInternal
        }
    }
}

unsafe fn create_with(
    name: *const c_char,
    config: KernelConfig,
    out: *mut *mut MMStrategy,
) -> MMStatus {
    if name.is_null() || out.is_null() {
        set_last_error("null argument".to_string());
        return MMStatus::ErrorInvalidArgument;
    }
    let name = match unsafe { CStr::from_ptr(name) }.to_str() {
        Ok(s) => s,
        Err(e) => {
            set_last_error(format!("invalid strategy name: {}", e));
            return MMStatus::ErrorInvalidArgument;
        }
    };
    let registry = match Registry::new(config) {
        Ok(r) => r,
        Err(e) => return report(e),
    };
    match registry.try_create(name) {
        Ok(strategy) => {
            log::debug!("ffi: created handle for {}", strategy.name());
            let handle = Box::new(MMStrategy::new(strategy));
            unsafe { *out = Box::into_raw(handle) };
            MMStatus::Ok
        }
        Err(e) => report(e),
    }
}

/// Create a strategy by name using the default configuration, overlaid
/// with `MM_TILE_SIZE`, `MM_STRASSEN_THRESHOLD` and `MM_NUM_THREADS`.
///
/// On success, writes a heap-allocated handle into `*out`. The caller owns
/// it and must release it with `mm_strategy_destroy`.
#[no_mangle]
pub unsafe extern "C" fn mm_strategy_create(
    name: *const c_char,
    out: *mut *mut MMStrategy,
) -> MMStatus {
    catch_panic(|| {
        let config = match KernelConfig::from_env() {
            Ok(c) => c,
            Err(e) => return report(e),
        };
        unsafe { create_with(name, config, out) }
    })
}

/// Create a strategy by name with explicit tuning parameters.
#[no_mangle]
pub unsafe extern "C" fn mm_strategy_create_with_config(
    name: *const c_char,
    config: MMKernelConfig,
    out: *mut *mut MMStrategy,
) -> MMStatus {
    catch_panic(|| unsafe { create_with(name, config.into(), out) })
}

/// Destroy a handle previously created by `mm_strategy_create*`.
///
/// Passing a null pointer is a no-op and returns `MMStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn mm_strategy_destroy(handle: *mut MMStrategy) -> MMStatus {
    if handle.is_null() {
        return MMStatus::Ok;
    }
    drop(Box::from_raw(handle));
    MMStatus::Ok
}

/// Registry name of the strategy behind `handle`.
///
/// The returned string is owned by the handle and valid until it is
/// destroyed. Returns null for a null handle.
#[no_mangle]
pub unsafe extern "C" fn mm_strategy_name(handle: *const MMStrategy) -> *const c_char {
    if handle.is_null() {
        return std::ptr::null();
    }
    unsafe { (*handle).name.as_ptr() }
}

/// Multiply row-major `a` (m x k) by `b` (k x n) into `c` (m x n).
///
/// With `accumulate` false, `c` is overwritten; otherwise the product is
/// added to its current contents. On any error `c` is left unchanged.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn mm_multiply(
    handle: *const MMStrategy,
    a: *const f32,
    b: *const f32,
    c: *mut f32,
    m: usize,
    k: usize,
    n: usize,
    accumulate: bool,
) -> MMStatus {
    catch_panic(|| {
        if handle.is_null() || a.is_null() || b.is_null() || c.is_null() {
            set_last_error("null argument".to_string());
            return MMStatus::ErrorInvalidArgument;
        }
        let (len_a, len_b, len_c) = match (m.checked_mul(k), k.checked_mul(n), m.checked_mul(n)) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => {
                set_last_error(format!("dimensions overflow: m={} k={} n={}", m, k, n));
                return MMStatus::ErrorInvalidArgument;
            }
        };
        let handle = unsafe { &*handle };

        let a_data = unsafe { std::slice::from_raw_parts(a, len_a) }.to_vec();
        let b_data = unsafe { std::slice::from_raw_parts(b, len_b) }.to_vec();
        let c_out = unsafe { std::slice::from_raw_parts_mut(c, len_c) };

        let built = (
            Matrix::from_vec(m, k, a_data),
            Matrix::from_vec(k, n, b_data),
            Matrix::from_vec(m, n, c_out.to_vec()),
        );
        let (a_mat, b_mat, mut c_mat) = match built {
            (Ok(x), Ok(y), Ok(z)) => (x, y, z),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return report(e),
        };

        let mode = if accumulate {
            OutputMode::Accumulate
        } else {
            OutputMode::Overwrite
        };
        match handle.strategy.multiply_with(&a_mat, &b_mat, &mut c_mat, mode) {
            Ok(()) => {
                c_out.copy_from_slice(c_mat.as_slice());
                MMStatus::Ok
            }
            Err(e) => report(e),
        }
    })
}

/// Retrieve the last error message recorded on this thread.
///
/// Returns null if there is none. The caller must free a non-null result
/// with `mm_free_string`.
#[no_mangle]
pub extern "C" fn mm_last_error() -> *mut c_char {
    match take_last_error() {
        Some(msg) => msg.into_raw(),
        None => std::ptr::null_mut(),
    }
}

/// Free a string returned by this library.
#[no_mangle]
pub unsafe extern "C" fn mm_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
