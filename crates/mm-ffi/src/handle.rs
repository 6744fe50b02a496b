use std::ffi::CString;

use mm_kernels::MatMul;

/// Opaque handle owning one strategy instance.
///
/// Created by `mm_strategy_create*`, released by `mm_strategy_destroy`.
pub struct MMStrategy {
    pub strategy: Box<dyn MatMul>,
    pub name: CString,
}

impl MMStrategy {
    pub fn new(strategy: Box<dyn MatMul>) -> Self {
        // Registry names are plain ASCII identifiers.
        let name = CString::new(strategy.name()).unwrap_or_default();
        Self { strategy, name }
    }
}
