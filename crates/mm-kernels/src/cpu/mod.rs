//! CPU-resident strategies.
//!
//! Each submodule exposes a slice-level kernel function and a strategy type
//! implementing [`crate::MatMul`] on top of it.

pub mod blocked;
pub mod cache_friendly;
pub mod multithreaded;
pub mod naive;
pub mod simd;
pub mod strassen;

pub use blocked::BlockedStrategy;
pub use cache_friendly::CacheFriendlyStrategy;
pub use multithreaded::MultithreadedStrategy;
pub use naive::NaiveStrategy;
pub use simd::SimdStrategy;
pub use strassen::StrassenStrategy;
