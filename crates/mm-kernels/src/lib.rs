//! `mm-kernels` - interchangeable f32 matrix multiplication strategies.
//!
//! This crate provides:
//! - A row-major `Matrix` value type
//! - A `MatMul` trait every strategy implements, with explicit
//!   overwrite/accumulate output modes
//! - Six CPU strategies: naive, blocked, cache-friendly, SIMD,
//!   multithreaded and Strassen
//! - Accelerator strategies that wrap externally supplied device kernels
//! - A `Registry` that builds any of the above by name
//!
//! ```
//! use mm_kernels::{Matrix, Registry};
//!
//! let a = Matrix::identity(4);
//! let b = Matrix::from_vec(4, 4, (0..16).map(|v| v as f32).collect()).unwrap();
//! let mut c = Matrix::new(4, 4);
//!
//! let strategy = Registry::default().create("blocked").unwrap();
//! strategy.multiply(&a, &b, &mut c).unwrap();
//! assert_eq!(c, b);
//! ```

pub mod accel;
pub mod config;
pub mod cpu;
pub mod error;
pub mod matrix;
pub mod registry;
pub mod strategy;

// Re-export primary types at the crate root for convenience.
pub use accel::{DeviceKernel, HalfDeviceKernel};
pub use config::KernelConfig;
pub use error::{MatmulError, Result};
pub use matrix::Matrix;
pub use registry::{Registry, StrategyKind};
pub use strategy::{MatMul, OutputMode};
