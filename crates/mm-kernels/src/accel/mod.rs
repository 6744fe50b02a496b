//! Accelerator-offloaded strategies.
//!
//! Device runtimes live outside this crate. They plug in through the flat
//! [`DeviceKernel`] signature (or [`HalfDeviceKernel`] for tensor-core
//! paths) and are wrapped here in strategies that validate every
//! precondition before dispatch and only publish the device result into `C`
//! after the launch has returned successfully.

pub mod device;
pub mod tensor_core;

pub use device::AcceleratorStrategy;
pub use tensor_core::{TensorCoreStrategy, TENSOR_CORE_TILE};

use std::fmt::Debug;

use half::f16;

use crate::error::{MatmulError, Result};
use crate::strategy::Dims;

/// Flat single-precision device kernel: `c = a @ b` for `n x n` operands.
///
/// Implementations must either fill all of `c` and return `Ok`, or return
/// an error. The host copy in and out of device memory is part of one
/// `launch` call.
pub trait DeviceKernel: Send + Sync + Debug {
    fn launch(&self, a: &[f32], b: &[f32], c: &mut [f32], n: usize) -> Result<()>;
}

/// Device kernel taking half-precision inputs and producing an f32
/// accumulator, the operand layout tensor cores consume.
pub trait HalfDeviceKernel: Send + Sync + Debug {
    fn launch(&self, a: &[f16], b: &[f16], c: &mut [f32], n: usize) -> Result<()>;
}

/// The flat device signature carries a single `n`, so all three operands
/// must be the same square size.
pub(crate) fn square_side(d: Dims, name: &str) -> Result<usize> {
    if d.m == d.k && d.k == d.n {
        Ok(d.n)
    } else {
        Err(MatmulError::Precondition(format!(
            "{} requires square operands of equal size, got [{}x{}] @ [{}x{}]",
            name, d.m, d.k, d.k, d.n
        )))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cpu::naive::naive_accumulate;

    /// Runs the naive kernel on the host in place of a device.
    #[derive(Debug, Default)]
    pub struct HostDevice;

    impl DeviceKernel for HostDevice {
        fn launch(&self, a: &[f32], b: &[f32], c: &mut [f32], n: usize) -> Result<()> {
            c.fill(0.0);
            naive_accumulate(a, b, c, n, n, n);
            Ok(())
        }
    }

    impl HalfDeviceKernel for HostDevice {
        fn launch(&self, a: &[f16], b: &[f16], c: &mut [f32], n: usize) -> Result<()> {
            let a: Vec<f32> = a.iter().map(|v| v.to_f32()).collect();
            let b: Vec<f32> = b.iter().map(|v| v.to_f32()).collect();
            c.fill(0.0);
            naive_accumulate(&a, &b, c, n, n, n);
            Ok(())
        }
    }

    /// Writes garbage into its output and then reports a failure.
    #[derive(Debug, Default)]
    pub struct FailingDevice;

    impl DeviceKernel for FailingDevice {
        fn launch(&self, _a: &[f32], _b: &[f32], c: &mut [f32], _n: usize) -> Result<()> {
            c.fill(f32::NAN);
            Err(MatmulError::Device("launch failed".to_string()))
        }
    }
}
