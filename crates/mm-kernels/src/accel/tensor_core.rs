use std::sync::Arc;

use half::f16;

use crate::accel::{square_side, HalfDeviceKernel};
use crate::error::{MatmulError, Result};
use crate::matrix::Matrix;
use crate::strategy::{check_shapes, store, MatMul, OutputMode};

/// Tensor-core fragments are 16x16x16; every dimension must be a multiple.
pub const TENSOR_CORE_TILE: usize = 16;

/// Offload to a tensor-core kernel (`cuda_tensorcore`).
///
/// Operands are staged to IEEE half precision on the host, so results carry
/// f16 input rounding even though accumulation is f32.
#[derive(Debug, Clone)]
pub struct TensorCoreStrategy {
    name: String,
    kernel: Option<Arc<dyn HalfDeviceKernel>>,
}

impl TensorCoreStrategy {
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernel: None,
        }
    }

    pub fn with_kernel(name: impl Into<String>, kernel: Arc<dyn HalfDeviceKernel>) -> Self {
        Self {
            name: name.into(),
            kernel: Some(kernel),
        }
    }

    pub fn is_available(&self) -> bool {
        self.kernel.is_some()
    }
}

fn to_half(src: &[f32]) -> Vec<f16> {
    src.iter().map(|&v| f16::from_f32(v)).collect()
}

impl MatMul for TensorCoreStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        if d.m % TENSOR_CORE_TILE != 0 || d.k % TENSOR_CORE_TILE != 0 || d.n % TENSOR_CORE_TILE != 0
        {
            return Err(MatmulError::Precondition(format!(
                "{} requires every dimension to be a multiple of {}, got m={} k={} n={}",
                self.name, TENSOR_CORE_TILE, d.m, d.k, d.n
            )));
        }
        let n = square_side(d, &self.name)?;

        let kernel = match &self.kernel {
            Some(k) => k,
            None => {
                log::warn!("{}: no device runtime registered", self.name);
                return Err(MatmulError::AcceleratorUnavailable(self.name.clone()));
            }
        };

        log::debug!("{}: staging {}x{} operands as f16", self.name, n, n);
        let (a16, b16) = (to_half(a.as_slice()), to_half(b.as_slice()));
        let mut staging = vec![0.0f32; n * n];
        kernel.launch(&a16, &b16, &mut staging, n)?;
        store(c.as_mut_slice(), &staging, mode);
        Ok(())
    }
}
