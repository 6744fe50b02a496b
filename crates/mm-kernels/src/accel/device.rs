use std::sync::Arc;

use crate::accel::{square_side, DeviceKernel};
use crate::error::{MatmulError, Result};
use crate::matrix::Matrix;
use crate::strategy::{check_shapes, store, MatMul, OutputMode};

/// Strategy that offloads to a single-precision device kernel
/// (`cuda_naive`, `opencl_naive`).
#[derive(Debug, Clone)]
pub struct AcceleratorStrategy {
    name: String,
    kernel: Option<Arc<dyn DeviceKernel>>,
}

impl AcceleratorStrategy {
    /// A strategy with no device attached. Every call validates its inputs
    /// and then reports [`MatmulError::AcceleratorUnavailable`].
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernel: None,
        }
    }

    pub fn with_kernel(name: impl Into<String>, kernel: Arc<dyn DeviceKernel>) -> Self {
        Self {
            name: name.into(),
            kernel: Some(kernel),
        }
    }

    pub fn is_available(&self) -> bool {
        self.kernel.is_some()
    }
}

impl MatMul for AcceleratorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        let n = square_side(d, &self.name)?;

        let kernel = match &self.kernel {
            Some(k) => k,
            None => {
                log::warn!("{}: no device runtime registered", self.name);
                return Err(MatmulError::AcceleratorUnavailable(self.name.clone()));
            }
        };

        log::debug!("{}: dispatching {}x{} to device", self.name, n, n);
        let mut staging = vec![0.0f32; n * n];
        kernel.launch(a.as_slice(), b.as_slice(), &mut staging, n)?;
        store(c.as_mut_slice(), &staging, mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::testing::{FailingDevice, HostDevice};

    fn sample(n: usize) -> Matrix {
        Matrix::from_vec(n, n, (0..n * n).map(|v| (v % 5) as f32).collect()).unwrap()
    }

    #[test]
    fn test_unavailable_reports_after_validation() {
        let s = AcceleratorStrategy::unavailable("cuda_naive");
        let mut c = Matrix::new(4, 4);
        let err = s.multiply(&sample(4), &sample(4), &mut c).unwrap_err();
        assert_eq!(err, MatmulError::AcceleratorUnavailable("cuda_naive".into()));

        // Shape problems are reported before availability.
        let a = Matrix::new(2, 3);
        let b = Matrix::new(3, 2);
        let mut c = Matrix::new(2, 2);
        assert!(matches!(
            s.multiply(&a, &b, &mut c),
            Err(MatmulError::Precondition(_))
        ));
    }

    #[test]
    fn test_dispatch_to_kernel() {
        let s = AcceleratorStrategy::with_kernel("opencl_naive", Arc::new(HostDevice));
        assert!(s.is_available());
        let (a, b) = (sample(6), sample(6));
        let mut c = Matrix::from_vec(6, 6, vec![9.0; 36]).unwrap();
        s.multiply(&a, &b, &mut c).unwrap();
        let mut expected = Matrix::new(6, 6);
        crate::cpu::naive::naive_accumulate(
            a.as_slice(),
            b.as_slice(),
            expected.as_mut_slice(),
            6,
            6,
            6,
        );
        assert_eq!(c, expected);
    }

    #[test]
    fn test_failed_launch_leaves_output() {
        let s = AcceleratorStrategy::with_kernel("cuda_naive", Arc::new(FailingDevice));
        let mut c = Matrix::from_vec(3, 3, vec![1.0; 9]).unwrap();
        let err = s.multiply(&sample(3), &sample(3), &mut c).unwrap_err();
        assert!(matches!(err, MatmulError::Device(_)));
        assert_eq!(c.as_slice(), &[1.0; 9]);
    }
}
