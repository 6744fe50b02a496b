use crate::error::Result;
use crate::matrix::Matrix;
use crate::strategy::{check_shapes, MatMul, OutputMode};

/// Textbook i-j-k triple loop: `c[i][j] += a[i][p] * b[p][j]`.
///
/// Each term is added straight into `c`, so the result depends on what `c`
/// held on entry. This is the reference every other strategy is checked
/// against.
///
/// * `a` - m x k, row-major
/// * `b` - k x n, row-major
/// * `c` - m x n, row-major, accumulated into
pub fn naive_accumulate(a: &[f32], b: &[f32], c: &mut [f32], m: usize, k: usize, n: usize) {
    for i in 0..m {
        for j in 0..n {
            for p in 0..k {
                c[i * n + j] += a[i * k + p] * b[p * n + j];
            }
        }
    }
}

/// Reference triple-loop strategy.
#[derive(Debug, Clone, Default)]
pub struct NaiveStrategy;

impl NaiveStrategy {
    pub fn new() -> Self {
        NaiveStrategy
    }
}

impl MatMul for NaiveStrategy {
    fn name(&self) -> &str {
        "naive"
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        if mode == OutputMode::Overwrite {
            c.zero();
        }
        naive_accumulate(a.as_slice(), b.as_slice(), c.as_mut_slice(), d.m, d.k, d.n);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_basic() {
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        let mut c = Matrix::new(2, 2);
        NaiveStrategy::new().multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_naive_rectangular() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let mut c = Matrix::new(2, 2);
        NaiveStrategy::new().multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_naive_accumulate_onto_existing() {
        let a = Matrix::identity(2);
        let b = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut c = Matrix::from_vec(2, 2, vec![10.0; 4]).unwrap();
        NaiveStrategy::new().multiply_accumulate(&a, &b, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_naive_overwrite_ignores_existing() {
        let a = Matrix::identity(2);
        let b = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut c = Matrix::from_vec(2, 2, vec![10.0; 4]).unwrap();
        NaiveStrategy::new().multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_naive_shape_mismatch_leaves_output() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 2);
        let mut c = Matrix::from_vec(2, 2, vec![7.0; 4]).unwrap();
        assert!(NaiveStrategy::new().multiply(&a, &b, &mut c).is_err());
        assert_eq!(c.as_slice(), &[7.0; 4]);
    }
}
