use crate::config::KernelConfig;
use crate::error::Result;
use crate::matrix::{transpose_into, Matrix};
use crate::strategy::{check_shapes, MatMul, OutputMode};

/// Tiled multiply reading a pre-transposed right operand: `c += a @ btᵀ`.
///
/// `bt` is `b` transposed (n x k, row-major), so the innermost loop walks
/// both `a[i][..]` and `bt[j][..]` with unit stride.
pub fn blocked_transposed_accumulate(
    a: &[f32],
    bt: &[f32],
    c: &mut [f32],
    m: usize,
    k: usize,
    n: usize,
    tile: usize,
) {
    for ii in (0..m).step_by(tile) {
        let i_end = (ii + tile).min(m);
        for jj in (0..n).step_by(tile) {
            let j_end = (jj + tile).min(n);
            for kk in (0..k).step_by(tile) {
                let k_end = (kk + tile).min(k);
                for i in ii..i_end {
                    let a_row = &a[i * k + kk..i * k + k_end];
                    for j in jj..j_end {
                        let bt_row = &bt[j * k + kk..j * k + k_end];
                        let mut sum = 0.0f32;
                        for (x, y) in a_row.iter().zip(bt_row) {
                            sum += x * y;
                        }
                        c[i * n + j] += sum;
                    }
                }
            }
        }
    }
}

/// Transposes `b` once (O(k*n) extra memory), then runs the tiled loop with
/// contiguous access on both operands.
#[derive(Debug, Clone)]
pub struct CacheFriendlyStrategy {
    tile_size: usize,
}

impl CacheFriendlyStrategy {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            tile_size: config.tile_size.max(1),
        }
    }
}

impl Default for CacheFriendlyStrategy {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

impl MatMul for CacheFriendlyStrategy {
    fn name(&self) -> &str {
        "cache_friendly"
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        let mut bt = vec![0.0f32; d.k * d.n];
        transpose_into(b.as_slice(), &mut bt, d.k, d.n);

        if mode == OutputMode::Overwrite {
            c.zero();
        }
        blocked_transposed_accumulate(
            a.as_slice(),
            &bt,
            c.as_mut_slice(),
            d.m,
            d.k,
            d.n,
            self.tile_size,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::blocked::blocked_accumulate;

    #[test]
    fn test_matches_blocked_bitwise() {
        // Same tiling and same k-order per tile, so results are identical.
        let (m, k, n) = (33, 20, 17);
        let a: Vec<f32> = (0..m * k).map(|v| (v as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..k * n).map(|v| (v as f32 * 0.11).cos()).collect();

        let mut expected = vec![0.0; m * n];
        blocked_accumulate(&a, &b, &mut expected, m, k, n, 8);

        let mut bt = vec![0.0; k * n];
        transpose_into(&b, &mut bt, k, n);
        let mut c = vec![0.0; m * n];
        blocked_transposed_accumulate(&a, &bt, &mut c, m, k, n, 8);

        assert_eq!(c, expected);
    }

    #[test]
    fn test_does_not_modify_inputs() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let (a0, b0) = (a.clone(), b.clone());
        let mut c = Matrix::new(2, 2);
        CacheFriendlyStrategy::default().multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }
}
