use crate::config::KernelConfig;
use crate::error::Result;
use crate::matrix::Matrix;
use crate::strategy::{check_shapes, MatMul, OutputMode};

/// Tiled i-j-k multiply: `c += a @ b`.
///
/// The iteration space is cut into `tile x tile x tile` cubes. Within a cube
/// each `c[i][j]` receives the partial dot product over that cube's k-range.
/// Edge cubes are clipped to the real dimensions.
pub fn blocked_accumulate(
    a: &[f32],
    b: &[f32],
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
                    for j in jj..j_end {
                        let mut sum = 0.0f32;
                        for p in kk..k_end {
                            sum += a[i * k + p] * b[p * n + j];
                        }
                        c[i * n + j] += sum;
                    }
                }
            }
        }
    }
}

/// Cache-blocked strategy over the original layouts of `a` and `b`.
#[derive(Debug, Clone)]
pub struct BlockedStrategy {
    tile_size: usize,
}

impl BlockedStrategy {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            tile_size: config.tile_size.max(1),
        }
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }
}

impl Default for BlockedStrategy {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

impl MatMul for BlockedStrategy {
    fn name(&self) -> &str {
        "blocked"
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        if mode == OutputMode::Overwrite {
            c.zero();
        }
        blocked_accumulate(
            a.as_slice(),
            b.as_slice(),
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
    use crate::cpu::naive::naive_accumulate;

    fn ramp(rows: usize, cols: usize) -> Matrix {
        let data = (0..rows * cols).map(|v| ((v % 7) as f32) - 3.0).collect();
        Matrix::from_vec(rows, cols, data).unwrap()
    }

    #[test]
    fn test_blocked_clips_edge_tiles() {
        // 37 and 45 are not multiples of the tile, so every edge tile is partial.
        let a = ramp(37, 45);
        let b = ramp(45, 29);
        let mut expected = Matrix::new(37, 29);
        naive_accumulate(a.as_slice(), b.as_slice(), expected.as_mut_slice(), 37, 45, 29);

        let s = BlockedStrategy::new(&KernelConfig::default().with_tile_size(8));
        let mut c = Matrix::new(37, 29);
        s.multiply(&a, &b, &mut c).unwrap();
        // Small integers: every partial sum is exact.
        assert_eq!(c, expected);
    }

    #[test]
    fn test_blocked_tile_larger_than_matrix() {
        let a = ramp(3, 5);
        let b = ramp(5, 2);
        let mut expected = Matrix::new(3, 2);
        naive_accumulate(a.as_slice(), b.as_slice(), expected.as_mut_slice(), 3, 5, 2);

        let s = BlockedStrategy::default();
        assert_eq!(s.tile_size(), 32);
        let mut c = Matrix::new(3, 2);
        s.multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_blocked_accumulates_twice() {
        let a = ramp(16, 16);
        let b = ramp(16, 16);
        let s = BlockedStrategy::default();
        let mut once = Matrix::new(16, 16);
        s.multiply(&a, &b, &mut once).unwrap();
        let mut twice = Matrix::new(16, 16);
        s.multiply_accumulate(&a, &b, &mut twice).unwrap();
        s.multiply_accumulate(&a, &b, &mut twice).unwrap();
        for (x, y) in once.as_slice().iter().zip(twice.as_slice()) {
            assert_eq!(2.0 * x, *y);
        }
    }
}
