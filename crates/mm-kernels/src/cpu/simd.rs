//! Vectorised dot-product strategy.
//!
//! Each `c[i][j]` is reduced in `LANES`-wide steps: the slice of row `i` of
//! `a` is loaded contiguously, the matching slice of column `j` of `b` is
//! gathered element by element (stride `n`), and the lane-wise products are
//! summed into a vector accumulator. The accumulator is then summed
//! horizontally and the `k % LANES` tail is added in scalar code.
//!
//! On x86_64 the AVX path is chosen at runtime. The portable path keeps the
//! same lane layout and the same add/multiply order, so both produce
//! identical bits.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::strategy::{check_shapes, MatMul, OutputMode};

/// Number of f32 elements per vector step (one 256-bit register).
pub const LANES: usize = 8;

/// `c = a @ b` (or `c += a @ b` with `OutputMode::Accumulate`) using the
/// best lane implementation available on this CPU.
pub fn simd_multiply(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    m: usize,
    k: usize,
    n: usize,
    mode: OutputMode,
) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            unsafe { simd_multiply_avx(a, b, c, m, k, n, mode) };
            return;
        }
    }
    simd_multiply_portable(a, b, c, m, k, n, mode);
}

/// Lane-array implementation with no target-specific instructions.
pub fn simd_multiply_portable(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    m: usize,
    k: usize,
    n: usize,
    mode: OutputMode,
) {
    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let mut acc = [0.0f32; LANES];
            let mut p = 0;
            while p + LANES <= k {
                for l in 0..LANES {
                    acc[l] += a_row[p + l] * b[(p + l) * n + j];
                }
                p += LANES;
            }
            let sum = finish(&acc, a_row, b, p, j, n);
            write(&mut c[i * n + j], sum, mode);
        }
    }
}

/// AVX implementation.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
pub unsafe fn simd_multiply_avx(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    m: usize,
    k: usize,
    n: usize,
    mode: OutputMode,
) {
    use std::arch::x86_64::*;

    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let mut acc = _mm256_setzero_ps();
            let mut gathered = [0.0f32; LANES];
            let mut p = 0;
            while p + LANES <= k {
                let a_vec = _mm256_loadu_ps(a_row.as_ptr().add(p));
                // Column access: no contiguous load is possible for b.
                for (l, g) in gathered.iter_mut().enumerate() {
                    *g = b[(p + l) * n + j];
                }
                let b_vec = _mm256_loadu_ps(gathered.as_ptr());
                acc = _mm256_add_ps(acc, _mm256_mul_ps(a_vec, b_vec));
                p += LANES;
            }
            let mut lanes = [0.0f32; LANES];
            _mm256_storeu_ps(lanes.as_mut_ptr(), acc);
            let sum = finish(&lanes, a_row, b, p, j, n);
            write(&mut c[i * n + j], sum, mode);
        }
    }
}

/// Horizontal sum of the lanes followed by the scalar remainder from `p`.
#[inline]
fn finish(lanes: &[f32; LANES], a_row: &[f32], b: &[f32], mut p: usize, j: usize, n: usize) -> f32 {
    let mut sum = 0.0f32;
    for v in lanes {
        sum += v;
    }
    while p < a_row.len() {
        sum += a_row[p] * b[p * n + j];
        p += 1;
    }
    sum
}

#[inline]
fn write(dst: &mut f32, sum: f32, mode: OutputMode) {
    match mode {
        OutputMode::Overwrite => *dst = sum,
        OutputMode::Accumulate => *dst += sum,
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimdStrategy;

impl SimdStrategy {
    pub fn new() -> Self {
        SimdStrategy
    }
}

impl MatMul for SimdStrategy {
    fn name(&self) -> &str {
        "simd"
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        simd_multiply(a.as_slice(), b.as_slice(), c.as_mut_slice(), d.m, d.k, d.n, mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::naive::naive_accumulate;
    use approx::assert_relative_eq;

    fn seq(len: usize, scale: f32) -> Vec<f32> {
        (0..len).map(|v| ((v as f32) * scale).sin() * 4.0).collect()
    }

    #[test]
    fn test_remainder_lengths() {
        // k below, at, and between multiples of the lane width.
        for &k in &[1usize, 7, 8, 9, 15, 16, 17, 31] {
            let (m, n) = (5, 6);
            let a = seq(m * k, 0.3);
            let b = seq(k * n, 0.7);
            let mut expected = vec![0.0; m * n];
            naive_accumulate(&a, &b, &mut expected, m, k, n);

            let mut c = vec![0.0; m * n];
            simd_multiply(&a, &b, &mut c, m, k, n, OutputMode::Overwrite);
            for (x, y) in c.iter().zip(&expected) {
                assert_relative_eq!(*x, *y, epsilon = 1e-4, max_relative = 1e-4);
            }
        }
    }

    #[test]
    fn test_below_lane_width_is_exact() {
        // With k < LANES the vector loop never runs and the order is naive's.
        let a = vec![1.5, -2.0, 3.25];
        let b = vec![2.0, 4.0, -1.0];
        let mut c = vec![0.0; 1];
        simd_multiply(&a, &b, &mut c, 1, 3, 1, OutputMode::Overwrite);
        assert_eq!(c[0], 1.5 * 2.0 + -2.0 * 4.0 + 3.25 * -1.0);
    }

    #[test]
    fn test_overwrite_is_repeatable() {
        let a = Matrix::from_vec(4, 12, seq(48, 0.5)).unwrap();
        let b = Matrix::from_vec(12, 3, seq(36, 0.9)).unwrap();
        let s = SimdStrategy::new();
        let mut c = Matrix::new(4, 3);
        s.multiply(&a, &b, &mut c).unwrap();
        let first = c.clone();
        s.multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c, first);
    }

    #[test]
    fn test_accumulate_mode() {
        let a = Matrix::identity(9);
        let b = Matrix::from_vec(9, 9, seq(81, 0.2)).unwrap();
        let mut c = Matrix::from_vec(9, 9, vec![1.0; 81]).unwrap();
        SimdStrategy::new().multiply_accumulate(&a, &b, &mut c).unwrap();
        for (x, y) in c.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!(*x, y + 1.0, epsilon = 1e-6);
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_avx_matches_portable_bitwise() {
        if !is_x86_feature_detected!("avx") {
            return;
        }
        let (m, k, n) = (7, 29, 5);
        let a = seq(m * k, 0.13);
        let b = seq(k * n, 0.41);
        let mut portable = vec![0.0; m * n];
        simd_multiply_portable(&a, &b, &mut portable, m, k, n, OutputMode::Overwrite);
        let mut avx = vec![0.0; m * n];
        unsafe { simd_multiply_avx(&a, &b, &mut avx, m, k, n, OutputMode::Overwrite) };
        assert_eq!(avx, portable);
    }
}
