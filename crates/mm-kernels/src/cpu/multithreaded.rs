use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::KernelConfig;
use crate::error::{MatmulError, Result};
use crate::matrix::Matrix;
use crate::strategy::{check_shapes, MatMul, OutputMode};

/// Row-parallel multiply.
///
/// The `m` rows of `c` are cut into at most `workers` contiguous bands and
/// each band is handed to one rayon task. Bands are disjoint `&mut` chunks of
/// `c`, while `a` and `b` are only ever borrowed shared, so no locking is
/// needed. Every element is the same k-ordered scalar sum the naive kernel
/// produces, so the output does not depend on `workers`.
#[allow(clippy::too_many_arguments)]
pub fn row_parallel_multiply(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    m: usize,
    k: usize,
    n: usize,
    workers: usize,
    mode: OutputMode,
) {
    if m == 0 || n == 0 {
        return;
    }
    let rows_per_band = m.div_ceil(workers.max(1));

    c.par_chunks_mut(rows_per_band * n)
        .enumerate()
        .for_each(|(band, c_band)| {
            let first_row = band * rows_per_band;
            for (local, c_row) in c_band.chunks_mut(n).enumerate() {
                let i = first_row + local;
                let a_row = &a[i * k..(i + 1) * k];
                for (j, dst) in c_row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for (p, x) in a_row.iter().enumerate() {
                        sum += x * b[p * n + j];
                    }
                    match mode {
                        OutputMode::Overwrite => *dst = sum,
                        OutputMode::Accumulate => *dst += sum,
                    }
                }
            }
        });
}

/// Multithreaded strategy backed by a rayon pool.
///
/// With `num_threads == 0` the global rayon pool is used; otherwise the
/// strategy owns a dedicated pool of exactly that many workers.
#[derive(Debug, Clone)]
pub struct MultithreadedStrategy {
    pool: Option<Arc<ThreadPool>>,
}

impl MultithreadedStrategy {
    pub fn new(config: &KernelConfig) -> Result<Self> {
        if config.num_threads == 0 {
            return Ok(Self { pool: None });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("mm-worker-{}", i))
            .build()
            .map_err(|e| MatmulError::ThreadPool(e.to_string()))?;
        log::debug!("multithreaded: dedicated pool with {} workers", config.num_threads);
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Number of workers a call will use.
    pub fn workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl MatMul for MultithreadedStrategy {
    fn name(&self) -> &str {
        "multithreaded"
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        let workers = self.workers();
        let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_mut_slice());
        match &self.pool {
            Some(pool) => {
                pool.install(|| row_parallel_multiply(a, b, c, d.m, d.k, d.n, workers, mode))
            }
            None => row_parallel_multiply(a, b, c, d.m, d.k, d.n, workers, mode),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::naive::naive_accumulate;

    fn data(len: usize, seed: f32) -> Vec<f32> {
        (0..len).map(|v| ((v as f32 + seed) * 0.618).fract() * 20.0 - 10.0).collect()
    }

    #[test]
    fn test_matches_naive_exactly() {
        let (m, k, n) = (19, 23, 11);
        let a = data(m * k, 1.0);
        let b = data(k * n, 2.0);
        let mut expected = vec![0.0; m * n];
        naive_accumulate(&a, &b, &mut expected, m, k, n);

        let mut c = vec![0.0; m * n];
        row_parallel_multiply(&a, &b, &mut c, m, k, n, 4, OutputMode::Overwrite);
        assert_eq!(c, expected);
    }

    #[test]
    fn test_more_workers_than_rows() {
        let (m, k, n) = (3, 4, 5);
        let a = data(m * k, 3.0);
        let b = data(k * n, 4.0);
        let mut expected = vec![0.0; m * n];
        naive_accumulate(&a, &b, &mut expected, m, k, n);

        let mut c = vec![0.0; m * n];
        row_parallel_multiply(&a, &b, &mut c, m, k, n, 16, OutputMode::Overwrite);
        assert_eq!(c, expected);
    }

    #[test]
    fn test_dedicated_pool_size() {
        let s = MultithreadedStrategy::new(&KernelConfig::default().with_num_threads(3)).unwrap();
        assert_eq!(s.workers(), 3);
    }

    #[test]
    fn test_overwrite_is_repeatable() {
        let a = Matrix::from_vec(8, 8, data(64, 5.0)).unwrap();
        let b = Matrix::from_vec(8, 8, data(64, 6.0)).unwrap();
        let s = MultithreadedStrategy::new(&KernelConfig::default().with_num_threads(2)).unwrap();
        let mut c = Matrix::new(8, 8);
        s.multiply(&a, &b, &mut c).unwrap();
        let first = c.clone();
        s.multiply(&a, &b, &mut c).unwrap();
        assert_eq!(c, first);
    }
}
