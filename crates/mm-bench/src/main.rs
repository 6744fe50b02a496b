//! Benchmark and correctness runner for every registered strategy.
//!
//! Usage: `mm-bench [SIZE...]` (defaults to 64 128 256 512 1024).
//! Tuning comes from `MM_TILE_SIZE`, `MM_STRASSEN_THRESHOLD` and
//! `MM_NUM_THREADS`; set `RUST_LOG=debug` to see dispatch decisions.

use std::process::ExitCode;
use std::time::Instant;

use mm_kernels::{KernelConfig, MatmulError, Matrix, Registry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_SIZES: [usize; 5] = [64, 128, 256, 512, 1024];
const SEED: u64 = 42;
const EPS: f32 = 1e-2;

enum Outcome {
    Correct,
    Mismatch(f32),
    Unavailable,
    Failed(MatmulError),
}

impl Outcome {
    fn label(&self) -> String {
        match self {
            Outcome::Correct => "CORRECT".to_string(),
            Outcome::Mismatch(diff) => format!("MISMATCH ({:.3e})", diff),
            Outcome::Unavailable => "UNAVAILABLE".to_string(),
            Outcome::Failed(e) => format!("ERROR ({})", e),
        }
    }
}

struct Row {
    size: usize,
    name: &'static str,
    time_ms: Option<f64>,
    mem_kb: Option<i64>,
    outcome: Outcome,
}

fn random_matrix(rng: &mut StdRng, n: usize) -> Matrix {
    let mut m = Matrix::new(n, n);
    for v in m.as_mut_slice() {
        *v = rng.gen_range(-10.0f32..=10.0);
    }
    m
}

/// Resident set size in KB from `/proc/self/status`, where available.
fn resident_kb() -> Option<i64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find(|l| l.starts_with("VmRSS:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

/// Element-wise comparison, tolerance scaled by the reference magnitude.
fn check(expected: &Matrix, actual: &Matrix) -> Outcome {
    let mut worst = 0.0f32;
    let mut ok = true;
    for (x, y) in expected.as_slice().iter().zip(actual.as_slice()) {
        let diff = (x - y).abs();
        worst = worst.max(diff);
        if diff > EPS * x.abs().max(1.0) {
            ok = false;
        }
    }
    if ok {
        Outcome::Correct
    } else {
        Outcome::Mismatch(worst)
    }
}

fn parse_sizes() -> Result<Vec<usize>, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return Ok(DEFAULT_SIZES.to_vec());
    }
    args.iter()
        .map(|a| match a.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("invalid size '{}': expected a positive integer", a)),
        })
        .collect()
}

fn run(registry: &Registry, n: usize, rng: &mut StdRng) -> Vec<Row> {
    let a = random_matrix(rng, n);
    let b = random_matrix(rng, n);

    let mut rows = Vec::new();
    let reference = match registry.try_create("naive").and_then(|s| a.matmul(&b, s.as_ref())) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("bench: reference failed at n={}: {}", n, e);
            return rows;
        }
    };

    for name in Registry::names() {
        let strategy = match registry.try_create(name) {
            Ok(s) => s,
            Err(e) => {
                rows.push(Row { size: n, name, time_ms: None, mem_kb: None, outcome: Outcome::Failed(e) });
                continue;
            }
        };

        let before = resident_kb();
        let mut c = Matrix::new(n, n);
        let start = Instant::now();
        let result = strategy.multiply(&a, &b, &mut c);
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        let after = resident_kb();

        let (time_ms, mem_kb, outcome) = match result {
            Ok(()) => (
                Some(elapsed),
                before.zip(after).map(|(b, a)| a - b),
                check(&reference, &c),
            ),
            Err(MatmulError::AcceleratorUnavailable(_)) => (None, None, Outcome::Unavailable),
            Err(e) => (None, None, Outcome::Failed(e)),
        };
        rows.push(Row { size: n, name, time_ms, mem_kb, outcome });
    }
    rows
}

fn print_table(rows: &[Row]) {
    println!(
        "{:<6} | {:<16} | {:>12} | {:>9} | {:>10} | Result",
        "Size", "Algorithm", "Time(ms)", "Mem(KB)", "GFLOPS"
    );
    println!("{}", "-".repeat(80));
    for r in rows {
        let time = r.time_ms.map_or("-".to_string(), |t| format!("{:.3}", t));
        let mem = r.mem_kb.map_or("-".to_string(), |m| m.to_string());
        let gflops = r.time_ms.filter(|&t| t > 0.0).map_or("-".to_string(), |t| {
            let flops = 2.0 * (r.size as f64).powi(3);
            format!("{:.2}", flops / (t / 1000.0) / 1e9)
        });
        println!(
            "{:<6} | {:<16} | {:>12} | {:>9} | {:>10} | {}",
            r.size,
            r.name,
            time,
            mem,
            gflops,
            r.outcome.label()
        );
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let sizes = match parse_sizes() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let registry = match KernelConfig::from_env().and_then(Registry::new) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let cfg = registry.config();
    println!("=== Matrix Multiplication Benchmark ===\n");
    println!(
        "tile_size={} strassen_threshold={} num_threads={}\n",
        cfg.tile_size, cfg.strassen_threshold, cfg.num_threads
    );

    let mut rng = StdRng::seed_from_u64(SEED);
    let mut rows = Vec::new();
    for &n in &sizes {
        log::debug!("bench: running n={}", n);
        rows.extend(run(&registry, n, &mut rng));
    }
    print_table(&rows);

    let mismatches = rows
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Mismatch(_) | Outcome::Failed(_)))
        .count();
    if mismatches > 0 {
        eprintln!("{} result(s) did not match the reference", mismatches);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
