use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::accel::{AcceleratorStrategy, DeviceKernel, HalfDeviceKernel, TensorCoreStrategy};
use crate::config::KernelConfig;
use crate::cpu::{
    BlockedStrategy, CacheFriendlyStrategy, MultithreadedStrategy, NaiveStrategy, SimdStrategy,
    StrassenStrategy,
};
use crate::error::{MatmulError, Result};
use crate::strategy::MatMul;

/// The closed set of strategies the registry knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Naive,
    Blocked,
    CacheFriendly,
    Simd,
    Multithreaded,
    Strassen,
    CudaNaive,
    CudaTensorCore,
    OpenClNaive,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 9] = [
        StrategyKind::Naive,
        StrategyKind::Blocked,
        StrategyKind::CacheFriendly,
        StrategyKind::Simd,
        StrategyKind::Multithreaded,
        StrategyKind::Strassen,
        StrategyKind::CudaNaive,
        StrategyKind::CudaTensorCore,
        StrategyKind::OpenClNaive,
    ];

    /// Canonical registry name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Naive => "naive",
            StrategyKind::Blocked => "blocked",
            StrategyKind::CacheFriendly => "cache_friendly",
            StrategyKind::Simd => "simd",
            StrategyKind::Multithreaded => "multithreaded",
            StrategyKind::Strassen => "strassen",
            StrategyKind::CudaNaive => "cuda_naive",
            StrategyKind::CudaTensorCore => "cuda_tensorcore",
            StrategyKind::OpenClNaive => "opencl_naive",
        }
    }

    /// Runs on the host CPU, as opposed to an external device.
    pub fn is_cpu(&self) -> bool {
        !matches!(
            self,
            StrategyKind::CudaNaive | StrategyKind::CudaTensorCore | StrategyKind::OpenClNaive
        )
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = MatmulError;

    fn from_str(s: &str) -> Result<Self> {
        // "cpu_naive" is accepted for callers written against older names.
        if s == "cpu_naive" {
            return Ok(StrategyKind::Naive);
        }
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| MatmulError::UnknownStrategy(s.to_string()))
    }
}

/// Builds strategy handles by name.
///
/// Every handle is an independent owned value: the caller holds the only
/// reference and it is released when dropped. Device runtimes for the
/// accelerator entries can be attached with [`Registry::register_device`]
/// and [`Registry::register_tensor_core`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: KernelConfig,
    devices: HashMap<StrategyKind, Arc<dyn DeviceKernel>>,
    tensor_core: Option<Arc<dyn HalfDeviceKernel>>,
}

impl Registry {
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            devices: HashMap::new(),
            tensor_core: None,
        })
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// All canonical names, CPU strategies first.
    pub fn names() -> Vec<&'static str> {
        StrategyKind::ALL.iter().map(|k| k.as_str()).collect()
    }

    /// Attach a single-precision device runtime to `cuda_naive` or `opencl_naive`.
    pub fn register_device(&mut self, kind: StrategyKind, kernel: Arc<dyn DeviceKernel>) -> Result<()> {
        match kind {
            StrategyKind::CudaNaive | StrategyKind::OpenClNaive => {
                log::debug!("registry: device runtime attached to {}", kind);
                self.devices.insert(kind, kernel);
                Ok(())
            }
            other => Err(MatmulError::Precondition(format!(
                "{} does not take a single-precision device kernel",
                other
            ))),
        }
    }

    /// Attach a tensor-core runtime to `cuda_tensorcore`.
    pub fn register_tensor_core(&mut self, kernel: Arc<dyn HalfDeviceKernel>) {
        log::debug!("registry: device runtime attached to cuda_tensorcore");
        self.tensor_core = Some(kernel);
    }

    /// Build the strategy `kind`.
    pub fn build(&self, kind: StrategyKind) -> Result<Box<dyn MatMul>> {
        let cfg = &self.config;
        let strategy: Box<dyn MatMul> = match kind {
            StrategyKind::Naive => Box::new(NaiveStrategy::new()),
            StrategyKind::Blocked => Box::new(BlockedStrategy::new(cfg)),
            StrategyKind::CacheFriendly => Box::new(CacheFriendlyStrategy::new(cfg)),
            StrategyKind::Simd => Box::new(SimdStrategy::new()),
            StrategyKind::Multithreaded => Box::new(MultithreadedStrategy::new(cfg)?),
            StrategyKind::Strassen => Box::new(StrassenStrategy::new(cfg)),
            StrategyKind::CudaNaive | StrategyKind::OpenClNaive => {
                Box::new(match self.devices.get(&kind) {
                    Some(k) => AcceleratorStrategy::with_kernel(kind.as_str(), Arc::clone(k)),
                    None => AcceleratorStrategy::unavailable(kind.as_str()),
                })
            }
            StrategyKind::CudaTensorCore => Box::new(match &self.tensor_core {
                Some(k) => TensorCoreStrategy::with_kernel(kind.as_str(), Arc::clone(k)),
                None => TensorCoreStrategy::unavailable(kind.as_str()),
            }),
        };
        log::debug!("registry: created {}", kind);
        Ok(strategy)
    }

    /// Build a strategy by name, reporting unknown names as an error.
    pub fn try_create(&self, name: &str) -> Result<Box<dyn MatMul>> {
        let kind: StrategyKind = name.parse()?;
        self.build(kind)
    }

    /// Build a strategy by name. Returns `None` for names the registry does
    /// not know, and also if construction fails (logged as a warning).
    pub fn create(&self, name: &str) -> Option<Box<dyn MatMul>> {
        match self.try_create(name) {
            Ok(s) => Some(s),
            Err(MatmulError::UnknownStrategy(_)) => None,
            Err(e) => {
                log::warn!("registry: failed to build {}: {}", name, e);
                None
            }
        }
    }
}
