use mm_kernels::KernelConfig;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MMStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorUnknownStrategy = 2,
    ErrorShapeMismatch = 3,
    ErrorPrecondition = 4,
    ErrorUnavailable = 5,
    ErrorInternal = 6,
}

/// Tuning parameters, mirroring `KernelConfig`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MMKernelConfig {
    pub tile_size: u32,
    pub strassen_threshold: u32,
    /// 0 selects the default worker count.
    pub num_threads: u32,
    pub strassen_padding: bool,
}

impl Default for MMKernelConfig {
    fn default() -> Self {
        KernelConfig::default().into()
    }
}

fn saturate(v: usize) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

impl From<KernelConfig> for MMKernelConfig {
    fn from(c: KernelConfig) -> Self {
        Self {
            tile_size: saturate(c.tile_size),
            strassen_threshold: saturate(c.strassen_threshold),
            num_threads: saturate(c.num_threads),
            strassen_padding: c.strassen_padding,
        }
    }
}

impl From<MMKernelConfig> for KernelConfig {
    fn from(c: MMKernelConfig) -> Self {
        KernelConfig {
            tile_size: c.tile_size as usize,
            strassen_threshold: c.strassen_threshold as usize,
            num_threads: c.num_threads as usize,
            strassen_padding: c.strassen_padding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let cfg = KernelConfig::default().with_tile_size(16).with_num_threads(4);
        let back: KernelConfig = MMKernelConfig::from(cfg).into();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_oversized_values_saturate() {
        let cfg = KernelConfig::default().with_num_threads(usize::MAX);
        let c = MMKernelConfig::from(cfg);
        assert_eq!(c.num_threads, u32::MAX);
        assert_eq!(c.tile_size, 32);
    }
}
