use crate::error::{MatmulError, Result};

/// Default tile edge for the blocked and cache-friendly strategies.
pub const DEFAULT_TILE_SIZE: usize = 32;
/// Side length at or below which Strassen falls back to the naive kernel.
pub const DEFAULT_STRASSEN_THRESHOLD: usize = 64;

/// Tuning parameters handed to each strategy at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Edge length of the cubic (i, j, k) tiles.
    pub tile_size: usize,
    /// Strassen recursion stops once the block side is `<=` this value.
    pub strassen_threshold: usize,
    /// Worker count for the multithreaded strategy. `0` lets rayon decide.
    pub num_threads: usize,
    /// Zero-pad non-square / non-power-of-two Strassen inputs instead of
    /// rejecting them.
    pub strassen_padding: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            strassen_threshold: DEFAULT_STRASSEN_THRESHOLD,
            num_threads: 0,
            strassen_padding: true,
        }
    }
}

impl KernelConfig {
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_strassen_threshold(mut self, threshold: usize) -> Self {
        self.strassen_threshold = threshold;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_strassen_padding(mut self, enabled: bool) -> Self {
        self.strassen_padding = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(MatmulError::InvalidConfig(
                "tile_size must be > 0".to_string(),
            ));
        }
        if self.strassen_threshold == 0 {
            return Err(MatmulError::InvalidConfig(
                "strassen_threshold must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults overlaid with `MM_TILE_SIZE`, `MM_STRASSEN_THRESHOLD` and
    /// `MM_NUM_THREADS` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`KernelConfig::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("MM_TILE_SIZE") {
            config.tile_size = parse_usize("MM_TILE_SIZE", &v)?;
        }
        if let Some(v) = lookup("MM_STRASSEN_THRESHOLD") {
            config.strassen_threshold = parse_usize("MM_STRASSEN_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("MM_NUM_THREADS") {
            config.num_threads = parse_usize("MM_NUM_THREADS", &v)?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        MatmulError::InvalidConfig(format!("{}={:?} is not a non-negative integer", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let c = KernelConfig::default();
        assert_eq!(c.tile_size, 32);
        assert_eq!(c.strassen_threshold, 64);
        assert_eq!(c.num_threads, 0);
        assert!(c.strassen_padding);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(KernelConfig::default().with_tile_size(0).validate().is_err());
        assert!(KernelConfig::default()
            .with_strassen_threshold(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [("MM_TILE_SIZE", "16"), ("MM_NUM_THREADS", " 3 ")]
            .into_iter()
            .collect();
        let c = KernelConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.tile_size, 16);
        assert_eq!(c.num_threads, 3);
        assert_eq!(c.strassen_threshold, DEFAULT_STRASSEN_THRESHOLD);
    }

    #[test]
    fn test_from_lookup_malformed() {
        let r = KernelConfig::from_lookup(|k| (k == "MM_STRASSEN_THRESHOLD").then(|| "x".into()));
        assert!(matches!(r, Err(MatmulError::InvalidConfig(_))));

        let r = KernelConfig::from_lookup(|k| (k == "MM_TILE_SIZE").then(|| "0".into()));
        assert!(r.is_err());
    }
}
