//! Configuration - Allocation and Kernel Tuning
//!
//! Loads Lamina's runtime configuration from TOML and environment variables.
//! A process-wide configuration is installed once and read by the default
//! allocator and the CPU kernel.
//!
//! # Key Features
//! - TOML configuration via serde
//! - `LAMINA_*` environment variable overrides
//! - Validation of alignment and thresholds
//! - Global configuration installed once per process
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding `alloc.alignment`.
pub const ENV_ALIGNMENT: &str = "LAMINA_ALIGNMENT";

/// Environment variable overriding `kernel.parallel_threshold`.
pub const ENV_PARALLEL_THRESHOLD: &str = "LAMINA_PARALLEL_THRESHOLD";

static GLOBAL: OnceLock<Config> = OnceLock::new();

// =============================================================================
// Config Structs
// =============================================================================

/// Top-level Lamina configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Allocation policy.
    #[serde(default)]
    pub alloc: AllocConfig,
    /// CPU kernel tuning.
    #[serde(default)]
    pub kernel: KernelConfig,
}

/// Allocation policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AllocConfig {
    /// Byte alignment of every payload allocation. Must be a power of two.
    #[serde(default = "default_alignment")]
    pub alignment: usize,
}

/// CPU kernel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KernelConfig {
    /// Minimum element count before elementwise kernels go parallel.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_alignment() -> usize {
    64
}
fn default_parallel_threshold() -> usize {
    4096
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alloc: AllocConfig::default(),
            kernel: KernelConfig::default(),
        }
    }
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            alignment: default_alignment(),
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Config {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Builds the default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Applies `LAMINA_*` environment overrides on top of this configuration.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// # Arguments
    /// * `lookup` - Returns the raw value for an environment key, if set
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_ALIGNMENT) {
            self.alloc.alignment = parse_usize(ENV_ALIGNMENT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PARALLEL_THRESHOLD) {
            self.kernel.parallel_threshold = parse_usize(ENV_PARALLEL_THRESHOLD, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that the configuration is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if !self.alloc.alignment.is_power_of_two() {
            return Err(Error::config(format!(
                "alloc.alignment must be a power of two, got {}",
                self.alloc.alignment
            )));
        }
        if self.kernel.parallel_threshold == 0 {
            return Err(Error::config("kernel.parallel_threshold must be positive"));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(format!("{key} must be an unsigned integer, got {raw:?}")))
}

// =============================================================================
// Global Configuration
// =============================================================================

/// Installs the process-wide configuration.
///
/// Fails if a configuration was already installed or read.
pub fn init(config: Config) -> Result<()> {
    config.validate()?;
    GLOBAL
        .set(config)
        .map_err(|_| Error::config("global configuration already initialized"))
}

/// Returns the process-wide configuration.
///
/// Falls back to defaults plus environment overrides on first use; an
/// unusable environment falls back to plain defaults.
pub fn global() -> &'static Config {
    GLOBAL.get_or_init(|| {
        Config::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring invalid LAMINA_* environment, using defaults");
            Config::default()
        })
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.alloc.alignment, 64);
        assert_eq!(config.kernel.parallel_threshold, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml_str("[alloc]\nalignment = 128\n").unwrap();
        assert_eq!(config.alloc.alignment, 128);
        assert_eq!(config.kernel.parallel_threshold, 4096);

        let empty = Config::from_toml_str("").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_rejects_bad_alignment() {
        let err = Config::from_toml_str("[alloc]\nalignment = 48\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(|key| match key {
                ENV_ALIGNMENT => Some("32".to_string()),
                ENV_PARALLEL_THRESHOLD => Some(" 16 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.alloc.alignment, 32);
        assert_eq!(config.kernel.parallel_threshold, 16);

        let bad = Config::default().with_overrides(|key| {
            (key == ENV_PARALLEL_THRESHOLD).then(|| "lots".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
