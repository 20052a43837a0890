//! Platform-specific directory management
//!
//! Provides the global configuration file location and the default scratch
//! root for per-component build isolation.
//!
//! Environment variables can override default directories:
//! - `DEBSMITH_CACHE_DIR` - Override cache directory
//! - `DEBSMITH_CONFIG_DIR` - Override config directory
//! - `DEBSMITH_SCRATCH_DIR` - Override the scratch root directly

use std::env;
use std::path::PathBuf;

/// Environment variable names for directory overrides
pub const ENV_CACHE_DIR: &str = "DEBSMITH_CACHE_DIR";
pub const ENV_CONFIG_DIR: &str = "DEBSMITH_CONFIG_DIR";
pub const ENV_SCRATCH_DIR: &str = "DEBSMITH_SCRATCH_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "debsmith";

/// Subdirectory names
const SCRATCH_SUBDIR: &str = "scratch";

/// Platform-specific directory provider for debsmith
#[derive(Debug, Clone)]
pub struct DebsmithDirs {
    cache_dir: PathBuf,
    config_dir: PathBuf,
}

impl DebsmithDirs {
    /// Create a new `DebsmithDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: env::var(ENV_CACHE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::platform_dir(dirs::cache_dir(), ".cache")),
            config_dir: env::var(ENV_CONFIG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::platform_dir(dirs::config_dir(), ".config")),
        }
    }

    /// Get the cache directory path
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    /// Get the config directory path
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default scratch root for per-component build and tmp directories
    ///
    /// `DEBSMITH_SCRATCH_DIR` wins; otherwise a directory under the cache.
    #[must_use]
    pub fn scratch_root(&self) -> PathBuf {
        env::var(ENV_SCRATCH_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.cache_dir.join(SCRATCH_SUBDIR))
    }

    fn platform_dir(base: Option<PathBuf>, home_fallback: &str) -> PathBuf {
        base.map(|p| p.join(APP_NAME)).unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(home_fallback)
                .join(APP_NAME)
        })
    }
}

impl Default for DebsmithDirs {
    fn default() -> Self {
        Self::new()
    }
}
