//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `config.toml` in the platform config directory
//! 3. Environment variables prefixed `DUPSCAN_` (e.g. `DUPSCAN_DIGEST_THREADS=8`)
//! 4. Command-line flags, applied by the caller
//!
//! # Example config.toml
//!
//! ```toml
//! strategy = "hybrid"
//! digest = "blake3"
//! digest_threads = 8
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, ScanStrategy};
use crate::scanner::DigestAlgorithm;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPSCAN_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduling strategy
    pub strategy: ScanStrategy,
    /// Content digest
    pub digest: DigestAlgorithm,
    /// Traversal threads (pipelined only)
    pub traversal_threads: usize,
    /// Digest threads (hybrid and pipelined)
    pub digest_threads: usize,
    /// Follow symbolic links during traversal
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        let finder = FinderConfig::default();
        Self {
            strategy: ScanStrategy::default(),
            digest: finder.digest,
            traversal_threads: finder.traversal_threads,
            digest_threads: finder.digest_threads,
            follow_symlinks: finder.follow_symlinks,
        }
    }
}

impl Config {
    /// Load the configuration from the default locations.
    ///
    /// A broken config file is logged and replaced by the defaults; it never
    /// stops a scan.
    #[must_use]
    pub fn load() -> Self {
        match Self::load_from(Self::config_path().as_deref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration, reading `path` as the TOML layer if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an environment variable does not
    /// parse into a valid configuration.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::figment(path)
            .extract()
            .context("Invalid configuration")
    }

    /// Build the provider stack without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Save the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupscan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Engine configuration for these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_digest(self.digest)
            .with_traversal_threads(self.traversal_threads)
            .with_digest_threads(self.digest_threads)
            .with_follow_symlinks(self.follow_symlinks)
    }
}
