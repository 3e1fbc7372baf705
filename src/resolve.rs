// src/resolve.rs
//
// Config document path resolution.
//
// Precedence (highest to lowest):
// 1. CLI argument (--config)
// 2. Environment variable (DRIVENC_CONFIG)
// 3. Default baseline path
//
// An empty environment variable counts as unset.

use std::env;
use std::path::PathBuf;

/// Environment variable naming the config document.
pub const CONFIG_PATH_ENV: &str = "DRIVENC_CONFIG";

/// Default config document, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "configs/stdim_baseline.yaml";

/// Source of the effective config path (for logging precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// Explicitly provided via CLI argument (highest priority).
    Cli,
    /// Taken from the DRIVENC_CONFIG environment variable.
    Env,
    /// Default baseline fallback.
    Default,
}

impl PathSource {
    /// Stable lowercase name for the source (used in logs).
    pub fn as_str(&self) -> &'static str {
        match self {
            PathSource::Cli => "cli",
            PathSource::Env => "env",
            PathSource::Default => "default",
        }
    }
}

/// Resolved config path with its source for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfigPath {
    pub path: PathBuf,
    pub source: PathSource,
}

impl EffectiveConfigPath {
    /// Log the effective config path at startup (stderr).
    pub fn log_startup(&self) {
        eprintln!(
            "[config] using {} (source: {})",
            self.path.display(),
            self.source.as_str()
        );
    }
}

/// Resolve the config document path using standard precedence rules.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> EffectiveConfigPath {
    // 1. CLI takes highest precedence
    if let Some(path) = cli_path {
        return EffectiveConfigPath {
            path,
            source: PathSource::Cli,
        };
    }

    // 2. Environment variable (empty counts as unset)
    if let Ok(env_val) = env::var(CONFIG_PATH_ENV) {
        if !env_val.trim().is_empty() {
            return EffectiveConfigPath {
                path: PathBuf::from(env_val),
                source: PathSource::Env,
            };
        }
    }

    // 3. Default
    EffectiveConfigPath {
        path: PathBuf::from(DEFAULT_CONFIG_PATH),
        source: PathSource::Default,
    }
}
