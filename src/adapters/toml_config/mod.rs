// TOML config adapter - Engine configuration from TOML files

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::engine::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// File consulted when neither `--config` nor `NOSTALGIA_CONFIG` names one
pub const DEFAULT_CONFIG_FILE: &str = "nostalgia.toml";

/// Loads and saves [`EngineConfig`] as TOML
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn parse(content: &str) -> EngineResult<EngineConfig> {
        toml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Load a config file that must exist
    pub fn load(path: &Path) -> EngineResult<EngineConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::parse(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Resolve the config file: explicit path, then `NOSTALGIA_CONFIG`, then
    /// `./nostalgia.toml` if it exists
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os("NOSTALGIA_CONFIG") {
            return Some(PathBuf::from(path));
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Some(fallback);
        }
        debug!("No config file found, using defaults");
        None
    }

    /// Serialize a config, e.g. to write a starter file
    pub fn to_toml(config: &EngineConfig) -> EngineResult<String> {
        toml::to_string_pretty(config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }
}
