//! Configuration initialization and hierarchy management

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::adapters::TomlConfigAdapter;
use crate::cli::Cli;
use crate::engine::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Environment variables consulted after the config file
pub const ENV_MAPPINGS: [(&str, &str); 6] = [
    ("NOSTALGIA_FFMPEG", "ffmpeg_path"),
    ("NOSTALGIA_FFPROBE", "ffprobe_path"),
    ("NOSTALGIA_TIMEOUT_SECS", "timeout_secs"),
    ("NOSTALGIA_SCRATCH_DIR", "scratch_root"),
    ("NOSTALGIA_MAX_JOBS", "max_parallel_jobs"),
    ("NOSTALGIA_LOG_LEVEL", "logging.level"),
];

/// Build the effective configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match TomlConfigAdapter::locate(cli.config.as_deref()) {
        Some(path) => TomlConfigAdapter::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    apply_environment_overrides(&mut config, |key| std::env::var(key).ok())?;
    apply_cli_overrides(&mut config, cli);

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Apply `NOSTALGIA_*` overrides using `lookup` to read variables
pub fn apply_environment_overrides<F>(config: &mut EngineConfig, lookup: F) -> EngineResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    for (env_var, key) in ENV_MAPPINGS {
        let Some(value) = lookup(env_var) else {
            continue;
        };
        debug!("Environment override: {} = {}", env_var, value);
        match key {
            "ffmpeg_path" => config.ffmpeg_path = value,
            "ffprobe_path" => config.ffprobe_path = value,
            "timeout_secs" => config.timeout_secs = Some(parse_number(env_var, &value)?),
            "scratch_root" => config.scratch_root = Some(PathBuf::from(value)),
            "max_parallel_jobs" => config.max_parallel_jobs = Some(parse_number(env_var, &value)?),
            "logging.level" => config.logging.level = value,
            _ => {}
        }
    }
    Ok(())
}

/// Apply global command-line flags
pub fn apply_cli_overrides(config: &mut EngineConfig, cli: &Cli) {
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.ffmpeg_path = ffmpeg.clone();
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.ffprobe_path = ffprobe.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json {
        config.logging.json = true;
    }
}

fn parse_number<T: std::str::FromStr>(env_var: &str, value: &str) -> EngineResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::Config(format!("{} must be a whole number, got '{}'", env_var, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = EngineConfig::default();
        apply_environment_overrides(
            &mut config,
            lookup_from(&[
                ("NOSTALGIA_FFMPEG", "/usr/local/bin/ffmpeg"),
                ("NOSTALGIA_TIMEOUT_SECS", "90"),
                ("NOSTALGIA_MAX_JOBS", "2"),
                ("NOSTALGIA_LOG_LEVEL", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(config.ffmpeg_path, "/usr/local/bin/ffmpeg");
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.timeout_secs, Some(90));
        assert_eq!(config.max_parallel_jobs, Some(2));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_environment_number() {
        let mut config = EngineConfig::default();
        let err = apply_environment_overrides(
            &mut config,
            lookup_from(&[("NOSTALGIA_TIMEOUT_SECS", "later")]),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_cli_beats_environment() {
        let mut config = EngineConfig::default();
        apply_environment_overrides(&mut config, lookup_from(&[("NOSTALGIA_FFMPEG", "/env/ffmpeg")]))
            .unwrap();
        let cli = Cli::parse_from(["nostalgia", "--ffmpeg", "/cli/ffmpeg", "--json", "plan"]);
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.ffmpeg_path, "/cli/ffmpeg");
        assert!(config.logging.json);
    }
}
