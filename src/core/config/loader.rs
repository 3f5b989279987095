#![allow(clippy::result_large_err)]

use super::{MorphflowConfig, CONFIG_FILE_NAME};
use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, OutputFormat};
use std::env;
use std::path::Path;
use tracing::warn;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from a directory (dir/morphflow.toml)
    /// Environment variables override config file values
    /// Missing file means defaults + env vars
    pub fn load_from_dir(dir: &Path) -> Result<MorphflowConfig, AppError> {
        Self::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Load config from an explicit path, then apply env overrides
    pub fn load(path: &Path) -> Result<MorphflowConfig, AppError> {
        let mut config = Self::load_from_file(path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<MorphflowConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}", path.display()),
            )
            .with_code("PIPE-IO-001")
            .caused_by(e)
        })?;

        let config: MorphflowConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("PIPE-CFG-001")
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(config: &mut MorphflowConfig) {
        if let Ok(name) = env::var("MORPHFLOW_STATE_MACHINE_NAME") {
            config.compiler.state_machine_name = name;
        }

        if let Ok(name) = env::var("MORPHFLOW_RULE_NAME") {
            config.compiler.rule_name = name;
        }

        if let Ok(queue) = env::var("MORPHFLOW_DEAD_LETTER_QUEUE") {
            config.compiler.dead_letter_queue = Some(queue);
        }

        if let Ok(format_str) = env::var("MORPHFLOW_OUTPUT_FORMAT") {
            match format_str.parse::<OutputFormat>() {
                Ok(format) => config.output.format = format,
                Err(_) => warn!(value = %format_str, "ignoring invalid MORPHFLOW_OUTPUT_FORMAT"),
            }
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "MORPHFLOW_STATE_MACHINE_NAME - Override state machine name (default: StateMachine)",
            "MORPHFLOW_RULE_NAME - Override trigger rule name (default: Rule)",
            "MORPHFLOW_DEAD_LETTER_QUEUE - Override dead-letter queue id",
            "MORPHFLOW_OUTPUT_FORMAT - Override artifact format (json/yaml, default: json)",
        ]
    }
}
