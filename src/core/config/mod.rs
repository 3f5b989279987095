#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::pipeline::manifest::PipelineManifest;
use crate::core::pipeline::resource::QueueRef;
use crate::core::state_machine::builder::{
    CompilerOptions, DEFAULT_RULE_NAME, DEFAULT_STATE_MACHINE_NAME,
};
use crate::core::types::{ErrorCategory, OutputFormat};
use serde::{Deserialize, Serialize};

/// File name looked up next to the manifest.
pub const CONFIG_FILE_NAME: &str = "morphflow.toml";

/// Main configuration loaded from morphflow.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MorphflowConfig {
    /// Compiler configuration
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Name given to the generated state machine
    #[serde(default = "default_state_machine_name")]
    pub state_machine_name: String,

    /// Name given to the trigger rule
    #[serde(default = "default_rule_name")]
    pub rule_name: String,

    /// Queue id receiving failed invocations; overrides the manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_letter_queue: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Artifact encoding
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_state_machine_name() -> String {
    DEFAULT_STATE_MACHINE_NAME.to_string()
}

fn default_rule_name() -> String {
    DEFAULT_RULE_NAME.to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            state_machine_name: default_state_machine_name(),
            rule_name: default_rule_name(),
            dead_letter_queue: None,
        }
    }
}

impl MorphflowConfig {
    /// Compiler options for `manifest`. The dead-letter queue configured
    /// here takes precedence over the one declared by the manifest and must
    /// name one of its queues.
    pub fn compiler_options(&self, manifest: &PipelineManifest) -> Result<CompilerOptions, AppError> {
        let dead_letter_queue: Option<QueueRef> = match &self.compiler.dead_letter_queue {
            Some(id) => Some(manifest.queue(id).ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ConfigError,
                    format!(
                        "compiler.dead_letter_queue '{}' is not declared by pipeline '{}'",
                        id,
                        manifest.name()
                    ),
                )
                .with_code("PIPE-CFG-002")
            })?),
            None => manifest.dead_letter_queue(),
        };
        Ok(CompilerOptions {
            state_machine_name: self.compiler.state_machine_name.clone(),
            rule_name: self.compiler.rule_name.clone(),
            dead_letter_queue,
        })
    }
}


pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
