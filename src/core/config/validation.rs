#![allow(clippy::result_large_err)]

use super::MorphflowConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &MorphflowConfig) -> Result<(), AppError> {
        if !is_identifier(&config.compiler.state_machine_name) {
            return Err(invalid(format!(
                "compiler.state_machine_name '{}' must be 1-80 characters of [A-Za-z0-9_-]",
                config.compiler.state_machine_name
            )));
        }

        if !is_identifier(&config.compiler.rule_name) {
            return Err(invalid(format!(
                "compiler.rule_name '{}' must be 1-80 characters of [A-Za-z0-9_-]",
                config.compiler.rule_name
            )));
        }

        if let Some(queue) = &config.compiler.dead_letter_queue {
            if queue.trim().is_empty() {
                return Err(invalid("compiler.dead_letter_queue cannot be empty"));
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 80
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCategory::ConfigError, message).with_code("PIPE-CFG-003")
}
