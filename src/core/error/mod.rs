//! Structured error carried from the algebra up to the CLI.
//!
//! Every failure raised while lowering, compiling or loading a pipeline is an
//! [`AppError`] with a stable `PIPE-*` code, so callers can match on the code
//! rather than on message text.

use crate::core::types::{ErrorCategory, ErrorSeverity};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    /// Pipeline coordinates of the failure (state id, function, step...).
    pub context: BTreeMap<String, String>,
    pub recovery_suggestions: Vec<String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    /// New error with a unique placeholder code; pipeline failures replace
    /// it through [`AppError::with_code`].
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        AppError {
            category,
            severity: category.severity(),
            code: format!("PIPE-ERR-{}", &id[..8]),
            message: message.into(),
            context: BTreeMap::new(),
            recovery_suggestions: Vec::new(),
            occurred_at: Utc::now(),
            source: None,
        }
    }

    pub fn caused_by<E: Into<anyhow::Error>>(mut self, source: E) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_context<T: Into<String>>(mut self, context: T) -> Self {
        self.context.insert("context".to_string(), context.into());
        self
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_suggestion<T: Into<String>>(mut self, suggestion: T) -> Self {
        self.recovery_suggestions.push(suggestion.into());
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn add_context(&mut self, key: &str, value: &str) {
        self.context.insert(key.to_string(), value.to_string());
    }

    /// Process exit status for this failure: 2 when the pipeline definition
    /// is at fault, 3 for configuration, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.category.is_definition_error() {
            2
        } else if self.category == ErrorCategory::ConfigError {
            3
        } else {
            1
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if !self.context.is_empty() {
            let entries: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            write!(f, " ({})", entries.join(", "))?;
        }
        if let Some(source) = &self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::new(ErrorCategory::InternalError, e.to_string())
            .with_code("PIPE-INT-001")
            .caused_by(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::new(ErrorCategory::IoError, e.to_string())
            .with_code("PIPE-IO-001")
            .with_suggestion("check that the manifest and output paths exist and are writable")
            .caused_by(e)
    }
}

pub trait ErrorReporter {
    fn report_error(&self, error: &AppError);
    fn report_warning(&self, message: &str, context: Option<String>);
}

/// Writes errors to stderr, one detail per line.
#[derive(Debug, Default)]
pub struct DefaultErrorReporter;

impl DefaultErrorReporter {
    pub fn new() -> Self {
        DefaultErrorReporter
    }
}

impl ErrorReporter for DefaultErrorReporter {
    fn report_error(&self, error: &AppError) {
        eprintln!("[ERROR] {}: {}", error.code, error.message);
        for (key, value) in &error.context {
            eprintln!("  {}: {}", key, value);
        }
        for suggestion in &error.recovery_suggestions {
            eprintln!("  Hint: {}", suggestion);
        }
        if let Some(source) = &error.source {
            eprintln!("  Caused by: {}", source);
        }
    }

    fn report_warning(&self, message: &str, context: Option<String>) {
        eprintln!("[WARNING] {}", message);
        if let Some(ctx) = context {
            eprintln!("  {}", ctx);
        }
    }
}
