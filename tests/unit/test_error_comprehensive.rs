use morphflow::core::error::{AppError, DefaultErrorReporter, ErrorReporter};
use morphflow::core::types::{ErrorCategory, ErrorSeverity};

#[test]
fn test_error_creation_all_categories() {
    let categories = vec![
        ErrorCategory::CompositionError,
        ErrorCategory::ProtocolError,
        ErrorCategory::StructuralError,
        ErrorCategory::ValidationError,
        ErrorCategory::ConfigError,
        ErrorCategory::SerializationError,
        ErrorCategory::IoError,
        ErrorCategory::InternalError,
        ErrorCategory::Unknown,
    ];

    for category in categories {
        let error = AppError::new(category, "test message");
        assert_eq!(error.category, category);
        assert_eq!(error.message, "test message");
        assert_eq!(error.context.len(), 0);
        assert_eq!(error.recovery_suggestions.len(), 0);
        assert!(error.occurred_at <= chrono::Utc::now());
        assert!(error.source.is_none());
    }
}

#[test]
fn test_error_severity_mapping() {
    let test_cases = vec![
        (ErrorCategory::CompositionError, ErrorSeverity::Error),
        (ErrorCategory::ProtocolError, ErrorSeverity::Error),
        (ErrorCategory::StructuralError, ErrorSeverity::Error),
        (ErrorCategory::ValidationError, ErrorSeverity::Error),
        (ErrorCategory::ConfigError, ErrorSeverity::Error),
        (ErrorCategory::SerializationError, ErrorSeverity::Error),
        (ErrorCategory::IoError, ErrorSeverity::Error),
        (ErrorCategory::InternalError, ErrorSeverity::Error),
        (ErrorCategory::Unknown, ErrorSeverity::Info),
    ];

    for (category, expected_severity) in test_cases {
        let error = AppError::new(category, "test");
        assert_eq!(error.severity(), expected_severity);
    }
}

#[test]
fn test_error_add_context() {
    let mut error = AppError::new(ErrorCategory::StructuralError, "duplicate state");

    error.add_context("state", "MapAtoU");
    error.add_context("depth", "1");

    assert_eq!(error.context.get("state"), Some(&"MapAtoU".to_string()));
    assert_eq!(error.context.get("depth"), Some(&"1".to_string()));
    assert_eq!(error.context.len(), 2);
}

#[test]
fn test_error_display() {
    let mut error =
        AppError::new(ErrorCategory::CompositionError, "type mismatch").with_code("PIPE-COMP-001");
    error.add_context("step", "3");

    let display = format!("{}", error);
    assert!(display.contains("PIPE-COMP-001"));
    assert!(display.contains("CompositionError"));
    assert!(display.contains("type mismatch"));
    assert!(display.contains("step"));
}

#[test]
fn test_error_default_code_is_unique() {
    let first = AppError::new(ErrorCategory::Unknown, "a");
    let second = AppError::new(ErrorCategory::Unknown, "a");
    assert!(first.code.starts_with("PIPE-ERR-"));
    assert_ne!(first.code, second.code);
}

#[test]
fn test_error_suggestions_and_context_builder() {
    let error = AppError::new(ErrorCategory::StructuralError, "undefined event source")
        .with_suggestion("start the pipeline with from")
        .with_context("compile");
    assert_eq!(error.recovery_suggestions, vec!["start the pipeline with from"]);
    assert_eq!(error.context.get("context"), Some(&"compile".to_string()));
}

#[test]
fn test_error_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing manifest");
    let error: AppError = io.into();
    assert_eq!(error.category, ErrorCategory::IoError);
    assert_eq!(error.code, "PIPE-IO-001");
    assert_eq!(error.exit_code(), 1);
    assert!(error.source.is_some());
    assert!(error.to_string().contains("Caused by: missing manifest"));
}

#[test]
fn test_error_from_anyhow() {
    let error: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(error.category, ErrorCategory::InternalError);
    assert_eq!(error.code, "PIPE-INT-001");
    assert_eq!(error.message, "boom");
}

#[test]
fn test_caused_by_keeps_cause() {
    let error = AppError::new(ErrorCategory::SerializationError, "parse failed")
        .caused_by(anyhow::anyhow!("bad yaml"));
    assert_eq!(error.source.as_ref().map(|s| s.to_string()), Some("bad yaml".to_string()));
}

#[test]
fn test_definition_errors_exit_with_two() {
    for category in [
        ErrorCategory::CompositionError,
        ErrorCategory::ProtocolError,
        ErrorCategory::StructuralError,
        ErrorCategory::ValidationError,
    ] {
        assert!(category.is_definition_error());
        assert_eq!(AppError::new(category, "bad pipeline").exit_code(), 2);
    }
    assert!(!ErrorCategory::ConfigError.is_definition_error());
}

#[test]
fn test_reporter_does_not_panic() {
    let reporter = DefaultErrorReporter::new();
    let error = AppError::new(ErrorCategory::ConfigError, "bad config")
        .with_code("PIPE-CFG-001")
        .with_suggestion("fix morphflow.toml");
    reporter.report_error(&error);
    reporter.report_warning("shared dead-letter queue", Some("reply".to_string()));
}
