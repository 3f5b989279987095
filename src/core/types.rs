use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Ill-typed or otherwise invalid composition of morphisms.
    CompositionError,
    /// A node was visited in a position the traversal contract forbids.
    ProtocolError,
    /// The pipeline shape cannot be turned into a state machine.
    StructuralError,
    ValidationError,
    ConfigError,
    SerializationError,
    IoError,
    InternalError,
    Unknown,
}

impl ErrorCategory {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCategory::Unknown => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// The pipeline itself is wrong, as opposed to its environment.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            ErrorCategory::CompositionError
                | ErrorCategory::ProtocolError
                | ErrorCategory::StructuralError
                | ErrorCategory::ValidationError
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}

/// Output encoding of compiled artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "invalid output format '{}'; supported values are json, yaml",
                value
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
