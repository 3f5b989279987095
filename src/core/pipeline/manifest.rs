#![allow(clippy::result_large_err)] // Manifest APIs return AppError to preserve structured validation context without boxing.

//! Declarative pipelines read from YAML.
//!
//! The manifest names every resource once and lists the composition steps.
//! Building it performs, step by step, the type checks the typed algebra
//! gets from the Rust compiler, and yields the same AST.

use crate::core::error::AppError;
use crate::core::pipeline::ast::{lower, AstFrom, AstSeq, AstYield, Expr, Sink};
use crate::core::pipeline::function::{Binding, DEFAULT_CONCURRENCY};
use crate::core::pipeline::resource::{EventBusRef, FunctionRef, QueueRef};
use crate::core::types::ErrorCategory;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const SUPPORTED_VERSION: &str = "1.0";

/// Root document of a pipeline manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineManifest {
    pub version: String,
    pub pipeline: PipelineDefinition,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default)]
    pub event_buses: IndexMap<String, ResourceDefinition>,
    #[serde(default)]
    pub queues: IndexMap<String, ResourceDefinition>,
    #[serde(default)]
    pub functions: IndexMap<String, FunctionDefinition>,
    #[serde(default)]
    pub dead_letter_queue: Option<String>,
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceDefinition {
    pub uri: String,
}

/// Function declaration. `input`/`output` are type names; `[T]` is a list
/// of `T`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionDefinition {
    pub uri: String,
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    From(FromStep),
    Join(String),
    Lift(LiftStep),
    Wrap,
    Unit,
    ToQueue(String),
    ToEventBus(EventBusStep),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::From(_) => "from",
            Step::Join(_) => "join",
            Step::Lift(_) => "lift",
            Step::Wrap => "wrap",
            Step::Unit => "unit",
            Step::ToQueue(_) => "to_queue",
            Step::ToEventBus(_) => "to_event_bus",
        }
    }

    fn is_sink(&self) -> bool {
        matches!(self, Step::ToQueue(_) | Step::ToEventBus(_))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FromStep {
    pub bus: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LiftStep {
    Function(String),
    Bounded {
        function: String,
        #[serde(default)]
        concurrency: Option<usize>,
    },
}

impl LiftStep {
    fn function(&self) -> &str {
        match self {
            LiftStep::Function(id) => id,
            LiftStep::Bounded { function, .. } => function,
        }
    }

    fn concurrency(&self) -> usize {
        match self {
            LiftStep::Function(_) => DEFAULT_CONCURRENCY,
            LiftStep::Bounded { concurrency, .. } => concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventBusStep {
    pub bus: String,
    pub source: String,
    /// Detail type override; the first entry wins, as with the typed sink.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Type of the value flowing between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
}

impl TypeRef {
    /// Parse `Name`, `[T]` or `Vec<T>`.
    pub fn parse(text: &str) -> TypeRef {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            return TypeRef::List(Box::new(TypeRef::parse(inner)));
        }
        if let Some(inner) = text.strip_prefix("Vec<").and_then(|t| t.strip_suffix('>')) {
            return TypeRef::List(Box::new(TypeRef::parse(inner)));
        }
        TypeRef::Named(text.to_string())
    }

    fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::List(inner) => Some(inner),
            TypeRef::Named(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// Failures detected while reading or building a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse manifest: {0}")]
    Parse(String),
    #[error("unsupported manifest version {found}, expected {}", SUPPORTED_VERSION)]
    UnsupportedVersion { found: String },
    #[error("pipeline name must not be empty")]
    EmptyName,
    #[error("pipeline must define at least one step")]
    NoSteps,
    #[error("step {step}: unknown {kind} '{id}'")]
    UnknownResource {
        step: usize,
        kind: &'static str,
        id: String,
    },
    #[error("dead_letter_queue '{0}' is not a declared queue")]
    UnknownDeadLetterQueue(String),
    #[error("step {step}: pipeline must start with from, found {found}")]
    MissingSource { step: usize, found: &'static str },
    #[error("step {step}: {found} is only allowed as the first step")]
    MisplacedSource { step: usize, found: &'static str },
    #[error("step {step}: {found} after the terminal sink")]
    StepAfterSink { step: usize, found: &'static str },
    #[error("pipeline must end with to_queue or to_event_bus")]
    MissingSink,
    #[error("step {step}: {function} expects {expected}, got {found}")]
    TypeMismatch {
        step: usize,
        function: String,
        expected: String,
        found: String,
    },
    #[error("step {step}: {operation} requires a list, got {found}")]
    NotAList {
        step: usize,
        operation: &'static str,
        found: String,
    },
    #[error("step {step}: unit applied outside of a fan-out context")]
    UnitOutsideFanOut { step: usize },
}

impl ManifestError {
    pub fn code(&self) -> &'static str {
        match self {
            ManifestError::Read { .. } => "PIPE-MAN-001",
            ManifestError::Parse(_) => "PIPE-MAN-002",
            ManifestError::UnsupportedVersion { .. } => "PIPE-MAN-003",
            ManifestError::EmptyName | ManifestError::NoSteps => "PIPE-MAN-004",
            ManifestError::UnknownResource { .. } | ManifestError::UnknownDeadLetterQueue(_) => {
                "PIPE-MAN-005"
            }
            ManifestError::MissingSource { .. }
            | ManifestError::MisplacedSource { .. }
            | ManifestError::StepAfterSink { .. } => "PIPE-MAN-006",
            ManifestError::MissingSink => "PIPE-COMP-003",
            ManifestError::TypeMismatch { .. } | ManifestError::NotAList { .. } => "PIPE-COMP-001",
            ManifestError::UnitOutsideFanOut { .. } => "PIPE-COMP-002",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ManifestError::Read { .. } => ErrorCategory::IoError,
            ManifestError::Parse(_) => ErrorCategory::SerializationError,
            ManifestError::TypeMismatch { .. }
            | ManifestError::NotAList { .. }
            | ManifestError::UnitOutsideFanOut { .. }
            | ManifestError::MissingSink => ErrorCategory::CompositionError,
            _ => ErrorCategory::ValidationError,
        }
    }
}

impl From<ManifestError> for AppError {
    fn from(err: ManifestError) -> Self {
        let code = err.code();
        AppError::new(err.category(), err.to_string()).with_code(code)
    }
}

impl PipelineManifest {
    /// Load and validate a manifest from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|err| ManifestError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, AppError> {
        let manifest: PipelineManifest =
            serde_yaml::from_str(text).map_err(|err| ManifestError::Parse(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn name(&self) -> &str {
        &self.pipeline.name
    }

    /// Structural checks that do not need type information.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.version != SUPPORTED_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: self.version.clone(),
            }
            .into());
        }
        if self.pipeline.name.trim().is_empty() {
            return Err(ManifestError::EmptyName.into());
        }
        if self.pipeline.steps.is_empty() {
            return Err(ManifestError::NoSteps.into());
        }
        if let Some(id) = &self.pipeline.dead_letter_queue {
            if !self.pipeline.queues.contains_key(id) {
                return Err(ManifestError::UnknownDeadLetterQueue(id.clone()).into());
            }
        }

        for (index, step) in self.pipeline.steps.iter().enumerate() {
            let position = index + 1;
            match (index, step) {
                (0, Step::From(_)) => {}
                (0, other) => {
                    return Err(ManifestError::MissingSource {
                        step: position,
                        found: other.name(),
                    }
                    .into())
                }
                (_, Step::From(_)) => {
                    return Err(ManifestError::MisplacedSource {
                        step: position,
                        found: step.name(),
                    }
                    .into())
                }
                _ => {}
            }
            if index + 1 < self.pipeline.steps.len() && step.is_sink() {
                let next = &self.pipeline.steps[index + 1];
                return Err(ManifestError::StepAfterSink {
                    step: position + 1,
                    found: next.name(),
                }
                .into());
            }
            self.check_references(position, step)?;
        }

        if !self.pipeline.steps.last().is_some_and(Step::is_sink) {
            return Err(ManifestError::MissingSink.into());
        }
        Ok(())
    }

    fn check_references(&self, step: usize, value: &Step) -> Result<(), ManifestError> {
        let unknown = |kind: &'static str, id: &str| ManifestError::UnknownResource {
            step,
            kind,
            id: id.to_string(),
        };
        match value {
            Step::From(from) if !self.pipeline.event_buses.contains_key(&from.bus) => {
                Err(unknown("event bus", &from.bus))
            }
            Step::Join(id) if !self.pipeline.functions.contains_key(id) => {
                Err(unknown("function", id))
            }
            Step::Lift(lift) if !self.pipeline.functions.contains_key(lift.function()) => {
                Err(unknown("function", lift.function()))
            }
            Step::ToQueue(id) if !self.pipeline.queues.contains_key(id) => {
                Err(unknown("queue", id))
            }
            Step::ToEventBus(sink) if !self.pipeline.event_buses.contains_key(&sink.bus) => {
                Err(unknown("event bus", &sink.bus))
            }
            _ => Ok(()),
        }
    }

    /// Queue declared as the dead-letter target, if any.
    pub fn dead_letter_queue(&self) -> Option<QueueRef> {
        self.pipeline
            .dead_letter_queue
            .as_deref()
            .and_then(|id| self.queue(id))
    }

    pub fn queue(&self, id: &str) -> Option<QueueRef> {
        self.pipeline
            .queues
            .get(id)
            .map(|queue| QueueRef::new(id, &queue.uri))
    }

    fn event_bus(&self, id: &str) -> Option<EventBusRef> {
        self.pipeline
            .event_buses
            .get(id)
            .map(|bus| EventBusRef::new(id, &bus.uri))
    }

    /// Type-check the steps and lower them into the pipeline AST.
    pub fn build(&self) -> Result<AstSeq, AppError> {
        self.validate()?;
        let mut checker = TypeChecker::default();
        let mut expr: Option<Arc<Expr>> = None;

        for (index, step) in self.pipeline.steps.iter().enumerate() {
            let position = index + 1;
            let next = self.step_expr(position, step, &mut checker, expr.take())?;
            debug!(step = position, kind = step.name(), flowing = %checker.current, "manifest step typed");
            expr = Some(Arc::new(next));
        }

        let expr = expr.ok_or(ManifestError::NoSteps)?;
        lower(&expr)
    }

    fn step_expr(
        &self,
        position: usize,
        step: &Step,
        checker: &mut TypeChecker,
        upstream: Option<Arc<Expr>>,
    ) -> Result<Expr, AppError> {
        let unknown = |kind: &'static str, id: &str| ManifestError::UnknownResource {
            step: position,
            kind,
            id: id.to_string(),
        };

        let expr = match (step, upstream) {
            (Step::From(from), _) => {
                let source = self
                    .event_bus(&from.bus)
                    .ok_or_else(|| unknown("event bus", &from.bus))?;
                checker.current = TypeRef::parse(&from.type_name);
                Expr::From(AstFrom {
                    source,
                    categories: from.categories.clone(),
                    type_name: checker.current.to_string(),
                })
            }
            (_, None) => {
                return Err(ManifestError::MissingSource {
                    step: position,
                    found: step.name(),
                }
                .into())
            }
            (Step::Join(id), Some(upstream)) => {
                let function = self.function(id).ok_or_else(|| unknown("function", id))?;
                checker.join(position, id, function)?;
                Expr::Join {
                    binding: Binding::new(FunctionRef::new(id, &function.uri)),
                    upstream,
                }
            }
            (Step::Lift(lift), Some(upstream)) => {
                let id = lift.function();
                let function = self.function(id).ok_or_else(|| unknown("function", id))?;
                checker.lift(position, id, function)?;
                Expr::Lift {
                    binding: Binding::new(FunctionRef::new(id, &function.uri))
                        .with_concurrency(lift.concurrency()),
                    upstream,
                }
            }
            (Step::Wrap, Some(upstream)) => {
                checker.wrap(position)?;
                Expr::Wrap { upstream }
            }
            (Step::Unit, Some(upstream)) => {
                checker.unit(position)?;
                Expr::Unit { upstream }
            }
            (Step::ToQueue(id), Some(upstream)) => {
                let queue = self.queue(id).ok_or_else(|| unknown("queue", id))?;
                Expr::Yield {
                    target: AstYield {
                        sink: Sink::Queue(queue),
                        type_name: checker.current.to_string(),
                    },
                    upstream,
                }
            }
            (Step::ToEventBus(sink), Some(upstream)) => {
                let bus = self
                    .event_bus(&sink.bus)
                    .ok_or_else(|| unknown("event bus", &sink.bus))?;
                Expr::Yield {
                    target: AstYield {
                        sink: Sink::EventBus {
                            bus,
                            source: sink.source.clone(),
                            categories: sink.categories.clone(),
                        },
                        type_name: checker.current.to_string(),
                    },
                    upstream,
                }
            }
        };
        Ok(expr)
    }

    fn function(&self, id: &str) -> Option<&FunctionDefinition> {
        self.pipeline.functions.get(id)
    }
}

/// Type flowing out of the last step plus the number of open fan-outs.
#[derive(Debug)]
struct TypeChecker {
    current: TypeRef,
    open: usize,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self {
            current: TypeRef::Named(String::new()),
            open: 0,
        }
    }
}

impl TypeChecker {
    fn join(
        &mut self,
        step: usize,
        id: &str,
        function: &FunctionDefinition,
    ) -> Result<(), ManifestError> {
        let input = TypeRef::parse(&function.input);
        if input != self.current {
            return Err(ManifestError::TypeMismatch {
                step,
                function: id.to_string(),
                expected: input.to_string(),
                found: self.current.to_string(),
            });
        }
        self.current = TypeRef::parse(&function.output);
        Ok(())
    }

    fn lift(
        &mut self,
        step: usize,
        id: &str,
        function: &FunctionDefinition,
    ) -> Result<(), ManifestError> {
        let element = self.element(step, "lift")?;
        let input = TypeRef::parse(&function.input);
        if input != element {
            return Err(ManifestError::TypeMismatch {
                step,
                function: id.to_string(),
                expected: input.to_string(),
                found: element.to_string(),
            });
        }
        self.current = TypeRef::parse(&function.output);
        self.open += 1;
        Ok(())
    }

    fn wrap(&mut self, step: usize) -> Result<(), ManifestError> {
        self.current = self.element(step, "wrap")?;
        self.open += 1;
        Ok(())
    }

    fn unit(&mut self, step: usize) -> Result<(), ManifestError> {
        if self.open == 0 {
            return Err(ManifestError::UnitOutsideFanOut { step });
        }
        self.open -= 1;
        let element = std::mem::replace(&mut self.current, TypeRef::Named(String::new()));
        self.current = TypeRef::List(Box::new(element));
        Ok(())
    }

    fn element(&self, step: usize, operation: &'static str) -> Result<TypeRef, ManifestError> {
        self.current
            .element()
            .cloned()
            .ok_or_else(|| ManifestError::NotAList {
                step,
                operation,
                found: self.current.to_string(),
            })
    }
}
