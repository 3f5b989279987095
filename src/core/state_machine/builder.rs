#![allow(clippy::result_large_err)] // Compiler hooks return AppError to keep structured codes for callers.

use crate::core::error::AppError;
use crate::core::pipeline::ast::{AstFrom, AstMap, AstSeq, AstYield, Node, Sink};
use crate::core::pipeline::morphism::{Morphism, Void};
use crate::core::pipeline::resource::{EventBusRef, QueueRef};
use crate::core::pipeline::visitor::{walk, Visitor};
use crate::core::state_machine::graph::{
    CatchBranch, Chain, CompiledPipeline, EventPattern, State, StateKind, StateMachine,
    TriggerRule, ALL_ERRORS,
};
use crate::core::state_machine::naming::{
    fail_state_id, fan_out_state_id, forward_state_id, invoke_state_id, SINK_STATE_ID,
};
use crate::core::state_machine::paths::{DataPath, JsonPath};
use crate::core::types::ErrorCategory;
use std::collections::HashSet;
use tracing::{debug, info};

pub const DEFAULT_STATE_MACHINE_NAME: &str = "StateMachine";
pub const DEFAULT_RULE_NAME: &str = "Rule";

/// Settings fixed for the lifetime of a [`Compiler`].
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub state_machine_name: String,
    pub rule_name: String,
    /// Queue receiving `{input, error}` envelopes of failed invocations.
    pub dead_letter_queue: Option<QueueRef>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            state_machine_name: DEFAULT_STATE_MACHINE_NAME.to_string(),
            rule_name: DEFAULT_RULE_NAME.to_string(),
            dead_letter_queue: None,
        }
    }
}

impl CompilerOptions {
    pub fn with_dead_letter_queue(mut self, queue: QueueRef) -> Self {
        self.dead_letter_queue = Some(queue);
        self
    }
}

/// Turns pipelines into state machines. Each call to `compile` runs with a
/// fresh [`GraphBuilder`]; nothing carries over between compilations.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn compile<A>(&self, pipeline: &Morphism<A, Void>) -> Result<CompiledPipeline, AppError> {
        let ast = pipeline.ast()?;
        self.compile_ast(&ast)
    }

    pub fn compile_ast(&self, ast: &AstSeq) -> Result<CompiledPipeline, AppError> {
        let mut builder = GraphBuilder::new(self.options.clone());
        walk(ast, &mut builder)?;
        builder.finish()
    }
}

/// Visitor building the state chain of one pipeline.
///
/// `stack[0]` is the top-level chain; every open fan-out adds a level on top
/// and `names` accumulates the state ids emitted at the same level.
#[derive(Debug)]
pub struct GraphBuilder {
    options: CompilerOptions,
    stack: Vec<Chain>,
    names: Vec<String>,
    paths: DataPath,
    source: Option<EventBusRef>,
    filter: Vec<String>,
    emitted: HashSet<String>,
    output: Option<CompiledPipeline>,
}

impl GraphBuilder {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            stack: vec![Chain::new()],
            names: vec![String::new()],
            paths: DataPath::new(),
            source: None,
            filter: Vec::new(),
            emitted: HashSet::new(),
            output: None,
        }
    }

    /// Path the next emitted state will read its input from.
    pub fn input_path(&self) -> JsonPath {
        self.paths.current()
    }

    /// Number of open chain levels, the top-level chain included.
    pub fn open_levels(&self) -> usize {
        self.stack.len()
    }

    /// Artifact produced by `on_leave_morphism`.
    pub fn finish(self) -> Result<CompiledPipeline, AppError> {
        self.output.ok_or_else(|| {
            AppError::new(
                ErrorCategory::InternalError,
                "pipeline traversal did not complete",
            )
            .with_code("PIPE-INT-002")
            .with_suggestion("walk the whole pipeline before calling finish")
        })
    }

    fn append(&mut self, state: State) -> Result<(), AppError> {
        let Some(level) = self.stack.len().checked_sub(1) else {
            return Err(AppError::new(
                ErrorCategory::StructuralError,
                format!("malformed pipeline definition: no open chain for '{}'", state.id),
            )
            .with_code("PIPE-STRUCT-001"));
        };
        self.register(&state)?;
        debug!(
            state = %state.id,
            kind = state.kind.name(),
            input = %state.input_path,
            depth = level,
            "state appended"
        );
        self.names[level].push_str(&state.id);
        self.stack[level].push(state);
        Ok(())
    }

    fn register(&mut self, state: &State) -> Result<(), AppError> {
        let mut ids = vec![state.id.as_str()];
        for branch in &state.catch {
            ids.extend(branch.states.states.iter().map(|s| s.id.as_str()));
        }
        for id in ids {
            if !self.emitted.insert(id.to_string()) {
                let mut error = AppError::new(
                    ErrorCategory::StructuralError,
                    format!("duplicate state id '{}' in pipeline", id),
                )
                .with_code("PIPE-STRUCT-004")
                .with_suggestion("bind each function at most once per pipeline");
                error.add_context("state", id);
                return Err(error);
            }
        }
        Ok(())
    }

    fn catch_branch(&self, node: &AstMap, dead_letter: &QueueRef) -> CatchBranch {
        let function = &node.binding.function;
        let forward = State::new(
            forward_state_id(function),
            JsonPath::Root,
            StateKind::CatchAndForward {
                target: dead_letter.clone(),
            },
        );
        let fail = State::new(fail_state_id(function), JsonPath::Root, StateKind::Fail);
        CatchBranch {
            errors: vec![ALL_ERRORS.to_string()],
            result_path: JsonPath::ErrorResult,
            states: Chain::from(vec![forward, fail]),
        }
    }
}

impl Visitor for GraphBuilder {
    fn on_leave_morphism(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        if self.stack.len() != 1 {
            return Err(AppError::new(
                ErrorCategory::StructuralError,
                format!(
                    "malformed pipeline definition: {} fan-out level(s) left open",
                    self.stack.len().saturating_sub(1)
                ),
            )
            .with_code("PIPE-STRUCT-001"));
        }

        let source = self.source.clone().ok_or_else(|| {
            AppError::new(
                ErrorCategory::StructuralError,
                "undefined event source for pipeline",
            )
            .with_code("PIPE-STRUCT-002")
            .with_suggestion("start the pipeline with from")
        })?;

        let chain = self.stack.pop().unwrap_or_default();
        if chain.is_empty() {
            return Err(AppError::new(
                ErrorCategory::StructuralError,
                "malformed pipeline definition: no states emitted",
            )
            .with_code("PIPE-STRUCT-001"));
        }
        self.names.clear();

        let state_machine = StateMachine {
            name: self.options.state_machine_name.clone(),
            chain,
        };
        let rule = TriggerRule {
            name: self.options.rule_name.clone(),
            event_bus: source,
            pattern: EventPattern {
                detail_type: std::mem::take(&mut self.filter),
            },
            target: state_machine.name.clone(),
        };
        info!(
            state_machine = %state_machine.name,
            states = state_machine.chain.all_states().len(),
            start_at = state_machine.start_at().unwrap_or_default(),
            detail_type = ?rule.pattern.detail_type,
            "pipeline compiled"
        );
        self.output = Some(CompiledPipeline {
            state_machine,
            rule,
        });
        Ok(())
    }

    fn on_enter_from(&mut self, _depth: usize, node: &AstFrom) -> Result<(), AppError> {
        self.source = Some(node.source.clone());
        self.filter = if node.categories.is_empty() {
            vec![node.type_name.clone()]
        } else {
            node.categories.clone()
        };
        self.paths.enter_event();
        Ok(())
    }

    fn on_enter_map(&mut self, _depth: usize, node: &AstMap) -> Result<(), AppError> {
        if node.binding.concurrency == 0 {
            let mut error = AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "function '{}' has concurrency 0, expected at least 1",
                    node.binding.function.id
                ),
            )
            .with_code("PIPE-VAL-001");
            error.add_context("function", &node.binding.function.id);
            return Err(error);
        }

        let mut state = State::new(
            invoke_state_id(&node.binding.function),
            self.paths.current(),
            StateKind::Invoke {
                function: node.binding.function.clone(),
            },
        );
        if let Some(dead_letter) = &self.options.dead_letter_queue {
            state.catch.push(self.catch_branch(node, dead_letter));
        }
        self.append(state)
    }

    fn on_leave_map(&mut self, _depth: usize, _node: &AstMap) -> Result<(), AppError> {
        // invocation results are always wrapped in a response envelope
        self.paths.enter_result();
        Ok(())
    }

    fn on_enter_seq(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        self.stack.push(Chain::new());
        self.names.push(String::new());
        self.paths.push_scope();
        Ok(())
    }

    fn on_leave_seq(&mut self, depth: usize, node: &AstSeq) -> Result<(), AppError> {
        if self.stack.len() < 2 {
            return Err(AppError::new(
                ErrorCategory::StructuralError,
                "malformed pipeline definition: fan-out closed without being opened",
            )
            .with_code("PIPE-STRUCT-001"));
        }
        let iterator = self.stack.pop().unwrap_or_default();
        let accumulated = self.names.pop().unwrap_or_default();

        if iterator.is_empty() {
            // identity fan-out: the list stays untouched
            self.paths.collapse_scope();
            debug!(depth, "empty fan-out elided");
            return Ok(());
        }

        let concurrency = match node.nodes.iter().find(|child| !emits_nothing(child)) {
            Some(Node::Map(map)) => map.binding.concurrency,
            first => {
                let found = first.map(Node::kind).unwrap_or("nothing");
                return Err(AppError::new(
                    ErrorCategory::StructuralError,
                    format!("fan-out must start with a function invocation, found {}", found),
                )
                .with_code("PIPE-STRUCT-003")
                .with_suggestion("apply lift or join before nesting another fan-out"));
            }
        };

        let items_path = self.paths.pop_scope().unwrap_or(JsonPath::InvokeResult);
        let state = State::new(
            fan_out_state_id(&accumulated),
            JsonPath::Root,
            StateKind::ForEach {
                items_path,
                concurrency,
                iterator,
            },
        );
        self.append(state)?;
        self.paths.enter_result();
        Ok(())
    }

    fn on_enter_yield(&mut self, _depth: usize, node: &AstYield) -> Result<(), AppError> {
        let kind = match &node.sink {
            Sink::Queue(queue) => StateKind::SendToQueue {
                queue: queue.clone(),
            },
            Sink::EventBus {
                bus,
                source,
                categories,
            } => StateKind::SendToEventBus {
                bus: bus.clone(),
                source: source.clone(),
                detail_type: categories
                    .first()
                    .cloned()
                    .unwrap_or_else(|| node.type_name.clone()),
            },
        };
        self.append(State::new(SINK_STATE_ID, self.paths.current(), kind))
    }
}

/// A fan-out whose children are all elided fan-outs emits no state.
fn emits_nothing(node: &Node) -> bool {
    match node {
        Node::Seq(seq) => seq.nodes.iter().all(emits_nothing),
        _ => false,
    }
}
