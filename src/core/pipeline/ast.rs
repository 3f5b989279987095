#![allow(clippy::result_large_err)] // Lowering returns AppError directly to keep error codes attached.

use crate::core::error::AppError;
use crate::core::pipeline::function::Binding;
use crate::core::pipeline::resource::{EventBusRef, QueueRef};
use crate::core::types::ErrorCategory;
use serde::Serialize;
use std::sync::Arc;

/// Root of a pipeline: event source plus the category filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstFrom {
    pub source: EventBusRef,
    pub categories: Vec<String>,
    /// Short name of the type carried by the triggering events.
    pub type_name: String,
}

/// Single-step transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstMap {
    pub binding: Binding,
}

/// Ordered sequence of nodes. The top-level chain of a pipeline is an
/// `AstSeq`, and so is every fan-out sub-chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AstSeq {
    pub nodes: Vec<Node>,
}

/// Terminal sink of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstYield {
    pub sink: Sink,
    /// Short name of the type delivered to the sink.
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sink {
    Queue(QueueRef),
    EventBus {
        bus: EventBusRef,
        source: String,
        categories: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    From(AstFrom),
    Map(AstMap),
    Seq(AstSeq),
    Yield(AstYield),
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::From(_) => "From",
            Node::Map(_) => "Map",
            Node::Seq(_) => "Seq",
            Node::Yield(_) => "Yield",
        }
    }
}

/// Composition tree built by the algebra. Each variant except `From` owns
/// its upstream, so extending a morphism shares rather than copies it.
#[derive(Debug)]
pub(crate) enum Expr {
    From(AstFrom),
    Join { binding: Binding, upstream: Arc<Expr> },
    Lift { binding: Binding, upstream: Arc<Expr> },
    Wrap { upstream: Arc<Expr> },
    Unit { upstream: Arc<Expr> },
    Yield { target: AstYield, upstream: Arc<Expr> },
}

impl Expr {
    fn upstream(&self) -> Option<&Expr> {
        match self {
            Expr::From(_) => None,
            Expr::Join { upstream, .. }
            | Expr::Lift { upstream, .. }
            | Expr::Wrap { upstream }
            | Expr::Unit { upstream }
            | Expr::Yield { upstream, .. } => Some(upstream.as_ref()),
        }
    }
}

/// Flatten a composition tree into the four-kind AST.
///
/// `Lift` and `Wrap` open a fan-out level, `Unit` closes the innermost one
/// and `Yield` closes every level still open before appending the sink.
pub(crate) fn lower(expr: &Expr) -> Result<AstSeq, AppError> {
    let mut chain = Vec::new();
    let mut cursor = Some(expr);
    while let Some(current) = cursor {
        chain.push(current);
        cursor = current.upstream();
    }
    chain.reverse();

    let mut levels: Vec<Vec<Node>> = vec![Vec::new()];
    for expr in chain {
        match expr {
            Expr::From(from) => innermost(&mut levels).push(Node::From(from.clone())),
            Expr::Join { binding, .. } => innermost(&mut levels).push(Node::Map(AstMap {
                binding: binding.clone(),
            })),
            Expr::Lift { binding, .. } => levels.push(vec![Node::Map(AstMap {
                binding: binding.clone(),
            })]),
            Expr::Wrap { .. } => levels.push(Vec::new()),
            Expr::Unit { .. } => {
                if levels.len() == 1 {
                    return Err(AppError::new(
                        ErrorCategory::CompositionError,
                        "unit applied outside of a fan-out context",
                    )
                    .with_code("PIPE-COMP-002")
                    .with_suggestion("use unit only after lift or wrap"));
                }
                close_level(&mut levels);
            }
            Expr::Yield { target, .. } => {
                while levels.len() > 1 {
                    close_level(&mut levels);
                }
                innermost(&mut levels).push(Node::Yield(target.clone()));
            }
        }
    }

    let terminated = levels.len() == 1 && matches!(levels[0].last(), Some(Node::Yield(_)));
    if !terminated {
        return Err(AppError::new(
            ErrorCategory::CompositionError,
            "pipeline has no terminal sink",
        )
        .with_code("PIPE-COMP-003")
        .with_suggestion("finish the pipeline with to_queue or to_event_bus"));
    }

    let nodes = levels.pop().unwrap_or_default();
    Ok(AstSeq { nodes })
}

fn innermost(levels: &mut Vec<Vec<Node>>) -> &mut Vec<Node> {
    if levels.is_empty() {
        levels.push(Vec::new());
    }
    let last = levels.len() - 1;
    &mut levels[last]
}

fn close_level(levels: &mut Vec<Vec<Node>>) {
    if let Some(nodes) = levels.pop() {
        innermost(levels).push(Node::Seq(AstSeq { nodes }));
    }
}

/// Type name without module paths, e.g. `Vec<Product>` for
/// `alloc::vec::Vec<shop::Product>`.
pub fn short_type_name<T: ?Sized>() -> String {
    shorten(std::any::type_name::<T>())
}

fn shorten(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
