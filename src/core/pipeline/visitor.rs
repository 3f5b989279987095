#![allow(clippy::result_large_err)] // Visitor hooks return AppError so a backend can attach codes and context.

use crate::core::error::AppError;
use crate::core::pipeline::ast::{AstFrom, AstMap, AstSeq, AstYield, Node};
use crate::core::types::ErrorCategory;

/// Traversal contract implemented by pipeline backends.
///
/// `depth` is the fan-out nesting level of the node: 0 for the top-level
/// chain, `n + 1` for the children of a `Seq` visited at depth `n`. Any
/// error aborts the walk immediately.
pub trait Visitor {
    fn on_enter_morphism(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        Ok(())
    }

    fn on_leave_morphism(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        Ok(())
    }

    fn on_enter_from(&mut self, _depth: usize, _node: &AstFrom) -> Result<(), AppError> {
        Ok(())
    }

    fn on_leave_from(&mut self, _depth: usize, _node: &AstFrom) -> Result<(), AppError> {
        Ok(())
    }

    fn on_enter_map(&mut self, _depth: usize, _node: &AstMap) -> Result<(), AppError> {
        Ok(())
    }

    fn on_leave_map(&mut self, _depth: usize, _node: &AstMap) -> Result<(), AppError> {
        Ok(())
    }

    fn on_enter_seq(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        Ok(())
    }

    fn on_leave_seq(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        Ok(())
    }

    fn on_enter_yield(&mut self, _depth: usize, _node: &AstYield) -> Result<(), AppError> {
        Ok(())
    }

    fn on_leave_yield(&mut self, _depth: usize, _node: &AstYield) -> Result<(), AppError> {
        Ok(())
    }
}

/// Walk a pipeline depth-first, from its source to its sink.
pub fn walk<V: Visitor + ?Sized>(root: &AstSeq, visitor: &mut V) -> Result<(), AppError> {
    visitor.on_enter_morphism(0, root)?;
    walk_nodes(0, &root.nodes, visitor)?;
    visitor.on_leave_morphism(0, root)
}

fn walk_nodes<V: Visitor + ?Sized>(
    depth: usize,
    nodes: &[Node],
    visitor: &mut V,
) -> Result<(), AppError> {
    let last = nodes.len().saturating_sub(1);
    for (index, node) in nodes.iter().enumerate() {
        match node {
            Node::From(from) => {
                if depth != 0 || index != 0 {
                    return Err(misplaced(node, depth, index));
                }
                visitor.on_enter_from(depth, from)?;
                visitor.on_leave_from(depth, from)?;
            }
            Node::Map(map) => {
                visitor.on_enter_map(depth, map)?;
                visitor.on_leave_map(depth, map)?;
            }
            Node::Seq(seq) => {
                visitor.on_enter_seq(depth, seq)?;
                walk_nodes(depth + 1, &seq.nodes, visitor)?;
                visitor.on_leave_seq(depth, seq)?;
            }
            Node::Yield(sink) => {
                if depth != 0 || index != last {
                    return Err(misplaced(node, depth, index));
                }
                visitor.on_enter_yield(depth, sink)?;
                visitor.on_leave_yield(depth, sink)?;
            }
        }
    }
    Ok(())
}

fn misplaced(node: &Node, depth: usize, index: usize) -> AppError {
    let mut error = AppError::new(
        ErrorCategory::ProtocolError,
        format!(
            "unexpected {} node at position {} of nesting level {}",
            node.kind(),
            index,
            depth
        ),
    )
    .with_code("PIPE-PROTO-001");
    error.add_context("node", node.kind());
    error
}
