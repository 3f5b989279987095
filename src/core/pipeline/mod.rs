//! Typed pipeline algebra, its four-kind AST and the traversal protocol.

pub mod ast;
pub mod function;
pub mod manifest;
pub mod morphism;
pub mod resource;
pub mod visitor;

pub use ast::{AstFrom, AstMap, AstSeq, AstYield, Node, Sink};
pub use function::{Binding, Function};
pub use manifest::PipelineManifest;
pub use morphism::{from, join, lift, lift_p, to_event_bus, to_queue, unit, wrap, Morphism, Void};
pub use resource::{EventBusRef, FunctionRef, QueueRef};
pub use visitor::{walk, Visitor};
