//! Backend lowering pipelines into a state-machine graph and trigger rule.

pub mod builder;
pub mod definition;
pub mod dot;
pub mod graph;
pub mod naming;
pub mod paths;

pub use builder::{Compiler, CompilerOptions, GraphBuilder};
pub use definition::render;
pub use dot::pipeline_to_dot;
pub use graph::{
    CatchBranch, Chain, CompiledPipeline, EventPattern, State, StateKind, StateMachine,
    TriggerRule,
};
pub use paths::{DataPath, JsonPath};
