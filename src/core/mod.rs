pub mod config;
pub mod error;
pub mod pipeline;
pub mod state_machine;
pub mod types;

pub use config::{ConfigLoader, ConfigValidator, MorphflowConfig};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use pipeline::{
    from, join, lift, lift_p, to_event_bus, to_queue, unit, wrap, EventBusRef, Function,
    FunctionRef, Morphism, PipelineManifest, QueueRef, Void,
};
pub use state_machine::{CompiledPipeline, Compiler, CompilerOptions};
pub use types::*;
