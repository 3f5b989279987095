//! Opaque handles to externally provisioned resources.
//!
//! The compiler never inspects or calls these resources. It only records a
//! stable identifier (used to name states) and a URI that ends up in the
//! rendered definition.

use serde::{Deserialize, Serialize};

/// Deployed unit of computation (e.g. a serverless function).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRef {
    pub id: String,
    pub uri: String,
}

impl FunctionRef {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }
}

/// Event bus used either as the pipeline source or as a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventBusRef {
    pub id: String,
    pub uri: String,
}

impl EventBusRef {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }
}

/// Message queue used as a sink or as the dead-letter target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueRef {
    pub id: String,
    pub uri: String,
}

impl QueueRef {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }
}
