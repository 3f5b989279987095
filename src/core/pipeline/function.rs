use crate::core::pipeline::resource::FunctionRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Default number of simultaneous invocations inside a fan-out.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Typed handle of an external function `A -> B`.
///
/// The type parameters exist only at compile time: they make `join`/`lift`
/// reject ill-typed compositions while the runtime value is just the
/// opaque [`FunctionRef`].
pub struct Function<A, B> {
    handle: FunctionRef,
    _types: PhantomData<fn(A) -> B>,
}

impl<A, B> Function<A, B> {
    pub fn new(handle: FunctionRef) -> Self {
        Self {
            handle,
            _types: PhantomData,
        }
    }

    pub fn handle(&self) -> &FunctionRef {
        &self.handle
    }

    pub(crate) fn bind(&self, concurrency: usize) -> Binding {
        Binding {
            function: self.handle.clone(),
            concurrency,
        }
    }
}

impl<A, B> Clone for Function<A, B> {
    fn clone(&self) -> Self {
        Self::new(self.handle.clone())
    }
}

impl<A, B> fmt::Debug for Function<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("handle", &self.handle)
            .finish()
    }
}

/// A function handle paired with the concurrency bound it runs with when
/// placed under a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub function: FunctionRef,
    pub concurrency: usize,
}

impl Binding {
    pub fn new(function: FunctionRef) -> Self {
        Self {
            function,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}
