#![allow(clippy::result_large_err)]

//! Typed pipeline algebra.
//!
//! A [`Morphism<A, B>`] describes a computation from `A` to `B` that starts
//! at an event source. Constructors never touch their inputs: each one
//! returns a new morphism holding the previous one as its upstream.
//!
//! ```ignore
//! let a = from::<Account>(&input, &[]);
//! let b = join(&get_user, a);
//! let c = join(&pick_category, b);   // Morphism<Account, Vec<Category>>
//! let d = lift(&pick_product, c);    // fan-out over categories
//! let e = lift(&mail_to, d);         // nested fan-out over products
//! let f = to_queue(&reply, e);       // Morphism<Account, Void>
//! ```

use crate::core::error::AppError;
use crate::core::pipeline::ast::{self, short_type_name, AstFrom, AstSeq, AstYield, Expr, Sink};
use crate::core::pipeline::function::{Function, DEFAULT_CONCURRENCY};
use crate::core::pipeline::resource::{EventBusRef, QueueRef};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Output type of a pipeline that ended in a sink. Uninhabited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Void {}

pub struct Morphism<A, B> {
    expr: Arc<Expr>,
    _types: PhantomData<fn(A) -> B>,
}

impl<A, B> Morphism<A, B> {
    fn of(expr: Expr) -> Self {
        Self::from_expr(Arc::new(expr))
    }

    fn from_expr(expr: Arc<Expr>) -> Self {
        Self {
            expr,
            _types: PhantomData,
        }
    }

    /// Lower the composition into the four-kind AST walked by visitors.
    pub fn ast(&self) -> Result<AstSeq, AppError> {
        ast::lower(&self.expr)
    }
}

impl<A, B> Clone for Morphism<A, B> {
    fn clone(&self) -> Self {
        Self::from_expr(Arc::clone(&self.expr))
    }
}

impl<A, B> fmt::Debug for Morphism<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Morphism")
            .field("input", &short_type_name::<A>())
            .field("output", &short_type_name::<B>())
            .finish()
    }
}

/// Start a pipeline reading `A` events from `bus`. Without explicit
/// categories the events are filtered by the short type name of `A`.
pub fn from<A>(bus: &EventBusRef, categories: &[&str]) -> Morphism<A, A> {
    Morphism::of(Expr::From(AstFrom {
        source: bus.clone(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        type_name: short_type_name::<A>(),
    }))
}

/// Compose `f: B -> C` after `m: A -> B`.
pub fn join<A, B, C>(f: &Function<B, C>, m: Morphism<A, B>) -> Morphism<A, C> {
    Morphism::of(Expr::Join {
        binding: f.bind(DEFAULT_CONCURRENCY),
        upstream: m.expr,
    })
}

/// Apply `f: B -> C` to every element of the list produced by `m`.
///
/// The result stays inside the fan-out context: further joins run per
/// element until the context is closed with [`unit`] or by a sink.
pub fn lift<A, B, C>(f: &Function<B, C>, m: Morphism<A, Vec<B>>) -> Morphism<A, C> {
    lift_p(DEFAULT_CONCURRENCY, f, m)
}

/// Same as [`lift`] with at most `n` elements processed simultaneously.
pub fn lift_p<A, B, C>(n: usize, f: &Function<B, C>, m: Morphism<A, Vec<B>>) -> Morphism<A, C> {
    Morphism::of(Expr::Lift {
        binding: f.bind(n),
        upstream: m.expr,
    })
}

/// Expose the elements of the list produced by `m` without transforming
/// them.
pub fn wrap<A, B>(m: Morphism<A, Vec<B>>) -> Morphism<A, B> {
    Morphism::of(Expr::Wrap { upstream: m.expr })
}

/// Close the innermost fan-out, collecting per-element results into a list.
pub fn unit<A, B>(m: Morphism<A, B>) -> Morphism<A, Vec<B>> {
    Morphism::of(Expr::Unit { upstream: m.expr })
}

/// Deliver the output of `m` to a queue.
pub fn to_queue<A, B>(queue: &QueueRef, m: Morphism<A, B>) -> Morphism<A, Void> {
    Morphism::of(Expr::Yield {
        target: AstYield {
            sink: Sink::Queue(queue.clone()),
            type_name: short_type_name::<B>(),
        },
        upstream: m.expr,
    })
}

/// Publish the output of `m` to an event bus. The first category, if any,
/// overrides the detail type; otherwise the short type name of `B` is used.
pub fn to_event_bus<A, B>(
    source: &str,
    bus: &EventBusRef,
    m: Morphism<A, B>,
    categories: &[&str],
) -> Morphism<A, Void> {
    Morphism::of(Expr::Yield {
        target: AstYield {
            sink: Sink::EventBus {
                bus: bus.clone(),
                source: source.to_string(),
                categories: categories.iter().map(|c| c.to_string()).collect(),
            },
            type_name: short_type_name::<B>(),
        },
        upstream: m.expr,
    })
}
