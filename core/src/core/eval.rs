// rill/src/core/eval.rs

//! Crate-private evaluation plumbing shared by both pipeline kinds.
//!
//! One `EvalCx` exists per subscription and carries the handle that every
//! stage consults for cancellation. `Downstream` is the push seam between a
//! producer and the stage (or consumer) below it; control flows back upstream
//! through the `FlowControl` it returns.

use crate::core::control::FlowControl;
use crate::core::subscription::SubscriptionHandle;
use crate::error::RillResult;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-subscription evaluation context.
pub(crate) struct EvalCx {
  pub(crate) handle: SubscriptionHandle,
}

impl EvalCx {
  pub(crate) fn new(handle: SubscriptionHandle) -> Self {
    Self { handle }
  }
}

/// The stage directly below a producer in an operator chain.
///
/// `next` may suspend (a `flat_map` inner pipeline, a delay); the returned
/// `FlowControl` tells the producer whether to keep emitting.
#[async_trait]
pub(crate) trait Downstream<T: Send>: Send {
  async fn next(&mut self, cx: &EvalCx, value: T) -> RillResult<FlowControl>;
}
