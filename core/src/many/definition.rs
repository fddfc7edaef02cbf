// rill/src/many/definition.rs

//! Contains the `Many<T>` struct definition and its value-sequence
//! constructors.
//!
//! Like `Single<T>`, a `Many<T>` is an immutable, strictly linear chain of
//! operator nodes; each node shares exactly one upstream through an `Arc`.

use crate::core::control::{FlowControl, OperatorKind};
use crate::core::eval::{Downstream, EvalCx};
use crate::error::RillResult;
use crate::sink::SinkShared;
use async_trait::async_trait;
use std::sync::Arc;

/// A cold, multi-value asynchronous pipeline.
///
/// Values are delivered to the consumer in production order. Once a terminal
/// signal (complete or error) fires, no further values follow.
pub struct Many<T> {
  pub(crate) op: Arc<ManyOp<T>>,
}

// Manual Clone: `Arc` sharing, no `T: Clone` requirement.
impl<T> Clone for Many<T> {
  fn clone(&self) -> Self {
    Self { op: Arc::clone(&self.op) }
  }
}

/// The closed set of node shapes a `Many` chain is built from.
pub(crate) enum ManyOp<T> {
  /// A fixed value sequence, re-produced for every subscription.
  Values(Arc<dyn Fn() -> Vec<T> + Send + Sync>),
  /// An externally-driven injection point (see `crate::sink`).
  Sink(Arc<SinkShared<T>>),
  /// A factory invoked freshly on each subscription, never at call time.
  Defer(Arc<dyn Fn() -> Many<T> + Send + Sync>),
  /// A composed stage: operators and the generator source.
  Stage(Box<dyn ManyStage<T>>),
}

/// One drive pass of a composed stage, pushing values into `down`.
#[async_trait]
pub(crate) trait ManyStage<T: Send>: Send + Sync {
  fn kind(&self) -> OperatorKind;
  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl>;
}

impl<T: Send + Sync + 'static> Many<T> {
  pub(crate) fn from_op(op: ManyOp<T>) -> Self {
    Self { op: Arc::new(op) }
  }

  pub(crate) fn stage(stage: impl ManyStage<T> + 'static) -> Self {
    Self::from_op(ManyOp::Stage(Box::new(stage)))
  }

  /// Emits the given values in order, then completes.
  pub fn from_values<I>(values: I) -> Self
  where
    T: Clone,
    I: IntoIterator<Item = T>,
  {
    let values: Vec<T> = values.into_iter().collect();
    Self::from_op(ManyOp::Values(Arc::new(move || values.clone())))
  }

  /// Creates a pipeline whose underlying producer is built freshly on each
  /// subscription.
  pub fn defer(factory: impl Fn() -> Many<T> + Send + Sync + 'static) -> Self {
    Self::from_op(ManyOp::Defer(Arc::new(factory)))
  }
}

impl Many<i32> {
  /// Emits `count` consecutive integers starting at `start`, then completes.
  pub fn range(start: i32, count: u32) -> Many<i32> {
    let values: Vec<i32> = (0..count).map(|i| start.wrapping_add(i as i32)).collect();
    Self::from_op(ManyOp::Values(Arc::new(move || values.clone())))
  }
}

impl<T: Send> std::fmt::Debug for Many<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let shape = match self.op.as_ref() {
      ManyOp::Values(_) => "values".to_string(),
      ManyOp::Sink(_) => "sink".to_string(),
      ManyOp::Defer(_) => "defer".to_string(),
      ManyOp::Stage(stage) => stage.kind().to_string(),
    };
    f.debug_struct("Many").field("op", &shape).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_reports_node_shape() {
    let values = Many::from_values(vec![1, 2]);
    assert_eq!(format!("{values:?}"), "Many { op: \"values\" }");

    // Stage-backed chains report their operator kind.
    let mapped = values.map(|value| value + 1);
    assert_eq!(format!("{mapped:?}"), "Many { op: \"map\" }");
  }
}
