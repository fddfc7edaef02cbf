// rill/src/single/definition.rs

//! Contains the `Single<T>` struct definition and its constructors.
//!
//! A `Single<T>` is an immutable description of a computation that, once
//! subscribed, yields at most one value (or an empty completion, or an
//! error). The chain is a strictly linear structure: each operator node
//! shares exactly one upstream through an `Arc`, so applying an operator
//! never mutates the pipeline it was called on and cloning is cheap.

use crate::core::control::OperatorKind;
use crate::core::eval::EvalCx;
use crate::error::RillResult;
use async_trait::async_trait;
use std::sync::Arc;

/// A cold, single-value asynchronous pipeline.
///
/// Nothing runs at construction time: user closures are only evaluated when
/// a consumer subscribes. Subscribing twice re-runs the whole chain.
pub struct Single<T> {
  pub(crate) op: Arc<SingleOp<T>>,
}

// Manual Clone: `Arc` sharing, no `T: Clone` requirement.
impl<T> Clone for Single<T> {
  fn clone(&self) -> Self {
    Self { op: Arc::clone(&self.op) }
  }
}

/// The closed set of node shapes a `Single` chain is built from.
///
/// Type-changing operators live behind the crate-private [`SingleStage`]
/// trait (the operator kind stays observable through `kind()`); the trait is
/// not exported, so the set of stages is closed at the crate boundary.
pub(crate) enum SingleOp<T> {
  /// An immediately-available value, re-produced for every subscription.
  Just(Arc<dyn Fn() -> T + Send + Sync>),
  /// A side-effecting action run at subscription time; completes empty.
  /// Only constructed with `T = ()`.
  Action(Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>),
  /// A factory invoked freshly on each subscription, never at call time.
  Defer(Arc<dyn Fn() -> Single<T> + Send + Sync>),
  /// A composed operator stage wrapping a (possibly differently-typed)
  /// upstream pipeline.
  Stage(Box<dyn SingleStage<T>>),
}

/// One evaluation pass of a composed operator over its upstream.
#[async_trait]
pub(crate) trait SingleStage<T>: Send + Sync {
  fn kind(&self) -> OperatorKind;
  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>>;
}

impl<T: Send + Sync + 'static> Single<T> {
  pub(crate) fn from_op(op: SingleOp<T>) -> Self {
    Self { op: Arc::new(op) }
  }

  pub(crate) fn stage(stage: impl SingleStage<T> + 'static) -> Self {
    Self::from_op(SingleOp::Stage(Box::new(stage)))
  }

  /// Creates an immediately-resolved pipeline around `value`.
  ///
  /// The value is cloned out once per subscription (cold semantics).
  pub fn just(value: T) -> Self
  where
    T: Clone,
  {
    Self::from_op(SingleOp::Just(Arc::new(move || value.clone())))
  }

  /// Creates a pipeline whose underlying producer is built freshly on each
  /// subscription. The factory never runs at construction time, so a
  /// producer whose construction can fail does not bypass error channeling.
  pub fn defer(factory: impl Fn() -> Single<T> + Send + Sync + 'static) -> Self {
    Self::from_op(SingleOp::Defer(Arc::new(factory)))
  }
}

impl Single<()> {
  /// Runs a side-effecting action with no value at subscription time, then
  /// completes empty.
  pub fn from_action(action: impl Fn() + Send + Sync + 'static) -> Single<()> {
    Self::try_from_action(move || {
      action();
      Ok(())
    })
  }

  /// Like [`Single::from_action`], but the action may fail. A failure is
  /// delivered through the error channel of the subscription that ran the
  /// action; it is never raised at construction time.
  pub fn try_from_action(action: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) -> Single<()> {
    Self::from_op(SingleOp::Action(Arc::new(action)))
  }
}

impl<T> std::fmt::Debug for Single<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let shape = match self.op.as_ref() {
      SingleOp::Just(_) => "just".to_string(),
      SingleOp::Action(_) => "from_action".to_string(),
      SingleOp::Defer(_) => "defer".to_string(),
      SingleOp::Stage(stage) => stage.kind().to_string(),
    };
    f.debug_struct("Single").field("op", &shape).finish()
  }
}
