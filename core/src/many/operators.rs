// rill/src/many/operators.rs

//! Operator methods for `Many<T>`, with the same containment rule as the
//! single-value pipeline: a failing operator closure becomes a terminal
//! error notification, never a synchronous failure of chain construction.
//!
//! Each operator stage drives its upstream with a small `Downstream` adapter
//! that transforms values on the way down; control (cancellation) flows back
//! upstream through the returned `FlowControl`.

use crate::core::control::{FlowControl, OperatorKind};
use crate::core::eval::{Downstream, EvalCx};
use crate::error::{RillError, RillResult};
use crate::many::definition::{Many, ManyStage};
use async_trait::async_trait;
use tracing::{event, Level};

impl<T: Send + Sync + 'static> Many<T> {
  /// Transforms each value with an infallible function.
  pub fn map<R, F>(&self, f: F) -> Many<R>
  where
    R: Send + Sync + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
  {
    Many::stage(MapStage { upstream: self.clone(), f })
  }

  /// Transforms each value with a fallible function. The first `Err`
  /// terminates the subscription with [`RillError::Transform`]; values
  /// already delivered stay delivered.
  pub fn try_map<R, F>(&self, f: F) -> Many<R>
  where
    R: Send + Sync + 'static,
    F: Fn(T) -> anyhow::Result<R> + Send + Sync + 'static,
  {
    Many::stage(TryMapStage { upstream: self.clone(), f })
  }

  /// Forwards only the values accepted by the predicate.
  pub fn filter<F>(&self, predicate: F) -> Many<T>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    Many::stage(FilterStage {
      upstream: self.clone(),
      predicate,
    })
  }

  /// Maps each value to an inner pipeline and flattens sequentially: the
  /// inner pipeline spawned by one value runs to completion before the next
  /// outer value is processed, so output order follows input order.
  pub fn flat_map<R, F>(&self, f: F) -> Many<R>
  where
    R: Send + Sync + 'static,
    F: Fn(T) -> Many<R> + Send + Sync + 'static,
  {
    Many::stage(FlatMapStage { upstream: self.clone(), f })
  }

  /// Observes each value as it passes through, without altering it.
  pub fn do_on_next<F>(&self, f: F) -> Many<T>
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    Many::stage(DoOnNextStage { upstream: self.clone(), f })
  }

  /// Intercepts a terminal error, emits `fallback` instead, and completes.
  /// Values emitted before the error stay delivered.
  pub fn on_error_return(&self, fallback: T) -> Many<T>
  where
    T: Clone,
  {
    Many::stage(OnErrorReturnStage {
      upstream: self.clone(),
      fallback,
    })
  }
}

// --- Downstream adapters ---

struct MapDown<'a, R: Send, F> {
  down: &'a mut dyn Downstream<R>,
  f: &'a F,
}

#[async_trait]
impl<'a, U, R, F> Downstream<U> for MapDown<'a, R, F>
where
  U: Send + 'static,
  R: Send + 'static,
  F: Fn(U) -> R + Send + Sync,
{
  async fn next(&mut self, cx: &EvalCx, value: U) -> RillResult<FlowControl> {
    self.down.next(cx, (self.f)(value)).await
  }
}

struct TryMapDown<'a, R: Send, F> {
  down: &'a mut dyn Downstream<R>,
  f: &'a F,
}

#[async_trait]
impl<'a, U, R, F> Downstream<U> for TryMapDown<'a, R, F>
where
  U: Send + 'static,
  R: Send + 'static,
  F: Fn(U) -> anyhow::Result<R> + Send + Sync,
{
  async fn next(&mut self, cx: &EvalCx, value: U) -> RillResult<FlowControl> {
    match (self.f)(value) {
      Ok(mapped) => self.down.next(cx, mapped).await,
      Err(source) => Err(RillError::Transform {
        operator: OperatorKind::TryMap.name(),
        source,
      }),
    }
  }
}

struct FilterDown<'a, T: Send, F> {
  down: &'a mut dyn Downstream<T>,
  predicate: &'a F,
}

#[async_trait]
impl<'a, T, F> Downstream<T> for FilterDown<'a, T, F>
where
  T: Send + 'static,
  F: Fn(&T) -> bool + Send + Sync,
{
  async fn next(&mut self, cx: &EvalCx, value: T) -> RillResult<FlowControl> {
    if (self.predicate)(&value) {
      self.down.next(cx, value).await
    } else {
      Ok(FlowControl::Continue)
    }
  }
}

struct FlatMapDown<'a, R: Send, F> {
  down: &'a mut dyn Downstream<R>,
  f: &'a F,
}

#[async_trait]
impl<'a, U, R, F> Downstream<U> for FlatMapDown<'a, R, F>
where
  U: Send + 'static,
  R: Send + Sync + 'static,
  F: Fn(U) -> Many<R> + Send + Sync,
{
  async fn next(&mut self, cx: &EvalCx, value: U) -> RillResult<FlowControl> {
    // Sequential flattening: the inner pipeline runs to completion (into the
    // shared downstream) before the outer producer resumes.
    let inner = (self.f)(value);
    inner.drive(cx, &mut *self.down).await
  }
}

struct DoOnNextDown<'a, T: Send, F> {
  down: &'a mut dyn Downstream<T>,
  f: &'a F,
}

#[async_trait]
impl<'a, T, F> Downstream<T> for DoOnNextDown<'a, T, F>
where
  T: Send + 'static,
  F: Fn(&T) + Send + Sync,
{
  async fn next(&mut self, cx: &EvalCx, value: T) -> RillResult<FlowControl> {
    (self.f)(&value);
    self.down.next(cx, value).await
  }
}

// --- Stage implementations ---

struct MapStage<U, F> {
  upstream: Many<U>,
  f: F,
}

#[async_trait]
impl<U, T, F> ManyStage<T> for MapStage<U, F>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
  F: Fn(U) -> T + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Map
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    let mut adapter = MapDown { down, f: &self.f };
    self.upstream.drive(cx, &mut adapter).await
  }
}

struct TryMapStage<U, F> {
  upstream: Many<U>,
  f: F,
}

#[async_trait]
impl<U, T, F> ManyStage<T> for TryMapStage<U, F>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
  F: Fn(U) -> anyhow::Result<T> + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::TryMap
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    let mut adapter = TryMapDown { down, f: &self.f };
    self.upstream.drive(cx, &mut adapter).await
  }
}

struct FilterStage<T, F> {
  upstream: Many<T>,
  predicate: F,
}

#[async_trait]
impl<T, F> ManyStage<T> for FilterStage<T, F>
where
  T: Send + Sync + 'static,
  F: Fn(&T) -> bool + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Filter
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    let mut adapter = FilterDown {
      down,
      predicate: &self.predicate,
    };
    self.upstream.drive(cx, &mut adapter).await
  }
}

struct FlatMapStage<U, F> {
  upstream: Many<U>,
  f: F,
}

#[async_trait]
impl<U, T, F> ManyStage<T> for FlatMapStage<U, F>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
  F: Fn(U) -> Many<T> + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::FlatMap
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    let mut adapter = FlatMapDown { down, f: &self.f };
    self.upstream.drive(cx, &mut adapter).await
  }
}

struct DoOnNextStage<T, F> {
  upstream: Many<T>,
  f: F,
}

#[async_trait]
impl<T, F> ManyStage<T> for DoOnNextStage<T, F>
where
  T: Send + Sync + 'static,
  F: Fn(&T) + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::DoOnNext
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    let mut adapter = DoOnNextDown { down, f: &self.f };
    self.upstream.drive(cx, &mut adapter).await
  }
}

struct OnErrorReturnStage<T> {
  upstream: Many<T>,
  fallback: T,
}

#[async_trait]
impl<T> ManyStage<T> for OnErrorReturnStage<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::OnErrorReturn
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    match self.upstream.drive(cx, &mut *down).await {
      Err(error) => {
        event!(Level::DEBUG, %error, "Error intercepted; emitting fallback value.");
        if cx.handle.is_cancelled() {
          return Ok(FlowControl::Cancel);
        }
        down.next(cx, self.fallback.clone()).await
      }
      ok => ok,
    }
  }
}
