// rill/src/single/operators.rs

//! Operator methods for `Single<T>`. Each application wraps the receiver in
//! a new stage node and returns a new pipeline; the receiver is untouched.
//!
//! Failure containment rule: a fallible operator closure that returns `Err`
//! becomes a terminal error notification observed at subscription time. It
//! is never raised to the code that installed the operator chain.

use crate::core::control::OperatorKind;
use crate::core::eval::EvalCx;
use crate::error::{RillError, RillResult};
use crate::single::definition::{Single, SingleStage};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{event, Level};

impl<T: Send + Sync + 'static> Single<T> {
  /// Transforms the value with an infallible function.
  pub fn map<R, F>(&self, f: F) -> Single<R>
  where
    R: Send + Sync + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
  {
    Single::stage(MapStage { upstream: self.clone(), f })
  }

  /// Transforms the value with a fallible function. An `Err` terminates the
  /// subscription with [`RillError::Transform`].
  pub fn try_map<R, F>(&self, f: F) -> Single<R>
  where
    R: Send + Sync + 'static,
    F: Fn(T) -> anyhow::Result<R> + Send + Sync + 'static,
  {
    Single::stage(TryMapStage { upstream: self.clone(), f })
  }

  /// Drops the value (completing empty) when the predicate rejects it.
  pub fn filter<F>(&self, predicate: F) -> Single<T>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    Single::stage(FilterStage {
      upstream: self.clone(),
      predicate,
    })
  }

  /// Composes dependent asynchronous work: `f` maps the value to an inner
  /// pipeline, and the inner pipeline's value/error becomes this pipeline's
  /// terminal result. Logical completion is suspended until the inner
  /// pipeline resolves.
  pub fn flat_map<R, F>(&self, f: F) -> Single<R>
  where
    R: Send + Sync + 'static,
    F: Fn(T) -> Single<R> + Send + Sync + 'static,
  {
    Single::stage(FlatMapStage { upstream: self.clone(), f })
  }

  /// Observes the value as it passes through, without altering it.
  pub fn do_on_next<F>(&self, f: F) -> Single<T>
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    Single::stage(PeekStage {
      upstream: self.clone(),
      f,
      kind: OperatorKind::DoOnNext,
    })
  }

  /// Observes the successful (non-empty) outcome of the pipeline.
  pub fn do_on_success<F>(&self, f: F) -> Single<T>
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    Single::stage(PeekStage {
      upstream: self.clone(),
      f,
      kind: OperatorKind::DoOnSuccess,
    })
  }

  /// Intercepts a terminal error and substitutes a successful value,
  /// continuing the chain as if no error had occurred.
  pub fn on_error_return(&self, fallback: T) -> Single<T>
  where
    T: Clone,
  {
    Single::stage(OnErrorReturnStage {
      upstream: self.clone(),
      fallback,
    })
  }

  /// Discards this pipeline's value; once it completes, evaluates `other`
  /// as the new result. Errors from this pipeline still propagate.
  pub fn then<R>(&self, other: Single<R>) -> Single<R>
  where
    R: Send + Sync + 'static,
  {
    Single::stage(ThenStage {
      first: self.clone(),
      next: other,
    })
  }

  /// Delays the emission of the value by `duration`. An empty completion is
  /// not delayed. Cancellation interrupts the wait promptly.
  pub fn delay_element(&self, duration: Duration) -> Single<T> {
    Single::stage(DelayStage {
      upstream: self.clone(),
      duration,
    })
  }
}

// --- Stage implementations ---

struct MapStage<U, F> {
  upstream: Single<U>,
  f: F,
}

#[async_trait]
impl<U, T, F> SingleStage<T> for MapStage<U, F>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
  F: Fn(U) -> T + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Map
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    match self.upstream.eval(cx).await? {
      Some(value) => Ok(Some((self.f)(value))),
      None => Ok(None),
    }
  }
}

struct TryMapStage<U, F> {
  upstream: Single<U>,
  f: F,
}

#[async_trait]
impl<U, T, F> SingleStage<T> for TryMapStage<U, F>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
  F: Fn(U) -> anyhow::Result<T> + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::TryMap
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    match self.upstream.eval(cx).await? {
      Some(value) => match (self.f)(value) {
        Ok(mapped) => Ok(Some(mapped)),
        Err(source) => Err(RillError::Transform {
          operator: self.kind().name(),
          source,
        }),
      },
      None => Ok(None),
    }
  }
}

struct FilterStage<T, F> {
  upstream: Single<T>,
  predicate: F,
}

#[async_trait]
impl<T, F> SingleStage<T> for FilterStage<T, F>
where
  T: Send + Sync + 'static,
  F: Fn(&T) -> bool + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Filter
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    match self.upstream.eval(cx).await? {
      Some(value) if (self.predicate)(&value) => Ok(Some(value)),
      _ => Ok(None),
    }
  }
}

struct FlatMapStage<U, F> {
  upstream: Single<U>,
  f: F,
}

#[async_trait]
impl<U, T, F> SingleStage<T> for FlatMapStage<U, F>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
  F: Fn(U) -> Single<T> + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::FlatMap
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    match self.upstream.eval(cx).await? {
      Some(value) => {
        let inner = (self.f)(value);
        inner.eval(cx).await
      }
      None => Ok(None),
    }
  }
}

/// Shared shape for `do_on_next` and `do_on_success`: both observe the value
/// of a single-value pipeline without altering it; they differ only in the
/// position they conceptually occupy (per-value vs. final success).
struct PeekStage<T, F> {
  upstream: Single<T>,
  f: F,
  kind: OperatorKind,
}

#[async_trait]
impl<T, F> SingleStage<T> for PeekStage<T, F>
where
  T: Send + Sync + 'static,
  F: Fn(&T) + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    self.kind
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    let outcome = self.upstream.eval(cx).await?;
    if let Some(value) = &outcome {
      (self.f)(value);
    }
    Ok(outcome)
  }
}

struct OnErrorReturnStage<T> {
  upstream: Single<T>,
  fallback: T,
}

#[async_trait]
impl<T> SingleStage<T> for OnErrorReturnStage<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::OnErrorReturn
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    match self.upstream.eval(cx).await {
      Err(error) => {
        event!(Level::DEBUG, %error, "Error intercepted; substituting fallback value.");
        if cx.handle.is_cancelled() {
          return Ok(None);
        }
        Ok(Some(self.fallback.clone()))
      }
      ok => ok,
    }
  }
}

struct ThenStage<U, T> {
  first: Single<U>,
  next: Single<T>,
}

#[async_trait]
impl<U, T> SingleStage<T> for ThenStage<U, T>
where
  U: Send + Sync + 'static,
  T: Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Then
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    // Value discarded; error still propagates.
    let _ = self.first.eval(cx).await?;
    // The first leg may have parked (a delay) while the subscription was
    // cancelled; the continuation must not run then.
    if cx.handle.is_cancelled() {
      return Ok(None);
    }
    self.next.eval(cx).await
  }
}

struct DelayStage<T> {
  upstream: Single<T>,
  duration: Duration,
}

#[async_trait]
impl<T> SingleStage<T> for DelayStage<T>
where
  T: Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Delay
  }

  async fn eval(&self, cx: &EvalCx) -> RillResult<Option<T>> {
    match self.upstream.eval(cx).await? {
      Some(value) => {
        tokio::select! {
          () = tokio::time::sleep(self.duration) => Ok(Some(value)),
          () = cx.handle.cancelled() => Ok(None),
        }
      }
      None => Ok(None),
    }
  }
}
