// rill/src/many/execution.rs

//! Contains the drive routine for `Many<T>` and the `subscribe` entry
//! points that deliver the value sequence to a consumer.

use crate::core::consumer::Consumer;
use crate::core::control::FlowControl;
use crate::core::eval::{BoxFuture, Downstream, EvalCx};
use crate::core::subscription::{SubscriptionHandle, SubscriptionState};
use crate::error::{RillError, RillResult};
use crate::many::definition::{Many, ManyOp};
use crate::sink;
use async_trait::async_trait;
use tracing::{event, instrument, Level};

impl<T: Send + Sync + 'static> Many<T> {
  /// Single drive routine over the closed set of node shapes, pushing each
  /// produced value into `down`.
  ///
  /// Returns `Ok(Continue)` when the source ran to natural completion,
  /// `Ok(Cancel)` when the downstream cancelled, or the terminal error.
  /// Boxed for recursion: `defer` factories, `flat_map` inner pipelines and
  /// stage upstreams re-enter it.
  pub(crate) fn drive<'a>(
    &'a self,
    cx: &'a EvalCx,
    down: &'a mut dyn Downstream<T>,
  ) -> BoxFuture<'a, RillResult<FlowControl>> {
    Box::pin(async move {
      match self.op.as_ref() {
        ManyOp::Values(produce) => {
          for value in produce() {
            if cx.handle.is_cancelled() {
              return Ok(FlowControl::Cancel);
            }
            match down.next(cx, value).await? {
              FlowControl::Continue => {}
              FlowControl::Cancel => return Ok(FlowControl::Cancel),
            }
          }
          Ok(FlowControl::Continue)
        }
        ManyOp::Sink(shared) => sink::drive_sink(shared, cx, down).await,
        ManyOp::Defer(factory) => {
          // Factory runs here, once per subscription.
          let inner = factory();
          inner.drive(cx, down).await
        }
        ManyOp::Stage(stage) => stage.drive(cx, down).await,
      }
    })
  }

  /// Subscribes with a bare `on_next` callback.
  ///
  /// Terminal errors have no handler here, so they are returned to the
  /// caller as `Err` (the unhandled-error contract).
  pub async fn subscribe<F>(&self, on_next: F) -> Result<SubscriptionState, RillError>
  where
    F: FnMut(T) + Send + 'static,
  {
    self.subscribe_with(Consumer::new().on_next(on_next)).await
  }

  /// Subscribes with a full consumer. A fresh handle is created, so every
  /// call re-runs the chain (cold semantics).
  pub async fn subscribe_with(&self, consumer: Consumer<T>) -> Result<SubscriptionState, RillError> {
    let handle = SubscriptionHandle::new();
    self.subscribe_with_handle(&handle, consumer).await
  }

  /// Subscribes with an externally-held handle, allowing observation and
  /// cancellation of the running subscription from other tasks.
  #[instrument(
    name = "Many::subscribe",
    skip_all,
    fields(value_type = %std::any::type_name::<T>(), handled = consumer.handles_errors()),
  )]
  pub async fn subscribe_with_handle(
    &self,
    handle: &SubscriptionHandle,
    mut consumer: Consumer<T>,
  ) -> Result<SubscriptionState, RillError> {
    handle.activate()?;
    event!(Level::DEBUG, "Many subscription starting.");
    let cx = EvalCx::new(handle.clone());

    let outcome = {
      let mut down = ConsumerDown { consumer: &mut consumer };
      self.drive(&cx, &mut down).await
    };

    match outcome {
      Ok(control) => {
        if control == FlowControl::Cancel || handle.is_cancelled() {
          handle.finish(SubscriptionState::Cancelled);
          event!(Level::DEBUG, "Many subscription cancelled.");
          return Ok(SubscriptionState::Cancelled);
        }
        if let Some(f) = consumer.on_complete.as_mut() {
          f();
        }
        handle.finish(SubscriptionState::Completed);
        event!(Level::DEBUG, "Many subscription completed.");
        Ok(SubscriptionState::Completed)
      }
      Err(error) => {
        if handle.is_cancelled() {
          event!(Level::DEBUG, "Subscription cancelled; suppressing error delivery.");
          return Ok(SubscriptionState::Cancelled);
        }
        handle.finish(SubscriptionState::Errored);
        event!(Level::ERROR, %error, "Many subscription terminated with error.");
        match consumer.on_error.as_mut() {
          Some(f) => {
            f(error);
            Ok(SubscriptionState::Errored)
          }
          None => Err(error),
        }
      }
    }
  }
}

/// Terminal adapter delivering values to the consumer callbacks. Checks for
/// cancellation both before and after the callback runs, so a consumer that
/// cancels its own subscription from within `on_next` stops the producer at
/// the next emission.
struct ConsumerDown<'a, T> {
  consumer: &'a mut Consumer<T>,
}

#[async_trait]
impl<'a, T: Send + 'static> Downstream<T> for ConsumerDown<'a, T> {
  async fn next(&mut self, cx: &EvalCx, value: T) -> RillResult<FlowControl> {
    if cx.handle.is_cancelled() {
      return Ok(FlowControl::Cancel);
    }
    if let Some(f) = self.consumer.on_next.as_mut() {
      f(value);
    }
    if cx.handle.is_cancelled() {
      return Ok(FlowControl::Cancel);
    }
    Ok(FlowControl::Continue)
  }
}
