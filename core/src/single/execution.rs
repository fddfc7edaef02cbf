// rill/src/single/execution.rs

//! Contains the evaluation routine for `Single<T>` and the `subscribe`
//! entry points that drive one subscription to its terminal state.

use crate::core::consumer::Consumer;
use crate::core::eval::{BoxFuture, EvalCx};
use crate::core::subscription::{SubscriptionHandle, SubscriptionState};
use crate::error::{RillError, RillResult};
use crate::single::definition::{Single, SingleOp};
use tracing::{event, instrument, Level};

impl<T: Send + Sync + 'static> Single<T> {
  /// Single evaluation routine over the closed set of node shapes.
  ///
  /// Boxed for recursion: `defer` factories and stage upstreams re-enter it.
  pub(crate) fn eval<'a>(&'a self, cx: &'a EvalCx) -> BoxFuture<'a, RillResult<Option<T>>> {
    Box::pin(async move {
      match self.op.as_ref() {
        SingleOp::Just(produce) => Ok(Some(produce())),
        SingleOp::Action(action) => match action() {
          Ok(()) => Ok(None),
          Err(source) => Err(RillError::Failed { source }),
        },
        SingleOp::Defer(factory) => {
          // Factory runs here, once per subscription.
          let inner = factory();
          inner.eval(cx).await
        }
        SingleOp::Stage(stage) => stage.eval(cx).await,
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
  ///
  /// Returns `Ok(Completed | Errored | Cancelled)` for a delivered terminal,
  /// or `Err` with the original failure when the pipeline errors and the
  /// consumer supplied no `on_error` callback.
  #[instrument(
    name = "Single::subscribe",
    skip_all,
    fields(value_type = %std::any::type_name::<T>(), handled = consumer.handles_errors()),
  )]
  pub async fn subscribe_with_handle(
    &self,
    handle: &SubscriptionHandle,
    mut consumer: Consumer<T>,
  ) -> Result<SubscriptionState, RillError> {
    handle.activate()?;
    event!(Level::DEBUG, "Single subscription starting.");
    let cx = EvalCx::new(handle.clone());

    match self.eval(&cx).await {
      Ok(outcome) => {
        if handle.is_cancelled() {
          event!(Level::DEBUG, "Subscription cancelled; dropping outcome.");
          return Ok(SubscriptionState::Cancelled);
        }
        if let Some(value) = outcome {
          if let Some(f) = consumer.on_next.as_mut() {
            f(value);
          }
        }
        // A consumer callback may have cancelled its own subscription; the
        // completion signal is then suppressed.
        if handle.is_cancelled() {
          return Ok(SubscriptionState::Cancelled);
        }
        if let Some(f) = consumer.on_complete.as_mut() {
          f();
        }
        handle.finish(SubscriptionState::Completed);
        event!(Level::DEBUG, "Single subscription completed.");
        Ok(SubscriptionState::Completed)
      }
      Err(error) => {
        if handle.is_cancelled() {
          event!(Level::DEBUG, "Subscription cancelled; suppressing error delivery.");
          return Ok(SubscriptionState::Cancelled);
        }
        handle.finish(SubscriptionState::Errored);
        event!(Level::ERROR, %error, "Single subscription terminated with error.");
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
