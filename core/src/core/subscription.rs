// rill/src/core/subscription.rs

//! The subscription state machine and the cancellable handle that drives it.
//!
//! `Unsubscribed -> Active -> {Completed | Errored | Cancelled}`; the three
//! terminal states are absorbing. Exactly one subscription drives one
//! pipeline pass; a handle is consumed by `activate` and cannot be reused.

use crate::error::{RillError, RillResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

/// Lifecycle of a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
  Unsubscribed,
  Active,
  Completed,
  Errored,
  Cancelled,
}

impl SubscriptionState {
  /// Terminal states are absorbing: no transition leaves them.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      SubscriptionState::Completed | SubscriptionState::Errored | SubscriptionState::Cancelled
    )
  }
}

struct HandleInner {
  state: Mutex<SubscriptionState>,
  cancel_notify: Notify,
}

/// Cheaply cloneable handle observing and cancelling one subscription.
///
/// Cloning shares the same underlying state; pass a clone into consumer
/// callbacks or other tasks to cancel a running subscription.
#[derive(Clone)]
pub struct SubscriptionHandle {
  inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(HandleInner {
        state: Mutex::new(SubscriptionState::Unsubscribed),
        cancel_notify: Notify::new(),
      }),
    }
  }

  pub fn state(&self) -> SubscriptionState {
    *self.inner.state.lock()
  }

  pub fn is_cancelled(&self) -> bool {
    self.state() == SubscriptionState::Cancelled
  }

  /// Requests cancellation. Idempotent; a no-op once the subscription has
  /// already completed or errored. Wakes any producer parked on an
  /// asynchronous boundary (emitter sink wait, delay timer).
  pub fn cancel(&self) {
    {
      let mut guard = self.inner.state.lock();
      match *guard {
        SubscriptionState::Completed | SubscriptionState::Errored | SubscriptionState::Cancelled => {}
        SubscriptionState::Unsubscribed | SubscriptionState::Active => {
          *guard = SubscriptionState::Cancelled;
        }
      }
    }
    self.inner.cancel_notify.notify_waiters();
  }

  /// `Unsubscribed -> Active`. Any other starting state is structural misuse:
  /// a handle drives at most one subscription.
  pub(crate) fn activate(&self) -> RillResult<()> {
    let mut guard = self.inner.state.lock();
    match *guard {
      SubscriptionState::Unsubscribed => {
        *guard = SubscriptionState::Active;
        Ok(())
      }
      state => Err(RillError::SubscriptionMisuse { state }),
    }
  }

  /// Records the terminal outcome of the drive. Keeps an earlier terminal
  /// state (notably a concurrent cancel) if one was already recorded.
  pub(crate) fn finish(&self, terminal: SubscriptionState) {
    debug_assert!(terminal.is_terminal());
    let mut guard = self.inner.state.lock();
    if !guard.is_terminal() {
      *guard = terminal;
    }
  }

  /// Resolves once the subscription is cancelled. Used by producers that
  /// park on an asynchronous boundary and must wake up promptly on cancel.
  pub(crate) async fn cancelled(&self) {
    loop {
      let notified = self.inner.cancel_notify.notified();
      tokio::pin!(notified);
      notified.as_mut().enable();
      if self.is_cancelled() {
        return;
      }
      notified.await;
    }
  }
}

impl Default for SubscriptionHandle {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for SubscriptionHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionHandle").field("state", &self.state()).finish()
  }
}
