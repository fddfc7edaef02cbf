// rill/src/core/consumer.rs

//! The terminal consumer contract: three optional callbacks receiving the
//! values, the terminal error, or the completion signal of one subscription.

use crate::error::RillError;

pub type OnNext<T> = Box<dyn FnMut(T) + Send>;
pub type OnError = Box<dyn FnMut(RillError) + Send>;
pub type OnComplete = Box<dyn FnMut() + Send>;

/// Consumer callbacks attached at `subscribe` time.
///
/// All three callbacks are optional. If `on_error` is absent and the pipeline
/// terminates with an error, `subscribe` returns that error to its caller
/// instead of swallowing it.
pub struct Consumer<T> {
  pub(crate) on_next: Option<OnNext<T>>,
  pub(crate) on_error: Option<OnError>,
  pub(crate) on_complete: Option<OnComplete>,
}

impl<T> Consumer<T> {
  pub fn new() -> Self {
    Self {
      on_next: None,
      on_error: None,
      on_complete: None,
    }
  }

  pub fn on_next(mut self, f: impl FnMut(T) + Send + 'static) -> Self {
    self.on_next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnMut(RillError) + Send + 'static) -> Self {
    self.on_error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
    self.on_complete = Some(Box::new(f));
    self
  }

  pub(crate) fn handles_errors(&self) -> bool {
    self.on_error.is_some()
  }
}

impl<T> Default for Consumer<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> std::fmt::Debug for Consumer<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Consumer")
      .field("on_next", &self.on_next.is_some())
      .field("on_error", &self.on_error.is_some())
      .field("on_complete", &self.on_complete.is_some())
      .finish()
  }
}
