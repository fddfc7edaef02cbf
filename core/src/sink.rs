// rill/src/sink.rs

//! The manual injection point: an `EmitterSink<T>` pushes values and a
//! terminal signal into a `Many<T>` asynchronously relative to pipeline
//! construction.
//!
//! Buffering policy (stated, not incidental): **buffer-then-replay**. Values
//! emitted before a consumer attaches are kept in an unbounded queue and
//! replayed in emission order at subscription time; values emitted while the
//! consumer is live wake its drive loop. The queue is the only mutable
//! resource shared between producer and consumer and sits behind a
//! `parking_lot` mutex, so producers may run on other threads.
//!
//! A sink-backed pipeline is single-consumer: its buffer and terminal signal
//! are consumed by the subscription that drains them.

use crate::core::control::FlowControl;
use crate::core::eval::{Downstream, EvalCx};
use crate::error::{RillError, RillResult};
use crate::many::definition::{Many, ManyOp};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{event, Level};

pub(crate) struct SinkShared<T> {
  inner: Mutex<SinkInner<T>>,
  notify: Notify,
}

struct SinkInner<T> {
  buffer: VecDeque<T>,
  terminal: Option<SinkTerminal>,
}

enum SinkTerminal {
  Complete,
  // The error is taken by the subscription that delivers it.
  Failed(Option<anyhow::Error>),
}

/// Producer half of a sink-backed `Many<T>`.
///
/// Cloneable; the shared buffer is lock-protected, so clones may emit from
/// other threads.
pub struct EmitterSink<T> {
  shared: Arc<SinkShared<T>>,
}

impl<T> Clone for EmitterSink<T> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<T: Send + 'static> EmitterSink<T> {
  /// Pushes one value into the stream. Fails with
  /// [`RillError::SinkTerminated`] once a terminal signal was raised.
  pub fn emit(&self, value: T) -> RillResult<()> {
    {
      let mut guard = self.shared.inner.lock();
      if guard.terminal.is_some() {
        return Err(RillError::SinkTerminated);
      }
      guard.buffer.push_back(value);
    }
    self.shared.notify.notify_one();
    Ok(())
  }

  /// Signals successful completion; buffered values are still delivered
  /// first. Fails if a terminal signal was already raised.
  pub fn complete(&self) -> RillResult<()> {
    self.terminate(SinkTerminal::Complete)
  }

  /// Signals failure; buffered values are still delivered first. Fails if a
  /// terminal signal was already raised.
  pub fn fail(&self, error: impl Into<anyhow::Error>) -> RillResult<()> {
    self.terminate(SinkTerminal::Failed(Some(error.into())))
  }

  fn terminate(&self, terminal: SinkTerminal) -> RillResult<()> {
    {
      let mut guard = self.shared.inner.lock();
      if guard.terminal.is_some() {
        return Err(RillError::SinkTerminated);
      }
      guard.terminal = Some(terminal);
    }
    self.shared.notify.notify_one();
    Ok(())
  }
}

impl<T: Send + Sync + 'static> Many<T> {
  /// Creates a sink-backed pipeline: the returned [`EmitterSink`] pushes
  /// values into the returned `Many<T>`.
  pub fn emitter() -> (EmitterSink<T>, Many<T>) {
    let shared = Arc::new(SinkShared {
      inner: Mutex::new(SinkInner {
        buffer: VecDeque::new(),
        terminal: None,
      }),
      notify: Notify::new(),
    });
    let sink = EmitterSink {
      shared: Arc::clone(&shared),
    };
    (sink, Many::from_op(ManyOp::Sink(shared)))
  }
}

enum Pending<T> {
  Value(T),
  Complete,
  Error(RillError),
  Wait,
}

/// Drains the sink into `down`: buffered values first (replay), then values
/// as they arrive, until a terminal signal or cancellation.
pub(crate) async fn drive_sink<T: Send + 'static>(
  shared: &SinkShared<T>,
  cx: &EvalCx,
  down: &mut dyn Downstream<T>,
) -> RillResult<FlowControl> {
  loop {
    let pending = {
      let mut guard = shared.inner.lock();
      if let Some(value) = guard.buffer.pop_front() {
        Pending::Value(value)
      } else {
        match guard.terminal.as_mut() {
          Some(SinkTerminal::Complete) => Pending::Complete,
          Some(SinkTerminal::Failed(source)) => match source.take() {
            Some(source) => Pending::Error(RillError::Failed { source }),
            // The failure was consumed by an earlier subscription; this
            // sink is spent.
            None => Pending::Error(RillError::SinkTerminated),
          },
          None => Pending::Wait,
        }
      }
    };

    match pending {
      Pending::Value(value) => match down.next(cx, value).await? {
        FlowControl::Continue => {}
        FlowControl::Cancel => return Ok(FlowControl::Cancel),
      },
      Pending::Complete => return Ok(FlowControl::Continue),
      Pending::Error(error) => return Err(error),
      Pending::Wait => {
        event!(Level::TRACE, "Sink drained; waiting for producer.");
        tokio::select! {
          () = shared.notify.notified() => {}
          () = cx.handle.cancelled() => return Ok(FlowControl::Cancel),
        }
      }
    }
  }
}
