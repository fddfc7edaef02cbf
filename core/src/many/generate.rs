// rill/src/many/generate.rs

//! Programmatic sequence generation with explicit state threading.
//!
//! The caller-owned state value is moved into each step invocation and the
//! updated state is moved back out, so there is no shared mutable generator
//! state. A step may emit at most one value through its [`StepEmitter`] and
//! may optionally raise a terminal signal; the optional finalizer receives
//! the final state exactly once, whether the sequence ends by completion,
//! error, contract violation, or cancellation.

use crate::core::control::{FlowControl, OperatorKind};
use crate::core::eval::{Downstream, EvalCx};
use crate::error::{RillError, RillResult};
use crate::many::definition::{Many, ManyStage};
use async_trait::async_trait;
use tracing::{event, Level};

/// Per-step emission handle handed to the generator step function.
pub struct StepEmitter<T> {
  value: Option<T>,
  overflowed: bool,
  terminal: Option<StepTerminal>,
}

enum StepTerminal {
  Complete,
  Error(anyhow::Error),
}

impl<T> StepEmitter<T> {
  fn new() -> Self {
    Self {
      value: None,
      overflowed: false,
      terminal: None,
    }
  }

  /// Emits one value for this step. Calling `next` more than once per step
  /// is a contract violation and terminates the sequence with
  /// [`RillError::GeneratorMisuse`].
  pub fn next(&mut self, value: T) {
    if self.value.is_some() {
      self.overflowed = true;
    } else {
      self.value = Some(value);
    }
  }

  /// Signals successful completion after this step's emission (if any).
  pub fn complete(&mut self) {
    if self.terminal.is_none() {
      self.terminal = Some(StepTerminal::Complete);
    }
  }

  /// Signals failure after this step's emission (if any).
  pub fn error(&mut self, error: impl Into<anyhow::Error>) {
    if self.terminal.is_none() {
      self.terminal = Some(StepTerminal::Error(error.into()));
    }
  }

  fn into_parts(self) -> RillResult<(Option<T>, Option<StepTerminal>)> {
    if self.overflowed {
      return Err(RillError::GeneratorMisuse {
        message: "step emitted more than one value".to_string(),
      });
    }
    Ok((self.value, self.terminal))
  }
}

impl<T: Send + Sync + 'static> Many<T> {
  /// Builds a sequence by repeated invocation: `init` produces the starting
  /// state, and each `step(state, emitter)` call may emit at most one value
  /// and optionally signal completion, returning the state for the next
  /// invocation.
  pub fn generate<S, FI, FS>(init: FI, step: FS) -> Many<T>
  where
    S: Send + 'static,
    FI: Fn() -> S + Send + Sync + 'static,
    FS: Fn(S, &mut StepEmitter<T>) -> S + Send + Sync + 'static,
  {
    Many::stage(GenerateStage {
      init,
      step,
      finalizer: None::<fn(S)>,
    })
  }

  /// Like [`Many::generate`], with a finalizer that consumes the final state
  /// exactly once when the sequence terminates, by completion, error, or
  /// cancellation.
  pub fn generate_with<S, FI, FS, FF>(init: FI, step: FS, finalizer: FF) -> Many<T>
  where
    S: Send + 'static,
    FI: Fn() -> S + Send + Sync + 'static,
    FS: Fn(S, &mut StepEmitter<T>) -> S + Send + Sync + 'static,
    FF: Fn(S) + Send + Sync + 'static,
  {
    Many::stage(GenerateStage {
      init,
      step,
      finalizer: Some(finalizer),
    })
  }
}

struct GenerateStage<FI, FS, FF> {
  init: FI,
  step: FS,
  finalizer: Option<FF>,
}

fn run_finalizer<S, FF: Fn(S)>(finalizer: &Option<FF>, state: S) {
  if let Some(f) = finalizer {
    f(state);
  }
}

#[async_trait]
impl<T, S, FI, FS, FF> ManyStage<T> for GenerateStage<FI, FS, FF>
where
  T: Send + Sync + 'static,
  S: Send + 'static,
  FI: Fn() -> S + Send + Sync + 'static,
  FS: Fn(S, &mut StepEmitter<T>) -> S + Send + Sync + 'static,
  FF: Fn(S) + Send + Sync + 'static,
{
  fn kind(&self) -> OperatorKind {
    OperatorKind::Generate
  }

  async fn drive(&self, cx: &EvalCx, down: &mut dyn Downstream<T>) -> RillResult<FlowControl> {
    let mut state = (self.init)();
    loop {
      // The step function must not run once cancellation has taken effect.
      if cx.handle.is_cancelled() {
        run_finalizer(&self.finalizer, state);
        return Ok(FlowControl::Cancel);
      }

      let mut emitter = StepEmitter::new();
      state = (self.step)(state, &mut emitter);

      let (value, terminal) = match emitter.into_parts() {
        Ok(parts) => parts,
        Err(error) => {
          event!(Level::ERROR, %error, "Generator step violated its contract.");
          run_finalizer(&self.finalizer, state);
          return Err(error);
        }
      };

      if let Some(value) = value {
        match down.next(cx, value).await {
          Ok(FlowControl::Continue) => {}
          Ok(FlowControl::Cancel) => {
            run_finalizer(&self.finalizer, state);
            return Ok(FlowControl::Cancel);
          }
          Err(error) => {
            run_finalizer(&self.finalizer, state);
            return Err(error);
          }
        }
      }

      match terminal {
        Some(StepTerminal::Complete) => {
          run_finalizer(&self.finalizer, state);
          return Ok(FlowControl::Continue);
        }
        Some(StepTerminal::Error(source)) => {
          run_finalizer(&self.finalizer, state);
          return Err(RillError::Failed { source });
        }
        None => {}
      }
    }
  }
}
