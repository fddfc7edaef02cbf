// rill/src/error.rs
use crate::core::subscription::SubscriptionState;
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RillError {
  /// A user-supplied operator closure failed. The failure is captured and
  /// delivered as a terminal error notification; it is never raised to the
  /// code that installed the operator chain.
  #[error("Transform failed in '{operator}' operator. Source: {source}")]
  Transform {
    operator: &'static str,
    #[source]
    source: AnyhowError,
  },

  /// An explicit failure pushed into a pipeline (`try_from_action`,
  /// `StepEmitter::error`, `EmitterSink::fail`).
  #[error("Pipeline failed. Source: {source}")]
  Failed {
    #[source]
    source: AnyhowError,
  },

  /// A generator step emitted more than one value per invocation.
  #[error("Generator contract violation: {message}")]
  GeneratorMisuse { message: String },

  /// `emit`/`complete`/`fail` was called on a sink that already carried a
  /// terminal signal, or a drained sink was subscribed to again.
  #[error("Emitter sink is already terminated")]
  SinkTerminated,

  /// A subscription handle was reused after it had already driven (or begun
  /// driving) a pipeline. Subscribing twice requires a fresh handle.
  #[error("Subscription handle already used (state: {state:?})")]
  SubscriptionMisuse { state: SubscriptionState },

  #[error("Internal rill error: {0}")]
  Internal(String),
}

impl RillError {
  /// The user-level failure message, when this error wraps one.
  ///
  /// The verification harness matches `expect_error_message` against the
  /// message the operator closure produced, not against the crate's own
  /// Display framing.
  pub fn user_message(&self) -> Option<String> {
    match self {
      RillError::Transform { source, .. } | RillError::Failed { source } => Some(source.to_string()),
      _ => None,
    }
  }
}

// This is the key conversion rill provides for external errors.
impl From<AnyhowError> for RillError {
  fn from(err: AnyhowError) -> Self {
    RillError::Failed { source: err }
  }
}

pub type RillResult<T, E = RillError> = std::result::Result<T, E>;
