// rill/src/verify.rs

//! A deterministic, step-based verification harness.
//!
//! `StepVerifier` subscribes to a pipeline (either kind), records the actual
//! signal sequence, and checks it against the expected one: an exact ordered
//! run of values followed by exactly one terminal signal. Mismatches are
//! reported value-by-value with both sequences printed in full.
//!
//! Pipelines that resolve later (delays, sink pushes from another task) are
//! verified the same way; tests drive them under tokio's paused clock for
//! simulated time advance.

use crate::core::consumer::Consumer;
use crate::error::RillError;
use crate::many::Many;
use crate::single::Single;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::{event, Level};

/// Either pipeline kind, as accepted by [`StepVerifier::create`].
pub enum VerifySource<T> {
  Single(Single<T>),
  Many(Many<T>),
}

impl<T> From<Single<T>> for VerifySource<T> {
  fn from(source: Single<T>) -> Self {
    VerifySource::Single(source)
  }
}

impl<T> From<Many<T>> for VerifySource<T> {
  fn from(source: Many<T>) -> Self {
    VerifySource::Many(source)
  }
}

enum TerminalExpect {
  Unspecified,
  Complete,
  AnyError,
  ErrorMessage(String),
  ErrorMatches(Box<dyn Fn(&RillError) -> bool + Send + Sync>),
}

impl TerminalExpect {
  fn describe(&self) -> String {
    match self {
      TerminalExpect::Unspecified => "<unspecified>".to_string(),
      TerminalExpect::Complete => "complete".to_string(),
      TerminalExpect::AnyError => "error(_)".to_string(),
      TerminalExpect::ErrorMessage(message) => format!("error({message:?})"),
      TerminalExpect::ErrorMatches(_) => "error(<predicate>)".to_string(),
    }
  }
}

enum ActualSignal<T> {
  Next(T),
  Error(RillError),
  Complete,
}

impl<T: Debug> ActualSignal<T> {
  fn describe(&self) -> String {
    match self {
      ActualSignal::Next(value) => format!("next({value:?})"),
      ActualSignal::Error(error) => format!("error({error})"),
      ActualSignal::Complete => "complete".to_string(),
    }
  }
}

/// Harness failure, carrying a precise expected-vs-actual report.
#[derive(Debug, Error)]
pub enum VerifyError {
  #[error("No terminal expectation set; call expect_complete() or an expect_error variant before verify()")]
  MissingTerminalExpectation,

  #[error(
    "Signal mismatch at position {position}: expected {expected}, actual {actual}\n  expected sequence: [{expected_sequence}]\n  actual sequence:   [{actual_sequence}]"
  )]
  Mismatch {
    position: usize,
    expected: String,
    actual: String,
    expected_sequence: String,
    actual_sequence: String,
  },

  #[error("Subscription could not be driven: {0}")]
  Subscribe(RillError),
}

/// Step-based verifier for a pipeline's signal sequence.
pub struct StepVerifier<T> {
  source: VerifySource<T>,
  expected_values: Vec<T>,
  terminal: TerminalExpect,
}

impl<T> StepVerifier<T>
where
  T: Debug + PartialEq + Send + Sync + 'static,
{
  /// Prepares a verifier for the given pipeline (`Single` or `Many`).
  pub fn create(source: impl Into<VerifySource<T>>) -> Self {
    Self {
      source: source.into(),
      expected_values: Vec::new(),
      terminal: TerminalExpect::Unspecified,
    }
  }

  /// Expects the next signal to be this value.
  pub fn expect_next(mut self, value: T) -> Self {
    self.expected_values.push(value);
    self
  }

  /// Expects the next signals to be these values, in order.
  pub fn expect_next_values(mut self, values: impl IntoIterator<Item = T>) -> Self {
    self.expected_values.extend(values);
    self
  }

  /// Expects the sequence to end with successful completion.
  pub fn expect_complete(mut self) -> Self {
    self.terminal = TerminalExpect::Complete;
    self
  }

  /// Expects the sequence to end with any terminal error.
  pub fn expect_error(mut self) -> Self {
    self.terminal = TerminalExpect::AnyError;
    self
  }

  /// Expects a terminal error whose user-level message equals `message`
  /// (the message produced by the failing operator closure or injected
  /// failure, not the crate's Display framing).
  pub fn expect_error_message(mut self, message: impl Into<String>) -> Self {
    self.terminal = TerminalExpect::ErrorMessage(message.into());
    self
  }

  /// Expects a terminal error matching the predicate (error-kind checks).
  pub fn expect_error_matches(mut self, predicate: impl Fn(&RillError) -> bool + Send + Sync + 'static) -> Self {
    self.terminal = TerminalExpect::ErrorMatches(Box::new(predicate));
    self
  }

  /// Subscribes and checks the recorded signals against the expectations.
  pub async fn verify(self) -> Result<(), VerifyError> {
    if matches!(self.terminal, TerminalExpect::Unspecified) {
      return Err(VerifyError::MissingTerminalExpectation);
    }

    let signals: Arc<Mutex<Vec<ActualSignal<T>>>> = Arc::new(Mutex::new(Vec::new()));
    let consumer = {
      let next_signals = Arc::clone(&signals);
      let error_signals = Arc::clone(&signals);
      let complete_signals = Arc::clone(&signals);
      Consumer::new()
        .on_next(move |value| next_signals.lock().push(ActualSignal::Next(value)))
        .on_error(move |error| error_signals.lock().push(ActualSignal::Error(error)))
        .on_complete(move || complete_signals.lock().push(ActualSignal::Complete))
    };

    let subscribed = match &self.source {
      VerifySource::Single(single) => single.subscribe_with(consumer).await,
      VerifySource::Many(many) => many.subscribe_with(consumer).await,
    };
    if let Err(error) = subscribed {
      // All three callbacks are installed, so this only fires for
      // structural misuse, not for pipeline errors.
      return Err(VerifyError::Subscribe(error));
    }

    let actual = Arc::try_unwrap(signals)
      .map_err(|_| VerifyError::Subscribe(RillError::Internal("signal recorder still shared".to_string())))?
      .into_inner();
    event!(Level::DEBUG, signal_count = actual.len(), "Verifying recorded signals.");
    self.check(actual)
  }

  fn check(&self, actual: Vec<ActualSignal<T>>) -> Result<(), VerifyError> {
    let expected_sequence = self.describe_expected();
    let actual_sequence = actual.iter().map(ActualSignal::describe).collect::<Vec<_>>().join(", ");
    let mismatch = |position: usize, expected: String, actual_desc: String| VerifyError::Mismatch {
      position,
      expected,
      actual: actual_desc,
      expected_sequence: expected_sequence.clone(),
      actual_sequence: actual_sequence.clone(),
    };

    for (position, expected_value) in self.expected_values.iter().enumerate() {
      match actual.get(position) {
        Some(ActualSignal::Next(value)) if value == expected_value => {}
        other => {
          return Err(mismatch(
            position,
            format!("next({expected_value:?})"),
            describe_position(other),
          ));
        }
      }
    }

    let terminal_position = self.expected_values.len();
    let terminal_matches = match (&self.terminal, actual.get(terminal_position)) {
      (TerminalExpect::Complete, Some(ActualSignal::Complete)) => true,
      (TerminalExpect::AnyError, Some(ActualSignal::Error(_))) => true,
      (TerminalExpect::ErrorMessage(message), Some(ActualSignal::Error(error))) => {
        error.user_message().as_deref() == Some(message.as_str())
      }
      (TerminalExpect::ErrorMatches(predicate), Some(ActualSignal::Error(error))) => predicate(error),
      _ => false,
    };
    if !terminal_matches {
      return Err(mismatch(
        terminal_position,
        self.terminal.describe(),
        describe_position(actual.get(terminal_position)),
      ));
    }

    if actual.len() > terminal_position + 1 {
      return Err(mismatch(
        terminal_position + 1,
        "end of signals".to_string(),
        describe_position(actual.get(terminal_position + 1)),
      ));
    }

    Ok(())
  }

  fn describe_expected(&self) -> String {
    let mut parts: Vec<String> = self.expected_values.iter().map(|v| format!("next({v:?})")).collect();
    parts.push(self.terminal.describe());
    parts.join(", ")
  }
}

fn describe_position<T: Debug>(signal: Option<&ActualSignal<T>>) -> String {
  match signal {
    Some(signal) => signal.describe(),
    None => "<no signal>".to_string(),
  }
}
