// rill/src/core/control.rs

//! Defines signals for controlling value delivery and the closed set of
//! operator kinds a pipeline chain can be built from.

/// Signal returned by a downstream stage for each delivered value, indicating
/// whether the upstream producer should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  /// Keep producing values.
  Continue,
  /// Stop producing immediately; the subscription has been cancelled.
  /// No further values are delivered and no completion signal fires.
  Cancel,
}

/// The closed set of operator kinds a pipeline can be composed from.
///
/// Operators are dispatched through a single evaluation routine per pipeline
/// kind; this tag identifies the stage for error attribution and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
  Map,
  TryMap,
  Filter,
  FlatMap,
  DoOnNext,
  DoOnSuccess,
  OnErrorReturn,
  Then,
  Delay,
  Generate,
  Defer,
}

impl OperatorKind {
  pub fn name(self) -> &'static str {
    match self {
      OperatorKind::Map => "map",
      OperatorKind::TryMap => "try_map",
      OperatorKind::Filter => "filter",
      OperatorKind::FlatMap => "flat_map",
      OperatorKind::DoOnNext => "do_on_next",
      OperatorKind::DoOnSuccess => "do_on_success",
      OperatorKind::OnErrorReturn => "on_error_return",
      OperatorKind::Then => "then",
      OperatorKind::Delay => "delay_element",
      OperatorKind::Generate => "generate",
      OperatorKind::Defer => "defer",
    }
  }
}

impl std::fmt::Display for OperatorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}
