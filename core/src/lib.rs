// src/lib.rs

//! Rill: an ASYNC single-consumer reactive pipeline core for Rust.
//!
//! Rill lets you declare lazy, re-subscribable value pipelines
//! with features like:
//!  - A single-value pipeline (`Single<T>`) and a multi-value pipeline (`Many<T>`).
//!  - Cold semantics: chains are immutable descriptions, re-run per subscription.
//!  - Fallible transforms whose failures become terminal error notifications.
//!  - Error recovery (`on_error_return`) and side-effect observation hooks.
//!  - Stateful sequence generation with an exactly-once finalizer.
//!  - A manual push-style source (`EmitterSink`) with buffer-then-replay.
//!  - Cooperative cancellation through externally-held subscription handles.
//!  - A step-based verification harness for asserting exact signal sequences.

// Declare modules according to the planned structure
pub mod core;
pub mod single;
pub mod many;
pub mod sink;
pub mod verify;
pub mod error;

// --- Re-exports for the Public API ---

// Core types that users will interact with frequently
pub use crate::core::consumer::Consumer;
pub use crate::core::control::{FlowControl, OperatorKind};
pub use crate::core::subscription::{SubscriptionHandle, SubscriptionState};

// The two pipeline structs and their auxiliary handles
pub use crate::single::definition::Single;
pub use crate::many::definition::Many;
pub use crate::many::generate::StepEmitter;
pub use crate::sink::EmitterSink;

pub use crate::error::{RillError, RillResult};

// The step-based verification harness
pub use crate::verify::{StepVerifier, VerifyError, VerifySource};
