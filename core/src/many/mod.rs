// rill/src/many/mod.rs

//! The multi-value pipeline: produces zero or more values in order, then
//! completes or errors. Construction is lazy and cold; subscribing re-runs
//! the chain (the emitter sink source is the one stateful exception, see
//! `crate::sink`).

pub mod definition;
pub mod execution;
pub mod generate;
pub mod operators;

// Re-export the main pipeline struct and the generator emission handle
pub use definition::Many;
pub use generate::StepEmitter;
