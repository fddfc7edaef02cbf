// rill/src/single/mod.rs

//! The single-value pipeline: produces at most one value or an error, then
//! terminates. Construction is lazy and cold; every subscription re-runs the
//! chain from scratch.

pub mod definition;
pub mod execution;
pub mod operators;

// Re-export the main pipeline struct
pub use definition::Single;
