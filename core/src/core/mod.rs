pub mod consumer;
pub mod control;
pub mod subscription;

pub(crate) mod eval;

// Re-export key types for easier access from other rill modules (and lib.rs)
pub use consumer::Consumer;
pub use control::{FlowControl, OperatorKind};
pub use subscription::{SubscriptionHandle, SubscriptionState};
