//! Reference model for model-based testing.
//!
//! [`ModelWorld`] re-implements the arbiter protocol in plain vectors
//! and queues with a millisecond virtual clock. It is the oracle: the
//! real implementation must produce the same per-operation results and
//! the same observable state for any operation sequence.

mod operation;
mod world;

pub use operation::{ModelClientId, ModelResourceId, Operation, OperationResult};
pub use world::{ModelWorld, ObservableState};
