//! Deterministic test harness for the Warden arbiter.
//!
//! Provides a manually clocked [`Environment`] implementation and a
//! plain-data reference model of the whole protocol for model-based
//! testing: operations are applied to both the model and the real
//! arbiter, and their results and observable states are compared.
//!
//! [`Environment`]: warden_core::env::Environment

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    ModelClientId, ModelResourceId, ModelWorld, ObservableState, Operation, OperationResult,
};
pub use sim_env::SimEnv;
