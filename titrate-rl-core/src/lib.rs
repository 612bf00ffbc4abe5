//! Core reinforcement learning traits and types for the titration environment
//!
//! This crate provides the foundational abstractions (actions, observations,
//! rewards, the environment step contract, and trajectory storage) that the
//! titration environment and its external training loops build on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod reward;
pub mod trajectory;

// Re-export core traits and types
pub use action::{Action, ActionSpace, DiscreteAction, DiscreteSpace};
pub use environment::{Environment, Step, StepInfo};
pub use error::{Result, RlError};
pub use observation::{BoxObservationSpace, Observation, ObservationSpace, VectorObservation};
pub use reward::Reward;
pub use trajectory::{Trajectory, Transition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, Environment, Observation, ObservationSpace, Result, Reward, Step,
        StepInfo,
    };
}
