//! Weak-acid titration environment with a colorimetric observation
//!
//! This crate provides:
//! - A closed-form pH solver for monoprotic weak-acid / strong-base titration
//! - A continuous indicator color model (the agent's only chemistry signal)
//! - Asymmetric anti-overshoot reward shaping
//! - The episode state machine implementing the `Environment` contract
//! - Episode recording in the JSON export format used by playback clients

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chemistry;
pub mod indicator;
pub mod manual;
pub mod recording;
pub mod reward;
pub mod titration;

// Re-export the environment surface
pub use chemistry::{compute_ph, equivalence_volume_ml};
pub use indicator::{color_from_ph, Rgb};
pub use recording::{run_episode, EpisodeRecord, EpisodeRecorder, EpisodeSummary};
pub use reward::RewardPolicy;
pub use titration::{
    EpisodeStatus, TerminationCause, TitrationAction, TitrationActionSpace, TitrationConfig,
    TitrationEnv,
};

// Re-export core types
pub use titrate_rl_core::{
    Action, ActionSpace, Environment, Observation, ObservationSpace, Result, Reward, RlError,
    Step, StepInfo, VectorObservation,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        run_episode, EpisodeRecorder, EpisodeStatus, TitrationAction, TitrationConfig,
        TitrationEnv,
    };
    pub use titrate_rl_core::prelude::*;
}
