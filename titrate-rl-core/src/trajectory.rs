//! Trajectory storage for rollout collection

use serde::{Deserialize, Serialize};

use crate::{environment::StepInfo, Reward};

/// Single transition in a trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition<O, A> {
    /// Observation before the action
    pub observation: O,
    /// Action taken
    pub action: A,
    /// Reward received
    pub reward: Reward,
    /// Observation after the action
    pub next_observation: O,
    /// Whether the episode reached a terminal state
    pub done: bool,
    /// Whether the episode was truncated
    pub truncated: bool,
    /// Step diagnostics as reported by the environment
    pub info: StepInfo,
}

/// Complete trajectory of an episode
#[derive(Debug, Clone, Default)]
pub struct Trajectory<O, A> {
    /// Sequence of transitions
    pub transitions: Vec<Transition<O, A>>,
    /// Total reward
    pub total_reward: f64,
}

impl<O, A> Trajectory<O, A> {
    /// Create a new empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            total_reward: 0.0,
        }
    }

    /// Add a transition to the trajectory
    pub fn push(&mut self, transition: Transition<O, A>) {
        self.total_reward += transition.reward.0;
        self.transitions.push(transition);
    }

    /// Get the length of the trajectory
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if trajectory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Compute returns (cumulative discounted rewards)
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for i in (0..self.len()).rev() {
            if self.transitions[i].done || self.transitions[i].truncated {
                running_return = 0.0;
            }
            running_return = self.transitions[i].reward.0 + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }
}
