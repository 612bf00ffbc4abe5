//! Environment traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Action, ActionSpace, Observation, ObservationSpace, Reward};

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O> {
    /// Observation from the environment
    pub observation: O,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode reached a terminal state
    pub done: bool,
    /// Whether the episode was truncated (e.g., time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

/// Additional information from a step
///
/// Carried as a flat JSON map so environments can expose diagnostics
/// (true internal quantities, chosen action names, running totals) to
/// recorders and training loops without widening the observation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl StepInfo {
    /// Insert a numeric field
    pub fn insert_f64(&mut self, key: impl Into<String>, value: f64) {
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.fields.insert(key.into(), Value::Number(number));
        }
    }

    /// Insert a string field
    pub fn insert_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), Value::String(value.into()));
    }

    /// Read back a numeric field, if present
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Read back a string field, if present
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// Core environment trait
///
/// `reset` and `step` are async to fit agents and rollout drivers that are
/// themselves async; implementations are expected to complete in bounded
/// time without suspending.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Get the observation space
    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>>;

    /// Get the action space
    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>>;

    /// Reset the environment, starting a fresh episode
    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)>;

    /// Take a step in the environment
    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>>;

    /// Close the environment
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }
}
