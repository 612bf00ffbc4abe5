//! Episode recording and export
//!
//! Captures a full episode trajectory in the JSON layout consumed by
//! playback and visualization clients. Field names follow that wire format
//! (`Vb_ml`, `pH`, `V_over_Veq`, ...) rather than Rust conventions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use titrate_rl_core::{
    Environment, Result, Step, Trajectory, Transition, VectorObservation,
};

use crate::indicator::Rgb;
use crate::titration::{TitrationAction, TitrationEnv};

/// Success band around the target pH, from the training reliability check
const SUCCESS_PH_LOW: f64 = 6.9;
/// Upper edge of the success band
const SUCCESS_PH_HIGH: f64 = 7.05;

/// One recorded environment step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedStep {
    /// 1-based step number
    pub step: usize,
    /// Action index
    pub action: usize,
    /// Human-readable action name
    pub action_name: String,
    /// Base volume after the step (mL)
    #[serde(rename = "Vb_ml")]
    pub vb_ml: f64,
    /// pH after the step
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Indicator color after the step
    pub color: Rgb,
    /// Reward for this step
    pub reward: f64,
    /// Cumulative reward including this step
    pub total_reward: f64,
    /// `|pH - target|` after the step
    pub distance_to_target: f64,
    /// Volume ratio `Vb / Veq` after the step
    #[serde(rename = "V_over_Veq")]
    pub v_over_veq: f64,
    /// Whether this step terminated the episode
    pub terminated: bool,
    /// Whether this step truncated the episode
    pub truncated: bool,
}

/// Solution state before any action was taken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialState {
    /// Base volume (mL), zero at reset
    #[serde(rename = "Vb_ml")]
    pub vb_ml: f64,
    /// pH at reset
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Indicator color at reset
    pub color: Rgb,
}

/// Episode summary for playback headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Number of steps taken
    pub total_steps: usize,
    /// pH at episode end
    #[serde(rename = "final_pH")]
    pub final_ph: f64,
    /// Base volume at episode end (mL)
    #[serde(rename = "final_Vb_ml")]
    pub final_vb_ml: f64,
    /// Cumulative episode reward
    pub total_reward: f64,
    /// `|pH - target|` at episode end
    pub final_distance: f64,
    /// Whether the final pH landed in the success band `[6.9, 7.05]`
    pub success: bool,
}

/// Complete exported episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Ordered step records
    pub steps: Vec<RecordedStep>,
    /// State at reset
    pub initial_state: InitialState,
    /// Target pH of the task
    #[serde(rename = "target_pH")]
    pub target_ph: f64,
    /// Equivalence volume (mL)
    #[serde(rename = "Veq_ml")]
    pub veq_ml: f64,
    /// The six increment magnitudes (mL)
    pub step_sizes_ml: Vec<f64>,
    /// Names of all actions, in index order
    pub action_names: Vec<String>,
    /// Summary block
    pub summary: EpisodeSummary,
}

impl EpisodeRecord {
    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns a serialization error if any field is not representable.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the record as JSON to the given path
    ///
    /// # Errors
    ///
    /// Propagates serialization and IO failures.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Records one episode of a [`TitrationEnv`]
///
/// Create it right after `reset`, feed it every step, then call
/// [`EpisodeRecorder::finish`]. The recorder also keeps the raw
/// [`Trajectory`] for training-side consumers.
pub struct EpisodeRecorder {
    steps: Vec<RecordedStep>,
    trajectory: Trajectory<VectorObservation, TitrationAction>,
    initial_state: InitialState,
    target_ph: f64,
    veq_ml: f64,
    last_observation: VectorObservation,
}

impl EpisodeRecorder {
    /// Start recording from a freshly reset environment
    #[must_use]
    pub fn new(env: &TitrationEnv, reset_observation: &VectorObservation) -> Self {
        Self {
            steps: Vec::new(),
            trajectory: Trajectory::new(),
            initial_state: InitialState {
                vb_ml: env.vb_ml(),
                ph: env.current_ph(),
                color: env.current_color(),
            },
            target_ph: env.config().target_ph,
            veq_ml: env.veq_ml(),
            last_observation: reset_observation.clone(),
        }
    }

    /// Record one step taken in the environment
    pub fn record(
        &mut self,
        env: &TitrationEnv,
        action: TitrationAction,
        step: &Step<VectorObservation>,
    ) {
        let ph = env.current_ph();
        self.steps.push(RecordedStep {
            step: self.steps.len() + 1,
            action: action.index(),
            action_name: action.name().to_string(),
            vb_ml: env.vb_ml(),
            ph,
            color: env.current_color(),
            reward: step.reward.0,
            total_reward: env.total_reward(),
            distance_to_target: (ph - self.target_ph).abs(),
            v_over_veq: env.vb_ml() / self.veq_ml,
            terminated: step.done,
            truncated: step.truncated,
        });
        self.trajectory.push(Transition {
            observation: std::mem::replace(&mut self.last_observation, step.observation.clone()),
            action,
            reward: step.reward,
            next_observation: step.observation.clone(),
            done: step.done,
            truncated: step.truncated,
            info: step.info.clone(),
        });
    }

    /// Raw trajectory collected so far
    #[must_use]
    pub fn trajectory(&self) -> &Trajectory<VectorObservation, TitrationAction> {
        &self.trajectory
    }

    /// Close the recording and build the export record
    #[must_use]
    pub fn finish(self) -> EpisodeRecord {
        let (final_ph, final_vb_ml) = self
            .steps
            .last()
            .map_or((self.initial_state.ph, self.initial_state.vb_ml), |s| {
                (s.ph, s.vb_ml)
            });
        let final_distance = (final_ph - self.target_ph).abs();
        let summary = EpisodeSummary {
            total_steps: self.steps.len(),
            final_ph,
            final_vb_ml,
            total_reward: self.trajectory.total_reward,
            final_distance,
            success: (SUCCESS_PH_LOW..=SUCCESS_PH_HIGH).contains(&final_ph),
        };
        tracing::info!(
            total_steps = summary.total_steps,
            final_ph = summary.final_ph,
            total_reward = summary.total_reward,
            success = summary.success,
            "episode recorded"
        );
        EpisodeRecord {
            steps: self.steps,
            initial_state: self.initial_state,
            target_ph: self.target_ph,
            veq_ml: self.veq_ml,
            step_sizes_ml: TitrationAction::step_sizes_ml().to_vec(),
            action_names: TitrationAction::names().map(String::from).to_vec(),
            summary,
        }
    }
}

/// Run one full episode under the given policy and export it
///
/// The policy sees each observation and picks the next action; the episode
/// runs from `reset` until termination or truncation.
///
/// # Errors
///
/// Propagates any environment error.
pub async fn run_episode<P>(env: &mut TitrationEnv, mut policy: P) -> Result<EpisodeRecord>
where
    P: FnMut(&VectorObservation) -> TitrationAction,
{
    let (mut observation, _info) = env.reset().await?;
    let mut recorder = EpisodeRecorder::new(env, &observation);

    loop {
        let action = policy(&observation);
        let step = env.step(action).await?;
        recorder.record(env, action, &step);
        if step.done || step.truncated {
            break;
        }
        observation = step.observation;
    }

    Ok(recorder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::titration::TitrationEnv;
    use approx::assert_relative_eq;

    async fn record_scripted(script: &[TitrationAction]) -> EpisodeRecord {
        let mut env = TitrationEnv::default_setup().unwrap();
        let mut queue = script.iter().copied();
        run_episode(&mut env, |_| queue.next().unwrap_or(TitrationAction::Stop))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn record_captures_every_step_in_order() {
        let script = [
            TitrationAction::Add3000,
            TitrationAction::Add1000,
            TitrationAction::Stop,
        ];
        let record = record_scripted(&script).await;

        assert_eq!(record.steps.len(), 3);
        for (i, step) in record.steps.iter().enumerate() {
            assert_eq!(step.step, i + 1);
        }
        assert_eq!(record.steps[0].action_name, "3.0mL");
        assert_relative_eq!(record.steps[1].vb_ml, 4.0);
        assert!(record.steps[2].terminated);
        assert_eq!(record.summary.total_steps, 3);
    }

    #[tokio::test]
    async fn record_header_describes_the_task() {
        let record = record_scripted(&[TitrationAction::Stop]).await;

        assert_relative_eq!(record.target_ph, 7.0);
        assert_relative_eq!(record.veq_ml, 50.0);
        assert_eq!(record.step_sizes_ml, vec![0.1, 0.2, 0.5, 1.0, 2.0, 3.0]);
        assert_eq!(record.action_names.len(), 7);
        assert_eq!(record.action_names[6], "Stop");
        assert_relative_eq!(record.initial_state.vb_ml, 0.0);
    }

    #[tokio::test]
    async fn total_reward_matches_the_trajectory_sum() {
        let record = record_scripted(&[
            TitrationAction::Add2000,
            TitrationAction::Add2000,
            TitrationAction::Stop,
        ])
        .await;

        let summed: f64 = record.steps.iter().map(|s| s.reward).sum();
        assert_relative_eq!(record.summary.total_reward, summed, epsilon = 1e-9);
        assert_relative_eq!(
            record.steps.last().unwrap().total_reward,
            summed,
            epsilon = 1e-9
        );
    }

    #[tokio::test]
    async fn success_requires_the_final_ph_band() {
        // Immediate stop leaves the solution strongly acidic
        let record = record_scripted(&[TitrationAction::Stop]).await;
        assert!(!record.summary.success);

        // A scripted run to 49.7 mL ends at pH 6.979, inside [6.9, 7.05]
        let mut script = vec![TitrationAction::Add1000; 49];
        script.push(TitrationAction::Add500);
        script.push(TitrationAction::Add200);
        script.push(TitrationAction::Stop);
        let record = record_scripted(&script).await;
        assert!(record.summary.success, "final pH {}", record.summary.final_ph);
    }

    #[tokio::test]
    async fn json_export_uses_wire_field_names() {
        let record = record_scripted(&[TitrationAction::Add100, TitrationAction::Stop]).await;
        let json = record.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["target_pH"].is_number());
        assert!(value["Veq_ml"].is_number());
        assert!(value["initial_state"]["pH"].is_number());
        assert!(value["initial_state"]["color"].is_array());
        let step = &value["steps"][0];
        for key in [
            "step",
            "action",
            "action_name",
            "Vb_ml",
            "pH",
            "color",
            "reward",
            "total_reward",
            "distance_to_target",
            "V_over_Veq",
            "terminated",
            "truncated",
        ] {
            assert!(!step[key].is_null(), "missing wire field {key}");
        }
        assert_eq!(step["color"].as_array().unwrap().len(), 3);
        assert!(value["summary"]["success"].is_boolean());
    }
}
