//! Weak-acid titration environment
//!
//! The agent adds strong base to a weak-acid solution in discrete increments
//! and observes only the indicator color, the volume ratio, and a normalized
//! step counter, never the true pH. The episode ends when the agent stops,
//! the burette runs out, or the step limit is reached.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use titrate_rl_core::{
    Action, ActionSpace, BoxObservationSpace, DiscreteAction, Environment, ObservationSpace,
    Result, Reward, RlError, Step, StepInfo, VectorObservation,
};

use crate::chemistry::{compute_ph, equivalence_volume_ml};
use crate::indicator::{color_from_ph, DEFAULT_NEUTRAL_BAND, DEFAULT_P_KA_IND};
use crate::reward::{RewardPolicy, BURETTE_EXHAUSTED_REWARD};

/// Titrant volumes, in µL, of the six addition actions
const STEP_SIZES_UL: [u32; 6] = [100, 200, 500, 1000, 2000, 3000];

/// Discrete action set of the titration environment
///
/// A closed enumeration: six titrant increments plus a stop action. Keeping
/// the set closed means every dispatch over it is exhaustively checked,
/// rather than branching on a raw index at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitrationAction {
    /// Add 0.1 mL of base
    Add100,
    /// Add 0.2 mL of base
    Add200,
    /// Add 0.5 mL of base
    Add500,
    /// Add 1.0 mL of base
    Add1000,
    /// Add 2.0 mL of base
    Add2000,
    /// Add 3.0 mL of base
    Add3000,
    /// Stop titrating and end the episode
    Stop,
}

impl TitrationAction {
    /// All actions, in index order
    pub const ALL: [Self; 7] = [
        Self::Add100,
        Self::Add200,
        Self::Add500,
        Self::Add1000,
        Self::Add2000,
        Self::Add3000,
        Self::Stop,
    ];

    /// The six increment magnitudes in mL, in index order
    #[must_use]
    pub fn step_sizes_ml() -> [f64; 6] {
        STEP_SIZES_UL.map(|ul| f64::from(ul) / 1000.0)
    }

    /// Action at the given index
    ///
    /// # Errors
    ///
    /// Returns [`RlError::InvalidAction`] for indices outside `0..7`; an
    /// out-of-range index is a caller contract violation, not an episode
    /// outcome.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| RlError::InvalidAction(format!("action index {index} out of range 0..7")))
    }

    /// Index of this action in the action space
    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0)
    }

    /// Titrant volume in mL, or `None` for the stop action
    #[must_use]
    pub fn volume_ml(self) -> Option<f64> {
        match self {
            Self::Add100 => Some(0.1),
            Self::Add200 => Some(0.2),
            Self::Add500 => Some(0.5),
            Self::Add1000 => Some(1.0),
            Self::Add2000 => Some(2.0),
            Self::Add3000 => Some(3.0),
            Self::Stop => None,
        }
    }

    /// Display name, matching the episode export format
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add100 => "0.1mL",
            Self::Add200 => "0.2mL",
            Self::Add500 => "0.5mL",
            Self::Add1000 => "1.0mL",
            Self::Add2000 => "2.0mL",
            Self::Add3000 => "3.0mL",
            Self::Stop => "Stop",
        }
    }

    /// Display names of all actions, in index order
    #[must_use]
    pub fn names() -> [&'static str; 7] {
        Self::ALL.map(Self::name)
    }
}

impl Action for TitrationAction {
    fn to_vec(&self) -> Vec<f64> {
        vec![self.index() as f64]
    }
}

impl From<TitrationAction> for DiscreteAction {
    fn from(action: TitrationAction) -> Self {
        DiscreteAction(action.index())
    }
}

impl TryFrom<DiscreteAction> for TitrationAction {
    type Error = RlError;

    fn try_from(action: DiscreteAction) -> Result<Self> {
        Self::from_index(action.0)
    }
}

/// Action space over [`TitrationAction`]
#[derive(Debug, Clone, Default)]
pub struct TitrationActionSpace;

impl ActionSpace for TitrationActionSpace {
    type Action = TitrationAction;

    fn sample(&self) -> Self::Action {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        TitrationAction::ALL[rng.gen_range(0..TitrationAction::ALL.len())]
    }

    fn contains(&self, _action: &Self::Action) -> bool {
        true
    }

    fn dim(&self) -> Option<usize> {
        Some(1)
    }
}

/// Why a terminated episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// The agent chose the stop action
    AgentStopped,
    /// An addition would have pushed the burette past capacity
    BuretteExhausted,
}

/// Lifecycle of one episode
///
/// `Active` is the initial state; the other two are absorbing. Truncation
/// only ever comes from the step limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// Episode in progress, `step` calls are valid
    Active,
    /// Episode ended by an in-environment condition
    Terminated(TerminationCause),
    /// Episode cut off by the step limit
    Truncated,
}

impl EpisodeStatus {
    /// Whether the episode is still accepting steps
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Fixed per-episode configuration
///
/// Fields mirror the physical setup: acid volume and concentration, base
/// concentration, acid pKa, indicator parameters, and the two hard limits
/// (burette capacity and step count). Validation happens in
/// [`TitrationEnv::new`] before any state exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitrationConfig {
    /// Initial acid volume (mL)
    pub va_ml: f64,
    /// Acid concentration (mol/L)
    pub ca: f64,
    /// Base concentration (mol/L)
    pub cb: f64,
    /// Acid dissociation exponent
    pub p_ka: f64,
    /// Target pH the agent is rewarded for reaching
    pub target_ph: f64,
    /// Step-count limit per episode
    pub max_steps: usize,
    /// Burette capacity (mL)
    pub max_burette_ml: f64,
    /// Indicator transition midpoint
    pub p_ka_ind: f64,
    /// Half-width of the neutral color band
    pub neutral_band: f64,
}

impl Default for TitrationConfig {
    fn default() -> Self {
        // Acetic-acid-like setup: Veq lands exactly at the burette capacity
        Self {
            va_ml: 50.0,
            ca: 0.1,
            cb: 0.1,
            p_ka: 4.76,
            target_ph: 7.0,
            max_steps: 200,
            max_burette_ml: 50.0,
            p_ka_ind: DEFAULT_P_KA_IND,
            neutral_band: DEFAULT_NEUTRAL_BAND,
        }
    }
}

impl TitrationConfig {
    /// Check the configuration for physical validity
    ///
    /// # Errors
    ///
    /// Returns [`RlError::InvalidConfig`] if any of the solution parameters
    /// or limits is non-positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("va_ml", self.va_ml),
            ("ca", self.ca),
            ("cb", self.cb),
            ("max_burette_ml", self.max_burette_ml),
            ("neutral_band", self.neutral_band),
        ] {
            if !(value > 0.0) {
                return Err(RlError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(RlError::InvalidConfig("max_steps must be positive".into()));
        }
        Ok(())
    }
}

/// The titration environment
///
/// One value per concurrent rollout: all mutable episode state lives in the
/// instance, so independent instances can be stepped in parallel with no
/// shared state.
pub struct TitrationEnv {
    config: TitrationConfig,
    policy: RewardPolicy,
    /// Equivalence volume (mL), derived once from the config
    veq_ml: f64,
    /// Base volume added so far (mL)
    vb_ml: f64,
    /// Step counter
    steps: usize,
    /// Cumulative reward over the episode
    total_reward: f64,
    /// pH after the previous transition, for the progress delta
    last_ph: f64,
    status: EpisodeStatus,
}

impl TitrationEnv {
    /// Create an environment from a validated configuration
    ///
    /// The new instance starts in a freshly reset episode.
    ///
    /// # Errors
    ///
    /// Returns [`RlError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: TitrationConfig) -> Result<Self> {
        config.validate()?;
        let veq_ml = equivalence_volume_ml(config.va_ml, config.ca, config.cb);
        let policy = RewardPolicy::new(config.target_ph);
        let mut env = Self {
            config,
            policy,
            veq_ml,
            vb_ml: 0.0,
            steps: 0,
            total_reward: 0.0,
            last_ph: 0.0,
            status: EpisodeStatus::Active,
        };
        env.reset_episode();
        Ok(env)
    }

    /// Environment with the default acetic-acid setup
    ///
    /// # Errors
    ///
    /// Never fails for the default configuration; the `Result` keeps the
    /// constructor signatures uniform.
    pub fn default_setup() -> Result<Self> {
        Self::new(TitrationConfig::default())
    }

    /// Current pH of the solution
    #[must_use]
    pub fn current_ph(&self) -> f64 {
        compute_ph(
            self.config.va_ml,
            self.config.ca,
            self.vb_ml,
            self.config.cb,
            self.config.p_ka,
        )
    }

    /// Indicator color at the current pH
    #[must_use]
    pub fn current_color(&self) -> crate::indicator::Rgb {
        color_from_ph(
            self.current_ph(),
            self.config.p_ka_ind,
            self.config.neutral_band,
        )
    }

    /// Base volume added so far (mL)
    #[must_use]
    pub fn vb_ml(&self) -> f64 {
        self.vb_ml
    }

    /// Equivalence volume (mL)
    #[must_use]
    pub fn veq_ml(&self) -> f64 {
        self.veq_ml
    }

    /// Steps taken in the current episode
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Cumulative reward over the current episode
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Episode lifecycle status
    #[must_use]
    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// The configuration this environment was built from
    #[must_use]
    pub fn config(&self) -> &TitrationConfig {
        &self.config
    }

    /// Step by raw action index, for index-driven training loops
    ///
    /// # Errors
    ///
    /// Rejects out-of-range indices with [`RlError::InvalidAction`] before
    /// touching any episode state, and finished episodes with
    /// [`RlError::EpisodeFinished`].
    pub async fn step_index(&mut self, index: usize) -> Result<Step<VectorObservation>> {
        let action = TitrationAction::from_index(index)?;
        self.step(action).await
    }

    fn reset_episode(&mut self) {
        self.vb_ml = 0.0;
        self.steps = 0;
        self.total_reward = 0.0;
        self.status = EpisodeStatus::Active;
        self.last_ph = self.current_ph();
        tracing::debug!(
            va_ml = self.config.va_ml,
            veq_ml = self.veq_ml,
            ph = self.last_ph,
            "episode reset"
        );
    }

    fn observation(&self) -> VectorObservation {
        let color = self.current_color();
        let [r, g, b] = color.channels();
        VectorObservation {
            data: vec![
                r,
                g,
                b,
                self.vb_ml / self.veq_ml,
                self.steps as f64 / self.config.max_steps as f64,
            ],
        }
    }

    fn diagnostics(&self, ph: f64, action: Option<TitrationAction>, reward: f64) -> StepInfo {
        let mut info = StepInfo::default();
        info.insert_f64("pH", ph);
        info.insert_f64("Vb_ml", self.vb_ml);
        info.insert_f64("distance_to_target", (ph - self.config.target_ph).abs());
        info.insert_f64("V_over_Veq", self.vb_ml / self.veq_ml);
        info.insert_f64("reward", reward);
        info.insert_f64("total_reward", self.total_reward);
        if let Some(action) = action {
            info.insert_str("action_name", action.name());
        }
        info
    }
}

#[async_trait]
impl Environment for TitrationEnv {
    type Observation = VectorObservation;
    type Action = TitrationAction;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        // [R, G, B, Vb/Veq, t/Smax]; the volume ratio may pass 1.0 when the
        // burette holds more than one equivalence volume
        let low = vec![0.0; 5];
        let high = vec![1.0, 1.0, 1.0, 2.0, 1.0];
        Box::new(BoxObservationSpace::new(low, high, vec![5]).unwrap())
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(TitrationActionSpace)
    }

    async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
        self.reset_episode();
        let ph = self.last_ph;
        let info = self.diagnostics(ph, None, 0.0);
        Ok((self.observation(), info))
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        if !self.status.is_active() {
            return Err(RlError::EpisodeFinished(format!(
                "cannot step a finished episode ({:?})",
                self.status
            )));
        }

        let ph_prev = self.last_ph;
        let reward = match action.volume_ml() {
            None => {
                let reward = self
                    .policy
                    .stop_reward(ph_prev, self.vb_ml, self.veq_ml);
                self.status = EpisodeStatus::Terminated(TerminationCause::AgentStopped);
                tracing::debug!(ph = ph_prev, vb_ml = self.vb_ml, reward, "agent stopped");
                reward
            }
            Some(volume_ml) => {
                let candidate_vb = self.vb_ml + volume_ml;
                if candidate_vb > self.config.max_burette_ml {
                    // Not clipped: the attempt itself exhausts the burette
                    self.status = EpisodeStatus::Terminated(TerminationCause::BuretteExhausted);
                    tracing::debug!(
                        vb_ml = self.vb_ml,
                        attempted_ml = candidate_vb,
                        "burette exhausted"
                    );
                    BURETTE_EXHAUSTED_REWARD
                } else {
                    self.vb_ml = candidate_vb;
                    let ph = self.current_ph();
                    let reward = self.policy.step_reward(ph_prev, ph);
                    self.last_ph = ph;
                    self.steps += 1;
                    reward
                }
            }
        };

        self.total_reward += reward;

        if self.status.is_active() && self.steps >= self.config.max_steps {
            self.status = EpisodeStatus::Truncated;
            tracing::debug!(steps = self.steps, "step limit reached");
        }

        let ph = self.last_ph;
        let info = self.diagnostics(ph, Some(action), reward);

        Ok(Step {
            observation: self.observation(),
            reward: Reward(reward),
            done: matches!(self.status, EpisodeStatus::Terminated(_)),
            truncated: matches!(self.status, EpisodeStatus::Truncated),
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use titrate_rl_core::Observation;

    fn env() -> TitrationEnv {
        TitrationEnv::default_setup().unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TitrationConfig {
            ca: -0.1,
            ..TitrationConfig::default()
        };
        assert!(matches!(
            TitrationEnv::new(config),
            Err(RlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn action_indices_round_trip() {
        for (i, action) in TitrationAction::ALL.iter().enumerate() {
            assert_eq!(TitrationAction::from_index(i).unwrap(), *action);
            assert_eq!(action.index(), i);
        }
        assert!(TitrationAction::from_index(7).is_err());
    }

    #[test]
    fn step_sizes_match_action_volumes() {
        let sizes = TitrationAction::step_sizes_ml();
        assert_eq!(sizes, [0.1, 0.2, 0.5, 1.0, 2.0, 3.0]);
        for (size, action) in sizes.iter().zip(TitrationAction::ALL) {
            assert_relative_eq!(action.volume_ml().unwrap(), *size);
        }
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let mut env = env();
        let (first, _) = env.reset().await.unwrap();
        env.step(TitrationAction::Add3000).await.unwrap();
        let (second, _) = env.reset().await.unwrap();
        assert_eq!(first, second);
        assert_relative_eq!(env.vb_ml(), 0.0);
        assert_eq!(env.steps(), 0);
        assert_relative_eq!(env.total_reward(), 0.0);
    }

    #[tokio::test]
    async fn observation_has_expected_layout() {
        let mut env = env();
        let (obs, info) = env.reset().await.unwrap();
        assert_eq!(obs.shape(), vec![5]);
        assert_relative_eq!(obs.data[3], 0.0); // no base added yet
        assert_relative_eq!(obs.data[4], 0.0); // no steps taken
        assert!(info.get_f64("pH").is_some());
        assert!(env.observation_space().contains(&obs));
    }

    #[tokio::test]
    async fn adding_base_moves_the_volume_ratio() {
        let mut env = env();
        let step = env.step(TitrationAction::Add1000).await.unwrap();
        assert_relative_eq!(env.vb_ml(), 1.0);
        assert_relative_eq!(step.observation.data[3], 1.0 / 50.0);
        assert!(!step.done);
        assert!(!step.truncated);
    }

    #[tokio::test]
    async fn step_info_carries_required_fields() {
        let mut env = env();
        let step = env.step(TitrationAction::Add500).await.unwrap();
        for key in [
            "pH",
            "Vb_ml",
            "distance_to_target",
            "V_over_Veq",
            "reward",
            "total_reward",
        ] {
            assert!(step.info.get_f64(key).is_some(), "missing info field {key}");
        }
        assert_eq!(step.info.get_str("action_name"), Some("0.5mL"));
    }

    #[tokio::test]
    async fn burette_overrun_terminates_without_mutating_volume() {
        let mut env = env();
        // 16 * 3 mL = 48 mL, inside the 50 mL burette
        for _ in 0..16 {
            env.step(TitrationAction::Add3000).await.unwrap();
        }
        assert_relative_eq!(env.vb_ml(), 48.0);

        let step = env.step(TitrationAction::Add3000).await.unwrap();
        assert_relative_eq!(env.vb_ml(), 48.0);
        assert_relative_eq!(step.reward.0, BURETTE_EXHAUSTED_REWARD);
        assert!(step.done);
        assert!(!step.truncated);
        assert_eq!(
            env.status(),
            EpisodeStatus::Terminated(TerminationCause::BuretteExhausted)
        );
    }

    /// Drive the default setup to 49.7 mL, the closest volume to the
    /// equivalence point that the 0.1 mL increment granularity can reach.
    async fn drive_to_49_7(env: &mut TitrationEnv) {
        for _ in 0..49 {
            env.step(TitrationAction::Add1000).await.unwrap();
        }
        env.step(TitrationAction::Add500).await.unwrap();
        env.step(TitrationAction::Add200).await.unwrap();
        assert_relative_eq!(env.vb_ml(), 49.7, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn stop_just_outside_fine_band_pays_the_near_bonus() {
        let mut env = env();
        drive_to_49_7(&mut env).await;
        // pKa 4.76 puts 49.7 mL at pH 6.979, a hair outside the 0.02 band
        let ph = env.current_ph();
        assert!(ph < 7.0, "scripted endpoint overshot: pH {ph}");

        let step = env.step(TitrationAction::Stop).await.unwrap();
        let distance = step.info.get_f64("distance_to_target").unwrap();
        assert!(distance <= 0.05, "distance {distance}");
        assert!(step.reward.0 >= 300.0);
        assert!(step.done);
        assert_eq!(
            env.status(),
            EpisodeStatus::Terminated(TerminationCause::AgentStopped)
        );
    }

    #[tokio::test]
    async fn stop_within_fine_band_pays_the_full_bonus() {
        // With pKa 4.78 the reachable 49.7 mL endpoint sits 0.0008 pH from
        // the target, inside the 0.02 stop band
        let mut env = TitrationEnv::new(TitrationConfig {
            p_ka: 4.78,
            ..TitrationConfig::default()
        })
        .unwrap();
        drive_to_49_7(&mut env).await;

        let step = env.step(TitrationAction::Stop).await.unwrap();
        let distance = step.info.get_f64("distance_to_target").unwrap();
        assert!(distance <= 0.02, "distance {distance}");
        assert!(step.reward.0 >= 500.0);
        assert!(step.done);
    }

    #[tokio::test]
    async fn step_limit_truncates_instead_of_terminating() {
        let mut env = env();
        // 0.1 mL per step keeps the total at 20 mL after 200 steps
        for _ in 0..200 {
            let step = env.step(TitrationAction::Add100).await.unwrap();
            assert!(!step.done);
        }
        assert_eq!(env.status(), EpisodeStatus::Truncated);
        assert!(env.vb_ml() <= 50.0);
    }

    #[tokio::test]
    async fn finished_episode_refuses_further_steps() {
        let mut env = env();
        env.step(TitrationAction::Stop).await.unwrap();
        let err = env.step(TitrationAction::Add100).await.unwrap_err();
        assert!(matches!(err, RlError::EpisodeFinished(_)));
    }

    #[tokio::test]
    async fn out_of_range_index_is_a_contract_violation() {
        let mut env = env();
        let err = env.step_index(9).await.unwrap_err();
        assert!(matches!(err, RlError::InvalidAction(_)));
        // The failed call must not have touched episode state
        assert_eq!(env.steps(), 0);
        assert!(env.status().is_active());
    }

    #[tokio::test]
    async fn volume_never_exceeds_burette_capacity() {
        let mut env = env();
        loop {
            let step = env.step(TitrationAction::Add3000).await.unwrap();
            assert!(env.vb_ml() <= env.config().max_burette_ml);
            if step.done || step.truncated {
                break;
            }
        }
    }
}
