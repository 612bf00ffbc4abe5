//! Reward shaping for the titration task
//!
//! The shaping is deliberately asymmetric: titrant can only be added, never
//! withdrawn, so overshooting past the target pH is unrecoverable within an
//! episode while undershooting remains correctable. Overshoot penalties
//! escalate non-linearly so that no single step's positive signal can pay
//! for crossing the target.

/// Scale of the smooth distance-to-target signal
const BASE_SIGNAL_MAGNITUDE: f64 = 50.0;
/// Decay length (pH units) of the distance signal
const BASE_SIGNAL_DECAY: f64 = 0.8;
/// Gain on per-step distance improvement
const PROGRESS_GAIN: f64 = 5.0;

/// Bonus for sitting anywhere in the broad pre-equivalence zone
const ZONE_BROAD_BONUS: f64 = 1.0;
/// Bonus for the approach zone just under the target
const ZONE_NEAR_BONUS: f64 = 5.0;
/// Bonus for the fine-control zone immediately under the target
const ZONE_FINE_BONUS: f64 = 20.0;

/// Penalty for continuing to raise pH when already past the target
const PAST_TARGET_INCREASE_PENALTY: f64 = -5.0;

/// Episode-ending reward when an addition would overflow the burette
pub const BURETTE_EXHAUSTED_REWARD: f64 = -30.0;

/// Stop bonus when within 0.02 pH of the target
const STOP_BONUS_FINE: f64 = 500.0;
/// Stop bonus when within 0.05 pH of the target
const STOP_BONUS_NEAR: f64 = 300.0;
/// Stop bonus when within 0.1 pH of the target
const STOP_BONUS_BROAD: f64 = 150.0;
/// Overshoot penalties double when the agent stops while past the target
const STOP_OVERSHOOT_SCALE: f64 = 2.0;
/// Flat penalty for stopping before any meaningful titration happened
const STOP_AT_RESET_PENALTY: f64 = -1.0;
/// Fraction of the equivalence volume below which a stop counts as immediate
const STOP_AT_RESET_FRACTION: f64 = 0.01;

/// Per-step reward shaping for the titration environment
///
/// Pure and stateless: every method is a function of the pH transition it
/// is given. One value per environment instance.
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    /// Target pH the agent is driving toward
    pub target_ph: f64,
}

impl RewardPolicy {
    /// Create a policy targeting the given pH
    #[must_use]
    pub fn new(target_ph: f64) -> Self {
        Self { target_ph }
    }

    /// Reward for a titrant-addition step that moved the pH from `ph_prev`
    /// to `ph`.
    #[must_use]
    pub fn step_reward(&self, ph_prev: f64, ph: f64) -> f64 {
        let d_prev = (ph_prev - self.target_ph).abs();
        let d = (ph - self.target_ph).abs();

        let mut reward = BASE_SIGNAL_MAGNITUDE * (-d / BASE_SIGNAL_DECAY).exp();

        // Reward progress toward the target, never movement away
        if d < d_prev {
            reward += PROGRESS_GAIN * (d_prev - d);
        }

        // Zone bonuses are cumulative, not exclusive
        if (3.0..=6.0).contains(&ph) {
            reward += ZONE_BROAD_BONUS;
        }
        if (6.5..=7.0).contains(&ph) {
            reward += ZONE_NEAR_BONUS;
        }
        if (6.9..=7.0).contains(&ph) {
            reward += ZONE_FINE_BONUS;
        }

        reward += self.overshoot_penalty(ph);

        // Continuing upward while already past the target is penalized even
        // when the overshoot band has not changed
        if ph > ph_prev && ph > self.target_ph {
            reward += PAST_TARGET_INCREASE_PENALTY;
        }

        reward
    }

    /// Reward for choosing the stop action at pH `ph` after adding `vb_ml`
    /// of a `veq_ml` equivalence volume.
    #[must_use]
    pub fn stop_reward(&self, ph: f64, vb_ml: f64, veq_ml: f64) -> f64 {
        let d = (ph - self.target_ph).abs();

        if d <= 0.02 {
            return STOP_BONUS_FINE;
        }
        if d <= 0.05 {
            return STOP_BONUS_NEAR;
        }
        if d <= 0.1 {
            return STOP_BONUS_BROAD;
        }

        if ph > self.target_ph {
            // Stopping while overshot is worse than stepping while overshot
            return STOP_OVERSHOOT_SCALE * self.overshoot_penalty(ph);
        }

        // Undershot and far away: discourage stopping right at reset
        if vb_ml < STOP_AT_RESET_FRACTION * veq_ml {
            return STOP_AT_RESET_PENALTY;
        }

        0.0
    }

    /// Overshoot penalty ladder; the highest exceeded threshold wins.
    fn overshoot_penalty(&self, ph: f64) -> f64 {
        let over = ph - self.target_ph;
        if over <= 0.0 {
            0.0
        } else if ph > 8.0 {
            -500.0
        } else if ph > 7.5 {
            -200.0
        } else if ph > 7.2 {
            -100.0
        } else if ph > 7.1 {
            -50.0
        } else {
            -10.0
        }
    }
}
