//! Simulated acid/base indicator with a continuous color response
//!
//! The agent never sees the true pH, only this color. The mapping is a
//! logistic yellow-to-blue blend from the indicator equilibrium, with a
//! green overlay fading in triangularly inside a narrow band around
//! neutral. Continuity everywhere is deliberate: a discontinuous color
//! curve would alias distinct pH values into an unlearnable signal.

use serde::{Deserialize, Serialize};

/// Indicator transition midpoint used when none is configured
pub const DEFAULT_P_KA_IND: f64 = 7.0;

/// Half-width of the neutral band used when none is configured
pub const DEFAULT_NEUTRAL_BAND: f64 = 0.15;

/// pH at which the neutral overlay peaks
const NEUTRAL_PH: f64 = 7.0;

/// Color of the protonated (acid) indicator form: yellow
pub const ACID_RGB: Rgb = Rgb {
    r: 1.0,
    g: 1.0,
    b: 0.0,
};

/// Color of the deprotonated (base) indicator form: blue
pub const BASE_RGB: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 1.0,
};

/// Color overlaid near neutral pH: green
pub const NEUTRAL_RGB: Rgb = Rgb {
    r: 0.0,
    g: 1.0,
    b: 0.0,
};

/// An RGB color with channels in `[0, 1]`
///
/// Serializes as a `[r, g, b]` triple to match the episode export format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    /// Red channel
    pub r: f64,
    /// Green channel
    pub g: f64,
    /// Blue channel
    pub b: f64,
}

impl Rgb {
    /// Per-channel linear interpolation: `(1 - t) * self + t * other`
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: (1.0 - t) * self.r + t * other.r,
            g: (1.0 - t) * self.g + t * other.g,
            b: (1.0 - t) * self.b + t * other.b,
        }
    }

    /// Channels as a fixed array
    #[must_use]
    pub fn channels(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f64; 3]> for Rgb {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(rgb: Rgb) -> Self {
        rgb.channels()
    }
}

/// Map a pH value to the indicator color.
///
/// `p_ka_ind` is the indicator transition midpoint and `neutral_band` the
/// half-width of the green overlay window around pH 7. At exactly pH 7 the
/// result is pure green.
#[must_use]
pub fn color_from_ph(ph: f64, p_ka_ind: f64, neutral_band: f64) -> Rgb {
    // Fraction of the deprotonated (blue) form from the indicator equilibrium
    let f_base = (1.0 / (1.0 + 10f64.powf(p_ka_ind - ph))).clamp(0.0, 1.0);
    let base_mix = ACID_RGB.lerp(BASE_RGB, f_base);

    let dist = (ph - NEUTRAL_PH).abs();
    if dist >= neutral_band {
        return base_mix;
    }

    // Triangular window: weight 1 at neutral, 0 at the band edge
    let w = 1.0 - dist / neutral_band;
    base_mix.lerp(NEUTRAL_RGB, w)
}
