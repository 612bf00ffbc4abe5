//! Stateless interface for interactive/manual clients
//!
//! UI sliders show the same solution math as the environment without any
//! episode semantics. These are thin re-exports of the two pure functions so
//! a manual view and a recorded episode can never disagree visually.

use crate::chemistry::compute_ph;
use crate::indicator::{color_from_ph, Rgb};

/// pH of the solution for the given composition
///
/// Identical to the environment's internal solver.
#[must_use]
pub fn solution_ph(va_ml: f64, ca: f64, vb_ml: f64, cb: f64, p_ka: f64) -> f64 {
    compute_ph(va_ml, ca, vb_ml, cb, p_ka)
}

/// Indicator color for the given composition
#[must_use]
pub fn indicator_color(
    va_ml: f64,
    ca: f64,
    vb_ml: f64,
    cb: f64,
    p_ka: f64,
    p_ka_ind: f64,
    neutral_band: f64,
) -> Rgb {
    color_from_ph(compute_ph(va_ml, ca, vb_ml, cb, p_ka), p_ka_ind, neutral_band)
}
