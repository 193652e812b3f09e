//! Analytic point-source potential in a homogeneous volume conductor.
//!
//! The monopole solution
//!
//! $V(r) = \frac{I}{4 \pi \sigma r}$
//!
//! is the closed-form reference the scattered-field interpolant is validated
//! against, and doubles as a built-in self-check for configured pipelines.
//! Positions are in metres, currents in amperes, conductivities in S/m, and
//! the returned potential in volts.

/// Conductivity of physiological saline (S/m).
pub const SIGMA_SALINE: f64 = 1.45;

/// Bulk conductivity of the nerve trunk, dominated by the perineurial
/// sheaths (S/m).
pub const SIGMA_NERVE: f64 = 0.01;

/// Intrafascicular (endoneurial) conductivity (S/m).
pub const SIGMA_FASCICLE: f64 = 0.0517;

/// Extracellular potential of a monopolar current source in an infinite
/// homogeneous medium.
///
/// Returns infinity when `p` coincides with `source`; callers keep their
/// observation points away from the singularity.
///
/// # Arguments
/// * `current_amps` - Source current (A).
/// * `conductivity` - Medium conductivity (S/m).
/// * `source` - Source position (m).
/// * `p` - Observation position (m).
pub fn potential(current_amps: f64, conductivity: f64, source: [f64; 3], p: [f64; 3]) -> f64 {
    let dx = p[0] - source[0];
    let dy = p[1] - source[1];
    let dz = p[2] - source[2];
    let r = (dx * dx + dy * dy + dz * dz).sqrt();
    current_amps / (4.0 * std::f64::consts::PI * conductivity * r)
}
