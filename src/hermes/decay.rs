//! Exponential visibility decay.
//!
//! Both functions are permissive: they accept any real input and leave range
//! checks to the engine boundary (see `hermes::types`).

const LOAD_WEIGHT: f64 = 0.5;
const TIME_WEIGHT_PER_HOUR: f64 = 0.005;
const TIME_FACTOR_CAP: f64 = 0.1;

/// Effective decay rate under load: `base * (1 + load * 0.5) + min(0.1, t * 0.005)`.
///
/// The elapsed-time contribution is capped so long-lived boosts do not
/// accelerate without bound.
pub fn dynamic_decay_constant(base_constant: f64, system_load: f64, time_elapsed_hours: f64) -> f64 {
    let load_factor = 1.0 + system_load * LOAD_WEIGHT;
    let time_factor = (time_elapsed_hours * TIME_WEIGHT_PER_HOUR).min(TIME_FACTOR_CAP);
    base_constant * load_factor + time_factor
}

/// `V(t) = V0 * e^(-λt)`
pub fn visibility_decay(initial_visibility: f64, decay_constant: f64, time_elapsed_hours: f64) -> f64 {
    initial_visibility * (-decay_constant * time_elapsed_hours).exp()
}
