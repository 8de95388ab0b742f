//! Chaos module.
//!
//! Models transient sensor faults: a tick that hits the fault roll produces
//! nothing at all, no reading and no event.

use rand::Rng;

/// True with the given probability. Values outside `[0, 1]` are clamped.
pub fn fault_roll(probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    rand::rng().random::<f64>() < probability.min(1.0)
}
