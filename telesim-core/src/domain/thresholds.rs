use serde::{Deserialize, Serialize};

/// Optional alarm bounds for a sensor's readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Which bound a value crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Breach {
    AboveMax,
    BelowMin,
}

impl Breach {
    pub fn as_str(&self) -> &'static str {
        match self {
            Breach::AboveMax => "above_max",
            Breach::BelowMin => "below_min",
        }
    }
}

impl Thresholds {
    /// The max bound is checked first. Bounds are exclusive.
    pub fn exceeds(&self, value: f64) -> Option<Breach> {
        if self.max.is_some_and(|max| value > max) {
            return Some(Breach::AboveMax);
        }
        if self.min.is_some_and(|min| value < min) {
            return Some(Breach::BelowMin);
        }
        None
    }
}
