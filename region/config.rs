use crate::numeric::ZERO_TOLERANCE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Margin subtracted from the upper breakpoint of every active-set segment.
pub const BOUNDARY_MARGIN: f64 = 1e-10;

/// Largest gap between neighbouring active-set intervals that still counts as round-off.
pub const MERGE_GAP: f64 = 0.01;

#[derive(Error, Debug, PartialEq)]
pub enum ToleranceError {
    #[error("Tolerance '{name}' must be finite and strictly positive, got {value}.")]
    NotPositive { name: &'static str, value: f64 },
}

/// Numeric stabilisation knobs for region construction.
///
/// Analysis files may override any subset; missing fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tolerances {
    /// Coefficients and discriminants with magnitude at most this are treated as zero.
    pub zero: f64,
    /// Subtracted from a segment's right breakpoint when emitting its interval.
    pub boundary_margin: f64,
    /// Active-set intervals separated by less than this are merged.
    pub merge_gap: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            zero: ZERO_TOLERANCE,
            boundary_margin: BOUNDARY_MARGIN,
            merge_gap: MERGE_GAP,
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> Result<(), ToleranceError> {
        for (name, value) in [
            ("zero", self.zero),
            ("boundary_margin", self.boundary_margin),
            ("merge_gap", self.merge_gap),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ToleranceError::NotPositive { name, value });
            }
        }
        Ok(())
    }
}
