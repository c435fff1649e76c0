//! Project-wide grading constraints.
//!
//! All lengths are metres, `max_incline` is rise/run and the deflection
//! limits are degrees. The derived slope-ratio limits consumed by the
//! deflection corrector are exposed as methods so they stay in sync with the
//! degree values.

use super::project::ProjectKind;
use crate::angle::deg_to_slope;
use crate::error::{GradingError, Result};
use serde::{Deserialize, Serialize};

/// Number of segments the cumulative budget is spread over when deriving
/// the per-segment slope change.
const CUMULATIVE_SPREAD: f64 = 6.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub min_reveal_height: f64,
    pub max_reveal_height: f64,
    #[serde(default)]
    pub pile_install_tolerance: f64,
    pub max_incline: f64,
    /// Position of the initial target inside the window (0 = min, 1 = max).
    #[serde(default = "default_target_height_percentage")]
    pub target_height_percentage: f64,
    #[serde(default)]
    pub edge_overhang: f64,
    #[serde(default)]
    pub max_segment_deflection_deg: Option<f64>,
    #[serde(default)]
    pub max_cumulative_deflection_deg: Option<f64>,
}

fn default_target_height_percentage() -> f64 {
    0.5
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_reveal_height: 1.375,
            max_reveal_height: 1.675,
            pile_install_tolerance: 0.0,
            max_incline: 0.15,
            target_height_percentage: default_target_height_percentage(),
            edge_overhang: 0.0,
            max_segment_deflection_deg: None,
            max_cumulative_deflection_deg: None,
        }
    }
}

/// Bend-angle limits for terrain-following trackers (degrees).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeflectionLimits {
    pub segment_deg: f64,
    pub cumulative_deg: f64,
}

impl Constraints {
    /// Validate numeric ranges for the given project kind.
    pub fn validate(&self, kind: ProjectKind) -> Result<()> {
        let invalid = |reason: &str| {
            Err(GradingError::InvalidConstraints {
                reason: reason.to_string(),
            })
        };
        let finite = [
            self.min_reveal_height,
            self.max_reveal_height,
            self.pile_install_tolerance,
            self.max_incline,
            self.target_height_percentage,
            self.edge_overhang,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return invalid("all constraint values must be finite");
        }
        if self.min_reveal_height <= 0.0 || self.max_reveal_height <= 0.0 {
            return invalid("min_reveal_height and max_reveal_height must be > 0");
        }
        if self.min_reveal_height >= self.max_reveal_height {
            return invalid("min_reveal_height must be < max_reveal_height");
        }
        if self.pile_install_tolerance < 0.0 {
            return invalid("pile_install_tolerance must be >= 0");
        }
        if self.max_incline < 0.0 {
            return invalid("max_incline must be >= 0 (rise/run)");
        }
        if !(0.0..=1.0).contains(&self.target_height_percentage) {
            return invalid("target_height_percentage must lie in [0, 1]");
        }
        if self.edge_overhang < 0.0 {
            return invalid("edge_overhang must be >= 0");
        }

        if kind == ProjectKind::TerrainFollowing {
            let Some(limits) = self.deflection_limits() else {
                return invalid(
                    "terrain-following projects require max_segment_deflection_deg and \
                     max_cumulative_deflection_deg",
                );
            };
            if !(limits.segment_deg.is_finite() && limits.cumulative_deg.is_finite()) {
                return invalid("deflection limits must be finite");
            }
            if limits.segment_deg < 0.0 || limits.cumulative_deg < 0.0 {
                return invalid("deflection limits must be >= 0");
            }
        }
        Ok(())
    }

    /// Both deflection limits, when configured.
    pub fn deflection_limits(&self) -> Option<DeflectionLimits> {
        match (
            self.max_segment_deflection_deg,
            self.max_cumulative_deflection_deg,
        ) {
            (Some(segment_deg), Some(cumulative_deg)) => Some(DeflectionLimits {
                segment_deg,
                cumulative_deg,
            }),
            _ => None,
        }
    }

    /// Width of the reveal window after the install tolerance is removed.
    #[inline]
    pub fn reveal_span(&self) -> f64 {
        self.max_reveal_height - self.min_reveal_height - self.pile_install_tolerance
    }

    pub fn max_cumulative_slope_change(&self) -> f64 {
        self.max_cumulative_deflection_deg
            .map(deg_to_slope)
            .unwrap_or(0.0)
    }

    pub fn max_segment_slope_change(&self) -> f64 {
        self.max_cumulative_slope_change() / CUMULATIVE_SPREAD
    }

    /// Per-segment limit as a slope ratio, rounded to four decimals.
    pub fn max_strict_segment_slope_change(&self) -> f64 {
        self.max_segment_deflection_deg
            .map(|deg| (deg_to_slope(deg) * 1e4).round() / 1e4)
            .unwrap_or(0.0)
    }

    /// Per-segment share of the cumulative limit, floored to three decimals.
    pub fn max_conservative_segment_slope_change(&self) -> f64 {
        (self.max_segment_slope_change() * 1e3).floor() / 1e3
    }
}
