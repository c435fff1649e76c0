use super::window::Window;
use crate::error::{GradingError, Result};
use crate::model::{Constraints, Tracker, TrackerKind};
use serde::Serialize;

/// Smallest first-to-last northing separation accepted for a slope.
const MIN_NORTHING_SPAN: f64 = 1e-9;

/// Tube line `height = slope * northing + intercept`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GradingLine {
    pub slope: f64,
    pub intercept: f64,
}

impl GradingLine {
    /// Line with the given slope passing through `(northing, height)`.
    #[inline]
    pub fn through(slope: f64, northing: f64, height: f64) -> Self {
        Self {
            slope,
            intercept: height - slope * northing,
        }
    }

    #[inline]
    pub fn height_at(&self, northing: f64) -> f64 {
        self.slope * northing + self.intercept
    }
}

/// Place every pile of the tracker on `line`.
pub fn apply_line(tracker: &mut Tracker, line: GradingLine) {
    for pile in tracker.piles_mut() {
        pile.height = line.height_at(pile.northing);
    }
}

/// Initialise pile heights on a straight line through the first pile's
/// target height.
///
/// The slope follows the end-pile target heights for flat trackers and the
/// end-pile ground for terrain-following trackers, clamped to
/// `±max_incline`. Ground elevations are never touched.
pub fn target_height_line(
    tracker: &mut Tracker,
    windows: &[Window],
    constraints: &Constraints,
) -> Result<GradingLine> {
    let fraction = constraints.target_height_percentage;
    let piles = tracker.piles();
    let (Some(first), Some(last)) = (piles.first(), piles.last()) else {
        return Err(GradingError::DegenerateGeometry {
            tracker_id: tracker.tracker_id,
            reason: "tracker has no piles".into(),
        });
    };
    let first_target = windows[0].target(fraction);

    if piles.len() == 1 {
        let line = GradingLine {
            slope: 0.0,
            intercept: first_target,
        };
        tracker.piles_mut()[0].height = first_target;
        return Ok(line);
    }

    let run = last.northing - first.northing;
    if run.abs() <= MIN_NORTHING_SPAN {
        return Err(GradingError::DegenerateGeometry {
            tracker_id: tracker.tracker_id,
            reason: format!(
                "first and last piles share northing {:.3}; vertical alignment is not supported",
                first.northing
            ),
        });
    }

    let rise = match tracker.kind {
        TrackerKind::Flat => windows[windows.len() - 1].target(fraction) - first_target,
        TrackerKind::TerrainFollowing => last.current_elevation - first.current_elevation,
    };
    let max_incline = constraints.max_incline.abs();
    let slope = (rise / run).clamp(-max_incline, max_incline);
    let line = GradingLine::through(slope, first.northing, first_target);
    apply_line(tracker, line);
    Ok(line)
}
