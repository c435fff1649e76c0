use super::pile::Pile;
use crate::angle::tube_angle_deg;
use crate::error::{GradingError, Result};

const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Directed tube span between two adjacent piles.
///
/// Segments hold plain copies of their endpoint keys and geometry. They are
/// rebuilt from the owning tracker whenever heights change; nothing points
/// back into the tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// 1-based segment id; segment `k` joins pile positions `k` and `k + 1`.
    pub segment_id: u32,
    /// Index of the start pile in the tracker's pile list.
    pub start: usize,
    /// Index of the end pile in the tracker's pile list.
    pub end: usize,
    pub start_pile: u32,
    pub end_pile: u32,
    /// Horizontal run between the two piles.
    pub length: f64,
    /// `end.height - start.height`.
    pub rise: f64,
}

impl Segment {
    /// Build the segment joining `piles[start]` and `piles[start + 1]`.
    pub(crate) fn between(tracker_id: u32, start: usize, a: &Pile, b: &Pile) -> Result<Self> {
        let length = (b.position() - a.position()).norm();
        if !(length > MIN_SEGMENT_LENGTH) {
            return Err(GradingError::DegenerateGeometry {
                tracker_id,
                reason: format!(
                    "piles {} and {} share a plan position (zero-length segment)",
                    a.pile_in_tracker, b.pile_in_tracker
                ),
            });
        }
        Ok(Self {
            segment_id: start as u32 + 1,
            start,
            end: start + 1,
            start_pile: a.pile_in_tracker,
            end_pile: b.pile_in_tracker,
            length,
            rise: b.height - a.height,
        })
    }

    /// Rise over run.
    #[inline]
    pub fn slope(&self) -> f64 {
        self.rise / self.length
    }

    /// Tube angle relative to horizontal, in degrees.
    #[inline]
    pub fn deflection_angle_deg(&self) -> f64 {
        tube_angle_deg(self.rise, self.length)
    }

    /// Start height minus end height; negative when the tube climbs.
    #[inline]
    pub fn height_difference(&self) -> f64 {
        -self.rise
    }
}
