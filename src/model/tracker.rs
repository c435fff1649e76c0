use super::pile::Pile;
use super::segment::Segment;
use crate::error::{GradingError, Result};
use serde::{Deserialize, Serialize};

/// Mechanical behaviour of a tracker's torque tube.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    /// Rigid straight tube; pile heights lie on one line.
    Flat,
    /// Articulated tube that may bend at each pile within deflection limits.
    TerrainFollowing,
}

/// Bend-angle summary of a graded terrain-following tracker.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingDeflection {
    /// Cumulative break over the low-position wing (degrees).
    pub south_wing_deflection: f64,
    /// Cumulative break over the high-position wing (degrees).
    pub north_wing_deflection: f64,
    /// Largest single-pile break (degrees).
    pub max_tracker_degree_break: f64,
    /// Unsigned break per pile, in pile order. Anchors are zero.
    pub breaks: Vec<f64>,
}

/// Ordered set of piles carrying one torque tube.
#[derive(Clone, Debug)]
pub struct Tracker {
    pub tracker_id: u32,
    pub kind: TrackerKind,
    piles: Vec<Pile>,
    /// Populated for terrain-following trackers once grading finishes.
    pub deflection: Option<WingDeflection>,
}

impl Tracker {
    pub fn new(tracker_id: u32, kind: TrackerKind) -> Self {
        Self {
            tracker_id,
            kind,
            piles: Vec::new(),
            deflection: None,
        }
    }

    pub fn with_piles(tracker_id: u32, kind: TrackerKind, piles: Vec<Pile>) -> Self {
        Self {
            tracker_id,
            kind,
            piles,
            deflection: None,
        }
    }

    pub fn add_pile(&mut self, pile: Pile) {
        self.piles.push(pile);
    }

    /// Order piles by `pile_in_tracker`. The grading engine expects this to
    /// have been done by whoever assembled the tracker.
    pub fn sort_by_pole_position(&mut self) {
        self.piles.sort_by_key(|p| p.pile_in_tracker);
    }

    /// True when positions strictly increase along the pile list.
    pub fn is_sorted(&self) -> bool {
        self.piles
            .windows(2)
            .all(|w| w[0].pile_in_tracker < w[1].pile_in_tracker)
    }

    #[inline]
    pub fn piles(&self) -> &[Pile] {
        &self.piles
    }

    #[inline]
    pub fn piles_mut(&mut self) -> &mut [Pile] {
        &mut self.piles
    }

    #[inline]
    pub fn pole_count(&self) -> usize {
        self.piles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.piles.is_empty()
    }

    #[inline]
    pub fn is_terrain_following(&self) -> bool {
        self.kind == TrackerKind::TerrainFollowing
    }

    pub fn first(&self) -> Option<&Pile> {
        self.piles.first()
    }

    pub fn last(&self) -> Option<&Pile> {
        self.piles.last()
    }

    /// Whether the pile at `index` is the first or last pile.
    #[inline]
    pub fn is_anchor_index(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.piles.len()
    }

    pub fn index_of(&self, pile_in_tracker: u32) -> Option<usize> {
        self.piles
            .iter()
            .position(|p| p.pile_in_tracker == pile_in_tracker)
    }

    pub fn pile_in_tracker(&self, pile_in_tracker: u32) -> Result<&Pile> {
        self.index_of(pile_in_tracker)
            .map(|idx| &self.piles[idx])
            .ok_or(GradingError::PileNotFound {
                tracker_id: self.tracker_id,
                pile_in_tracker,
            })
    }

    pub fn pile_in_tracker_mut(&mut self, pile_in_tracker: u32) -> Result<&mut Pile> {
        let tracker_id = self.tracker_id;
        self.piles
            .iter_mut()
            .find(|p| p.pile_in_tracker == pile_in_tracker)
            .ok_or(GradingError::PileNotFound {
                tracker_id,
                pile_in_tracker,
            })
    }

    pub fn northmost(&self) -> Option<&Pile> {
        self.piles
            .iter()
            .max_by(|a, b| a.northing.total_cmp(&b.northing))
    }

    pub fn southmost(&self) -> Option<&Pile> {
        self.piles
            .iter()
            .min_by(|a, b| a.northing.total_cmp(&b.northing))
    }

    /// Index of the pile that splits the tracker into its two wings.
    #[inline]
    pub fn centre_index(&self) -> usize {
        self.piles.len() / 2
    }

    pub fn centre_pile(&self) -> Option<&Pile> {
        self.piles.get(self.centre_index())
    }

    /// Northing distance between the first and last pile.
    pub fn distance_first_to_last(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.northing - first.northing).abs(),
            _ => 0.0,
        }
    }

    /// Rebuild the segments joining consecutive piles from current heights.
    pub fn segments(&self) -> Result<Vec<Segment>> {
        self.piles
            .windows(2)
            .enumerate()
            .map(|(idx, pair)| Segment::between(self.tracker_id, idx, &pair[0], &pair[1]))
            .collect()
    }

    pub fn heights(&self) -> Vec<f64> {
        self.piles.iter().map(|p| p.height).collect()
    }
}
