use super::constraints::Constraints;
use super::pile::{Pile, PileInput};
use super::tracker::{Tracker, TrackerKind};
use crate::error::{GradingError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Tracker technology used across a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Standard,
    TerrainFollowing,
}

impl ProjectKind {
    pub fn tracker_kind(self) -> TrackerKind {
        match self {
            ProjectKind::Standard => TrackerKind::Flat,
            ProjectKind::TerrainFollowing => TrackerKind::TerrainFollowing,
        }
    }
}

/// Serialized project description: constraints plus flat pile rows.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub kind: ProjectKind,
    pub constraints: Constraints,
    pub piles: Vec<PileInput>,
}

/// A solar site: trackers sharing one read-only set of constraints.
#[derive(Clone, Debug)]
pub struct Project {
    pub name: String,
    kind: ProjectKind,
    constraints: Constraints,
    trackers: Vec<Tracker>,
}

impl Project {
    pub fn new(name: impl Into<String>, kind: ProjectKind, constraints: Constraints) -> Result<Self> {
        constraints.validate(kind)?;
        Ok(Self {
            name: name.into(),
            kind,
            constraints,
            trackers: Vec::new(),
        })
    }

    /// Build a project from pile rows, grouping them into trackers and
    /// ordering each tracker by pile position.
    pub fn from_input(input: &ProjectInput) -> Result<Self> {
        let mut project = Project::new(input.name.clone(), input.kind, input.constraints.clone())?;
        let mut grouped: BTreeMap<u32, Vec<Pile>> = BTreeMap::new();
        for row in &input.piles {
            grouped
                .entry(row.resolved_tracker_id())
                .or_default()
                .push(Pile::try_from(row)?);
        }
        for (tracker_id, piles) in grouped {
            let mut tracker = project.new_tracker(tracker_id);
            for pile in piles {
                tracker.add_pile(pile);
            }
            tracker.sort_by_pole_position();
            project.add_tracker(tracker)?;
        }
        Ok(project)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let input: ProjectInput = serde_json::from_str(json)
            .map_err(|e| GradingError::Config(format!("failed to parse project: {e}")))?;
        Self::from_input(&input)
    }

    #[inline]
    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    #[inline]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    #[inline]
    pub fn trackers(&self) -> &[Tracker] {
        &self.trackers
    }

    #[inline]
    pub fn trackers_mut(&mut self) -> &mut [Tracker] {
        &mut self.trackers
    }

    /// Shared constraints alongside mutable trackers, for per-tracker work.
    pub(crate) fn split_mut(&mut self) -> (&Constraints, &mut [Tracker]) {
        (&self.constraints, &mut self.trackers)
    }

    /// Empty tracker of the kind matching this project.
    pub fn new_tracker(&self, tracker_id: u32) -> Tracker {
        Tracker::new(tracker_id, self.kind.tracker_kind())
    }

    pub fn add_tracker(&mut self, mut tracker: Tracker) -> Result<()> {
        if self.trackers.iter().any(|t| t.tracker_id == tracker.tracker_id) {
            return Err(GradingError::DuplicateTracker {
                tracker_id: tracker.tracker_id,
            });
        }
        tracker.kind = self.kind.tracker_kind();
        self.trackers.push(tracker);
        Ok(())
    }

    pub fn total_piles(&self) -> usize {
        self.trackers.iter().map(Tracker::pole_count).sum()
    }

    pub fn max_piles_per_tracker(&self) -> usize {
        self.trackers
            .iter()
            .map(Tracker::pole_count)
            .max()
            .unwrap_or(0)
    }

    pub fn tracker(&self, tracker_id: u32) -> Result<&Tracker> {
        self.trackers
            .iter()
            .find(|t| t.tracker_id == tracker_id)
            .ok_or(GradingError::TrackerNotFound { tracker_id })
    }

    pub fn tracker_mut(&mut self, tracker_id: u32) -> Result<&mut Tracker> {
        self.trackers
            .iter_mut()
            .find(|t| t.tracker_id == tracker_id)
            .ok_or(GradingError::TrackerNotFound { tracker_id })
    }

    /// Resolve an id in the `tracker.pile` convention, e.g. `175.03`.
    pub fn pile_by_id(&self, pile_id: f64) -> Result<&Pile> {
        let tracker_id = pile_id.floor() as u32;
        let pile_in_tracker = ((pile_id - pile_id.floor()) * 100.0).round() as u32;
        self.tracker(tracker_id)?.pile_in_tracker(pile_in_tracker)
    }

    /// Trackers whose first pile sits on `easting`, skipping `ignore_ids`.
    pub fn trackers_on_easting(&self, easting: f64, ignore_ids: &[u32]) -> Vec<&Tracker> {
        self.trackers
            .iter()
            .filter(|t| !ignore_ids.contains(&t.tracker_id))
            .filter(|t| t.first().is_some_and(|p| p.easting == easting))
            .collect()
    }

    /// Tube length including the overhang past both end piles.
    pub fn tracker_length(&self, tracker_id: u32) -> Result<f64> {
        let tracker = self.tracker(tracker_id)?;
        Ok(tracker.distance_first_to_last() + 2.0 * self.constraints.edge_overhang)
    }

    fn terrain_only(&self, value: f64) -> f64 {
        match self.kind {
            ProjectKind::TerrainFollowing => value,
            ProjectKind::Standard => 0.0,
        }
    }

    pub fn max_cumulative_slope_change(&self) -> f64 {
        self.terrain_only(self.constraints.max_cumulative_slope_change())
    }

    pub fn max_segment_slope_change(&self) -> f64 {
        self.terrain_only(self.constraints.max_segment_slope_change())
    }

    pub fn max_strict_segment_slope_change(&self) -> f64 {
        self.terrain_only(self.constraints.max_strict_segment_slope_change())
    }

    pub fn max_conservative_segment_slope_change(&self) -> f64 {
        self.terrain_only(self.constraints.max_conservative_segment_slope_change())
    }
}
