use super::tracker::TrackerReport;
use serde::Serialize;

/// Site-wide grading summary.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub name: String,
    pub tracker_count: usize,
    pub pile_count: usize,
    pub graded_piles: usize,
    pub total_cut: f64,
    pub total_fill: f64,
    pub violation_count: usize,
    pub trackers: Vec<TrackerReport>,
}

impl ProjectReport {
    pub fn from_trackers(name: impl Into<String>, trackers: Vec<TrackerReport>) -> Self {
        Self {
            name: name.into(),
            tracker_count: trackers.len(),
            pile_count: trackers.iter().map(|t| t.piles.len()).sum(),
            graded_piles: trackers.iter().map(TrackerReport::graded_piles).sum(),
            total_cut: trackers.iter().map(TrackerReport::total_cut).sum(),
            total_fill: trackers.iter().map(TrackerReport::total_fill).sum(),
            violation_count: trackers.iter().map(|t| t.violations.len()).sum(),
            trackers,
        }
    }

    pub fn tracker(&self, tracker_id: u32) -> Option<&TrackerReport> {
        self.trackers.iter().find(|t| t.tracker_id == tracker_id)
    }
}
