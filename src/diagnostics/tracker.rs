use super::timing::TimingBreakdown;
use crate::grading::{CorrectionOutcome, GradingLine, LineSearchResult, Violation};
use crate::model::{Pile, TrackerKind, WingDeflection};
use serde::Serialize;

/// Final state of one pile.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PileOutcome {
    pub pile_id: f64,
    pub pile_in_tracker: u32,
    pub northing: f64,
    pub easting: f64,
    pub initial_elevation: f64,
    pub final_elevation: f64,
    pub total_height: f64,
    pub pile_revealed: f64,
    /// Ground change, positive when ground was raised.
    pub cut_fill: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_degree_break: Option<f64>,
}

impl From<&Pile> for PileOutcome {
    fn from(pile: &Pile) -> Self {
        Self {
            pile_id: pile.pile_id,
            pile_in_tracker: pile.pile_in_tracker,
            northing: pile.northing,
            easting: pile.easting,
            initial_elevation: pile.initial_elevation,
            final_elevation: pile.final_elevation,
            total_height: pile.total_height,
            pile_revealed: pile.pile_revealed,
            cut_fill: pile.cut_fill(),
            final_degree_break: pile.terrain.map(|t| t.final_degree_break),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLineStage {
    pub line: GradingLine,
    pub violations: usize,
    pub cost: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Intercept,
    SlopeIntercept,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSearchStage {
    pub mode: SearchMode,
    pub span: f64,
    pub feasible: bool,
    /// Whether the search line replaced the initial one.
    pub accepted: bool,
    pub slope: f64,
    pub intercept: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coarse_cost: Option<f64>,
    pub slopes_evaluated: usize,
}

impl LineSearchStage {
    pub fn from_result(
        mode: SearchMode,
        span: f64,
        result: &LineSearchResult,
        accepted: bool,
        slopes_evaluated: usize,
    ) -> Self {
        let finite = |v: f64| v.is_finite().then_some(v);
        Self {
            mode,
            span,
            feasible: result.is_feasible(),
            accepted,
            slope: result.slope,
            intercept: result.intercept,
            cost: finite(result.cost),
            coarse_cost: finite(result.coarse_cost),
            slopes_evaluated,
        }
    }
}

/// Terrain-following passes run after the line search.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainStage {
    pub pulled_piles: usize,
    pub shift_before_correction: f64,
    pub correction: CorrectionOutcome,
    /// The corrector failed and the tube went back to the straight line.
    pub reverted_to_line: bool,
    pub shift_after_correction: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackStage {
    pub graded_piles: Vec<u32>,
    pub anchor_violations: Vec<Violation>,
}

/// Everything the engine did to one tracker.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerReport {
    pub tracker_id: u32,
    pub kind: TrackerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_line: Option<TargetLineStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_search: Option<LineSearchStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainStage>,
    pub fallback: FallbackStage,
    pub piles: Vec<PileOutcome>,
    /// Violations left after grading; only anchors or empty windows remain.
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deflection: Option<WingDeflection>,
    pub timings: TimingBreakdown,
}

impl TrackerReport {
    pub fn new(tracker_id: u32, kind: TrackerKind) -> Self {
        Self {
            tracker_id,
            kind,
            target_line: None,
            line_search: None,
            terrain: None,
            fallback: FallbackStage::default(),
            piles: Vec::new(),
            violations: Vec::new(),
            deflection: None,
            timings: TimingBreakdown::default(),
        }
    }

    /// Summed ground lowering under the tracker's piles.
    pub fn total_cut(&self) -> f64 {
        self.piles.iter().map(|p| (-p.cut_fill).max(0.0)).sum()
    }

    pub fn total_fill(&self) -> f64 {
        self.piles.iter().map(|p| p.cut_fill.max(0.0)).sum()
    }

    pub fn graded_piles(&self) -> usize {
        self.fallback.graded_piles.len()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}
