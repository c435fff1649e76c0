//! Coarse-to-fine line search over tube intercept and slope.
//!
//! Overview
//! - [`find_optimal_intercept`] holds the slope fixed and scans intercepts in
//!   `[b0 - span, b0 + span]`: a coarse pass over the whole span followed by a
//!   fine pass around the coarse best.
//! - [`find_optimal_line_2d`] repeats the intercept search for a small band
//!   of slope candidates around a baseline (flat trackers only).
//!
//! A candidate is feasible only when both end piles stay inside their own
//! windows. Among feasible candidates the cost is the summed out-of-window
//! distance of every pile. The searches leave pile heights exactly as they
//! found them; the caller commits a winning line explicitly.

use super::target_line::{apply_line, GradingLine};
use super::window::{anchors_within_window, check_within_window, total_grading_cost, Violation, Window};
use crate::model::Tracker;
use log::{debug, warn};
use serde::Deserialize;

/// Outcome class of an optimiser pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feasibility {
    /// At least one candidate kept both anchors inside their windows.
    Feasible,
    /// No candidate satisfied the anchor constraint.
    Infeasible,
}

/// Sampling parameters of the intercept search.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LineSearchOptions {
    /// Samples across the full `[b0 - span, b0 + span]` range.
    pub coarse_steps: usize,
    /// Samples across the refinement range.
    pub fine_steps: usize,
    /// Half-width of the refinement range relative to `span`.
    pub fine_span_fraction: f64,
    /// Search half-span as a multiple of the first violating pile's half window.
    pub span_window_multiple: f64,
    /// Lower bound on the search half-span.
    pub min_span: f64,
}

impl Default for LineSearchOptions {
    fn default() -> Self {
        Self {
            coarse_steps: 121,
            fine_steps: 121,
            fine_span_fraction: 0.1,
            span_window_multiple: 4.0,
            min_span: 1e-6,
        }
    }
}

/// Slope band explored by the 2D search.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SlopeSearchOptions {
    /// Relative half-width of the band around the baseline slope.
    pub tolerance: f64,
    /// Evenly spaced slopes sampled across the band.
    pub steps: usize,
}

impl Default for SlopeSearchOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.05,
            steps: 11,
        }
    }
}

/// Best line found by a search.
#[derive(Clone, Debug)]
pub struct LineSearchResult {
    pub slope: f64,
    pub intercept: f64,
    /// Cost of the best candidate; infinite when infeasible.
    pub cost: f64,
    /// Best cost after the coarse pass alone.
    pub coarse_cost: f64,
    /// Violations left by the best candidate.
    pub violations: Vec<Violation>,
    pub feasibility: Feasibility,
}

impl LineSearchResult {
    fn infeasible(slope: f64, intercept: f64) -> Self {
        Self {
            slope,
            intercept,
            cost: f64::INFINITY,
            coarse_cost: f64::INFINITY,
            violations: Vec::new(),
            feasibility: Feasibility::Infeasible,
        }
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.feasibility == Feasibility::Feasible
    }

    #[inline]
    pub fn line(&self) -> GradingLine {
        GradingLine {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

/// Result of the slope + intercept search.
#[derive(Clone, Debug)]
pub struct Line2DSearchResult {
    pub best: LineSearchResult,
    /// Slope the band was centred on, after clipping.
    pub baseline_slope: f64,
    pub slopes_evaluated: usize,
}

/// Saved tube heights of one tracker.
#[derive(Clone, Debug)]
pub(crate) struct HeightSnapshot(Vec<f64>);

impl HeightSnapshot {
    pub(crate) fn capture(tracker: &Tracker) -> Self {
        Self(tracker.heights())
    }

    pub(crate) fn restore(&self, tracker: &mut Tracker) {
        for (pile, h) in tracker.piles_mut().iter_mut().zip(&self.0) {
            pile.height = *h;
        }
    }
}

/// Search half-span derived from the first violating pile's window.
pub fn intercept_span(violations: &[Violation], options: &LineSearchOptions) -> f64 {
    let half_window = violations
        .first()
        .map(|v| (v.grading_window_max - v.grading_window_min).abs() / 2.0)
        .unwrap_or(0.0);
    (options.span_window_multiple * half_window).max(options.min_span)
}

/// `steps` evenly spaced values in `[centre - half_span, centre + half_span]`.
fn sample_grid(centre: f64, half_span: f64, steps: usize) -> impl Iterator<Item = f64> {
    let steps = steps.max(1);
    (0..steps).map(move |i| {
        if steps == 1 {
            centre
        } else {
            let t = i as f64 / (steps - 1) as f64;
            centre - half_span + 2.0 * half_span * t
        }
    })
}

/// Apply `line` and score it; `None` when an anchor leaves its window.
fn evaluate(
    tracker: &mut Tracker,
    windows: &[Window],
    line: GradingLine,
    eps: f64,
) -> Option<(f64, Vec<Violation>)> {
    apply_line(tracker, line);
    if !anchors_within_window(tracker, windows, eps) {
        return None;
    }
    let violations = check_within_window(tracker, windows, eps);
    Some((total_grading_cost(&violations), violations))
}

/// Best intercept for a fixed `slope`.
///
/// Heights are restored before returning. When no candidate is feasible the
/// result carries infinite cost and the initial intercept `b0`.
pub fn find_optimal_intercept(
    tracker: &mut Tracker,
    windows: &[Window],
    slope: f64,
    b0: f64,
    span: f64,
    options: &LineSearchOptions,
    eps: f64,
) -> LineSearchResult {
    let snapshot = HeightSnapshot::capture(tracker);
    let mut best: Option<(f64, f64, Vec<Violation>)> = None;

    let scan = |tracker: &mut Tracker, best: &mut Option<(f64, f64, Vec<Violation>)>, b: f64| {
        let line = GradingLine {
            slope,
            intercept: b,
        };
        if let Some((cost, violations)) = evaluate(tracker, windows, line, eps) {
            let improves = best.as_ref().map_or(true, |(_, c, _)| cost < *c);
            if improves {
                *best = Some((b, cost, violations));
            }
        }
    };

    for b in sample_grid(b0, span, options.coarse_steps) {
        scan(tracker, &mut best, b);
    }
    let coarse = best.as_ref().map(|(b, c, _)| (*b, *c));

    if let Some((coarse_b, _)) = coarse {
        let fine_half = span * options.fine_span_fraction;
        for b in sample_grid(coarse_b, fine_half, options.fine_steps) {
            scan(tracker, &mut best, b);
        }
    }
    snapshot.restore(tracker);

    match (best, coarse) {
        (Some((intercept, cost, violations)), Some((_, coarse_cost))) => {
            debug!(
                "tracker {}: intercept search slope={:.5} b={:.4} cost {:.4} (coarse {:.4})",
                tracker.tracker_id, slope, intercept, cost, coarse_cost
            );
            LineSearchResult {
                slope,
                intercept,
                cost,
                coarse_cost,
                violations,
                feasibility: Feasibility::Feasible,
            }
        }
        _ => {
            debug!(
                "tracker {}: no intercept within ±{:.4} of {:.4} keeps both anchors in window",
                tracker.tracker_id, span, b0
            );
            LineSearchResult::infeasible(slope, b0)
        }
    }
}

/// Slopes sampled evenly across the band around `base`, clipped to
/// `±max_incline` before sampling.
///
/// The band half-width is `|base| * tolerance`, or `max_incline * tolerance`
/// for a level baseline. The clipped baseline is always present; the output
/// is sorted and free of duplicates.
pub fn slope_candidates(base: f64, max_incline: f64, options: &SlopeSearchOptions) -> Vec<f64> {
    let max_incline = max_incline.abs();
    let base = base.clamp(-max_incline, max_incline);
    let band = if base == 0.0 {
        max_incline * options.tolerance
    } else {
        base.abs() * options.tolerance
    };
    let lo = (base - band).max(-max_incline);
    let hi = (base + band).min(max_incline);
    if options.steps < 2 || lo >= hi {
        return vec![base];
    }

    let last = (options.steps - 1) as f64;
    let mut slopes: Vec<f64> = (0..options.steps)
        .map(|i| {
            let t = i as f64 / last;
            lo * (1.0 - t) + hi * t
        })
        .collect();
    slopes.push(base);
    slopes.sort_by(f64::total_cmp);
    slopes.dedup();
    slopes
}

/// Joint slope and intercept search for flat trackers.
///
/// Every candidate line pivots on the baseline line's height at the first
/// pile, so all slopes start from the same anchor placement. The baseline is
/// searched first and another slope replaces it only on strictly lower cost.
#[allow(clippy::too_many_arguments)]
pub fn find_optimal_line_2d(
    tracker: &mut Tracker,
    windows: &[Window],
    baseline: GradingLine,
    span: f64,
    max_incline: f64,
    line_options: &LineSearchOptions,
    slope_options: &SlopeSearchOptions,
    eps: f64,
) -> Line2DSearchResult {
    let max_abs = max_incline.abs();
    let base_slope = baseline.slope.clamp(-max_abs, max_abs);
    let pivot_northing = tracker.first().map(|p| p.northing).unwrap_or(0.0);
    let pivot_height = baseline.height_at(pivot_northing);
    let centred = |slope: f64| GradingLine::through(slope, pivot_northing, pivot_height).intercept;

    let mut best = find_optimal_intercept(
        tracker,
        windows,
        base_slope,
        centred(base_slope),
        span,
        line_options,
        eps,
    );
    let mut slopes_evaluated = 1;

    for slope in slope_candidates(base_slope, max_abs, slope_options) {
        if slope == base_slope {
            continue;
        }
        let candidate = find_optimal_intercept(
            tracker,
            windows,
            slope,
            centred(slope),
            span,
            line_options,
            eps,
        );
        slopes_evaluated += 1;
        if candidate.is_feasible() && candidate.cost < best.cost {
            best = candidate;
        }
    }

    if best.is_feasible() {
        debug!(
            "tracker {}: 2D search best slope={:.5} b={:.4} cost={:.4} over {} slopes",
            tracker.tracker_id, best.slope, best.intercept, best.cost, slopes_evaluated
        );
    } else {
        warn!(
            "tracker {}: no line in the slope band keeps both anchors in window",
            tracker.tracker_id
        );
    }

    Line2DSearchResult {
        best,
        baseline_slope: base_slope,
        slopes_evaluated,
    }
}
