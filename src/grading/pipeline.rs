use super::deflection::{correct_deflection, measure_deflection, pull_towards_window};
use super::fallback::apply_final_grading;
use super::line_search::{
    find_optimal_intercept, find_optimal_line_2d, intercept_span, HeightSnapshot,
};
use super::shift::uniform_shift;
use super::target_line::{apply_line, target_height_line, GradingLine};
use super::window::{
    anchors_within_window, check_within_window, total_grading_cost, tracker_windows, Violation,
    Window,
};
use super::GradingOptions;
use crate::diagnostics::{
    FallbackStage, LineSearchStage, PileOutcome, ProjectReport, SearchMode, TargetLineStage,
    TerrainStage, TrackerReport,
};
use crate::error::{GradingError, Result};
use crate::model::{Constraints, DeflectionLimits, Project, TerrainBreak, Tracker, TrackerKind};
use log::{debug, warn};
use rayon::prelude::*;
use std::time::Instant;

/// Grade one tracker in place and report what each stage did.
///
/// Piles must already be ordered by `pile_in_tracker`. On return every pile
/// is finalized: `final_elevation`, `total_height` and `pile_revealed` are
/// set, and terrain-following trackers carry their bend angles.
pub fn grade_tracker(
    tracker: &mut Tracker,
    constraints: &Constraints,
    options: &GradingOptions,
) -> Result<TrackerReport> {
    let t0 = Instant::now();
    let mut report = TrackerReport::new(tracker.tracker_id, tracker.kind);
    if tracker.is_empty() {
        debug!("tracker {}: no piles, nothing to grade", tracker.tracker_id);
        return Ok(report);
    }
    if !tracker.is_sorted() {
        return Err(GradingError::UnsortedPiles {
            tracker_id: tracker.tracker_id,
        });
    }
    let limits = match tracker.kind {
        TrackerKind::TerrainFollowing => Some(constraints.deflection_limits().ok_or_else(|| {
            GradingError::InvalidConstraints {
                reason: format!(
                    "terrain-following tracker {} requires deflection limits",
                    tracker.tracker_id
                ),
            }
        })?),
        TrackerKind::Flat => None,
    };
    let eps = options.window_eps;

    let stage = Instant::now();
    let windows = tracker_windows(tracker, constraints);
    let line = target_height_line(tracker, &windows, constraints)?;
    let violations = check_within_window(tracker, &windows, eps);
    let cost = total_grading_cost(&violations);
    debug!(
        "tracker {}: target line slope={:.5} b={:.4}, {} violations (cost {:.4})",
        tracker.tracker_id,
        line.slope,
        line.intercept,
        violations.len(),
        cost
    );
    report.target_line = Some(TargetLineStage {
        line,
        violations: violations.len(),
        cost,
    });
    report.timings.record("target_line", stage);

    if !violations.is_empty() {
        let stage = Instant::now();
        let search = search_line(tracker, &windows, constraints, options, line, &violations);
        report.line_search = Some(search);
        report.timings.record("line_search", stage);

        if let Some(limits) = &limits {
            let stage = Instant::now();
            report.terrain = Some(terrain_passes(tracker, &windows, constraints, limits, options)?);
            report.timings.record("terrain", stage);
        }
    }

    let stage = Instant::now();
    let fallback = apply_final_grading(tracker, constraints, eps);
    report.timings.record("fallback", stage);

    for pile in tracker.piles_mut() {
        pile.finalize();
    }
    if tracker.is_terrain_following() {
        let measured = measure_deflection(tracker, options.deflection.centre_split)?;
        for (pile, b) in tracker.piles_mut().iter_mut().zip(&measured.breaks) {
            pile.terrain = Some(TerrainBreak {
                final_degree_break: b.abs(),
            });
        }
        let wings = measured.to_wing_deflection();
        tracker.deflection = Some(wings.clone());
        report.deflection = Some(wings);
    }

    debug!(
        "tracker {}: graded {} piles, {} violations remain",
        tracker.tracker_id,
        fallback.graded.len(),
        fallback.remaining.len()
    );
    report.fallback = FallbackStage {
        graded_piles: fallback.graded,
        anchor_violations: fallback.anchor_violations,
    };
    report.violations = fallback.remaining;
    report.piles = tracker.piles().iter().map(PileOutcome::from).collect();
    report.timings.finish(t0);
    Ok(report)
}

/// Search for a better line and commit it when it wins.
///
/// A feasible line replaces the initial one when it lowers the cost or when
/// the initial line leaves an anchor outside its window.
fn search_line(
    tracker: &mut Tracker,
    windows: &[Window],
    constraints: &Constraints,
    options: &GradingOptions,
    initial: GradingLine,
    violations: &[Violation],
) -> LineSearchStage {
    let eps = options.window_eps;
    let initial_cost = total_grading_cost(violations);
    let anchors_ok = anchors_within_window(tracker, windows, eps);
    let span = intercept_span(violations, &options.line_search);

    let (mode, result, slopes_evaluated) = match tracker.kind {
        TrackerKind::Flat => {
            let search = find_optimal_line_2d(
                tracker,
                windows,
                initial,
                span,
                constraints.max_incline,
                &options.line_search,
                &options.slope_search,
                eps,
            );
            (SearchMode::SlopeIntercept, search.best, search.slopes_evaluated)
        }
        TrackerKind::TerrainFollowing => {
            let result = find_optimal_intercept(
                tracker,
                windows,
                initial.slope,
                initial.intercept,
                span,
                &options.line_search,
                eps,
            );
            (SearchMode::Intercept, result, 1)
        }
    };

    let accepted = result.is_feasible() && (result.cost < initial_cost || !anchors_ok);
    if accepted {
        apply_line(tracker, result.line());
    } else if !result.is_feasible() {
        warn!(
            "tracker {}: no line keeps both end piles in window; keeping the target line",
            tracker.tracker_id
        );
    }
    LineSearchStage::from_result(mode, span, &result, accepted, slopes_evaluated)
}

/// Pull, shift, correct, shift.
///
/// When the corrector ends above the bend excess of the committed straight
/// line, the straight heights are restored and cut/fill handles the windows.
fn terrain_passes(
    tracker: &mut Tracker,
    windows: &[Window],
    constraints: &Constraints,
    limits: &DeflectionLimits,
    options: &GradingOptions,
) -> Result<TerrainStage> {
    let eps = options.window_eps;
    let straight = HeightSnapshot::capture(tracker);
    let straight_excess = measure_deflection(tracker, options.deflection.centre_split)?.excess(limits);

    let pulled_piles = pull_towards_window(
        tracker,
        windows,
        constraints.max_conservative_segment_slope_change(),
        eps,
    )?;
    let before = uniform_shift(tracker, windows, eps);
    let correction = correct_deflection(tracker, windows, limits, &options.deflection)?;

    let reverted_to_line = !correction.converged && correction.final_excess_deg > straight_excess;
    if reverted_to_line {
        warn!(
            "tracker {}: bend limits unreachable (best excess {:.5} deg), keeping the straight line",
            tracker.tracker_id, correction.final_excess_deg
        );
        straight.restore(tracker);
    }
    let after = uniform_shift(tracker, windows, eps);
    Ok(TerrainStage {
        pulled_piles,
        shift_before_correction: before.shift,
        correction,
        reverted_to_line,
        shift_after_correction: after.shift,
    })
}

/// Grade every tracker of `project` in parallel.
///
/// Trackers share only the read-only constraints, so the result is identical
/// to grading them one after another.
pub fn grade_project(project: &mut Project, options: &GradingOptions) -> Result<ProjectReport> {
    let t0 = Instant::now();
    let (constraints, trackers) = project.split_mut();
    let reports = trackers
        .par_iter_mut()
        .map(|tracker| grade_tracker(tracker, constraints, options))
        .collect::<Result<Vec<_>>>()?;
    let report = ProjectReport::from_trackers(project.name.clone(), reports);
    debug!(
        "project {}: {} trackers, {} graded piles, {} violations in {:.3} ms",
        report.name,
        report.tracker_count,
        report.graded_piles,
        report.violation_count,
        t0.elapsed().as_secs_f64() * 1000.0
    );
    Ok(report)
}
