//! Bend-angle correction for terrain-following trackers.
//!
//! The break at interior pile `k` is the signed change in tube angle between
//! the segment arriving at `k` and the segment leaving it. Two limits apply:
//! every break must stay within the per-segment limit, and each wing's summed
//! `|break|` must stay within the cumulative limit. The wings split at the
//! centre pile (`pole_count / 2`); how the centre break is charged to the
//! wings is selected by [`CentreSplit`].
//!
//! Corrections move pile heights only, are relaxed by an iteration-dependent
//! factor and are always clamped to the moved pile's window. Anchors are
//! never moved.

use super::line_search::HeightSnapshot;
use super::window::Window;
use crate::angle::{angle_diff_deg, tube_angle_deg};
use crate::error::Result;
use crate::model::{DeflectionLimits, Tracker, WingDeflection};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Share of the centre pile's break charged to each wing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentreSplit {
    Half,
    Full,
    None,
}

impl CentreSplit {
    #[inline]
    pub fn weight(self) -> f64 {
        match self {
            CentreSplit::Half => 0.5,
            CentreSplit::Full => 1.0,
            CentreSplit::None => 0.0,
        }
    }
}

/// Iteration controls for [`correct_deflection`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DeflectionOptions {
    pub max_iterations: usize,
    /// Relaxation applied on the first iteration.
    pub relaxation_start: f64,
    /// Relaxation reached on the last iteration.
    pub relaxation_end: f64,
    /// Slack (degrees) under which a limit counts as met.
    pub convergence_eps_deg: f64,
    /// Fraction of a limit that corrections aim for.
    pub target_margin: f64,
    pub centre_split: CentreSplit,
}

impl Default for DeflectionOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            relaxation_start: 0.5,
            relaxation_end: 1.0,
            convergence_eps_deg: 1e-5,
            target_margin: 0.95,
            centre_split: CentreSplit::Half,
        }
    }
}

impl DeflectionOptions {
    fn relaxation(&self, iteration: usize) -> f64 {
        if self.max_iterations <= 1 {
            return self.relaxation_end;
        }
        let t = iteration as f64 / (self.max_iterations - 1) as f64;
        self.relaxation_start + (self.relaxation_end - self.relaxation_start) * t
    }
}

/// Bend angles of a tracker at its current heights.
#[derive(Clone, Debug, PartialEq)]
pub struct DeflectionMeasurement {
    /// Signed break per pile (degrees); anchors are zero.
    pub breaks: Vec<f64>,
    /// Horizontal run of each segment.
    pub lengths: Vec<f64>,
    pub south_wing: f64,
    pub north_wing: f64,
    pub centre: usize,
}

impl DeflectionMeasurement {
    pub fn max_break(&self) -> f64 {
        self.breaks.iter().fold(0.0, |acc, b| acc.max(b.abs()))
    }

    /// Total amount by which the limits are exceeded (degrees).
    pub fn excess(&self, limits: &DeflectionLimits) -> f64 {
        let segment: f64 = self
            .breaks
            .iter()
            .map(|b| (b.abs() - limits.segment_deg).max(0.0))
            .sum();
        segment
            + (self.south_wing - limits.cumulative_deg).max(0.0)
            + (self.north_wing - limits.cumulative_deg).max(0.0)
    }

    pub fn within_limits(&self, limits: &DeflectionLimits, eps: f64) -> bool {
        self.breaks.iter().all(|b| b.abs() <= limits.segment_deg + eps)
            && self.south_wing <= limits.cumulative_deg + eps
            && self.north_wing <= limits.cumulative_deg + eps
    }

    pub fn to_wing_deflection(&self) -> WingDeflection {
        WingDeflection {
            south_wing_deflection: self.south_wing,
            north_wing_deflection: self.north_wing,
            max_tracker_degree_break: self.max_break(),
            breaks: self.breaks.iter().map(|b| b.abs()).collect(),
        }
    }
}

/// Weight of pile `index` in the south and north wing sums.
fn wing_weights(index: usize, centre: usize, split: CentreSplit) -> (f64, f64) {
    use std::cmp::Ordering;
    match index.cmp(&centre) {
        Ordering::Less => (1.0, 0.0),
        Ordering::Greater => (0.0, 1.0),
        Ordering::Equal => (split.weight(), split.weight()),
    }
}

/// Measure the signed breaks and wing sums of `tracker`.
pub fn measure_deflection(tracker: &Tracker, split: CentreSplit) -> Result<DeflectionMeasurement> {
    let segments = tracker.segments()?;
    let angles: Vec<f64> = segments.iter().map(|s| s.deflection_angle_deg()).collect();
    let n = tracker.pole_count();
    let centre = tracker.centre_index();

    let mut breaks = vec![0.0; n];
    for k in 1..n.saturating_sub(1) {
        breaks[k] = angle_diff_deg(angles[k], angles[k - 1]);
    }
    let (mut south_wing, mut north_wing) = (0.0, 0.0);
    for (k, b) in breaks.iter().enumerate() {
        let (ws, wn) = wing_weights(k, centre, split);
        south_wing += ws * b.abs();
        north_wing += wn * b.abs();
    }

    Ok(DeflectionMeasurement {
        breaks,
        lengths: segments.iter().map(|s| s.length).collect(),
        south_wing,
        north_wing,
        centre,
    })
}

/// Summary of a corrector run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionOutcome {
    pub iterations: usize,
    pub converged: bool,
    pub initial_excess_deg: f64,
    pub final_excess_deg: f64,
}

/// Height change at interior pile `k` that reduces its break by `reduce_deg`.
///
/// Raising pile `k` by `dh` steepens the incoming segment by about `dh / L1`
/// and flattens the outgoing one by `dh / L2`.
#[inline]
fn joint_move(l_in: f64, l_out: f64, break_deg: f64, reduce_deg: f64) -> f64 {
    let effective = l_in * l_out / (l_in + l_out);
    break_deg.signum() * effective * reduce_deg.to_radians()
}

/// Move violating interior piles towards their windows.
///
/// Each pile moves by at most `incoming segment length * max_slope_change`.
/// Returns how many piles moved.
pub fn pull_towards_window(
    tracker: &mut Tracker,
    windows: &[Window],
    max_slope_change: f64,
    eps: f64,
) -> Result<usize> {
    if max_slope_change <= 0.0 {
        return Ok(0);
    }
    let lengths: Vec<f64> = tracker.segments()?.iter().map(|s| s.length).collect();
    let n = tracker.pole_count();
    let mut moved = 0;
    for (k, pile) in tracker.piles_mut().iter_mut().enumerate() {
        if k == 0 || k + 1 >= n || windows[k].contains(pile.height, eps) {
            continue;
        }
        let wanted = windows[k].clamp(pile.height) - pile.height;
        let step = lengths[k - 1] * max_slope_change;
        pile.height += wanted.clamp(-step, step);
        moved += 1;
    }
    Ok(moved)
}

#[inline]
fn segment_angle(heights: &[f64], lengths: &[f64], k: usize) -> f64 {
    tube_angle_deg(heights[k + 1] - heights[k], lengths[k])
}

/// Forward sweep enforcing the per-segment limit.
fn segment_pass(
    heights: &mut [f64],
    windows: &[Window],
    lengths: &[f64],
    limit_deg: f64,
    options: &DeflectionOptions,
    relax: f64,
) {
    let n = heights.len();
    let aim = limit_deg * options.target_margin;

    for k in 1..n - 1 {
        let theta_in = segment_angle(heights, lengths, k - 1);
        let b = angle_diff_deg(segment_angle(heights, lengths, k), theta_in);
        if b.abs() <= limit_deg + options.convergence_eps_deg {
            continue;
        }
        let end = k + 1;
        let desired = theta_in + b.signum() * aim;
        let target = windows[end].clamp(heights[k] + lengths[k] * desired.to_radians().tan());
        let reached = angle_diff_deg(tube_angle_deg(target - heights[k], lengths[k]), theta_in);

        if end + 1 < n && reached.abs() <= limit_deg + options.convergence_eps_deg {
            let moved = heights[end] + relax * (target - heights[end]);
            heights[end] = windows[end].clamp(moved);
        } else {
            let dh = joint_move(lengths[k - 1], lengths[k], b, relax * (b.abs() - aim));
            heights[k] = windows[k].clamp(heights[k] + dh);
        }
    }
}

/// Proportional reduction of each wing that exceeds the cumulative limit.
fn cumulative_pass(
    heights: &mut [f64],
    windows: &[Window],
    measurement: &DeflectionMeasurement,
    limit_deg: f64,
    options: &DeflectionOptions,
    relax: f64,
) {
    let n = heights.len();
    let aim = limit_deg * options.target_margin;
    let wings = [
        (measurement.south_wing, true),
        (measurement.north_wing, false),
    ];
    for (sum, south) in wings {
        if sum <= limit_deg + options.convergence_eps_deg || sum <= 0.0 {
            continue;
        }
        let fraction = ((sum - aim) / sum).min(1.0);
        for k in 1..n - 1 {
            let (ws, wn) = wing_weights(k, measurement.centre, options.centre_split);
            let weight = if south { ws } else { wn };
            let b = measurement.breaks[k];
            if weight == 0.0 || b == 0.0 {
                continue;
            }
            let dh = weight
                * joint_move(
                    measurement.lengths[k - 1],
                    measurement.lengths[k],
                    b,
                    relax * fraction * b.abs(),
                );
            heights[k] = windows[k].clamp(heights[k] + dh);
        }
    }
}

fn write_heights(tracker: &mut Tracker, heights: &[f64]) {
    for (pile, h) in tracker.piles_mut().iter_mut().zip(heights) {
        pile.height = *h;
    }
}

/// Iteratively bring bend angles within `limits`.
///
/// The best state seen (lowest [`DeflectionMeasurement::excess`]) is kept,
/// so a run that fails to converge still leaves the least-violating heights
/// in place.
pub fn correct_deflection(
    tracker: &mut Tracker,
    windows: &[Window],
    limits: &DeflectionLimits,
    options: &DeflectionOptions,
) -> Result<CorrectionOutcome> {
    let eps = options.convergence_eps_deg;
    let initial = measure_deflection(tracker, options.centre_split)?;
    let initial_excess = initial.excess(limits);
    let n = tracker.pole_count();
    if n < 3 || initial.within_limits(limits, eps) {
        return Ok(CorrectionOutcome {
            iterations: 0,
            converged: initial.within_limits(limits, eps),
            initial_excess_deg: initial_excess,
            final_excess_deg: initial_excess,
        });
    }

    let mut best = HeightSnapshot::capture(tracker);
    let mut best_excess = initial_excess;
    let mut heights = tracker.heights();
    let mut iterations = 0;
    let mut converged = false;

    for it in 0..options.max_iterations {
        iterations = it + 1;
        let relax = options.relaxation(it);

        segment_pass(&mut heights, windows, &initial.lengths, limits.segment_deg, options, relax);
        write_heights(tracker, &heights);

        let measured = measure_deflection(tracker, options.centre_split)?;
        cumulative_pass(&mut heights, windows, &measured, limits.cumulative_deg, options, relax);
        write_heights(tracker, &heights);

        let measured = measure_deflection(tracker, options.centre_split)?;
        let excess = measured.excess(limits);
        if excess < best_excess {
            best_excess = excess;
            best = HeightSnapshot::capture(tracker);
        }
        if measured.within_limits(limits, eps) {
            converged = true;
            break;
        }
    }

    best.restore(tracker);
    if converged {
        debug!(
            "tracker {}: deflection corrected in {} iterations (excess {:.5} -> {:.5} deg)",
            tracker.tracker_id, iterations, initial_excess, best_excess
        );
    } else {
        warn!(
            "tracker {}: deflection limits not met after {} iterations, best excess {:.5} deg",
            tracker.tracker_id, iterations, best_excess
        );
    }
    Ok(CorrectionOutcome {
        iterations,
        converged,
        initial_excess_deg: initial_excess,
        final_excess_deg: best_excess,
    })
}
