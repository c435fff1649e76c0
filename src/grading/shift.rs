//! Uniform vertical shift of a whole tracker.
//!
//! Subtracting the same `s` from every pile height leaves every segment
//! slope, and therefore every bend angle, unchanged. The shift is limited to
//! the interval that keeps both anchors inside their windows:
//!
//! ```text
//! h_anchor - window_max <= s <= h_anchor - window_min
//! ```
//!
//! The summed out-of-window distance is piecewise linear and convex in `s`,
//! so its minimum over the interval lies on the interval ends or on one of
//! the window-boundary crossings `h_i - window_{min,max}`. Only those points
//! are evaluated.

use super::line_search::Feasibility;
use super::window::{check_within_window, total_grading_cost, Window};
use crate::model::Tracker;
use log::debug;

/// Outcome of a uniform-shift pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShiftResult {
    /// Amount subtracted from every height; zero when nothing improved.
    pub shift: f64,
    pub cost_before: f64,
    pub cost_after: f64,
    pub feasibility: Feasibility,
}

/// Shift every pile of `tracker` by the best anchor-feasible amount.
///
/// The unshifted state is the baseline; a shift is committed only when it
/// lowers the cost strictly. An empty anchor interval leaves the tracker
/// untouched and reports [`Feasibility::Infeasible`].
pub fn uniform_shift(tracker: &mut Tracker, windows: &[Window], eps: f64) -> ShiftResult {
    let cost_before = total_grading_cost(&check_within_window(tracker, windows, eps));
    let unchanged = |feasibility| ShiftResult {
        shift: 0.0,
        cost_before,
        cost_after: cost_before,
        feasibility,
    };

    let piles = tracker.piles();
    let (Some(first), Some(last)) = (piles.first(), piles.last()) else {
        return unchanged(Feasibility::Feasible);
    };
    let (w_first, w_last) = (windows[0], windows[windows.len() - 1]);
    let lo = (first.height - w_first.max).max(last.height - w_last.max);
    let hi = (first.height - w_first.min).min(last.height - w_last.min);
    if lo > hi + eps {
        debug!(
            "tracker {}: anchor windows admit no common shift ({:.4} > {:.4})",
            tracker.tracker_id, lo, hi
        );
        return unchanged(Feasibility::Infeasible);
    }
    let hi = hi.max(lo);

    let cost_at = |s: f64| -> f64 {
        piles
            .iter()
            .zip(windows)
            .map(|(pile, w)| {
                let h = pile.height - s;
                (w.min - h).max(0.0) + (h - w.max).max(0.0)
            })
            .sum()
    };

    let mut best_shift = 0.0;
    let mut best_cost = cost_before;
    let crossings = piles
        .iter()
        .zip(windows)
        .flat_map(|(pile, w)| [pile.height - w.min, pile.height - w.max]);
    for s in [lo, hi].into_iter().chain(crossings) {
        if s < lo || s > hi {
            continue;
        }
        let cost = cost_at(s);
        if cost < best_cost - eps {
            best_cost = cost;
            best_shift = s;
        }
    }

    if best_shift != 0.0 {
        for pile in tracker.piles_mut() {
            pile.height -= best_shift;
        }
        debug!(
            "tracker {}: uniform shift {:.4} lowers cost {:.4} -> {:.4}",
            tracker.tracker_id, best_shift, cost_before, best_cost
        );
    }
    let cost_after = total_grading_cost(&check_within_window(tracker, windows, eps));
    ShiftResult {
        shift: best_shift,
        cost_before,
        cost_after,
        feasibility: Feasibility::Feasible,
    }
}
