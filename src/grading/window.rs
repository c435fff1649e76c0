//! Grading windows and window-violation bookkeeping.
//!
//! A pile's window is the band of acceptable tube heights above its current
//! ground:
//!
//! ```text
//! min = ground + min_reveal + flooding_allowance + tolerance / 2
//! max = ground + max_reveal - tolerance / 2
//! ```
//!
//! Windows depend only on ground elevation, never on tube height, so the
//! optimiser passes compute them once per ground state and reuse them.

use crate::model::{Constraints, Pile, Tracker};
use log::warn;
use serde::Serialize;

/// Allowed tube-height interval for one pile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Window {
    pub min: f64,
    pub max: f64,
}

impl Window {
    /// `false` when tolerance and flooding allowance consume the whole reveal span.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.min <= self.max
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Inclusive containment test with an absolute slack `eps`.
    #[inline]
    pub fn contains(&self, height: f64, eps: f64) -> bool {
        height >= self.min - eps && height <= self.max + eps
    }

    /// Height located `fraction` of the way from `min` to `max`.
    #[inline]
    pub fn target(&self, fraction: f64) -> f64 {
        self.min + self.span() * fraction
    }

    /// Clamp into the window. An infeasible window resolves to `max`.
    #[inline]
    pub fn clamp(&self, height: f64) -> f64 {
        height.max(self.min).min(self.max)
    }
}

/// Window for a single pile from its current ground elevation.
pub fn pile_window(pile: &Pile, constraints: &Constraints) -> Window {
    let half_tol = constraints.pile_install_tolerance / 2.0;
    Window {
        min: pile.current_elevation
            + constraints.min_reveal_height
            + pile.flooding_allowance
            + half_tol,
        max: pile.current_elevation + constraints.max_reveal_height - half_tol,
    }
}

/// Windows for every pile of a tracker, in pile order.
///
/// Infeasible windows are reported with a warning and returned as-is so the
/// remaining stages can still place the pile as well as possible.
pub fn tracker_windows(tracker: &Tracker, constraints: &Constraints) -> Vec<Window> {
    tracker
        .piles()
        .iter()
        .map(|pile| {
            let window = pile_window(pile, constraints);
            if !window.is_feasible() {
                warn!(
                    "tracker {} pile {}: grading window is empty (min {:.4} > max {:.4})",
                    tracker.tracker_id, pile.pile_in_tracker, window.min, window.max
                );
            }
            window
        })
        .collect()
}

/// A pile whose tube height lies outside its grading window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Violation {
    pub pile_id: f64,
    pub pile_in_tracker: u32,
    pub grading_window_min: f64,
    pub grading_window_max: f64,
    /// `min(0, height - window_min)`; never positive.
    pub below_by: f64,
    /// `max(0, height - window_max)`; never negative.
    pub above_by: f64,
}

impl Violation {
    /// Signed ground movement that lands the pile on its nearest boundary.
    #[inline]
    pub fn movement(&self) -> f64 {
        self.below_by + self.above_by
    }

    /// Unsigned distance outside the window.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.below_by.abs() + self.above_by
    }
}

/// Collect every pile of `tracker` that lies outside its window.
///
/// `windows` must be in pile order, as returned by [`tracker_windows`].
pub fn check_within_window(tracker: &Tracker, windows: &[Window], eps: f64) -> Vec<Violation> {
    debug_assert_eq!(tracker.pole_count(), windows.len());
    tracker
        .piles()
        .iter()
        .zip(windows)
        .filter(|(pile, window)| !window.contains(pile.height, eps))
        .map(|(pile, window)| Violation {
            pile_id: pile.pile_id,
            pile_in_tracker: pile.pile_in_tracker,
            grading_window_min: window.min,
            grading_window_max: window.max,
            below_by: (pile.height - window.min).min(0.0),
            above_by: (pile.height - window.max).max(0.0),
        })
        .collect()
}

/// Total out-of-window distance, `Σ(|below_by| + above_by)`.
pub fn total_grading_cost(violations: &[Violation]) -> f64 {
    violations.iter().map(Violation::magnitude).sum()
}

/// Whether both end piles currently sit inside their own windows.
pub fn anchors_within_window(tracker: &Tracker, windows: &[Window], eps: f64) -> bool {
    let piles = tracker.piles();
    match (piles.first(), piles.last(), windows.first(), windows.last()) {
        (Some(first), Some(last), Some(w_first), Some(w_last)) => {
            w_first.contains(first.height, eps) && w_last.contains(last.height, eps)
        }
        _ => true,
    }
}
