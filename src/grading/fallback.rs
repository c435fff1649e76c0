//! Last-resort ground grading.
//!
//! Any interior pile still outside its window has its ground moved by
//! `below_by + above_by`, which lands the tube exactly on the nearest window
//! boundary. End piles are never graded; a violating anchor is reported
//! instead.

use super::window::{check_within_window, tracker_windows, Violation, Window};
use crate::model::{Constraints, Tracker};
use log::{debug, warn};

#[derive(Clone, Debug, Default)]
pub struct FallbackOutcome {
    /// `pile_in_tracker` of every pile whose ground was changed.
    pub graded: Vec<u32>,
    /// Anchor violations that were left in place.
    pub anchor_violations: Vec<Violation>,
    /// Violations remaining after grading, anchors included.
    pub remaining: Vec<Violation>,
    /// Windows recomputed from the graded ground.
    pub windows: Vec<Window>,
}

/// Cut or fill the ground under every violating interior pile.
pub fn apply_final_grading(tracker: &mut Tracker, constraints: &Constraints, eps: f64) -> FallbackOutcome {
    let windows = tracker_windows(tracker, constraints);
    let violations = check_within_window(tracker, &windows, eps);
    let mut outcome = FallbackOutcome::default();

    for violation in violations {
        let Some(index) = tracker.index_of(violation.pile_in_tracker) else {
            continue;
        };
        if tracker.is_anchor_index(index) {
            warn!(
                "tracker {} pile {}: end pile outside its window by {:.4}; not graded",
                tracker.tracker_id,
                violation.pile_in_tracker,
                violation.magnitude()
            );
            outcome.anchor_violations.push(violation);
            continue;
        }
        let pile = &mut tracker.piles_mut()[index];
        let ground = pile.current_elevation + violation.movement();
        pile.set_current_elevation(ground);
        debug!(
            "tracker {} pile {}: ground {:+.4} to {:.4}",
            tracker.tracker_id,
            violation.pile_in_tracker,
            violation.movement(),
            ground
        );
        outcome.graded.push(violation.pile_in_tracker);
    }

    outcome.windows = tracker_windows(tracker, constraints);
    outcome.remaining = check_within_window(tracker, &outcome.windows, eps);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pile, TrackerKind};

    fn tracker(rows: &[(f64, f64)]) -> Tracker {
        let mut tracker = Tracker::new(2, TrackerKind::Flat);
        for (i, (z, h)) in rows.iter().enumerate() {
            let pos = i as u32 + 1;
            let mut pile = Pile::new(2.0 + pos as f64 / 100.0, pos, i as f64 * 10.0, 0.0, *z, 0.0).unwrap();
            pile.height = *h;
            tracker.add_pile(pile);
        }
        tracker
    }

    #[test]
    fn interior_piles_land_on_nearest_boundary() {
        let c = Constraints::default();
        let mut t = tracker(&[(10.0, 11.5), (8.0, 11.5), (10.5, 11.5), (10.0, 11.5)]);
        let outcome = apply_final_grading(&mut t, &c, 1e-9);
        assert_eq!(outcome.graded, vec![2, 3]);
        assert!(outcome.remaining.is_empty());
        assert!(outcome.anchor_violations.is_empty());

        // Pile 2 was too high above ground: fill up to the max boundary.
        let raised = &t.piles()[1];
        assert!((raised.current_elevation - (11.5 - 1.675)).abs() < 1e-12);
        // Pile 3 was too close to ground: cut down to the min boundary.
        let lowered = &t.piles()[2];
        assert!((lowered.current_elevation - (11.5 - 1.375)).abs() < 1e-12);
    }

    #[test]
    fn anchors_are_reported_not_graded() {
        let c = Constraints::default();
        let mut t = tracker(&[(12.0, 11.5), (10.0, 11.5), (10.0, 11.5)]);
        let outcome = apply_final_grading(&mut t, &c, 1e-9);
        assert!(outcome.graded.is_empty());
        assert_eq!(outcome.anchor_violations.len(), 1);
        assert_eq!(outcome.remaining.len(), 1);
        assert_eq!(outcome.remaining[0].pile_in_tracker, 1);
        assert_eq!(t.piles()[0].current_elevation, 12.0);
    }
}
