mod common;

use common::init_logging;
use common::synthetic_terrain::{rolling_project, terrain_constraints, tracker_from_profile};
use tracker_grading::grading::{grade_project, grade_tracker, pile_window, GradingOptions};
use tracker_grading::model::{ProjectKind, Tracker, TrackerKind};

const SEGMENT_LIMIT_DEG: f64 = 1.0;

fn assert_anchors_ungraded(tracker: &Tracker) {
    for pile in [tracker.first().unwrap(), tracker.last().unwrap()] {
        assert_eq!(
            pile.final_elevation, pile.initial_elevation,
            "tracker {} anchor {} was graded",
            tracker.tracker_id, pile.pile_in_tracker
        );
    }
}

#[test]
fn steep_pair_clamps_slope_and_reports_anchor() {
    init_logging();
    let constraints = terrain_constraints();
    let mut tracker = tracker_from_profile(1, TrackerKind::TerrainFollowing, 10.0, &[10.0, 20.0]);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();

    let line = report.target_line.as_ref().unwrap().line;
    assert!((line.slope - 0.15).abs() < 1e-12);
    assert!(!report.line_search.as_ref().unwrap().feasible);

    assert_anchors_ungraded(&tracker);
    assert!(report.fallback.graded_piles.is_empty());
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].pile_in_tracker, 2);
    assert!(report.violations[0].below_by < 0.0);
    assert_eq!(report.fallback.anchor_violations.len(), 1);
}

#[test]
fn knee_in_terrain_is_followed_within_limits() {
    init_logging();
    let constraints = terrain_constraints();
    let ground = [10.0, 10.4, 11.2, 12.5, 13.0, 13.2, 13.1, 13.3, 13.6];
    let mut tracker = tracker_from_profile(2, TrackerKind::TerrainFollowing, 10.0, &ground);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();

    let terrain = report.terrain.as_ref().expect("terrain passes ran");
    assert!(terrain.correction.converged);

    let wings = tracker.deflection.as_ref().unwrap();
    assert_eq!(wings.breaks.len(), ground.len());
    assert_eq!(wings.breaks[0], 0.0);
    assert_eq!(wings.breaks[ground.len() - 1], 0.0);
    assert!(wings.max_tracker_degree_break <= SEGMENT_LIMIT_DEG + 1e-5);
    assert!(wings.south_wing_deflection <= 5.0 + 1e-5);
    assert!(wings.north_wing_deflection <= 5.0 + 1e-5);

    assert_anchors_ungraded(&tracker);
    assert!(report.violations.is_empty());
    for pile in tracker.piles() {
        let window = pile_window(pile, &constraints);
        assert!(window.contains(pile.total_height, 1e-9));
        assert!(pile.terrain.is_some());
    }
}

#[test]
fn jagged_terrain_keeps_anchor_invariant() {
    init_logging();
    let constraints = terrain_constraints();
    let ground = [10.0, 11.0, 10.5, 12.0, 11.5, 13.0, 12.0, 14.0, 13.0, 15.0];
    let mut tracker = tracker_from_profile(3, TrackerKind::TerrainFollowing, 10.0, &ground);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();

    assert_anchors_ungraded(&tracker);
    assert!(report.terrain.is_some());
    let reported: Vec<u32> = report.violations.iter().map(|v| v.pile_in_tracker).collect();
    for pile in tracker.piles() {
        let window = pile_window(pile, &constraints);
        assert!(window.contains(pile.total_height, 1e-9) || reported.contains(&pile.pile_in_tracker));
    }

    let wings = report.deflection.as_ref().unwrap();
    let total: f64 = wings.breaks.iter().sum();
    assert!((wings.south_wing_deflection + wings.north_wing_deflection - total).abs() < 1e-9);
    for (pile, b) in tracker.piles().iter().zip(&wings.breaks) {
        assert_eq!(pile.terrain.unwrap().final_degree_break, *b);
    }
}

#[test]
fn unreachable_bend_limits_fall_back_to_straight_tube() {
    init_logging();
    let constraints = terrain_constraints();
    let ground = [10.0, 11.0, 10.5, 12.0, 11.5, 13.0, 12.0, 14.0, 13.0, 15.0];
    let mut tracker = tracker_from_profile(4, TrackerKind::TerrainFollowing, 10.0, &ground);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();

    let terrain = report.terrain.as_ref().unwrap();
    assert!(!terrain.correction.converged);
    assert!(terrain.reverted_to_line);

    let wings = tracker.deflection.as_ref().unwrap();
    assert!(wings.max_tracker_degree_break <= SEGMENT_LIMIT_DEG + 1e-5);
    assert!(wings.south_wing_deflection <= 5.0 + 1e-5);
    assert!(wings.north_wing_deflection <= 5.0 + 1e-5);

    // Windows are met by cut/fill under the straight tube.
    assert!(!report.fallback.graded_piles.is_empty());
    assert!(report.violations.is_empty());
    assert_anchors_ungraded(&tracker);
}

#[test]
fn anchors_survive_a_whole_project() {
    init_logging();
    let mut project = rolling_project(ProjectKind::TerrainFollowing, 6, 13);
    let report = grade_project(&mut project, &GradingOptions::default()).unwrap();
    assert_eq!(report.tracker_count, 6);
    for tracker in project.trackers() {
        assert_anchors_ungraded(tracker);
        assert!(tracker.deflection.is_some());
    }
    for tracker_report in &report.trackers {
        for v in &tracker_report.violations {
            let tracker = project.tracker(tracker_report.tracker_id).unwrap();
            let idx = tracker.index_of(v.pile_in_tracker).unwrap();
            assert!(tracker.is_anchor_index(idx));
        }
    }
}

#[test]
fn single_pile_tracker_sits_on_target() {
    let constraints = terrain_constraints();
    let mut tracker = tracker_from_profile(5, TrackerKind::TerrainFollowing, 10.0, &[10.0]);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();
    let pile = tracker.first().unwrap();
    assert!((pile.total_height - 11.5).abs() < 1e-12);
    assert_eq!(pile.terrain.unwrap().final_degree_break, 0.0);
    assert!(report.violations.is_empty());
}
