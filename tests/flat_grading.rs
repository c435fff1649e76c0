mod common;

use common::init_logging;
use common::synthetic_terrain::{rolling_project, tracker_from_profile};
use tracker_grading::grading::{
    find_optimal_line_2d, grade_project, grade_tracker, intercept_span, pile_window,
    target_height_line, tracker_windows, check_within_window, GradingOptions,
};
use tracker_grading::model::{Constraints, Project, ProjectKind, Tracker, TrackerKind};
use tracker_grading::GradingError;

fn assert_piles_in_window_or_reported(tracker: &Tracker, constraints: &Constraints, violations: &[u32]) {
    for pile in tracker.piles() {
        let window = pile_window(pile, constraints);
        let inside = window.contains(pile.total_height, 1e-9);
        assert!(
            inside || violations.contains(&pile.pile_in_tracker),
            "tracker {} pile {} at {:.4} outside [{:.4}, {:.4}] but not reported",
            tracker.tracker_id,
            pile.pile_in_tracker,
            pile.total_height,
            window.min,
            window.max
        );
    }
}

#[test]
fn level_ground_settles_on_window_centre() {
    init_logging();
    let constraints = Constraints::default();
    let mut tracker = tracker_from_profile(1, TrackerKind::Flat, 10.0, &[10.0, 10.0, 10.0]);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();

    assert!(report.violations.is_empty());
    for pile in tracker.piles() {
        assert!((pile.total_height - 11.525).abs() < 1e-9);
        assert_eq!(pile.final_elevation, pile.initial_elevation);
        assert_eq!(pile.cut_fill(), 0.0);
    }
    assert_eq!(report.total_cut(), 0.0);
    assert_eq!(report.total_fill(), 0.0);
}

#[test]
fn dipped_pile_is_graded_into_window() {
    init_logging();
    let constraints = Constraints::default();
    let ground = [10.0, 10.05, 8.0, 9.95, 10.0];
    let mut tracker = tracker_from_profile(2, TrackerKind::Flat, 10.0, &ground);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();

    let search = report.line_search.as_ref().expect("dip triggers a line search");
    assert!(search.feasible);
    assert!(report.violations.is_empty(), "violations: {:?}", report.violations);

    let dipped = tracker.pile_in_tracker(3).unwrap();
    assert!(dipped.final_elevation > dipped.initial_elevation, "dip should be filled");
    assert!(report.fallback.graded_piles.contains(&3));

    let first = tracker.first().unwrap();
    let last = tracker.last().unwrap();
    assert_eq!(first.final_elevation, first.initial_elevation);
    assert_eq!(last.final_elevation, last.initial_elevation);
    assert_piles_in_window_or_reported(&tracker, &constraints, &[]);
    assert!(report.total_fill() > 0.0);
}

#[test]
fn piles_on_window_edge_are_not_violations() {
    let constraints = Constraints {
        target_height_percentage: 0.0,
        ..Default::default()
    };
    let mut tracker = tracker_from_profile(3, TrackerKind::Flat, 10.0, &[10.0, 10.0, 10.0, 10.0]);
    let report = grade_tracker(&mut tracker, &constraints, &GradingOptions::default()).unwrap();
    assert_eq!(report.target_line.as_ref().unwrap().violations, 0);
    assert!(report.fallback.graded_piles.is_empty());
    for pile in tracker.piles() {
        assert_eq!(pile.total_height, pile_window(pile, &constraints).min);
    }
}

#[test]
fn refinement_never_worsens_coarse_cost() {
    let constraints = Constraints::default();
    let options = GradingOptions::default();
    let mut project = rolling_project(ProjectKind::Standard, 6, 12);
    for tracker in project.trackers_mut() {
        let windows = tracker_windows(tracker, &constraints);
        let line = target_height_line(tracker, &windows, &constraints).unwrap();
        let violations = check_within_window(tracker, &windows, options.window_eps);
        if violations.is_empty() {
            continue;
        }
        let span = intercept_span(&violations, &options.line_search);
        let result = find_optimal_line_2d(
            tracker,
            &windows,
            line,
            span,
            constraints.max_incline,
            &options.line_search,
            &options.slope_search,
            options.window_eps,
        );
        if result.best.is_feasible() {
            assert!(result.best.cost <= result.best.coarse_cost);
        } else {
            assert!(result.best.cost.is_infinite());
        }
    }
}

#[test]
fn every_pile_is_in_window_or_reported() {
    init_logging();
    let mut project = rolling_project(ProjectKind::Standard, 8, 14);
    let report = grade_project(&mut project, &GradingOptions::default()).unwrap();
    assert_eq!(report.tracker_count, 8);
    assert_eq!(report.pile_count, 8 * 14);

    for (tracker, tracker_report) in project.trackers().iter().zip(&report.trackers) {
        assert_eq!(tracker.tracker_id, tracker_report.tracker_id);
        let reported: Vec<u32> = tracker_report.violations.iter().map(|v| v.pile_in_tracker).collect();
        assert_piles_in_window_or_reported(tracker, project.constraints(), &reported);
        for v in &tracker_report.violations {
            let idx = tracker.index_of(v.pile_in_tracker).unwrap();
            assert!(tracker.is_anchor_index(idx), "interior pile {} left in violation", v.pile_in_tracker);
        }
    }
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"trackerId\""));
    assert!(json.contains("\"totalCut\""));
}

#[test]
fn parallel_run_matches_sequential_run() {
    let options = GradingOptions::default();
    let mut parallel = rolling_project(ProjectKind::Standard, 10, 11);
    let mut sequential = parallel.clone();

    grade_project(&mut parallel, &options).unwrap();
    let constraints = sequential.constraints().clone();
    for tracker in sequential.trackers_mut() {
        grade_tracker(tracker, &constraints, &options).unwrap();
    }

    for (a, b) in parallel.trackers().iter().zip(sequential.trackers()) {
        for (pa, pb) in a.piles().iter().zip(b.piles()) {
            assert_eq!(pa.total_height, pb.total_height);
            assert_eq!(pa.final_elevation, pb.final_elevation);
        }
    }
}

#[test]
fn shared_northing_is_rejected() {
    let mut project = Project::new("bad", ProjectKind::Standard, Constraints::default()).unwrap();
    let mut tracker = tracker_from_profile(4, TrackerKind::Flat, 10.0, &[10.0, 10.0]);
    tracker.piles_mut()[1].northing = 0.0;
    tracker.piles_mut()[1].easting += 3.0;
    project.add_tracker(tracker).unwrap();

    let err = grade_project(&mut project, &GradingOptions::default()).unwrap_err();
    assert!(matches!(err, GradingError::DegenerateGeometry { tracker_id: 4, .. }));
    assert!(err.to_string().contains("northing"));
}
