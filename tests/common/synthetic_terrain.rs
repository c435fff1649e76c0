use tracker_grading::model::{Constraints, Pile, Project, ProjectKind, Tracker, TrackerKind};

/// Piles spaced `spacing` apart along northing with the given ground profile.
pub fn tracker_from_profile(tracker_id: u32, kind: TrackerKind, spacing: f64, ground: &[f64]) -> Tracker {
    assert!(spacing > 0.0, "pile spacing must be positive");
    let piles = ground
        .iter()
        .enumerate()
        .map(|(i, z)| {
            let pos = i as u32 + 1;
            Pile::new(
                tracker_id as f64 + pos as f64 / 100.0,
                pos,
                i as f64 * spacing,
                tracker_id as f64 * 6.0,
                *z,
                0.0,
            )
            .expect("synthetic pile is valid")
        })
        .collect();
    Tracker::with_piles(tracker_id, kind, piles)
}

/// Constraints used by the terrain-following scenarios.
pub fn terrain_constraints() -> Constraints {
    Constraints {
        min_reveal_height: 1.0,
        max_reveal_height: 2.0,
        pile_install_tolerance: 0.0,
        max_incline: 0.15,
        max_segment_deflection_deg: Some(1.0),
        max_cumulative_deflection_deg: Some(5.0),
        ..Default::default()
    }
}

/// Ground that climbs, levels off and undulates: a mix of trackers that
/// grade cleanly and trackers that need cut/fill.
pub fn rolling_ground(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            10.0 + 0.03 * x + 0.25 * (0.9 * x + phase).sin()
        })
        .collect()
}

/// Project with `count` trackers over rolling ground.
pub fn rolling_project(kind: ProjectKind, count: u32, piles_per_tracker: usize) -> Project {
    let constraints = match kind {
        ProjectKind::Standard => Constraints::default(),
        ProjectKind::TerrainFollowing => terrain_constraints(),
    };
    let mut project = Project::new("rolling", kind, constraints).expect("valid constraints");
    for id in 1..=count {
        let ground = rolling_ground(piles_per_tracker, id as f64 * 0.7);
        let tracker = tracker_from_profile(id, kind.tracker_kind(), 9.0, &ground);
        project.add_tracker(tracker).expect("unique tracker id");
    }
    project
}
