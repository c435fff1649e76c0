#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod diagnostics;
pub mod error;
pub mod grading;
pub mod model;

// Supporting modules used by the tools.
pub mod angle;
pub mod config;
pub mod io;

// --- High-level re-exports -------------------------------------------------

// Main entry points: grading runs and their options.
pub use crate::error::{GradingError, Result};
pub use crate::grading::{grade_project, grade_tracker, GradingOptions};

// Site model.
pub use crate::model::{Constraints, Pile, Project, ProjectInput, ProjectKind, Tracker, TrackerKind};

// Reports returned by the engine.
pub use crate::diagnostics::{ProjectReport, TrackerReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use tracker_grading::prelude::*;
///
/// # fn main() -> tracker_grading::Result<()> {
/// let mut project = Project::new("demo", ProjectKind::Standard, Constraints::default())?;
/// let mut tracker = project.new_tracker(1);
/// for (pos, northing) in [(1u32, 0.0), (2, 10.0), (3, 20.0)] {
///     tracker.add_pile(Pile::new(1.0 + pos as f64 / 100.0, pos, northing, 0.0, 10.0, 0.0)?);
/// }
/// project.add_tracker(tracker)?;
///
/// let report = grade_project(&mut project, &GradingOptions::default())?;
/// println!("graded={} violations={}", report.graded_piles, report.violation_count);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        grade_project, grade_tracker, Constraints, GradingOptions, Pile, Project, ProjectKind,
        Tracker, TrackerKind,
    };
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    // Stage runners.
    pub use crate::grading::{
        apply_final_grading, correct_deflection, find_optimal_intercept, find_optimal_line_2d,
        measure_deflection, pull_towards_window, target_height_line, tracker_windows,
        uniform_shift,
    };

    // Structured stage reports.
    pub use crate::diagnostics::{
        FallbackStage, LineSearchStage, PileOutcome, SearchMode, StageTiming, TargetLineStage,
        TerrainStage, TimingBreakdown,
    };
}
