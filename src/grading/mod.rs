//! Pile grading engine.
//!
//! Stages, per tracker
//! - Windows: allowed tube-height band per pile from ground and constraints.
//! - Target line: straight initial line anchored at the first pile's target.
//! - Line search: coarse-to-fine intercept search, plus a slope band for flat
//!   trackers, under the anchor constraint.
//! - Terrain passes (terrain-following only): window pull, uniform shift,
//!   bend-angle correction, uniform shift again.
//! - Fallback: cut/fill the ground under interior piles still out of window.
//!
//! Modules
//! - `window`: windows, violations and cost.
//! - `target_line`: initial line placement.
//! - `line_search`: 1D/2D line search and its options.
//! - `shift`: uniform vertical shift.
//! - `deflection`: bend-angle measurement, pull and corrector.
//! - `fallback`: final ground grading.
//! - `pipeline`: [`grade_tracker`] and the parallel [`grade_project`].
//!
//! Typical usage:
//! ```no_run
//! use tracker_grading::grading::{grade_project, GradingOptions};
//! use tracker_grading::model::Project;
//!
//! # fn example(json: &str) -> tracker_grading::Result<()> {
//! let mut project = Project::from_json_str(json)?;
//! let report = grade_project(&mut project, &GradingOptions::default())?;
//! println!("graded {} piles", report.graded_piles);
//! # Ok(())
//! # }
//! ```

pub mod deflection;
pub mod fallback;
pub mod line_search;
pub mod pipeline;
pub mod shift;
pub mod target_line;
pub mod window;

pub use deflection::{
    correct_deflection, measure_deflection, pull_towards_window, CentreSplit, CorrectionOutcome,
    DeflectionMeasurement, DeflectionOptions,
};
pub use fallback::{apply_final_grading, FallbackOutcome};
pub use line_search::{
    find_optimal_intercept, find_optimal_line_2d, intercept_span, slope_candidates, Feasibility,
    Line2DSearchResult, LineSearchOptions, LineSearchResult, SlopeSearchOptions,
};
pub use pipeline::{grade_project, grade_tracker};
pub use shift::{uniform_shift, ShiftResult};
pub use target_line::{apply_line, target_height_line, GradingLine};
pub use window::{
    anchors_within_window, check_within_window, pile_window, total_grading_cost, tracker_windows,
    Violation, Window,
};

use serde::Deserialize;

/// Tunables for a full grading run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GradingOptions {
    pub line_search: LineSearchOptions,
    pub slope_search: SlopeSearchOptions,
    pub deflection: DeflectionOptions,
    /// Absolute slack for window containment.
    pub window_eps: f64,
}

impl Default for GradingOptions {
    fn default() -> Self {
        Self {
            line_search: LineSearchOptions::default(),
            slope_search: SlopeSearchOptions::default(),
            deflection: DeflectionOptions::default(),
            window_eps: 1e-9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_options_fill_defaults() {
        let json = r#"{ "line_search": { "coarse_steps": 41 }, "deflection": { "centre_split": "full" } }"#;
        let opts: GradingOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.line_search.coarse_steps, 41);
        assert_eq!(opts.line_search.fine_steps, 121);
        assert_eq!(opts.slope_search.steps, 11);
        assert_eq!(opts.deflection.centre_split, CentreSplit::Full);
        assert_eq!(opts.deflection.max_iterations, 50);
        assert_eq!(opts.window_eps, 1e-9);
    }
}
