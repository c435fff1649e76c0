//! Serializable reports produced by the grading engine.
//!
//! [`TrackerReport`] records what every stage did to one tracker and the
//! final state of its piles. [`ProjectReport`] aggregates tracker reports
//! into site-wide cut/fill and violation totals.

pub mod project;
pub mod timing;
pub mod tracker;

pub use project::ProjectReport;
pub use timing::{StageTiming, TimingBreakdown};
pub use tracker::{
    FallbackStage, LineSearchStage, PileOutcome, SearchMode, TargetLineStage, TerrainStage,
    TrackerReport,
};
