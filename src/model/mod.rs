//! Site data model: piles, trackers, their tube segments, and the project
//! that owns them together with the shared grading constraints.
//!
//! Piles are created from survey rows and validated on construction. A
//! [`Tracker`] owns its piles in `pile_in_tracker` order and derives
//! [`Segment`]s on demand; segments never outlive a height change.

pub mod constraints;
pub mod pile;
pub mod project;
pub mod segment;
pub mod tracker;

pub use constraints::{Constraints, DeflectionLimits};
pub use pile::{Pile, PileInput, TerrainBreak};
pub use project::{Project, ProjectInput, ProjectKind};
pub use segment::Segment;
pub use tracker::{Tracker, TrackerKind, WingDeflection};
