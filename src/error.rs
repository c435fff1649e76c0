//! Error type shared by the model constructors and the grading engine.
//!
//! Only structural problems are errors. An optimiser pass that finds no
//! feasible candidate is an expected outcome and is reported through
//! [`crate::grading::Feasibility`] instead.

/// Reasons why a project cannot be built or graded.
#[derive(Clone, Debug, PartialEq)]
pub enum GradingError {
    InvalidPile {
        pile_id: f64,
        reason: String,
    },
    InvalidConstraints {
        reason: String,
    },
    DegenerateGeometry {
        tracker_id: u32,
        reason: String,
    },
    TrackerNotFound {
        tracker_id: u32,
    },
    PileNotFound {
        tracker_id: u32,
        pile_in_tracker: u32,
    },
    DuplicateTracker {
        tracker_id: u32,
    },
    UnsortedPiles {
        tracker_id: u32,
    },
    Config(String),
}

impl std::fmt::Display for GradingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradingError::InvalidPile { pile_id, reason } => {
                write!(f, "invalid pile {pile_id}: {reason}")
            }
            GradingError::InvalidConstraints { reason } => {
                write!(f, "invalid constraints: {reason}")
            }
            GradingError::DegenerateGeometry { tracker_id, reason } => {
                write!(f, "degenerate geometry in tracker {tracker_id}: {reason}")
            }
            GradingError::TrackerNotFound { tracker_id } => {
                write!(f, "tracker {tracker_id} not found")
            }
            GradingError::PileNotFound {
                tracker_id,
                pile_in_tracker,
            } => write!(
                f,
                "pile {pile_in_tracker} not found in tracker {tracker_id}"
            ),
            GradingError::DuplicateTracker { tracker_id } => {
                write!(f, "tracker {tracker_id} already exists in project")
            }
            GradingError::UnsortedPiles { tracker_id } => write!(
                f,
                "piles of tracker {tracker_id} are not ordered by pile_in_tracker"
            ),
            GradingError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for GradingError {}

pub type Result<T> = std::result::Result<T, GradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_tracker() {
        let err = GradingError::DegenerateGeometry {
            tracker_id: 12,
            reason: "first and last piles share a northing".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tracker 12"), "unexpected message: {msg}");
        assert!(msg.contains("northing"));
    }
}
