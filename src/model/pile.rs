use crate::error::{GradingError, Result};
use nalgebra::Vector2;
use serde::Deserialize;

/// One surveyed pile row as supplied by the import layer.
#[derive(Clone, Debug, Deserialize)]
pub struct PileInput {
    /// Identifier in the `tracker.pile` convention (e.g. `175.03`).
    pub pile_id: f64,
    /// 1-based position within the owning tracker.
    pub pile_in_tracker: u32,
    pub northing: f64,
    pub easting: f64,
    pub initial_elevation: f64,
    #[serde(default)]
    pub flooding_allowance: f64,
    /// Explicit tracker id; when absent the integer part of `pile_id` is used.
    #[serde(default)]
    pub tracker_id: Option<u32>,
}

impl PileInput {
    pub fn resolved_tracker_id(&self) -> u32 {
        self.tracker_id
            .unwrap_or_else(|| self.pile_id.max(0.0).floor() as u32)
    }
}

/// Terrain-following extension attached to a pile once its tracker is graded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TerrainBreak {
    /// Unsigned change in tube angle at this pile (degrees). Zero at anchors.
    pub final_degree_break: f64,
}

/// A pile supporting the torque tube.
///
/// `current_elevation` is the working ground level and only changes when
/// the final grading fallback cuts or fills. `height` is the working tube
/// attachment elevation mutated by the optimiser passes. The `final_*`,
/// `total_height` and `pile_revealed` fields are written once by
/// [`Pile::finalize`].
#[derive(Clone, Debug)]
pub struct Pile {
    pub pile_id: f64,
    pub pile_in_tracker: u32,
    pub northing: f64,
    pub easting: f64,
    pub initial_elevation: f64,
    pub flooding_allowance: f64,
    pub current_elevation: f64,
    pub height: f64,
    pub final_elevation: f64,
    pub total_height: f64,
    pub pile_revealed: f64,
    pub terrain: Option<TerrainBreak>,
}

impl Pile {
    /// Build a validated pile. Ground and tube height start at the surveyed
    /// elevation.
    pub fn new(
        pile_id: f64,
        pile_in_tracker: u32,
        northing: f64,
        easting: f64,
        initial_elevation: f64,
        flooding_allowance: f64,
    ) -> Result<Self> {
        let invalid = |reason: &str| GradingError::InvalidPile {
            pile_id,
            reason: reason.to_string(),
        };
        if !pile_id.is_finite() || pile_id < 0.0 {
            return Err(invalid("pile_id must be a non-negative number"));
        }
        if pile_in_tracker < 1 {
            return Err(invalid("pile_in_tracker must be >= 1"));
        }
        if !flooding_allowance.is_finite() || flooding_allowance < 0.0 {
            return Err(invalid("flooding_allowance must be non-negative"));
        }
        if !(northing.is_finite() && easting.is_finite() && initial_elevation.is_finite()) {
            return Err(invalid("coordinates and elevation must be finite"));
        }
        Ok(Self {
            pile_id,
            pile_in_tracker,
            northing,
            easting,
            initial_elevation,
            flooding_allowance,
            current_elevation: initial_elevation,
            height: initial_elevation,
            final_elevation: initial_elevation,
            total_height: initial_elevation,
            pile_revealed: 0.0,
            terrain: None,
        })
    }

    /// Plan position as `(northing, easting)`.
    #[inline]
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.northing, self.easting)
    }

    pub fn set_current_elevation(&mut self, elevation: f64) {
        self.current_elevation = elevation;
    }

    /// Freeze the working state into the reported outputs.
    pub fn finalize(&mut self) {
        self.final_elevation = self.current_elevation;
        self.total_height = self.height;
        self.pile_revealed = self.total_height - self.final_elevation;
    }

    /// Ground change applied by grading; positive when ground was raised.
    #[inline]
    pub fn cut_fill(&self) -> f64 {
        self.final_elevation - self.initial_elevation
    }

    #[inline]
    pub fn is_graded(&self) -> bool {
        self.cut_fill().abs() > 1e-12
    }
}

impl TryFrom<&PileInput> for Pile {
    type Error = GradingError;

    fn try_from(row: &PileInput) -> Result<Self> {
        Pile::new(
            row.pile_id,
            row.pile_in_tracker,
            row.northing,
            row.easting,
            row.initial_elevation,
            row.flooding_allowance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pile_starts_on_surveyed_ground() {
        let pile = Pile::new(1.01, 1, 100.0, 200.0, 10.0, 0.2).unwrap();
        assert_eq!(pile.current_elevation, 10.0);
        assert_eq!(pile.final_elevation, 10.0);
        assert_eq!(pile.height, 10.0);
        assert!(pile.terrain.is_none());
        assert_eq!(pile.position(), Vector2::new(100.0, 200.0));
    }

    #[test]
    fn rejects_invalid_fields() {
        assert!(matches!(
            Pile::new(-1.0, 1, 0.0, 0.0, 10.0, 0.0),
            Err(GradingError::InvalidPile { .. })
        ));
        assert!(matches!(
            Pile::new(1.0, 0, 0.0, 0.0, 10.0, 0.0),
            Err(GradingError::InvalidPile { .. })
        ));
        assert!(matches!(
            Pile::new(1.0, 1, 0.0, 0.0, 10.0, -0.1),
            Err(GradingError::InvalidPile { .. })
        ));
        assert!(matches!(
            Pile::new(1.0, 1, f64::NAN, 0.0, 10.0, 0.0),
            Err(GradingError::InvalidPile { .. })
        ));
    }

    #[test]
    fn finalize_records_reveal() {
        let mut pile = Pile::new(3.02, 2, 0.0, 0.0, 10.0, 0.0).unwrap();
        pile.height = 11.5;
        pile.set_current_elevation(10.25);
        pile.finalize();
        assert_eq!(pile.final_elevation, 10.25);
        assert_eq!(pile.total_height, 11.5);
        assert!((pile.pile_revealed - 1.25).abs() < 1e-12);
        assert!((pile.cut_fill() - 0.25).abs() < 1e-12);
        assert!(pile.is_graded());
    }

    #[test]
    fn tracker_id_falls_back_to_integer_part() {
        let row = PileInput {
            pile_id: 175.03,
            pile_in_tracker: 3,
            northing: 0.0,
            easting: 0.0,
            initial_elevation: 1.0,
            flooding_allowance: 0.0,
            tracker_id: None,
        };
        assert_eq!(row.resolved_tracker_id(), 175);
        let explicit = PileInput {
            tracker_id: Some(9),
            ..row
        };
        assert_eq!(explicit.resolved_tracker_id(), 9);
    }
}
