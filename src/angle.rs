//! Angle utilities used by the segment geometry and the deflection corrector.
//!
//! Tube angles are measured in degrees in the vertical plane containing two
//! adjacent piles: `atan2(rise, run)`, positive when the tube climbs towards
//! the higher `pile_in_tracker`.

/// Wraps an angle in degrees into the range (-180, 180].
#[inline]
pub fn wrap_deg(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Smallest signed difference `a - b` in degrees.
#[inline]
pub fn angle_diff_deg(a: f64, b: f64) -> f64 {
    wrap_deg(a - b)
}

/// Tube angle in degrees for a given rise over a horizontal run.
#[inline]
pub fn tube_angle_deg(rise: f64, run: f64) -> f64 {
    rise.atan2(run).to_degrees()
}

/// Converts an angle in degrees into a rise/run ratio.
#[inline]
pub fn deg_to_slope(angle_deg: f64) -> f64 {
    angle_deg.to_radians().tan()
}

/// Unsigned angular change between an incoming and an outgoing tube angle.
#[inline]
pub fn degree_break(angle_in_deg: f64, angle_out_deg: f64) -> f64 {
    angle_diff_deg(angle_out_deg, angle_in_deg).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn wrap_deg_basic() {
        assert!(approx_eq(wrap_deg(0.0), 0.0));
        assert!(approx_eq(wrap_deg(190.0), -170.0));
        assert!(approx_eq(wrap_deg(-190.0), 170.0));
        assert!(approx_eq(wrap_deg(180.0), 180.0));
        assert!(approx_eq(wrap_deg(-180.0), 180.0));
        assert!(approx_eq(wrap_deg(720.5), 0.5));
    }

    #[test]
    fn angle_diff_is_antisymmetric() {
        let a = 3.25;
        let b = -1.5;
        assert!(approx_eq(angle_diff_deg(a, b), -angle_diff_deg(b, a)));
    }

    #[test]
    fn tube_angle_matches_slope() {
        assert!(approx_eq(tube_angle_deg(0.0, 10.0), 0.0));
        assert!(approx_eq(tube_angle_deg(10.0, 10.0), 45.0));
        assert!(approx_eq(deg_to_slope(45.0), 1.0));
        assert!(approx_eq(tube_angle_deg(-1.0, 1.0), -45.0));
    }

    #[test]
    fn degree_break_ignores_direction() {
        assert!(approx_eq(degree_break(1.0, -0.5), 1.5));
        assert!(approx_eq(degree_break(-0.5, 1.0), 1.5));
        assert!(approx_eq(degree_break(2.0, 2.0), 0.0));
    }
}
