//! Unit-vector representation of points on the celestial sphere.

use tractmap_skymap_models::SkyCoord;

/// A point on the celestial sphere as a Cartesian unit vector.
///
/// The Cartesian form makes great-circle separation a dot product, which
/// stays well behaved at the poles and across the ra = 0/360 seam where
/// difference-of-angles formulas lose precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpherePoint {
    x: f64,
    y: f64,
    z: f64,
}

impl SpherePoint {
    /// Converts an equatorial coordinate to its unit vector.
    #[must_use]
    pub fn from_coord(coord: SkyCoord) -> Self {
        let ra = coord.ra_deg().to_radians();
        let dec = coord.dec_deg().to_radians();
        Self {
            x: dec.cos() * ra.cos(),
            y: dec.cos() * ra.sin(),
            z: dec.sin(),
        }
    }

    /// Great-circle separation to `other` in degrees, in `[0, 180]`.
    ///
    /// The dot product is clamped to `[-1, 1]` before the arccosine so
    /// rounding can never produce NaN for coincident or antipodal points.
    #[must_use]
    pub fn separation_deg(&self, other: &Self) -> f64 {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z;
        dot.clamp(-1.0, 1.0).acos().to_degrees()
    }
}

impl From<SkyCoord> for SpherePoint {
    fn from(coord: SkyCoord) -> Self {
        Self::from_coord(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn point(ra_deg: f64, dec_deg: f64) -> SpherePoint {
        SpherePoint::from_coord(SkyCoord::new(ra_deg, dec_deg).unwrap())
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn coincident_points_have_zero_separation() {
        assert_close(point(123.4, 56.7).separation_deg(&point(123.4, 56.7)), 0.0, EPS);
    }

    #[test]
    fn poles_are_antipodal() {
        assert_close(point(0.0, 90.0).separation_deg(&point(0.0, -90.0)), 180.0, EPS);
    }

    #[test]
    fn pole_to_equator_is_quarter_circle() {
        assert_close(point(215.0, 90.0).separation_deg(&point(12.0, 0.0)), 90.0, EPS);
    }

    #[test]
    fn equatorial_separation_equals_ra_difference() {
        assert_close(point(40.0, 0.0).separation_deg(&point(55.0, 0.0)), 15.0, EPS);
    }

    #[test]
    fn separation_crosses_the_ra_seam() {
        assert_close(point(350.0, 0.0).separation_deg(&point(10.0, 0.0)), 20.0, EPS);
    }

    #[test]
    fn separation_is_symmetric() {
        let a = point(33.0, 21.0);
        let b = point(290.0, -68.0);
        assert_close(a.separation_deg(&b), b.separation_deg(&a), EPS);
    }

    #[test]
    fn small_angles_keep_reasonable_precision() {
        // acos amplifies rounding near 1, so the tolerance is looser here.
        assert_close(point(10.0, 0.0).separation_deg(&point(10.001, 0.0)), 0.001, 1e-5);
    }
}
