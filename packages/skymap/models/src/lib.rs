#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core data types for the tractmap toolchain.
//!
//! A *tract* is a fixed region of the sky tessellation, reduced here to its
//! center coordinate. A *visit* is a single telescope pointing. The overlap
//! build relates the two, so every crate in the workspace shares these types.

mod band;

pub use band::Band;

use serde::Serialize;

/// Identifier of a tract in the sky tessellation.
pub type TractId = i64;

/// Identifier of a visit (a single pointing/exposure).
pub type VisitId = i64;

/// Mapping from visit id to the globally nearest tract id, one entry per
/// visit processed by an overlap build.
pub type ClosestTractMap = std::collections::BTreeMap<VisitId, TractId>;

/// A point on the celestial sphere in equatorial coordinates, degrees.
///
/// Construction validates both components, so a `SkyCoord` held anywhere in
/// the system is known to be in range: right ascension in `[0, 360)`,
/// declination in `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkyCoord {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyCoord {
    /// Creates a coordinate from right ascension and declination in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if `ra_deg` is outside `[0, 360)` or `dec_deg` is
    /// outside `[-90, 90]`. Non-finite values fail the same range checks.
    pub fn new(ra_deg: f64, dec_deg: f64) -> Result<Self, CoordError> {
        if !(0.0..360.0).contains(&ra_deg) {
            return Err(CoordError {
                component: "ra",
                value: ra_deg,
            });
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(CoordError {
                component: "dec",
                value: dec_deg,
            });
        }
        Ok(Self { ra_deg, dec_deg })
    }

    /// Right ascension in degrees, in `[0, 360)`.
    #[must_use]
    pub const fn ra_deg(self) -> f64 {
        self.ra_deg
    }

    /// Declination in degrees, in `[-90, 90]`.
    #[must_use]
    pub const fn dec_deg(self) -> f64 {
        self.dec_deg
    }
}

/// Error returned when a coordinate component is outside its valid range.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordError {
    /// Which component was invalid (`"ra"` or `"dec"`).
    pub component: &'static str,
    /// The offending value.
    pub value: f64,
}

impl std::fmt::Display for CoordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} out of range: {} (ra must be in [0, 360), dec in [-90, 90])",
            self.component, self.value
        )
    }
}

impl std::error::Error for CoordError {}

/// A tract of the sky tessellation, reduced to its center coordinate.
///
/// The tract table is fixed input data for a survey run; it is loaded once
/// and never mutated by the overlap computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tract {
    /// Tessellation-assigned tract id.
    pub id: TractId,
    /// Tract center.
    pub center: SkyCoord,
}

/// A single telescope pointing, as stored in the visit table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Visit {
    /// Exposure identifier from the observation database.
    pub id: VisitId,
    /// Pointing center.
    pub center: SkyCoord,
    /// Filter the exposure was taken in.
    pub band: Band,
    /// Observing-program identifier, when the export carries one.
    pub survey_id: Option<i64>,
    /// Observation epoch as a Modified Julian Date.
    pub mjd: Option<f64>,
    /// Nearest tract assigned by a completed overlap build, `None` before.
    pub nearest_tract: Option<TractId>,
}

/// One (tract, visit) overlap row.
///
/// `id` is a dense sequential surrogate key assigned in visit-then-tract
/// order; `(tract, visit)` pairs are unique across a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapRecord {
    /// Surrogate key, `0..N-1` over the whole build output.
    pub id: i64,
    /// Overlapping tract.
    pub tract: TractId,
    /// Overlapping visit.
    pub visit: VisitId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_accepts_full_valid_ranges() {
        assert!(SkyCoord::new(0.0, 0.0).is_ok());
        assert!(SkyCoord::new(359.999, 45.0).is_ok());
        assert!(SkyCoord::new(180.0, 90.0).is_ok());
        assert!(SkyCoord::new(180.0, -90.0).is_ok());
    }

    #[test]
    fn coord_rejects_out_of_range() {
        assert!(SkyCoord::new(360.0, 0.0).is_err());
        assert!(SkyCoord::new(-0.001, 0.0).is_err());
        assert!(SkyCoord::new(0.0, 90.001).is_err());
        assert!(SkyCoord::new(0.0, -90.001).is_err());
    }

    #[test]
    fn coord_rejects_non_finite() {
        assert!(SkyCoord::new(f64::NAN, 0.0).is_err());
        assert!(SkyCoord::new(0.0, f64::NAN).is_err());
        assert!(SkyCoord::new(f64::INFINITY, 0.0).is_err());
        assert!(SkyCoord::new(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn coord_error_names_component() {
        let err = SkyCoord::new(400.0, 0.0).unwrap_err();
        assert_eq!(err.component, "ra");
        let err = SkyCoord::new(0.0, -91.0).unwrap_err();
        assert_eq!(err.component, "dec");
    }
}
