//! Bounding windows on the (ra, dec) grid for candidate prefiltering.

use tractmap_skymap_models::SkyCoord;

/// Right-ascension extent of a search window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RaWindow {
    /// The window spans every right ascension. Produced when the search cap
    /// touches a pole or is too wide for a bounded range.
    Full,
    /// A single contiguous range, inclusive on both ends.
    Single {
        /// Lower bound in degrees.
        lo: f64,
        /// Upper bound in degrees.
        hi: f64,
    },
    /// Two ranges produced by splitting at the 0/360 seam: `low` hugs
    /// ra = 0, `high` hugs ra = 360.
    Split {
        /// `(lo, hi)` range starting at 0.
        low: (f64, f64),
        /// `(lo, hi)` range ending at 360.
        high: (f64, f64),
    },
}

/// Axis-aligned search window around a visit center.
///
/// The declination range is the search radius applied directly and clamped
/// to the valid range. The right-ascension half-width is the spherical-cap
/// extent evaluated at the declination edge nearest a pole, where meridians
/// converge hardest, so the window always covers the exact cap. That keeps
/// the prefilter a strict superset of the exact separation test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWindow {
    dec_min: f64,
    dec_max: f64,
    ra: RaWindow,
}

impl SearchWindow {
    /// Builds the window for a cap of `radius_deg` around `center`.
    #[must_use]
    pub fn around(center: SkyCoord, radius_deg: f64) -> Self {
        let dec_min = (center.dec_deg() - radius_deg).max(-90.0);
        let dec_max = (center.dec_deg() + radius_deg).min(90.0);
        let ra = ra_window(center.ra_deg(), dec_min, dec_max, radius_deg);
        Self {
            dec_min,
            dec_max,
            ra,
        }
    }

    /// Lower declination bound in degrees.
    #[must_use]
    pub const fn dec_min(&self) -> f64 {
        self.dec_min
    }

    /// Upper declination bound in degrees.
    #[must_use]
    pub const fn dec_max(&self) -> f64 {
        self.dec_max
    }

    /// Right-ascension extent.
    #[must_use]
    pub const fn ra(&self) -> RaWindow {
        self.ra
    }

    /// Whether a coordinate falls inside the window.
    #[must_use]
    pub fn contains(&self, coord: SkyCoord) -> bool {
        if !(self.dec_min..=self.dec_max).contains(&coord.dec_deg()) {
            return false;
        }
        let ra = coord.ra_deg();
        match self.ra {
            RaWindow::Full => true,
            RaWindow::Single { lo, hi } => (lo..=hi).contains(&ra),
            RaWindow::Split { low, high } => {
                (low.0..=low.1).contains(&ra) || (high.0..=high.1).contains(&ra)
            }
        }
    }
}

/// Right-ascension half-width of a cap of `radius_deg`, widened to the
/// declination window edge and split at the 0/360 seam when needed.
fn ra_window(ra0: f64, dec_min: f64, dec_max: f64, radius_deg: f64) -> RaWindow {
    if radius_deg >= 90.0 {
        return RaWindow::Full;
    }

    // cos(dec_edge) bounds how far the cap extends in ra anywhere inside the
    // declination window; at the poles it reaches zero and every ra matches.
    let dec_edge = dec_min.abs().max(dec_max.abs());
    let sin_r = radius_deg.to_radians().sin();
    let cos_edge = dec_edge.to_radians().cos();
    if sin_r >= cos_edge {
        return RaWindow::Full;
    }

    let half_width = (sin_r / cos_edge).asin().to_degrees();
    let lo = ra0 - half_width;
    let hi = ra0 + half_width;
    if lo < 0.0 {
        RaWindow::Split {
            low: (0.0, hi),
            high: (lo + 360.0, 360.0),
        }
    } else if hi > 360.0 {
        RaWindow::Split {
            low: (0.0, hi - 360.0),
            high: (lo, 360.0),
        }
    } else {
        RaWindow::Single { lo, hi }
    }
}
