//! R-tree index over tract centers and per-visit overlap resolution.

use rstar::{AABB, RTree, RTreeObject};
use tractmap_skymap_models::{SkyCoord, Tract, TractId};

use crate::sphere::SpherePoint;
use crate::window::{RaWindow, SearchWindow};

/// A tract center stored in the R-tree with its precomputed unit vector.
#[derive(Debug, Clone)]
struct TractEntry {
    id: TractId,
    center: SkyCoord,
    point: SpherePoint,
}

impl RTreeObject for TractEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.center.ra_deg(), self.center.dec_deg()])
    }
}

/// Result of resolving a single visit against the tract index.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitOverlap {
    /// Tracts within the search radius, ascending by id. May be empty.
    pub overlaps: Vec<TractId>,
    /// Globally nearest tract, inside the radius or not.
    pub closest_tract: TractId,
    /// Separation to the nearest tract in degrees.
    pub closest_sep_deg: f64,
}

/// Error returned when building an index from an empty tract sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTractSetError;

impl std::fmt::Display for EmptyTractSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot build a tract index from an empty tract set")
    }
}

impl std::error::Error for EmptyTractSetError {}

/// R-tree index over the tract table.
///
/// Built once per run and shared read-only across workers. Non-empty by
/// construction, so resolution always yields a closest tract.
#[derive(Debug)]
pub struct TractIndex {
    tree: RTree<TractEntry>,
}

impl TractIndex {
    /// Builds the index from the tract table.
    ///
    /// # Errors
    ///
    /// Returns an error if `tracts` is empty; every resolution must be able
    /// to name a closest tract.
    pub fn build(tracts: &[Tract]) -> Result<Self, EmptyTractSetError> {
        if tracts.is_empty() {
            return Err(EmptyTractSetError);
        }
        let entries: Vec<TractEntry> = tracts
            .iter()
            .map(|tract| TractEntry {
                id: tract.id,
                center: tract.center,
                point: SpherePoint::from_coord(tract.center),
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Built tract index over {} tract centers", tree.size());
        Ok(Self { tree })
    }

    /// Number of tracts in the index.
    #[must_use]
    pub fn tract_count(&self) -> usize {
        self.tree.size()
    }

    /// Tract ids whose stored centers fall inside the search window around
    /// `center` at `radius_deg`, ascending.
    ///
    /// Superset contract: every tract within `radius_deg` exact separation
    /// of `center` appears here; the exact test prunes the rest.
    #[must_use]
    pub fn candidate_ids(&self, center: SkyCoord, radius_deg: f64) -> Vec<TractId> {
        let window = SearchWindow::around(center, radius_deg);
        let mut ids = Vec::new();
        for envelope in window_envelopes(&window) {
            for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
                ids.push(entry.id);
            }
        }
        ids.sort_unstable();
        ids
    }

    /// Resolves one visit: overlap membership and the nearest tract.
    ///
    /// Candidates come from the window prefilter and get the exact
    /// separation test. When no candidate survives the radius the whole
    /// table is rescanned, so the nearest assignment is the global minimum
    /// rather than the window minimum. Ties resolve to the lower tract id.
    #[must_use]
    pub fn resolve_visit(&self, center: SkyCoord, max_sep_deg: f64) -> VisitOverlap {
        let point = SpherePoint::from_coord(center);
        let window = SearchWindow::around(center, max_sep_deg);

        let mut overlaps = Vec::new();
        let mut best = (f64::INFINITY, TractId::MAX);
        for envelope in window_envelopes(&window) {
            for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
                let sep = point.separation_deg(&entry.point);
                if (sep, entry.id) < best {
                    best = (sep, entry.id);
                }
                if sep <= max_sep_deg {
                    overlaps.push(entry.id);
                }
            }
        }

        if overlaps.is_empty() {
            best = self.nearest_anywhere(&point);
        }
        overlaps.sort_unstable();

        VisitOverlap {
            overlaps,
            closest_tract: best.1,
            closest_sep_deg: best.0,
        }
    }

    /// Linear scan over every tract, for visits outside every candidate
    /// window or outside every tract's radius.
    fn nearest_anywhere(&self, point: &SpherePoint) -> (f64, TractId) {
        let mut best = (f64::INFINITY, TractId::MAX);
        for entry in self.tree.iter() {
            let sep = point.separation_deg(&entry.point);
            if (sep, entry.id) < best {
                best = (sep, entry.id);
            }
        }
        best
    }
}

/// Envelope queries covering the window: one per contiguous ra range.
fn window_envelopes(window: &SearchWindow) -> Vec<AABB<[f64; 2]>> {
    let (dec_min, dec_max) = (window.dec_min(), window.dec_max());
    match window.ra() {
        RaWindow::Full => vec![AABB::from_corners([0.0, dec_min], [360.0, dec_max])],
        RaWindow::Single { lo, hi } => {
            vec![AABB::from_corners([lo, dec_min], [hi, dec_max])]
        }
        RaWindow::Split { low, high } => vec![
            AABB::from_corners([low.0, dec_min], [low.1, dec_max]),
            AABB::from_corners([high.0, dec_min], [high.1, dec_max]),
        ],
    }
}
