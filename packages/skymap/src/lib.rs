#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Spherical geometry and candidate filtering for visit-tract overlap.
//!
//! The tract table is indexed once in an R-tree over (ra, dec) centers. For
//! each visit a bounding window prefilters candidates, the exact great-circle
//! separation decides overlap membership and the nearest tract, and a full
//! rescan backs up visits that land outside every tract's radius.

mod index;
mod sphere;
mod window;

pub use index::{EmptyTractSetError, TractIndex, VisitOverlap};
pub use sphere::SpherePoint;
pub use window::{RaWindow, SearchWindow};
