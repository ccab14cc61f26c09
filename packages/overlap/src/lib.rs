#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Overlap table construction.
//!
//! Drives the tract index over the visit table, serially or across
//! partitioned workers, and produces the overlap records plus the
//! closest-tract mapping that persistence writes out. Per-visit resolution
//! is read-only over the tract index, so the parallel path shares the index
//! across workers without locking and merges results after the join barrier.

mod build;
mod partition;
pub mod progress;

pub use build::{build_overlap_table, build_overlap_table_parallel};
pub use partition::partition_ranges;

use tractmap_skymap_models::{ClosestTractMap, OverlapRecord};

/// Default maximum search radius in degrees: the tract radius plus the
/// field-of-view radius of a single pointing.
pub const DEFAULT_MAX_SEP_DEG: f64 = 3.15;

/// Options for an overlap build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum angular separation in degrees for a (tract, visit) pair to
    /// count as overlapping.
    pub max_sep_deg: f64,
    /// Number of contiguous visit partitions for the parallel build.
    pub partitions: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_sep_deg: DEFAULT_MAX_SEP_DEG,
            partitions: default_partitions(),
        }
    }
}

impl BuildOptions {
    /// Validates the options before any visit is processed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_sep_deg` is non-positive or
    /// non-finite, or if `partitions` is zero.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.max_sep_deg.is_finite() || self.max_sep_deg <= 0.0 {
            return Err(BuildError::Config {
                message: format!(
                    "max_sep_deg must be positive and finite, got {}",
                    self.max_sep_deg
                ),
            });
        }
        if self.partitions == 0 {
            return Err(BuildError::Config {
                message: "partitions must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// One partition per available core, falling back to a single partition.
fn default_partitions() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Output of an overlap build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverlapTable {
    /// Overlap rows with dense sequential ids in visit-then-tract order.
    pub records: Vec<OverlapRecord>,
    /// Nearest tract per visit, one entry per processed visit.
    pub closest: ClosestTractMap,
}

/// Errors from overlap table construction.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Invalid build options, rejected before any visit is processed.
    #[error("Configuration error: {message}")]
    Config {
        /// Details of the rejected configuration.
        message: String,
    },

    /// A parallel worker panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
