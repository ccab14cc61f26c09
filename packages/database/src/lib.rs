#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB`-backed survey database.
//!
//! One database file holds the three tables of a survey run: `tracts` and
//! `visits` are populated by ingestion, `overlaps` and the visit table's
//! `nearest_tract` column by the overlap build. All writes are
//! transactional; a failed write leaves the tables as they were.

pub mod paths;
pub mod survey_db;

pub use duckdb::Connection;

/// Errors from survey database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database engine error.
    #[error("Database error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// I/O error creating the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row failed validation, or a write matched the wrong number
    /// of rows.
    #[error("Data error: {message}")]
    Data {
        /// Details of the offending row or write.
        message: String,
    },
}
