#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the survey `DuckDB` file.
//!
//! Resolution order for the database location: an explicit path from the
//! caller, the `TRACTMAP_DB` environment variable, then
//! `data/tractmap.duckdb` under the project root.

use std::path::{Path, PathBuf};

/// Environment variable overriding the default database location.
pub const DB_ENV_VAR: &str = "TRACTMAP_DB";

/// Workspace root, two levels above this crate's compile-time manifest
/// directory.
///
/// # Panics
///
/// Panics if the manifest path has fewer than two ancestors, which a
/// checked-out workspace never does.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root lies two levels above the crate manifest")
        .to_path_buf()
}

/// The `data/` directory holding survey database files.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default path for the survey `DuckDB` file.
#[must_use]
pub fn survey_db_path() -> PathBuf {
    data_dir().join("tractmap.duckdb")
}

/// Resolves the database path from an explicit flag, the environment, or
/// the default location, in that order.
#[must_use]
pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(DB_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(survey_db_path)
}

/// Creates `path` and any missing parents; an existing directory is fine.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/explicit.duckdb");
        assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
    }

    #[test]
    fn default_path_lands_in_data_dir() {
        let path = survey_db_path();
        assert!(path.ends_with("data/tractmap.duckdb"));
    }
}
