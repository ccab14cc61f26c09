#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI entry point for the tractmap toolchain.
//!
//! Loads tract and visit exports into the survey database, runs the
//! overlap build, and answers queries against the stored overlap table.
//!
//! Logging goes through [`tractmap_cli_utils::init_logger`], which routes
//! `log` output around the active progress bars.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tractmap_cli_utils::{MultiProgress, TerminalProgress};
use tractmap_database::{paths, survey_db};
use tractmap_ingest::CoordUnit;
use tractmap_overlap::progress::ProgressCallback;
use tractmap_overlap::{BuildOptions, DEFAULT_MAX_SEP_DEG, build_overlap_table_parallel};
use tractmap_skymap::TractIndex;

#[derive(Parser)]
#[command(name = "tractmap", about = "Visit-tract overlap toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a tract-center CSV export into the survey database
    Tracts {
        /// Path to the CSV export
        file: PathBuf,
        /// Database file (default: `TRACTMAP_DB` or data/tractmap.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Coordinate columns are radians instead of degrees
        #[arg(long)]
        radians: bool,
    },
    /// Load a visit (pointing) CSV export into the survey database
    Visits {
        /// Path to the CSV export
        file: PathBuf,
        /// Database file (default: `TRACTMAP_DB` or data/tractmap.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Coordinate columns are radians instead of degrees (`OpSim` exports)
        #[arg(long)]
        radians: bool,
        /// Maximum number of rows to load (for trial runs)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Compute the overlap table and nearest-tract assignments
    Build {
        /// Database file (default: `TRACTMAP_DB` or data/tractmap.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Maximum separation in degrees for a visit to count as overlapping
        /// a tract (tract radius + field-of-view radius)
        #[arg(long, default_value_t = DEFAULT_MAX_SEP_DEG)]
        max_sep: f64,
        /// Number of parallel partitions (default: available cores)
        #[arg(long)]
        partitions: Option<usize>,
        /// Replace an existing overlap table instead of refusing to run
        #[arg(long)]
        force: bool,
    },
    /// List the visit ids overlapping a tract
    FindVisits {
        /// Tract id to query
        tract: i64,
        /// Lowest visit id to include
        #[arg(long)]
        min_visit: Option<i64>,
        /// Highest visit id to include (e.g. a season's last visit)
        #[arg(long)]
        max_visit: Option<i64>,
        /// Database file (default: `TRACTMAP_DB` or data/tractmap.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Report row counts and nearest-tract coverage
    Status {
        /// Database file (default: `TRACTMAP_DB` or data/tractmap.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Emit machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = tractmap_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tracts { file, db, radians } => {
            let start = Instant::now();
            let conn = survey_db::open(&paths::resolve_db_path(db))?;
            let progress = TerminalProgress::spinner(&multi, "Reading tract export...");
            let count = tractmap_ingest::ingest_tracts(&conn, &file, coord_unit(radians))?;
            progress.finish(format!("Loaded {count} tracts"));
            log::info!(
                "Tract load complete: {count} tracts in {:.1}s",
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Visits {
            file,
            db,
            radians,
            limit,
        } => {
            let start = Instant::now();
            let conn = survey_db::open(&paths::resolve_db_path(db))?;
            let progress = TerminalProgress::spinner(&multi, "Reading visit export...");
            let count = tractmap_ingest::ingest_visits(&conn, &file, coord_unit(radians), limit)?;
            progress.finish(format!("Loaded {count} visits"));
            log::info!(
                "Visit load complete: {count} visits in {:.1}s",
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Build {
            db,
            max_sep,
            partitions,
            force,
        } => run_build(&multi, db, max_sep, partitions, force).await?,
        Commands::FindVisits {
            tract,
            min_visit,
            max_visit,
            db,
        } => {
            let conn = survey_db::open(&paths::resolve_db_path(db))?;
            let range = match (min_visit, max_visit) {
                (None, None) => None,
                (min, max) => Some((min.unwrap_or(i64::MIN), max.unwrap_or(i64::MAX))),
            };
            let visits = survey_db::overlapping_visits(&conn, tract, range)?;
            log::info!("{} visit(s) overlap tract {tract}", visits.len());
            for visit in &visits {
                println!("{visit}");
            }
        }
        Commands::Status { db, json } => {
            let path = paths::resolve_db_path(db);
            let conn = survey_db::open(&path)?;
            let counts = survey_db::survey_counts(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else {
                println!("database: {}", path.display());
                println!("{:<22} {}", "tracts", counts.tracts);
                println!("{:<22} {}", "visits", counts.visits);
                println!("{:<22} {}", "overlap rows", counts.overlaps);
                println!("{:<22} {}", "visits with nearest", counts.visits_with_nearest);
            }
        }
    }

    Ok(())
}

const fn coord_unit(radians: bool) -> CoordUnit {
    if radians {
        CoordUnit::Radians
    } else {
        CoordUnit::Degrees
    }
}

/// Loads the stored tables, resolves every visit, and writes the overlap
/// rows and nearest-tract assignments back.
async fn run_build(
    multi: &MultiProgress,
    db: Option<PathBuf>,
    max_sep: f64,
    partitions: Option<usize>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let path = paths::resolve_db_path(db);
    let conn = survey_db::open(&path)?;

    let tracts = survey_db::load_tracts(&conn)?;
    let visits = survey_db::load_visits(&conn)?;
    log::info!(
        "Loaded {} tracts and {} visits from {}",
        tracts.len(),
        visits.len(),
        path.display()
    );

    // The overlap sink is append-only, so a re-run over existing rows would
    // double them up. Refuse unless the caller explicitly clears.
    let existing = survey_db::overlap_count(&conn)?;
    if existing > 0 {
        if !force {
            return Err(format!(
                "overlap table already has {existing} rows; pass --force to replace it"
            )
            .into());
        }
        let cleared = survey_db::clear_overlaps(&conn)?;
        log::info!("Cleared {cleared} existing overlap rows (--force)");
    }

    let index = TractIndex::build(&tracts)?;
    let options = BuildOptions {
        max_sep_deg: max_sep,
        partitions: partitions.unwrap_or_else(|| BuildOptions::default().partitions),
    };
    log::info!(
        "Resolving overlaps: max_sep {} deg, {} partition(s)",
        options.max_sep_deg,
        options.partitions
    );

    let progress = TerminalProgress::counted(multi, "Resolving visit overlaps...");
    let table =
        build_overlap_table_parallel(Arc::new(visits), Arc::new(index), &options, progress).await?;

    survey_db::append_overlap_records(&conn, &table.records)?;
    survey_db::update_visit_nearest_tract(&conn, &table.closest)?;

    log::info!(
        "Overlap build complete: {} overlap rows across {} visits in {:.1}s",
        table.records.len(),
        table.closest.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
