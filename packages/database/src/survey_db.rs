//! Storage for tracts, visits, and the overlap table.
//!
//! All multi-row writes run inside a single transaction and roll back on
//! the first error, so a failed write never leaves partial state behind.

use std::path::Path;

use duckdb::{Connection, params};
use serde::Serialize;
use tractmap_skymap_models::{
    Band, ClosestTractMap, OverlapRecord, SkyCoord, Tract, TractId, Visit, VisitId,
};

use crate::DbError;

/// Opens (creating if necessary) the survey database at `path`.
///
/// The parent directory is created when missing and the schema is applied
/// on every open.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    log::debug!("Opened survey database at {}", path.display());
    Ok(conn)
}

/// Opens an in-memory survey database with the schema applied.
///
/// # Errors
///
/// Returns an error if the connection cannot be created.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

// "dec" is quoted throughout: DEC is a reserved type keyword in DuckDB.
fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tracts (
            id BIGINT PRIMARY KEY,
            ra DOUBLE NOT NULL,
            \"dec\" DOUBLE NOT NULL
        );
        CREATE TABLE IF NOT EXISTS visits (
            id BIGINT PRIMARY KEY,
            ra DOUBLE NOT NULL,
            \"dec\" DOUBLE NOT NULL,
            band TEXT NOT NULL,
            nearest_tract BIGINT NOT NULL DEFAULT 0,
            survey_id BIGINT,
            mjd DOUBLE
        );
        CREATE TABLE IF NOT EXISTS overlaps (
            id BIGINT PRIMARY KEY,
            tract BIGINT NOT NULL,
            visit BIGINT NOT NULL
        );",
    )?;
    Ok(())
}

/// Inserts or replaces tract definitions.
///
/// # Errors
///
/// Returns an error if the transaction fails. Nothing is written on error.
pub fn insert_tracts(conn: &Connection, tracts: &[Tract]) -> Result<usize, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    if let Err(err) = insert_tracts_inner(conn, tracts) {
        let _ = conn.execute_batch("ROLLBACK");
        return Err(err);
    }
    conn.execute_batch("COMMIT")?;
    Ok(tracts.len())
}

fn insert_tracts_inner(conn: &Connection, tracts: &[Tract]) -> Result<(), DbError> {
    let mut stmt =
        conn.prepare("INSERT OR REPLACE INTO tracts (id, ra, \"dec\") VALUES (?, ?, ?)")?;
    for tract in tracts {
        stmt.execute(params![
            tract.id,
            tract.center.ra_deg(),
            tract.center.dec_deg()
        ])?;
    }
    Ok(())
}

/// Inserts or replaces visits. A missing closest tract is stored as the
/// sentinel id `0`.
///
/// # Errors
///
/// Returns an error if the transaction fails. Nothing is written on error.
pub fn insert_visits(conn: &Connection, visits: &[Visit]) -> Result<usize, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    if let Err(err) = insert_visits_inner(conn, visits) {
        let _ = conn.execute_batch("ROLLBACK");
        return Err(err);
    }
    conn.execute_batch("COMMIT")?;
    Ok(visits.len())
}

fn insert_visits_inner(conn: &Connection, visits: &[Visit]) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO visits
            (id, ra, \"dec\", band, nearest_tract, survey_id, mjd)
            VALUES (?, ?, ?, ?, ?, ?, ?)",
    )?;
    for visit in visits {
        let band: &str = visit.band.as_ref();
        stmt.execute(params![
            visit.id,
            visit.center.ra_deg(),
            visit.center.dec_deg(),
            band,
            visit.nearest_tract.unwrap_or(0),
            visit.survey_id,
            visit.mjd,
        ])?;
    }
    Ok(())
}

/// Loads every tract, ordered by id.
///
/// # Errors
///
/// Returns an error if a stored coordinate is out of range.
pub fn load_tracts(conn: &Connection) -> Result<Vec<Tract>, DbError> {
    let mut stmt = conn.prepare("SELECT id, ra, \"dec\" FROM tracts ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut tracts = Vec::new();
    while let Some(row) = rows.next()? {
        let id: TractId = row.get(0)?;
        let ra: f64 = row.get(1)?;
        let dec: f64 = row.get(2)?;
        let center = SkyCoord::new(ra, dec).map_err(|err| DbError::Data {
            message: format!("tract {id}: {err}"),
        })?;
        tracts.push(Tract { id, center });
    }
    Ok(tracts)
}

/// Loads every visit, ordered by id. The stored sentinel `0` maps back to
/// no closest tract.
///
/// # Errors
///
/// Returns an error if a stored coordinate or band is invalid.
pub fn load_visits(conn: &Connection) -> Result<Vec<Visit>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, ra, \"dec\", band, nearest_tract, survey_id, mjd
            FROM visits ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut visits = Vec::new();
    while let Some(row) = rows.next()? {
        let id: VisitId = row.get(0)?;
        let ra: f64 = row.get(1)?;
        let dec: f64 = row.get(2)?;
        let band_text: String = row.get(3)?;
        let nearest: TractId = row.get(4)?;
        let survey_id: Option<i64> = row.get(5)?;
        let mjd: Option<f64> = row.get(6)?;
        let center = SkyCoord::new(ra, dec).map_err(|err| DbError::Data {
            message: format!("visit {id}: {err}"),
        })?;
        let band = band_text.parse::<Band>().map_err(|_| DbError::Data {
            message: format!("visit {id}: unknown band {band_text:?}"),
        })?;
        visits.push(Visit {
            id,
            center,
            band,
            survey_id,
            mjd,
            nearest_tract: (nearest != 0).then_some(nearest),
        });
    }
    Ok(visits)
}

/// Appends overlap rows.
///
/// # Errors
///
/// Returns an error if the transaction fails. Nothing is written on error.
pub fn append_overlap_records(
    conn: &Connection,
    records: &[OverlapRecord],
) -> Result<usize, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    if let Err(err) = append_overlaps_inner(conn, records) {
        let _ = conn.execute_batch("ROLLBACK");
        return Err(err);
    }
    conn.execute_batch("COMMIT")?;
    Ok(records.len())
}

fn append_overlaps_inner(conn: &Connection, records: &[OverlapRecord]) -> Result<(), DbError> {
    let mut stmt = conn.prepare("INSERT INTO overlaps (id, tract, visit) VALUES (?, ?, ?)")?;
    for record in records {
        stmt.execute(params![record.id, record.tract, record.visit])?;
    }
    Ok(())
}

/// Deletes every overlap row, returning how many were removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn clear_overlaps(conn: &Connection) -> Result<i64, DbError> {
    let count = overlap_count(conn)?;
    conn.execute("DELETE FROM overlaps", [])?;
    Ok(count)
}

/// Returns the number of stored overlap rows.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn overlap_count(conn: &Connection) -> Result<i64, DbError> {
    let count = conn.query_row("SELECT COUNT(*) FROM overlaps", [], |row| row.get(0))?;
    Ok(count)
}

/// Writes the closest-tract assignment for each visit in `closest`.
///
/// Every visit id must already be present; an unknown id aborts the
/// transaction and no assignment is kept.
///
/// # Errors
///
/// Returns an error if a visit id is unknown or the transaction fails.
pub fn update_visit_nearest_tract(
    conn: &Connection,
    closest: &ClosestTractMap,
) -> Result<usize, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    if let Err(err) = update_nearest_inner(conn, closest) {
        let _ = conn.execute_batch("ROLLBACK");
        return Err(err);
    }
    conn.execute_batch("COMMIT")?;
    Ok(closest.len())
}

fn update_nearest_inner(conn: &Connection, closest: &ClosestTractMap) -> Result<(), DbError> {
    let mut stmt = conn.prepare("UPDATE visits SET nearest_tract = ? WHERE id = ?")?;
    for (&visit, &tract) in closest {
        let rows = stmt.execute(params![tract, visit])?;
        if rows != 1 {
            return Err(DbError::Data {
                message: format!("visit {visit} not present for nearest-tract update"),
            });
        }
    }
    Ok(())
}

/// Returns the distinct visit ids overlapping `tract`, ordered ascending.
/// An optional inclusive id range narrows the result.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn overlapping_visits(
    conn: &Connection,
    tract: TractId,
    visit_range: Option<(VisitId, VisitId)>,
) -> Result<Vec<VisitId>, DbError> {
    let (min, max) = visit_range.unwrap_or((VisitId::MIN, VisitId::MAX));
    let mut stmt = conn.prepare(
        "SELECT DISTINCT visit FROM overlaps
            WHERE tract = ? AND visit >= ? AND visit <= ?
            ORDER BY visit",
    )?;
    let mut rows = stmt.query(params![tract, min, max])?;
    let mut visits = Vec::new();
    while let Some(row) = rows.next()? {
        visits.push(row.get(0)?);
    }
    Ok(visits)
}

/// Row counts summarizing the database contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurveyCounts {
    pub tracts: i64,
    pub visits: i64,
    pub overlaps: i64,
    pub visits_with_nearest: i64,
}

/// Counts the stored tracts, visits, overlap rows, and visits with a
/// closest-tract assignment.
///
/// # Errors
///
/// Returns an error if a count query fails.
pub fn survey_counts(conn: &Connection) -> Result<SurveyCounts, DbError> {
    let tracts = conn.query_row("SELECT COUNT(*) FROM tracts", [], |row| row.get(0))?;
    let visits = conn.query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?;
    let overlaps = overlap_count(conn)?;
    let visits_with_nearest = conn.query_row(
        "SELECT COUNT(*) FROM visits WHERE nearest_tract != 0",
        [],
        |row| row.get(0),
    )?;
    Ok(SurveyCounts {
        tracts,
        visits,
        overlaps,
        visits_with_nearest,
    })
}
