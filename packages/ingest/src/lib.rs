#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CSV ingestion for the survey database.
//!
//! Reads tract-center and visit exports, validates every row, and loads
//! the results through the database crate. A malformed row aborts the
//! whole file with its row number reported; per-row skip-and-continue is
//! deliberately not offered, since a partially loaded table would poison
//! every overlap build made from it.

pub mod records;

use std::io::Read;
use std::path::Path;

use tractmap_database::Connection;
use tractmap_skymap_models::{Band, CoordError, SkyCoord, Tract, Visit};

use crate::records::{RawTract, RawVisit};

/// Errors from reading or loading an export file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// CSV could not be opened or parsed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path to the export file.
        path: String,
        /// Parser error from the csv crate.
        source: csv::Error,
    },

    /// A parsed row failed validation.
    #[error("Invalid data in {path} row {row}: {message}")]
    Data {
        /// Path to the export file.
        path: String,
        /// 1-based data row number (the header row is not counted).
        row: u64,
        /// What was wrong with the row.
        message: String,
    },

    /// Database write failed.
    #[error(transparent)]
    Db(#[from] tractmap_database::DbError),
}

/// Angular unit of the coordinate columns in an export.
///
/// `OpSim` summary tables store pointings in radians; tract-center exports
/// are usually already in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordUnit {
    /// Coordinate columns are degrees.
    #[default]
    Degrees,
    /// Coordinate columns are radians, converted to degrees on read.
    Radians,
}

impl CoordUnit {
    fn angle_deg(self, value: f64) -> f64 {
        match self {
            Self::Degrees => value,
            Self::Radians => value.to_degrees(),
        }
    }
}

/// Reads a tract-center CSV export.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or any row is invalid.
pub fn load_tracts_csv(path: &Path, unit: CoordUnit) -> Result<Vec<Tract>, IngestError> {
    let label = path.display().to_string();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: label.clone(),
            source,
        })?;
    read_tracts(reader, &label, unit)
}

/// Reads a visit CSV export.
///
/// `limit` caps the number of data rows read, for trial runs against a
/// large observation export.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or any row is invalid.
pub fn load_visits_csv(
    path: &Path,
    unit: CoordUnit,
    limit: Option<usize>,
) -> Result<Vec<Visit>, IngestError> {
    let label = path.display().to_string();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: label.clone(),
            source,
        })?;
    read_visits(reader, &label, unit, limit)
}

/// Loads a tract export into the database.
///
/// # Errors
///
/// Returns an error if reading fails or the write fails; nothing is
/// written unless the entire file parses.
pub fn ingest_tracts(
    conn: &Connection,
    path: &Path,
    unit: CoordUnit,
) -> Result<usize, IngestError> {
    let tracts = load_tracts_csv(path, unit)?;
    let count = tractmap_database::survey_db::insert_tracts(conn, &tracts)?;
    log::info!("Ingested {count} tracts from {}", path.display());
    Ok(count)
}

/// Loads a visit export into the database.
///
/// # Errors
///
/// Returns an error if reading fails or the write fails; nothing is
/// written unless the entire file parses.
pub fn ingest_visits(
    conn: &Connection,
    path: &Path,
    unit: CoordUnit,
    limit: Option<usize>,
) -> Result<usize, IngestError> {
    let visits = load_visits_csv(path, unit, limit)?;
    let count = tractmap_database::survey_db::insert_visits(conn, &visits)?;
    log::info!("Ingested {count} visits from {}", path.display());
    Ok(count)
}

fn read_tracts<R: Read>(
    mut reader: csv::Reader<R>,
    path: &str,
    unit: CoordUnit,
) -> Result<Vec<Tract>, IngestError> {
    let mut tracts = Vec::new();
    let mut row: u64 = 0;
    for result in reader.deserialize::<RawTract>() {
        row += 1;
        let raw = result.map_err(|source| IngestError::Csv {
            path: path.to_string(),
            source,
        })?;
        tracts.push(convert_tract(raw, unit, path, row)?);
    }
    log::debug!("Read {} tracts from {path}", tracts.len());
    Ok(tracts)
}

fn read_visits<R: Read>(
    mut reader: csv::Reader<R>,
    path: &str,
    unit: CoordUnit,
    limit: Option<usize>,
) -> Result<Vec<Visit>, IngestError> {
    let mut visits = Vec::new();
    let mut row: u64 = 0;
    for result in reader.deserialize::<RawVisit>() {
        if let Some(max) = limit
            && visits.len() >= max
        {
            log::info!("Reached row limit ({max}), stopping visit read");
            break;
        }
        row += 1;
        let raw = result.map_err(|source| IngestError::Csv {
            path: path.to_string(),
            source,
        })?;
        visits.push(convert_visit(raw, unit, path, row)?);
    }
    log::debug!("Read {} visits from {path}", visits.len());
    Ok(visits)
}

fn convert_tract(
    raw: RawTract,
    unit: CoordUnit,
    path: &str,
    row: u64,
) -> Result<Tract, IngestError> {
    let center = convert_center(raw.ra, raw.dec, unit).map_err(|err| IngestError::Data {
        path: path.to_string(),
        row,
        message: format!("tract {}: {err}", raw.id),
    })?;
    Ok(Tract { id: raw.id, center })
}

fn convert_visit(
    raw: RawVisit,
    unit: CoordUnit,
    path: &str,
    row: u64,
) -> Result<Visit, IngestError> {
    let center = convert_center(raw.ra, raw.dec, unit).map_err(|err| IngestError::Data {
        path: path.to_string(),
        row,
        message: format!("visit {}: {err}", raw.id),
    })?;
    let band = raw.band.parse::<Band>().map_err(|_| IngestError::Data {
        path: path.to_string(),
        row,
        message: format!("visit {}: unknown band {:?}", raw.id, raw.band),
    })?;
    Ok(Visit {
        id: raw.id,
        center,
        band,
        survey_id: raw.survey_id,
        mjd: raw.mjd,
        nearest_tract: None,
    })
}

// Ra is normalized into [0, 360) after unit conversion; a radian export
// can legitimately carry negative or >2pi angles. Dec is never wrapped.
fn convert_center(ra: f64, dec: f64, unit: CoordUnit) -> Result<SkyCoord, CoordError> {
    SkyCoord::new(unit.angle_deg(ra).rem_euclid(360.0), unit.angle_deg(dec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn reads_plain_tract_export() {
        let data = "id,ra,dec\n3831,55.0,-29.5\n4024,57.5,-31.4\n";
        let tracts = read_tracts(reader(data), "tracts.csv", CoordUnit::Degrees).unwrap();

        assert_eq!(tracts.len(), 2);
        assert_eq!(tracts[0].id, 3831);
        assert!((tracts[0].center.ra_deg() - 55.0).abs() < 1e-12);
        assert!((tracts[0].center.dec_deg() + 29.5).abs() < 1e-12);
        assert_eq!(tracts[1].id, 4024);
    }

    #[test]
    fn accepts_opsim_column_aliases_in_radians() {
        let data = "obsHistID,descDitheredRA,descDitheredDec,filter,propID,expMJD\n\
                    185783,1.5707963267948966,-0.5235987755982988,r,54,60123.25\n";
        let visits = read_visits(reader(data), "visits.csv", CoordUnit::Radians, None).unwrap();

        assert_eq!(visits.len(), 1);
        let visit = &visits[0];
        assert_eq!(visit.id, 185_783);
        assert!((visit.center.ra_deg() - 90.0).abs() < 1e-9);
        assert!((visit.center.dec_deg() + 30.0).abs() < 1e-9);
        assert_eq!(visit.band, Band::R);
        assert_eq!(visit.survey_id, Some(54));
        assert_eq!(visit.mjd, Some(60_123.25));
        assert_eq!(visit.nearest_tract, None);
    }

    #[test]
    fn negative_radian_ra_wraps_into_range() {
        let data = "id,ra,dec,band\n1,-0.1,0.0,g\n";
        let visits = read_visits(reader(data), "visits.csv", CoordUnit::Radians, None).unwrap();

        let ra = visits[0].center.ra_deg();
        assert!((0.0..360.0).contains(&ra));
        assert!((ra - (360.0 - 0.1_f64.to_degrees())).abs() < 1e-9);
    }

    #[test]
    fn missing_optional_columns_default_to_none() {
        let data = "id,ra,dec,band\n7,10.0,5.0,z\n";
        let visits = read_visits(reader(data), "visits.csv", CoordUnit::Degrees, None).unwrap();

        assert_eq!(visits[0].survey_id, None);
        assert_eq!(visits[0].mjd, None);
    }

    #[test]
    fn unknown_band_aborts_with_row_number() {
        let data = "id,ra,dec,band\n1,10.0,5.0,r\n2,11.0,5.0,q\n3,12.0,5.0,g\n";
        let err = read_visits(reader(data), "visits.csv", CoordUnit::Degrees, None).unwrap_err();

        match err {
            IngestError::Data { row, message, .. } => {
                assert_eq!(row, 2);
                assert!(message.contains("unknown band"));
            }
            other => panic!("expected data error, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_dec_aborts() {
        let data = "id,ra,dec\n1,10.0,95.0\n";
        let err = read_tracts(reader(data), "tracts.csv", CoordUnit::Degrees).unwrap_err();
        assert!(matches!(err, IngestError::Data { row: 1, .. }));
    }

    #[test]
    fn unparsable_number_is_a_csv_error() {
        let data = "id,ra,dec\n1,abc,0.0\n";
        let err = read_tracts(reader(data), "tracts.csv", CoordUnit::Degrees).unwrap_err();
        assert!(matches!(err, IngestError::Csv { .. }));
    }

    #[test]
    fn limit_caps_visit_rows() {
        let data = "id,ra,dec,band\n1,10.0,0.0,u\n2,11.0,0.0,g\n3,12.0,0.0,r\n";
        let visits = read_visits(reader(data), "visits.csv", CoordUnit::Degrees, Some(2)).unwrap();

        assert_eq!(visits.len(), 2);
        assert_eq!(visits[1].id, 2);
    }

    #[test]
    fn ingest_tracts_writes_rows() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("tractmap_ingest_test_{}.csv", std::process::id()));
        std::fs::write(&path, "tract,ra,dec\n2897,49.9,-44.1\n2898,52.2,-44.1\n").unwrap();

        let conn = tractmap_database::survey_db::open_in_memory().unwrap();
        let count = ingest_tracts(&conn, &path, CoordUnit::Degrees).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(count, 2);
        let loaded = tractmap_database::survey_db::load_tracts(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, 2897);
    }
}
