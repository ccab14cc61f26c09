//! Raw CSV row shapes for tract and visit exports.
//!
//! Visit field aliases accept the `OpSim` summary-table column names
//! (`obsHistID`, `descDitheredRA`, `descDitheredDec`, `filter`, `propID`,
//! `expMJD`) alongside the plain names, so an observation-database export
//! loads without renaming its header.

use serde::Deserialize;

/// A raw row from a tract-center export.
#[derive(Debug, Deserialize)]
pub struct RawTract {
    /// Tract id.
    #[serde(alias = "tract")]
    pub id: i64,
    /// Right ascension of the tract center.
    pub ra: f64,
    /// Declination of the tract center.
    pub dec: f64,
}

/// A raw row from a visit (pointing) export.
#[derive(Debug, Deserialize)]
pub struct RawVisit {
    /// Visit id.
    #[serde(alias = "obsHistID")]
    pub id: i64,
    /// Right ascension of the pointing center.
    #[serde(alias = "descDitheredRA")]
    pub ra: f64,
    /// Declination of the pointing center.
    #[serde(alias = "descDitheredDec")]
    pub dec: f64,
    /// Survey filter the exposure was taken in.
    #[serde(alias = "filter")]
    pub band: String,
    /// Observing-program id, when the export carries one.
    #[serde(default, alias = "propID")]
    pub survey_id: Option<i64>,
    /// Observation epoch as a Modified Julian Date.
    #[serde(default, alias = "expMJD")]
    pub mjd: Option<f64>,
}
