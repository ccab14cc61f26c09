//! Survey filter bands.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Photometric band (filter) of an exposure.
///
/// The six-filter complement of a wide-field optical survey. Band strings in
/// observation exports are single lowercase letters; anything else is
/// malformed data and rejected at the ingest boundary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Band {
    /// Near-ultraviolet.
    U,
    /// Green.
    G,
    /// Red.
    R,
    /// Near-infrared.
    I,
    /// Infrared.
    Z,
    /// Deep infrared.
    Y,
}

impl Band {
    /// All bands in wavelength order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [Self::U, Self::G, Self::R, Self::I, Self::Z, Self::Y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_display_roundtrip() {
        for band in Band::all() {
            let text = band.to_string();
            assert_eq!(text.len(), 1);
            assert_eq!(text.parse::<Band>().unwrap(), band);
        }
    }

    #[test]
    fn rejects_unknown_filter_strings() {
        assert!("v".parse::<Band>().is_err());
        assert!("".parse::<Band>().is_err());
        assert!("ug".parse::<Band>().is_err());
    }
}
