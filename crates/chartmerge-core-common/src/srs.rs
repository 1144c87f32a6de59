//! Minimal spatial reference handling.
//!
//! The engine never reprojects. It only needs to name a reference system,
//! stamp the canonical WGS84 one onto merged output, and tell geographic
//! (angle based) systems from projected ones.

use std::fmt;

/// EPSG code of WGS84 geographic 2D.
pub const WGS84_EPSG: u32 = 4326;

/// A reference system identified by authority code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpatialRef {
    /// `EPSG:<code>`.
    Epsg(u32),
    /// `OGC:CRS84`, WGS84 with longitude/latitude axis order.
    Crs84,
    /// Any other identifier, kept verbatim.
    Other(String),
}

impl SpatialRef {
    #[must_use]
    pub const fn from_epsg(code: u32) -> Self {
        Self::Epsg(code)
    }

    /// The canonical geographic system of merged output.
    #[must_use]
    pub const fn wgs84() -> Self {
        Self::Epsg(WGS84_EPSG)
    }

    /// Parses `EPSG:n`, `urn:ogc:def:crs:EPSG::n`, `urn:ogc:def:crs:OGC:1.3:CRS84`
    /// and `OGC:CRS84`. Anything else is kept as [`SpatialRef::Other`].
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        let trimmed = identifier.trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Self::Crs84;
        }
        let code = upper
            .strip_prefix("EPSG:")
            .or_else(|| upper.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .or_else(|| upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:"))
            .and_then(|rest| rest.rsplit(':').next())
            .and_then(|code| code.parse::<u32>().ok());
        match code {
            Some(code) => Self::Epsg(code),
            None => Self::Other(trimmed.to_string()),
        }
    }

    /// Whether coordinates are angular longitude/latitude.
    ///
    /// EPSG reserves 4000-4999 for geographic 2D systems; unknown
    /// identifiers are treated as projected.
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        match self {
            Self::Epsg(code) => (4000..5000).contains(code),
            Self::Crs84 => true,
            Self::Other(_) => false,
        }
    }

    /// OGC URN form, as written into GeoJSON `crs` members.
    #[must_use]
    pub fn urn(&self) -> String {
        match self {
            Self::Epsg(code) => format!("urn:ogc:def:crs:EPSG::{code}"),
            Self::Crs84 => "urn:ogc:def:crs:OGC:1.3:CRS84".to_string(),
            Self::Other(id) => id.clone(),
        }
    }
}

impl Default for SpatialRef {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
            Self::Crs84 => f.write_str("OGC:CRS84"),
            Self::Other(id) => f.write_str(id),
        }
    }
}
