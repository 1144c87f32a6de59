//! Driver registry for chart store formats.
//!
//! The registry lists every store format the tool knows about together with
//! its support status, and instantiates the store implementation behind a
//! supported descriptor.
//!
//! # Examples
//!
//! ```
//! use chartmerge_core::drivers::{find_driver, get_available_drivers};
//!
//! let geojson = find_driver("geojson").expect("GeoJSON driver should exist");
//! assert!(geojson.capabilities.read.is_supported());
//!
//! for driver in get_available_drivers() {
//!     println!("{}: {}", driver.short_name, driver.long_name);
//! }
//! ```

use chartmerge_core_common::VectorDriver;
use chartmerge_geojson::GeoJsonDriver;

pub use chartmerge_core_common::{Driver, DriverCapabilities, SupportStatus};

use crate::error::{DriverError, Result, driver_not_found};

/// Returns the complete registry of known chart store drivers.
#[must_use]
pub fn get_drivers() -> Vec<Driver> {
    use SupportStatus::{NotSupported, Planned, Supported};

    vec![
        Driver::new("GeoJSON", "GeoJSON", "geojson", Supported, Supported),
        Driver::new(
            "S57",
            "IHO S-57 (ENC) ISO 8211",
            "000",
            Planned,
            NotSupported,
        ),
        Driver::new(
            "ESRI Shapefile",
            "ESRI Shapefile / DBF",
            "shp",
            Planned,
            Planned,
        ),
        Driver::new("GPKG", "GeoPackage vector", "gpkg", Planned, Planned),
        Driver::new(
            "S101",
            "IHO S-101 (ENC) ISO 8211",
            "000",
            NotSupported,
            NotSupported,
        ),
    ]
}

/// Returns drivers with at least one supported operation.
#[must_use]
pub fn get_available_drivers() -> Vec<Driver> {
    get_drivers()
        .into_iter()
        .filter(|d| d.capabilities.has_supported_operation())
        .collect()
}

/// Finds a driver by its short name (case-insensitive).
#[must_use]
pub fn find_driver(name: &str) -> Option<Driver> {
    get_drivers()
        .into_iter()
        .find(|d| d.short_name.eq_ignore_ascii_case(name))
}

/// Returns all driver short names in alphabetically sorted order.
#[must_use]
pub fn get_driver_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_drivers().iter().map(|d| d.short_name).collect();
    names.sort_unstable();
    names
}

/// Resolves a driver name to a descriptor that supports both reading and
/// writing.
///
/// # Errors
///
/// Returns [`DriverError::NotFound`] for unknown names and
/// [`DriverError::OperationNotSupported`] when the driver cannot read or write.
pub fn resolve_read_write(name: &str) -> Result<Driver> {
    let driver = find_driver(name).ok_or_else(|| driver_not_found(name))?;
    for (status, operation) in [
        (driver.capabilities.read, "reading"),
        (driver.capabilities.write, "writing"),
    ] {
        if !status.is_supported() {
            return Err(DriverError::OperationNotSupported {
                driver: driver.short_name.to_string(),
                operation: operation.to_string(),
            }
            .into());
        }
    }
    Ok(driver)
}

/// Instantiates the store implementation of a supported driver.
///
/// # Errors
///
/// Returns [`DriverError::OperationNotSupported`] when no implementation exists.
pub fn open_driver(driver: &Driver) -> Result<Box<dyn VectorDriver>> {
    match driver.short_name {
        "GeoJSON" => Ok(Box::new(GeoJsonDriver::new())),
        other => Err(DriverError::OperationNotSupported {
            driver: other.to_string(),
            operation: "loading".to_string(),
        }
        .into()),
    }
}
