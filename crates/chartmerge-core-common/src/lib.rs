//! Common types and traits shared across `chartmerge` crates.
//!
//! This crate provides the data model (geometries, fields, features, spatial
//! references) and the store traits that sit between `chartmerge-core` and
//! the format implementation crates, preventing circular dependencies.

pub mod drivers;
pub mod feature;
pub mod field;
pub mod geometry;
pub mod io;
pub mod memory;
pub mod options;
pub mod srs;

// Re-export commonly used types
pub use drivers::{Driver, DriverCapabilities, SupportStatus};
pub use feature::Feature;
pub use field::{FieldDefn, FieldType, FieldValue};
pub use geometry::{Coord, Geometry, GeometryType};
pub use io::{Dataset, DatasetWriter, Layer, LayerWriter, VectorDriver};
pub use memory::{MemoryDataset, MemoryLayer, MemoryStore};
pub use options::{DriverOptions, LayerOptions, OpenOptions};
pub use srs::SpatialRef;
