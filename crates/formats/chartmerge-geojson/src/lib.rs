//! `GeoJSON` chart store for `chartmerge`.
//!
//! Charts are read from FeatureCollections whose features carry a `"layer"`
//! member naming their feature class, and merged artifacts are written back
//! as one FeatureCollection per file.

pub mod driver;
pub mod geometry;
pub mod parser;
pub mod writer;

pub use driver::{GeoJsonDataset, GeoJsonDatasetWriter, GeoJsonDriver, GeoJsonLayer, GeoJsonLayerWriter};
pub use geometry::{from_geojson, geometry_type_from_name, to_geojson};
pub use parser::{ParsedDataset, ParsedLayer, parse_dataset};
pub use writer::{FeatureCollectionWriter, GeoJsonWriterOptions, value_to_json};
