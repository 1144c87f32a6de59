//! I/O traits for reading and writing vector feature stores.
//!
//! This module defines the seams a store driver must provide: opening input
//! datasets as ordered layers of features, and creating output datasets that
//! accept fields and features layer by layer. All calls are blocking.

use std::path::Path;

use anyhow::Result;

use crate::feature::Feature;
use crate::field::FieldDefn;
use crate::geometry::GeometryType;
use crate::options::{LayerOptions, OpenOptions};
use crate::srs::SpatialRef;

/// A store driver able to open, create and delete datasets on some medium.
pub trait VectorDriver {
    /// Short name used for identification (e.g., `"GeoJSON"`).
    fn short_name(&self) -> &'static str;

    /// File extension, without the dot, of datasets this driver creates.
    fn extension(&self) -> &'static str;

    /// Opens an existing dataset read-only.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the dataset
    /// * `options` - Driver open options, passed through uninterpreted
    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn Dataset>>;

    /// Creates a new, empty dataset at `path`.
    fn create(&self, path: &Path) -> Result<Box<dyn DatasetWriter>>;

    /// Whether an artifact already exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Deletes the artifact at `path`.
    fn delete(&self, path: &Path) -> Result<()>;
}

/// A read-only dataset made of named layers.
pub trait Dataset {
    /// Name used in diagnostics, typically the source path.
    fn name(&self) -> &str;

    fn layer_count(&self) -> usize;

    /// Layer at `index`, or `None` when out of range.
    fn layer(&mut self, index: usize) -> Option<&mut dyn Layer>;

    /// Layer with the given name, or `None` when the dataset lacks it.
    fn layer_by_name(&mut self, name: &str) -> Option<&mut dyn Layer>;
}

/// A sequentially readable layer of features sharing one schema.
pub trait Layer {
    fn name(&self) -> &str;

    /// Attribute schema in column order.
    fn fields(&self) -> &[FieldDefn];

    fn spatial_ref(&self) -> Option<&SpatialRef>;

    /// Declared geometry type, [`GeometryType::UNKNOWN`] for mixed layers.
    fn geometry_type(&self) -> GeometryType;

    /// Rewinds the read cursor to the first feature.
    fn reset_reading(&mut self);

    /// Returns the next feature, or `None` at the end of the layer.
    fn next_feature(&mut self) -> Result<Option<Feature>>;
}

/// A dataset under construction.
pub trait DatasetWriter {
    /// Creates a layer and returns it for population.
    ///
    /// # Arguments
    ///
    /// * `name` - Layer name
    /// * `spatial_ref` - Reference system stamped on the layer
    /// * `geometry_type` - Optional geometry type hint
    /// * `options` - Layer creation options, passed through uninterpreted
    fn create_layer(
        &mut self,
        name: &str,
        spatial_ref: &SpatialRef,
        geometry_type: Option<GeometryType>,
        options: &LayerOptions,
    ) -> Result<&mut dyn LayerWriter>;

    /// Flushes and finalizes the dataset.
    fn close(self: Box<Self>) -> Result<()>;
}

/// A layer accepting a schema and then features.
pub trait LayerWriter {
    fn name(&self) -> &str;

    /// Appends a field definition to the schema.
    fn create_field(&mut self, field: &FieldDefn) -> Result<()>;

    /// Schema created so far.
    fn fields(&self) -> &[FieldDefn];

    /// Appends a feature. A failure concerns this feature only; the layer
    /// stays usable.
    fn create_feature(&mut self, feature: Feature) -> Result<()>;
}
