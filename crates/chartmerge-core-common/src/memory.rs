//! In-memory vector store.
//!
//! Datasets live in a shared map keyed by path, so a test (or an embedding
//! application) can seed inputs, run an operation through the
//! [`VectorDriver`] seam, and inspect whatever the operation wrote. Output
//! layers enforce declared string widths the way fixed-width attribute
//! tables do, which makes append failures reproducible.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};

use crate::feature::Feature;
use crate::field::{FieldDefn, FieldType, FieldValue};
use crate::geometry::GeometryType;
use crate::io::{Dataset, DatasetWriter, Layer, LayerWriter, VectorDriver};
use crate::options::{LayerOptions, OpenOptions};
use crate::srs::SpatialRef;

/// Layer held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayer {
    name: String,
    fields: Vec<FieldDefn>,
    spatial_ref: Option<SpatialRef>,
    geometry_type: Option<GeometryType>,
    options: LayerOptions,
    features: Vec<Feature>,
    cursor: usize,
}

impl MemoryLayer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDefn) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_spatial_ref(mut self, spatial_ref: SpatialRef) -> Self {
        self.spatial_ref = Some(spatial_ref);
        self
    }

    #[must_use]
    pub fn with_geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = Some(geometry_type);
        self
    }

    /// Adds a feature without schema validation.
    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Creation options the layer was created with.
    #[must_use]
    pub fn options(&self) -> &LayerOptions {
        &self.options
    }

    fn check_widths(&self, feature: &Feature) -> Result<()> {
        for defn in self
            .fields
            .iter()
            .filter(|d| d.field_type == FieldType::String && d.width > 0)
        {
            if let Some(FieldValue::String(text)) = feature.field(&defn.name) {
                let len = text.chars().count();
                if len > defn.width as usize {
                    bail!(
                        "value of field '{}' is {len} characters, exceeding width {}",
                        defn.name,
                        defn.width
                    );
                }
            }
        }
        Ok(())
    }
}

impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[FieldDefn] {
        &self.fields
    }

    fn spatial_ref(&self) -> Option<&SpatialRef> {
        self.spatial_ref.as_ref()
    }

    fn geometry_type(&self) -> GeometryType {
        self.geometry_type.unwrap_or(GeometryType::UNKNOWN)
    }

    fn reset_reading(&mut self) {
        self.cursor = 0;
    }

    fn next_feature(&mut self) -> Result<Option<Feature>> {
        let feature = self.features.get(self.cursor).cloned();
        if feature.is_some() {
            self.cursor += 1;
        }
        Ok(feature)
    }
}

impl LayerWriter for MemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_field(&mut self, field: &FieldDefn) -> Result<()> {
        if self.fields.iter().any(|f| f.name == field.name) {
            bail!("field '{}' already exists on layer '{}'", field.name, self.name);
        }
        self.fields.push(field.clone());
        Ok(())
    }

    fn fields(&self) -> &[FieldDefn] {
        &self.fields
    }

    fn create_feature(&mut self, mut feature: Feature) -> Result<()> {
        self.check_widths(&feature)?;
        if feature.fid.is_none() {
            feature.fid = Some(self.features.len() as u64);
        }
        self.features.push(feature);
        Ok(())
    }
}

/// Dataset held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    name: String,
    layers: Vec<MemoryLayer>,
}

impl MemoryDataset {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_layer(mut self, layer: MemoryLayer) -> Self {
        self.layers.push(layer);
        self
    }

    #[must_use]
    pub fn layers(&self) -> &[MemoryLayer] {
        &self.layers
    }

    #[must_use]
    pub fn find_layer(&self, name: &str) -> Option<&MemoryLayer> {
        self.layers.iter().find(|l| l.name == name)
    }
}

impl Dataset for MemoryDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&mut self, index: usize) -> Option<&mut dyn Layer> {
        self.layers
            .get_mut(index)
            .map(|layer| layer as &mut dyn Layer)
    }

    fn layer_by_name(&mut self, name: &str) -> Option<&mut dyn Layer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.name == name)
            .map(|layer| layer as &mut dyn Layer)
    }
}

/// Shared, single-threaded map of in-memory datasets acting as a driver.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    datasets: Rc<RefCell<BTreeMap<PathBuf, MemoryDataset>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `dataset` at `path`, replacing any previous one.
    pub fn insert(&self, path: impl Into<PathBuf>, dataset: MemoryDataset) {
        self.datasets.borrow_mut().insert(path.into(), dataset);
    }

    /// Snapshot of the dataset at `path`.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<MemoryDataset> {
        self.datasets.borrow().get(path.as_ref()).cloned()
    }

    /// Paths of every stored dataset, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.datasets.borrow().keys().cloned().collect()
    }
}

impl VectorDriver for MemoryStore {
    fn short_name(&self) -> &'static str {
        "Memory"
    }

    fn extension(&self) -> &'static str {
        "mem"
    }

    fn open(&self, path: &Path, _options: &OpenOptions) -> Result<Box<dyn Dataset>> {
        let mut dataset = self
            .get(path)
            .ok_or_else(|| anyhow!("no in-memory dataset at '{}'", path.display()))?;
        for layer in &mut dataset.layers {
            layer.reset_reading();
        }
        Ok(Box::new(dataset))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn DatasetWriter>> {
        Ok(Box::new(MemoryDatasetWriter {
            store: self.clone(),
            path: path.to_path_buf(),
            dataset: MemoryDataset::new(path.display().to_string()),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.datasets.borrow().contains_key(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.datasets
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no in-memory dataset at '{}'", path.display()))
    }
}

/// Writer that commits its dataset into the store on close.
#[derive(Debug)]
pub struct MemoryDatasetWriter {
    store: MemoryStore,
    path: PathBuf,
    dataset: MemoryDataset,
}

impl DatasetWriter for MemoryDatasetWriter {
    fn create_layer(
        &mut self,
        name: &str,
        spatial_ref: &SpatialRef,
        geometry_type: Option<GeometryType>,
        options: &LayerOptions,
    ) -> Result<&mut dyn LayerWriter> {
        if self.dataset.layers.iter().any(|l| l.name == name) {
            bail!("layer '{name}' already exists in '{}'", self.path.display());
        }
        let mut layer = MemoryLayer::new(name).with_spatial_ref(spatial_ref.clone());
        layer.geometry_type = geometry_type;
        layer.options = options.clone();
        self.dataset.layers.push(layer);
        let layer = self
            .dataset
            .layers
            .last_mut()
            .ok_or_else(|| anyhow!("layer '{name}' vanished after creation"))?;
        Ok(layer)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let Self {
            store,
            path,
            dataset,
        } = *self;
        store.insert(path, dataset);
        Ok(())
    }
}
