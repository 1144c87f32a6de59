//! File-backed `GeoJSON` store driver.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chartmerge_core_common::{
    Dataset, DatasetWriter, Feature, FieldDefn, GeometryType, Layer, LayerOptions, LayerWriter,
    OpenOptions, SpatialRef, VectorDriver,
};
use log::{debug, warn};

use crate::parser::{ParsedLayer, parse_dataset};
use crate::writer::{FeatureCollectionWriter, GeoJsonWriterOptions};

/// Reads chart documents and writes one FeatureCollection per artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonDriver;

impl GeoJsonDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl VectorDriver for GeoJsonDriver {
    fn short_name(&self) -> &'static str {
        "GeoJSON"
    }

    fn extension(&self) -> &'static str {
        "geojson"
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn Dataset>> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_dataset(&bytes, &stem, options, path.display().to_string())?;
        debug!(
            "Opened '{}' with {} layer(s)",
            path.display(),
            parsed.layers.len()
        );
        let spatial_ref = parsed.spatial_ref;
        Ok(Box::new(GeoJsonDataset {
            name: path.display().to_string(),
            layers: parsed
                .layers
                .into_iter()
                .map(|layer| GeoJsonLayer {
                    layer,
                    spatial_ref: spatial_ref.clone(),
                    cursor: 0,
                })
                .collect(),
        }))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn DatasetWriter>> {
        let file =
            File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?;
        Ok(Box::new(GeoJsonDatasetWriter {
            path: path.to_path_buf(),
            pending: Some(BufWriter::new(file)),
            layer: None,
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("Failed to delete '{}'", path.display()))
    }
}

/// A parsed document exposing its layers.
#[derive(Debug)]
pub struct GeoJsonDataset {
    name: String,
    layers: Vec<GeoJsonLayer>,
}

impl Dataset for GeoJsonDataset {
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
            .find(|layer| layer.layer.name == name)
            .map(|layer| layer as &mut dyn Layer)
    }
}

#[derive(Debug)]
pub struct GeoJsonLayer {
    layer: ParsedLayer,
    spatial_ref: SpatialRef,
    cursor: usize,
}

impl Layer for GeoJsonLayer {
    fn name(&self) -> &str {
        &self.layer.name
    }

    fn fields(&self) -> &[FieldDefn] {
        &self.layer.fields
    }

    fn spatial_ref(&self) -> Option<&SpatialRef> {
        Some(&self.spatial_ref)
    }

    fn geometry_type(&self) -> GeometryType {
        self.layer.geometry_type
    }

    fn reset_reading(&mut self) {
        self.cursor = 0;
    }

    fn next_feature(&mut self) -> Result<Option<Feature>> {
        let feature = self.layer.features.get(self.cursor).cloned();
        if feature.is_some() {
            self.cursor += 1;
        }
        Ok(feature)
    }
}

/// Output document. A `GeoJSON` file holds a single layer.
#[derive(Debug)]
pub struct GeoJsonDatasetWriter {
    path: PathBuf,
    pending: Option<BufWriter<File>>,
    layer: Option<GeoJsonLayerWriter>,
}

impl GeoJsonDatasetWriter {
    fn writer_options(&self, options: &LayerOptions) -> Result<GeoJsonWriterOptions> {
        if let Some(encoding) = options.get("ENCODING") {
            if !encoding.eq_ignore_ascii_case("UTF-8") && !encoding.eq_ignore_ascii_case("UTF8")
            {
                warn!(
                    "'{}': ENCODING={encoding} ignored, GeoJSON is always written as UTF-8",
                    self.path.display()
                );
            }
        }
        let mut writer_options = GeoJsonWriterOptions::new()
            .with_omit_schema(!options.flag("WRITE_SCHEMA", true));
        if let Some(precision) = options.get("COORDINATE_PRECISION") {
            let precision = precision
                .parse::<u32>()
                .with_context(|| format!("Invalid COORDINATE_PRECISION '{precision}'"))?;
            writer_options = writer_options.with_coordinate_precision(precision);
        }
        Ok(writer_options)
    }
}

impl DatasetWriter for GeoJsonDatasetWriter {
    fn create_layer(
        &mut self,
        name: &str,
        spatial_ref: &SpatialRef,
        geometry_type: Option<GeometryType>,
        options: &LayerOptions,
    ) -> Result<&mut dyn LayerWriter> {
        let writer_options = self.writer_options(options)?;
        let Some(sink) = self.pending.take() else {
            bail!(
                "'{}' already holds layer '{}'; GeoJSON supports one layer per file",
                self.path.display(),
                self.layer.as_ref().map_or("", |l| l.inner.name())
            );
        };
        let writer = GeoJsonLayerWriter {
            inner: FeatureCollectionWriter::new(
                sink,
                name,
                spatial_ref.clone(),
                geometry_type,
                writer_options,
            ),
        };
        Ok(self.layer.insert(writer))
    }

    fn close(self: Box<Self>) -> Result<()> {
        let Self {
            path,
            pending,
            layer,
        } = *self;
        match (layer, pending) {
            (Some(layer), _) => {
                layer.inner.finish()?;
            },
            (None, Some(sink)) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                FeatureCollectionWriter::new(
                    sink,
                    stem,
                    SpatialRef::wgs84(),
                    None,
                    GeoJsonWriterOptions::new().with_omit_schema(true),
                )
                .finish()?;
            },
            (None, None) => {},
        }
        debug!("Closed '{}'", path.display());
        Ok(())
    }
}

#[derive(Debug)]
pub struct GeoJsonLayerWriter {
    inner: FeatureCollectionWriter<BufWriter<File>>,
}

impl LayerWriter for GeoJsonLayerWriter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn create_field(&mut self, field: &FieldDefn) -> Result<()> {
        self.inner.add_field(field.clone())?;
        Ok(())
    }

    fn fields(&self) -> &[FieldDefn] {
        self.inner.fields()
    }

    fn create_feature(&mut self, feature: Feature) -> Result<()> {
        self.inner.write_feature(&feature)?;
        Ok(())
    }
}
