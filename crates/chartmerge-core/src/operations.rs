//! Top-level chart operations.
//!
//! This module ties the pieces together: input discovery, dataset loading,
//! feature-class registration and the merge itself, plus the single-dataset
//! longitude shift.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use chartmerge_core_common::{
    Dataset, GeometryType, LayerOptions, LayerWriter, OpenOptions, SpatialRef, VectorDriver,
};
use log::{debug, info, warn};

use crate::config::{MergeOptions, S57Options};
use crate::drivers::{open_driver, resolve_read_write};
use crate::error::{IoError, IoErrorExt, Result};
use crate::merge::{FeatureCopyFailure, MergeEngine, MergeReport};
use crate::registry::FeatureClassRegistry;
use crate::shift::shift_optional;

/// Driver used when a request names none.
pub const DEFAULT_DRIVER: &str = "GeoJSON";

/// Parameters of a merge run.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Directory searched (non-recursively) for input datasets.
    pub source_dir: PathBuf,
    /// Directory receiving the merged artifacts; created when missing.
    pub dest_dir: PathBuf,
    /// Store driver used for inputs and outputs.
    pub driver: String,
    pub options: MergeOptions,
    /// Options passed to the store when opening inputs.
    pub open_options: OpenOptions,
}

impl MergeRequest {
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            driver: DEFAULT_DRIVER.to_string(),
            options: MergeOptions::default(),
            open_options: S57Options::default().to_open_options(),
        }
    }

    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_open_options(mut self, open_options: OpenOptions) -> Self {
        self.open_options = open_options;
        self
    }
}

/// Parameters of a shift run.
#[derive(Debug, Clone)]
pub struct ShiftRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub driver: String,
    /// Passed to the destination layer as `ENCODING=<value>`.
    pub encoding: Option<String>,
}

impl ShiftRequest {
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            driver: DEFAULT_DRIVER.to_string(),
            encoding: None,
        }
    }

    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Outcome of a shift run.
#[derive(Debug, Clone)]
pub struct ShiftReport {
    pub layer: String,
    pub destination: PathBuf,
    /// Whether the source declared a geographic reference system.
    pub geographic: bool,
    pub features_written: u64,
    pub failures: Vec<FeatureCopyFailure>,
}

/// Lists the files of `source_dir` whose extension matches `extension`,
/// ignoring case, in path order.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] when `source_dir` is not a directory,
/// [`IoError::NoInputs`] when nothing matches, and [`IoError::Read`] when the
/// directory cannot be listed.
pub fn discover_inputs(source_dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        return Err(IoError::FileNotFound {
            path: source_dir.to_path_buf(),
        }
        .into());
    }

    let entries = fs::read_dir(source_dir)
        .map_err(anyhow::Error::from)
        .with_read_context("directory", source_dir)?;
    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(anyhow::Error::from)
            .with_read_context("directory", source_dir)?
            .path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();

    if inputs.is_empty() {
        return Err(IoError::NoInputs {
            path: source_dir.to_path_buf(),
            extension: extension.to_string(),
        }
        .into());
    }
    debug!("Found {} input(s) in '{}'", inputs.len(), source_dir.display());
    Ok(inputs)
}

/// Opens every path with `driver`, in order.
///
/// # Errors
///
/// The first dataset that fails to open aborts loading with [`IoError::Read`].
pub fn open_datasets(
    driver: &dyn VectorDriver,
    paths: &[PathBuf],
    options: &OpenOptions,
) -> Result<Vec<Box<dyn Dataset>>> {
    paths
        .iter()
        .map(|path| {
            info!("Opening {}", path.display());
            driver
                .open(path, options)
                .with_read_context(driver.short_name(), path)
        })
        .collect()
}

/// Merges every chart of `request.source_dir` into per-kind artifacts.
///
/// # Errors
///
/// Fails on invalid options, an unknown or read-only driver, a missing or
/// empty source directory, an unreadable input, an unclassifiable geometry or
/// an artifact that cannot be written. Individual features refused by the
/// destination are reported in the [`MergeReport`] instead.
pub fn merge_charts(request: &MergeRequest) -> Result<MergeReport> {
    request.options.validate()?;
    let driver = resolve_read_write(&request.driver)?;
    let store = open_driver(&driver)?;
    merge_with_driver(store.as_ref(), request)
}

/// [`merge_charts`] with an already loaded store implementation.
///
/// # Errors
///
/// See [`merge_charts`].
pub fn merge_with_driver(driver: &dyn VectorDriver, request: &MergeRequest) -> Result<MergeReport> {
    info!("Starting merge:");
    info!("Source: {}", request.source_dir.display());
    info!("Destination: {}", request.dest_dir.display());
    info!("Open options: {}", request.open_options);

    let inputs = discover_inputs(&request.source_dir, driver.extension())?;
    fs::create_dir_all(&request.dest_dir).map_err(|source| IoError::CreateDir {
        path: request.dest_dir.clone(),
        source,
    })?;

    let mut datasets = open_datasets(driver, &inputs, &request.open_options)?;
    let registry = FeatureClassRegistry::from_datasets(&mut datasets)?;

    let engine = MergeEngine::new(driver, request.options.clone());
    let report = engine.merge(datasets, &registry, &request.dest_dir)?;
    info!(
        "Merge completed: {} artifact(s), {} feature(s), {} failure(s)",
        report.artifacts.len(),
        report.features_written(),
        report.failure_count()
    );
    Ok(report)
}

/// Writes a copy of a dataset's first layer with longitudes moved into
/// `[0, 360]`.
///
/// # Errors
///
/// Fails when the driver is unknown, the source cannot be read or has no
/// layer, or the destination cannot be written. A source without a
/// geographic reference system only produces a warning.
pub fn shift_dataset(request: &ShiftRequest) -> Result<ShiftReport> {
    let driver = resolve_read_write(&request.driver)?;
    let store = open_driver(&driver)?;
    shift_with_driver(store.as_ref(), request)
}

/// [`shift_dataset`] with an already loaded store implementation.
///
/// # Errors
///
/// See [`shift_dataset`].
pub fn shift_with_driver(driver: &dyn VectorDriver, request: &ShiftRequest) -> Result<ShiftReport> {
    let format = driver.short_name();
    let source_path = &request.source;
    let destination_path = &request.destination;

    let mut dataset = driver
        .open(source_path, &OpenOptions::new())
        .with_read_context(format, source_path)?;
    let dataset_name = dataset.name().to_string();
    let source = dataset
        .layer(0)
        .ok_or_else(|| anyhow!("dataset has no layers"))
        .with_read_context(format, source_path)?;

    let geographic = source.spatial_ref().is_some_and(SpatialRef::is_geographic);
    if !geographic {
        warn!(
            "Source '{}' does not have a geographic coordinate system",
            source_path.display()
        );
    }
    let spatial_ref = source.spatial_ref().cloned().unwrap_or_else(SpatialRef::wgs84);
    let layer_options = request
        .encoding
        .as_deref()
        .filter(|encoding| !encoding.is_empty())
        .map_or_else(LayerOptions::new, |encoding| {
            LayerOptions::new().with("ENCODING", encoding)
        });

    if driver.exists(destination_path) {
        debug!("Replacing existing '{}'", destination_path.display());
        driver
            .delete(destination_path)
            .with_write_context(format, destination_path)?;
    }
    let mut writer = driver
        .create(destination_path)
        .with_write_context(format, destination_path)?;
    let layer_name = source.name().to_string();
    let geometry_type = Some(source.geometry_type()).filter(|t| *t != GeometryType::UNKNOWN);
    let destination = writer
        .create_layer(&layer_name, &spatial_ref, geometry_type, &layer_options)
        .with_write_context(format, destination_path)?;
    for field in source.fields() {
        destination
            .create_field(field)
            .with_write_context(format, destination_path)?;
    }

    let mut report = ShiftReport {
        layer: layer_name,
        destination: destination_path.clone(),
        geographic,
        features_written: 0,
        failures: Vec::new(),
    };
    let fields = destination.fields().to_vec();
    source.reset_reading();
    while let Some(mut feature) = source
        .next_feature()
        .with_read_context(format, source_path)?
    {
        shift_optional(feature.geometry.as_mut());
        let feature_id = feature.fid;
        match destination.create_feature(feature.conform_to(&fields)) {
            Ok(()) => report.features_written += 1,
            Err(err) => {
                let failure = FeatureCopyFailure {
                    dataset: dataset_name.clone(),
                    layer: report.layer.clone(),
                    feature_id,
                    cause: format!("{err:#}"),
                };
                warn!("{failure}");
                report.failures.push(failure);
            },
        }
    }

    writer
        .close()
        .with_write_context(format, destination_path)?;
    info!(
        "Shifted {} feature(s) of '{}' into {}",
        report.features_written,
        report.layer,
        destination_path.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmerge_core_common::{
        Coord, Feature, FieldDefn, FieldType, FieldValue, Geometry, GeometryType, Layer,
        MemoryDataset, MemoryLayer, MemoryStore,
    };
    use tempfile::TempDir;

    use crate::classify::GenericKind;
    use crate::error::ChartMergeError;

    const CHART_A: &str = r#"{
  "type": "FeatureCollection",
  "name": "NZ40100",
  "features": [
    {"type": "Feature", "id": 1, "layer": "DEPARE",
     "properties": {"RCID": 11, "DRVAL1": 0.0, "DRVAL2": 5.0},
     "geometry": {"type": "Polygon", "coordinates": [[[179.5, -40.0], [-179.5, -40.0], [-179.5, -41.0], [179.5, -40.0]]]}},
    {"type": "Feature", "id": 2, "layer": "DEPARE",
     "properties": {"RCID": 12, "DRVAL1": 5.0, "DRVAL2": 10.0},
     "geometry": {"type": "LineString", "coordinates": [[179.0, -40.0], [-179.0, -40.5]]}},
    {"type": "Feature", "id": 3, "layer": "LIGHTS",
     "properties": {"OBJNAM": "Cape Light"},
     "geometry": {"type": "Point", "coordinates": [-178.25, -40.1]}}
  ]
}"#;

    const CHART_B: &str = r#"{
  "type": "FeatureCollection",
  "name": "NZ40200",
  "features": [
    {"type": "Feature", "id": 7, "layer": "DEPARE",
     "properties": {"RCID": 21, "DRVAL1": 10.0, "DRVAL2": 20.0, "SORDAT": "20120101"},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[170.0, -40.0], [171.0, -40.0], [171.0, -41.0], [170.0, -40.0]]]]}}
  ]
}"#;

    fn chart_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("NZ40100.geojson"), CHART_A).unwrap();
        fs::write(dir.path().join("NZ40200.GEOJSON"), CHART_B).unwrap();
        fs::write(dir.path().join("README.txt"), "not a chart").unwrap();
        fs::create_dir(dir.path().join("nested.geojson")).unwrap();
        dir
    }

    #[test]
    fn test_discover_inputs_sorted_and_case_insensitive() {
        let dir = chart_dir();
        let inputs = discover_inputs(dir.path(), "geojson").unwrap();
        let names: Vec<String> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["NZ40100.geojson", "NZ40200.GEOJSON"]);
    }

    #[test]
    fn test_discover_inputs_missing_or_empty() {
        let dir = TempDir::new().unwrap();
        let err = discover_inputs(&dir.path().join("absent"), "geojson").unwrap_err();
        assert!(matches!(err, ChartMergeError::Io(IoError::FileNotFound { .. })));

        let err = discover_inputs(dir.path(), "geojson").unwrap_err();
        assert!(matches!(err, ChartMergeError::Io(IoError::NoInputs { .. })));
    }

    #[test]
    fn test_open_datasets_fails_on_first_bad_input() {
        let store = MemoryStore::new();
        store.insert("a.mem", MemoryDataset::new("a"));
        let paths = vec![PathBuf::from("a.mem"), PathBuf::from("b.mem")];
        let Err(err) = open_datasets(&store, &paths, &OpenOptions::new()) else {
            panic!("b.mem does not exist");
        };
        assert!(matches!(err, ChartMergeError::Io(IoError::Read { .. })));
        assert!(err.to_string().contains("b.mem"));

        let opened = open_datasets(&store, &paths[..1], &OpenOptions::new()).unwrap();
        assert_eq!(opened.len(), 1);
    }

    #[test]
    fn test_merge_charts_writes_one_artifact_per_kind() {
        let source = chart_dir();
        let dest = TempDir::new().unwrap();
        let out = dest.path().join("merged");
        let request = MergeRequest::new(source.path(), &out)
            .with_options(MergeOptions::default().with_prefix("nz_"));

        let report = merge_charts(&request).unwrap();

        let mut written: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(
            written,
            vec![
                "nz_DEPARE_Arc.geojson",
                "nz_DEPARE_Polygon.geojson",
                "nz_LIGHTS_Point.geojson",
            ]
        );

        let polygons = report.artifact("DEPARE", GenericKind::Polygon).unwrap();
        assert_eq!(polygons.contributors.len(), 2);
        assert!(polygons.contributors[0].ends_with("NZ40100.geojson"));
        assert!(polygons.contributors[1].ends_with("NZ40200.GEOJSON"));
        assert_eq!(polygons.features_written, 2);
        assert_eq!(polygons.features_skipped, 1);
        assert_eq!(report.failure_count(), 0);

        // Reopen through the store and check shifted longitudes and schema.
        let store = open_driver(&resolve_read_write("GeoJSON").unwrap()).unwrap();
        let mut merged = store
            .open(&out.join("nz_DEPARE_Polygon.geojson"), &OpenOptions::new())
            .unwrap();
        let layer = merged.layer_by_name("DEPARE").unwrap();
        let names: Vec<&str> = layer.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["DRVAL1", "DRVAL2"]);
        let mut xs = Vec::new();
        while let Some(feature) = layer.next_feature().unwrap() {
            feature.geometry.unwrap().for_each_coord(&mut |c| xs.push(c.x));
        }
        assert!(xs.iter().all(|x| (0.0..=360.0).contains(x)));
        assert!(xs.contains(&180.5));
    }

    #[test]
    fn test_merge_charts_rejects_unknown_driver() {
        let source = chart_dir();
        let dest = TempDir::new().unwrap();
        let request = MergeRequest::new(source.path(), dest.path()).with_driver("KML");
        assert!(matches!(
            merge_charts(&request),
            Err(ChartMergeError::Driver(_))
        ));
    }

    #[test]
    fn test_merge_charts_missing_source_leaves_no_output() {
        let dest = TempDir::new().unwrap();
        let out = dest.path().join("merged");
        let request = MergeRequest::new(dest.path().join("absent"), &out);
        assert!(merge_charts(&request).is_err());
        assert!(!out.exists());
    }

    fn source_store(layer: MemoryLayer) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("src.mem", MemoryDataset::new("src").with_layer(layer));
        store
    }

    #[test]
    fn test_shift_copies_schema_verbatim() {
        let layer = MemoryLayer::new("coastline")
            .with_spatial_ref(SpatialRef::wgs84())
            .with_geometry_type(GeometryType::LINE_STRING)
            .with_field(FieldDefn::new("LNAM", FieldType::StringList))
            .with_field(FieldDefn::new("NAME", FieldType::String).with_width(20))
            .with_feature(
                Feature::new()
                    .with_fid(4)
                    .with_attribute("LNAM", FieldValue::StringList(vec!["a".into()]))
                    .with_attribute("NAME", FieldValue::String("Wharf".into()))
                    .with_geometry(Geometry::line_string(vec![
                        Coord::xyz(-179.0, -40.0, 2.0),
                        Coord::xyz(179.0, -40.0, 3.0),
                    ])),
            )
            .with_feature(Feature::new().with_fid(5));
        let store = source_store(layer);
        let request = ShiftRequest::new("src.mem", "dst.mem").with_encoding("LATIN1");

        let report = shift_with_driver(&store, &request).unwrap();
        assert!(report.geographic);
        assert_eq!(report.features_written, 2);

        let output = store.get("dst.mem").unwrap();
        let shifted = output.find_layer("coastline").unwrap();
        assert_eq!(shifted.options().get("ENCODING"), Some("LATIN1"));
        assert_eq!(Layer::geometry_type(shifted), GeometryType::LINE_STRING);
        assert_eq!(LayerWriter::fields(shifted)[0].field_type, FieldType::StringList);
        assert_eq!(LayerWriter::fields(shifted)[1].width, 20);
        assert_eq!(
            shifted.features()[0].geometry,
            Some(Geometry::line_string(vec![
                Coord::xyz(181.0, -40.0, 2.0),
                Coord::xyz(179.0, -40.0, 3.0),
            ]))
        );
        assert_eq!(shifted.features()[1].geometry, None);
    }

    #[test]
    fn test_shift_non_geographic_source_is_advisory() {
        let layer = MemoryLayer::new("grid")
            .with_spatial_ref(SpatialRef::from_epsg(2193))
            .with_feature(Feature::new().with_geometry(Geometry::point(Coord::xy(-5.0, 1.0))));
        let store = source_store(layer);
        store.insert("dst.mem", MemoryDataset::new("stale"));

        let report = shift_with_driver(&store, &ShiftRequest::new("src.mem", "dst.mem")).unwrap();
        assert!(!report.geographic);
        let output = store.get("dst.mem").unwrap();
        let shifted = output.find_layer("grid").unwrap();
        assert_eq!(
            Layer::spatial_ref(shifted),
            Some(&SpatialRef::from_epsg(2193))
        );
        assert!(shifted.options().is_empty());
        assert_eq!(
            shifted.features()[0].geometry,
            Some(Geometry::point(Coord::xy(355.0, 1.0)))
        );
    }

    #[test]
    fn test_shift_records_refused_features() {
        let layer = MemoryLayer::new("names")
            .with_field(FieldDefn::new("NAME", FieldType::String).with_width(4))
            .with_feature(
                Feature::new()
                    .with_fid(1)
                    .with_attribute("NAME", FieldValue::String("Kaikoura".into())),
            )
            .with_feature(
                Feature::new()
                    .with_fid(2)
                    .with_attribute("NAME", FieldValue::String("Omau".into())),
            );
        let store = source_store(layer);

        let report = shift_with_driver(&store, &ShiftRequest::new("src.mem", "dst.mem")).unwrap();
        assert_eq!(report.features_written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].feature_id, Some(1));
        assert_eq!(report.failures[0].layer, "names");
    }

    #[test]
    fn test_shift_missing_source() {
        let store = MemoryStore::new();
        let err = shift_with_driver(&store, &ShiftRequest::new("src.mem", "dst.mem")).unwrap_err();
        assert!(matches!(err, ChartMergeError::Io(IoError::Read { .. })));
        assert!(store.get("dst.mem").is_none());
    }
}
