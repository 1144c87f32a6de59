use std::path::Path;

use anyhow::Result;
use chartmerge_core_common::{
    Feature, FieldDefn, FieldType, FieldValue, Geometry, GeometryType, LayerOptions, OpenOptions,
    SpatialRef, VectorDriver,
};
use chartmerge_geojson::GeoJsonDriver;
use tempfile::TempDir;

const CELL_A: &str = "tests/e2e_data/NZ40100.geojson";
const CELL_B: &str = "tests/e2e_data/NZ40200.geojson";

fn layer_names(path: &str, options: &OpenOptions) -> Result<Vec<String>> {
    let mut dataset = GeoJsonDriver.open(Path::new(path), options)?;
    Ok((0..dataset.layer_count())
        .filter_map(|i| dataset.layer(i).map(|l| l.name().to_string()))
        .collect())
}

/// Test reading a chart cell exposes its feature classes as layers
#[test]
fn test_read_chart_layers() -> Result<()> {
    let names = layer_names(CELL_A, &OpenOptions::new())?;
    assert_eq!(names, vec!["DEPARE", "SOUNDG", "COALNE", "M_COVR"]);

    let names = layer_names(CELL_B, &OpenOptions::new())?;
    assert_eq!(names, vec!["DEPARE", "LIGHTS"]);
    Ok(())
}

/// Test reading features with declared schema and geometries
#[test]
fn test_read_depare_features() -> Result<()> {
    let mut dataset = GeoJsonDriver.open(Path::new(CELL_A), &OpenOptions::new())?;
    let layer = dataset.layer_by_name("DEPARE").expect("DEPARE layer");

    assert_eq!(layer.fields().len(), 6);
    assert_eq!(layer.spatial_ref(), Some(&SpatialRef::wgs84()));

    let first = layer.next_feature()?.expect("first feature");
    assert_eq!(first.fid, Some(1));
    assert_eq!(first.field("DRVAL2"), Some(&FieldValue::Real(5.0)));
    assert_eq!(
        first.geometry.as_ref().map(Geometry::geometry_type),
        Some(GeometryType::POLYGON)
    );

    let second = layer.next_feature()?.expect("second feature");
    assert_eq!(second.field("LNAM_REFS"), Some(&FieldValue::Null));
    assert!(layer.next_feature()?.is_none());

    layer.reset_reading();
    assert_eq!(layer.next_feature()?.and_then(|f| f.fid), Some(1));
    Ok(())
}

/// Test sounding split with depth attribute
#[test]
fn test_split_soundings() -> Result<()> {
    let options = OpenOptions::parse("LNAM_REFS=ON,ADD_SOUNDG_DEPTH=ON,SPLIT_MULTIPOINT=ON");
    let mut dataset = GeoJsonDriver.open(Path::new(CELL_A), &options)?;
    let layer = dataset.layer_by_name("SOUNDG").expect("SOUNDG layer");

    let mut depths = Vec::new();
    while let Some(feature) = layer.next_feature()? {
        assert_eq!(
            feature.geometry.as_ref().map(|g| g.geometry_type().flatten()),
            Some(GeometryType::POINT)
        );
        depths.push(feature.field("DEPTH").cloned());
    }
    assert_eq!(
        depths,
        vec![
            Some(FieldValue::Real(12.5)),
            Some(FieldValue::Real(7.1)),
            Some(FieldValue::Real(3.2)),
        ]
    );
    Ok(())
}

/// Test a missing file surfaces the path in the error
#[test]
fn test_open_missing_file() {
    let err = GeoJsonDriver
        .open(Path::new("tests/e2e_data/missing.geojson"), &OpenOptions::new())
        .err()
        .expect("open should fail");
    assert!(err.to_string().contains("missing.geojson"));
}

/// Test writing a layer and reading it back
#[test]
fn test_write_and_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("out_DEPARE_poly.geojson");

    let mut writer = GeoJsonDriver.create(&path)?;
    let layer = writer.create_layer(
        "DEPARE",
        &SpatialRef::wgs84(),
        Some(GeometryType::POLYGON),
        &LayerOptions::parse("ENCODING=UTF-8"),
    )?;
    layer.create_field(&FieldDefn::new("DRVAL1", FieldType::Real))?;
    layer.create_field(&FieldDefn::new("OBJNAM", FieldType::String).with_width(10))?;
    layer.create_feature(
        Feature::new()
            .with_fid(9)
            .with_attribute("DRVAL1", FieldValue::Real(2.5))
            .with_attribute("OBJNAM", FieldValue::String("Reef".into())),
    )?;
    assert!(
        layer
            .create_field(&FieldDefn::new("LATE", FieldType::Integer))
            .is_err()
    );
    writer.close()?;

    assert!(GeoJsonDriver.exists(&path));
    let mut dataset = GeoJsonDriver.open(&path, &OpenOptions::new())?;
    let layer = dataset.layer_by_name("DEPARE").expect("DEPARE layer");
    assert_eq!(layer.geometry_type(), GeometryType::POLYGON);
    let feature = layer.next_feature()?.expect("feature");
    assert_eq!(feature.fid, Some(9));
    assert_eq!(
        feature.field("OBJNAM"),
        Some(&FieldValue::String("Reef".into()))
    );

    GeoJsonDriver.delete(&path)?;
    assert!(!GeoJsonDriver.exists(&path));
    Ok(())
}

/// Test a dataset closed without layers is still a valid empty collection
#[test]
fn test_close_without_layer() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("empty.geojson");
    GeoJsonDriver.create(&path)?.close()?;

    let dataset = GeoJsonDriver.open(&path, &OpenOptions::new())?;
    assert_eq!(dataset.layer_count(), 0);
    Ok(())
}

/// Test only one layer may be created per file
#[test]
fn test_single_layer_per_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("one.geojson");
    let mut writer = GeoJsonDriver.create(&path)?;
    writer.create_layer("A", &SpatialRef::wgs84(), None, &LayerOptions::new())?;
    let err = writer
        .create_layer("B", &SpatialRef::wgs84(), None, &LayerOptions::new())
        .err()
        .expect("second layer should fail");
    assert!(err.to_string().contains("one layer per file"));
    writer.close()?;
    Ok(())
}

/// Test a non UTF-8 encoding request is tolerated and empty layers survive
#[test]
fn test_non_utf8_encoding_is_tolerated() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("latin.geojson");
    let mut writer = GeoJsonDriver.create(&path)?;
    writer.create_layer(
        "COALNE",
        &SpatialRef::wgs84(),
        None,
        &LayerOptions::parse("ENCODING=ISO-8859-1"),
    )?;
    writer.close()?;
    assert_eq!(
        GeoJsonDriver
            .open(&path, &OpenOptions::new())?
            .layer_count(),
        1
    );
    Ok(())
}
