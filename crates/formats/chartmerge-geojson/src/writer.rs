//! Streaming `GeoJSON` FeatureCollection writer.
//!
//! The collection header (name, CRS, schema) is written lazily with the first
//! feature, so fields may be declared until then. Each feature is fully
//! serialized before any byte of it reaches the sink; a feature that cannot
//! be represented leaves the output untouched.

use std::io::Write;

use chartmerge_core_common::{Feature, FieldDefn, FieldValue, GeometryType, SpatialRef};
use chartmerge_shared::{VectorFormatError, VectorFormatResult};
use geojson::{JsonObject, JsonValue, Value};
use serde_json::json;

use crate::geometry::to_geojson;
use crate::parser::{GEOMETRY_TYPE_MEMBER, SCHEMA_MEMBER};

/// Options for `GeoJSON` writing
#[derive(Debug, Clone, Default)]
pub struct GeoJsonWriterOptions {
    /// Number of decimals kept for ordinates (default: all)
    pub coordinate_precision: Option<u32>,
    /// Whether to omit the `"schema"` member (default: false)
    pub omit_schema: bool,
}

impl GeoJsonWriterOptions {
    /// Create new writer options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of decimals kept for ordinates
    #[must_use]
    pub fn with_coordinate_precision(mut self, precision: u32) -> Self {
        self.coordinate_precision = Some(precision);
        self
    }

    /// Set whether to omit the `"schema"` member
    #[must_use]
    pub fn with_omit_schema(mut self, omit: bool) -> Self {
        self.omit_schema = omit;
        self
    }
}

/// Writes one layer as a FeatureCollection.
#[derive(Debug)]
pub struct FeatureCollectionWriter<W: Write> {
    sink: W,
    name: String,
    spatial_ref: SpatialRef,
    geometry_type: Option<GeometryType>,
    fields: Vec<FieldDefn>,
    options: GeoJsonWriterOptions,
    header_written: bool,
    features_written: u64,
}

impl<W: Write> FeatureCollectionWriter<W> {
    pub fn new(
        sink: W,
        name: impl Into<String>,
        spatial_ref: SpatialRef,
        geometry_type: Option<GeometryType>,
        options: GeoJsonWriterOptions,
    ) -> Self {
        Self {
            sink,
            name: name.into(),
            spatial_ref,
            geometry_type,
            fields: Vec::new(),
            options,
            header_written: false,
            features_written: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDefn] {
        &self.fields
    }

    #[must_use]
    pub fn features_written(&self) -> u64 {
        self.features_written
    }

    /// Declares a field.
    ///
    /// # Errors
    ///
    /// Fails when the name is already declared or features were already written.
    pub fn add_field(&mut self, field: FieldDefn) -> VectorFormatResult<()> {
        if self.header_written {
            return Err(self.schema_error(format!(
                "cannot add field '{}' after features were written",
                field.name
            )));
        }
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(self.schema_error(format!("field '{}' already exists", field.name)));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Serializes and appends a feature.
    ///
    /// # Errors
    ///
    /// Returns a geometry error when the geometry cannot be written, and an
    /// I/O error when the sink fails.
    pub fn write_feature(&mut self, feature: &Feature) -> VectorFormatResult<()> {
        let encoded = self.encode_feature(feature)?;
        self.write_header()?;
        let separator = if self.features_written == 0 { "\n" } else { ",\n" };
        self.sink
            .write_all(separator.as_bytes())
            .and_then(|()| self.sink.write_all(encoded.as_bytes()))
            .map_err(|err| VectorFormatError::io(err, self.name.clone()))?;
        self.features_written += 1;
        Ok(())
    }

    /// Closes the collection and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn finish(mut self) -> VectorFormatResult<W> {
        self.write_header()?;
        self.sink
            .write_all(b"\n]}\n")
            .and_then(|()| self.sink.flush())
            .map_err(|err| VectorFormatError::io(err, self.name.clone()))?;
        Ok(self.sink)
    }

    fn schema_error(&self, message: String) -> VectorFormatError {
        VectorFormatError::Schema {
            message,
            context: Some(format!("layer {}", self.name)),
        }
    }

    fn write_header(&mut self) -> VectorFormatResult<()> {
        if self.header_written {
            return Ok(());
        }
        let mut header = JsonObject::new();
        header.insert("type".into(), json!("FeatureCollection"));
        header.insert("name".into(), json!(self.name));
        header.insert(
            "crs".into(),
            json!({"type": "name", "properties": {"name": self.spatial_ref.urn()}}),
        );
        if !self.options.omit_schema {
            let fields: Vec<JsonValue> = self
                .fields
                .iter()
                .map(|f| {
                    json!({
                        "name": f.name,
                        "type": f.field_type.as_str(),
                        "width": f.width,
                        "precision": f.precision,
                    })
                })
                .collect();
            let mut schema = JsonObject::new();
            schema.insert(self.name.clone(), JsonValue::Array(fields));
            header.insert(SCHEMA_MEMBER.into(), JsonValue::Object(schema));
        }
        if let Some(geometry_type) = self.geometry_type {
            header.insert(
                GEOMETRY_TYPE_MEMBER.into(),
                json!(geometry_type.to_string()),
            );
        }

        // Reopen the object so features stream into the array.
        let mut text = serde_json::to_string(&JsonValue::Object(header)).map_err(|err| {
            VectorFormatError::Schema {
                message: err.to_string(),
                context: Some(format!("layer {}", self.name)),
            }
        })?;
        text.pop();
        text.push_str(",\"features\":[");
        self.sink
            .write_all(text.as_bytes())
            .map_err(|err| VectorFormatError::io(err, self.name.clone()))?;
        self.header_written = true;
        Ok(())
    }

    fn encode_feature(&self, feature: &Feature) -> VectorFormatResult<String> {
        let geometry = match &feature.geometry {
            Some(geometry) => {
                let mut value = to_geojson(geometry)?;
                if let Some(precision) = self.options.coordinate_precision {
                    round_value(&mut value, precision);
                }
                Some(geojson::Geometry::new(value))
            },
            None => None,
        };
        let properties: JsonObject = self
            .fields
            .iter()
            .map(|f| {
                let value = feature.field(&f.name).map_or(JsonValue::Null, value_to_json);
                (f.name.clone(), value)
            })
            .collect();
        let encoded = geojson::Feature {
            bbox: None,
            geometry,
            id: feature
                .fid
                .map(|fid| geojson::feature::Id::Number(fid.into())),
            properties: Some(properties),
            foreign_members: None,
        };
        serde_json::to_string(&encoded).map_err(|err| VectorFormatError::Geometry {
            message: err.to_string(),
        })
    }
}

/// Converts an attribute value to JSON. Binary values become upper-case hex.
#[must_use]
pub fn value_to_json(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Null => JsonValue::Null,
        FieldValue::Integer(v) => json!(v),
        FieldValue::Integer64(v) => json!(v),
        FieldValue::Real(v) => real_to_json(*v),
        FieldValue::String(v)
        | FieldValue::Date(v)
        | FieldValue::Time(v)
        | FieldValue::DateTime(v) => json!(v),
        FieldValue::IntegerList(v) => json!(v),
        FieldValue::Integer64List(v) => json!(v),
        FieldValue::RealList(v) => JsonValue::Array(v.iter().copied().map(real_to_json).collect()),
        FieldValue::StringList(v) => json!(v),
        FieldValue::Binary(bytes) => {
            JsonValue::String(bytes.iter().map(|b| format!("{b:02X}")).collect())
        },
    }
}

// Non-finite reals have no JSON representation.
fn real_to_json(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

fn round_value(value: &mut Value, precision: u32) {
    let factor = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    let round = |position: &mut Vec<f64>| {
        for ordinate in position.iter_mut() {
            *ordinate = (*ordinate * factor).round() / factor;
        }
    };
    match value {
        Value::Point(p) => round(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter_mut().for_each(round),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter_mut().flatten().for_each(round);
        },
        Value::MultiPolygon(polygons) => polygons.iter_mut().flatten().flatten().for_each(round),
        Value::GeometryCollection(members) => {
            for member in members {
                round_value(&mut member.value, precision);
            }
        },
    }
}
