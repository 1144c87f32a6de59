//! `GeoJSON` parsing into chart layers.
//!
//! A chart document is a FeatureCollection whose features name their layer
//! through a `"layer"` foreign member. Layer schemas come from the top-level
//! `"schema"` member when present and are otherwise inferred from the
//! property values. Open options reproduce the S-57 reader switches that
//! matter for merged products.

use std::collections::HashMap;

use chartmerge_core_common::{
    Feature, FieldDefn, FieldType, FieldValue, Geometry, GeometryType, OpenOptions, SpatialRef,
};
use chartmerge_shared::{SourcePosition, VectorFormatError, VectorFormatResult};
use geojson::{GeoJson, JsonObject, JsonValue};

use crate::geometry::{from_geojson, geometry_type_from_name};

/// Feature member naming the layer a feature belongs to.
pub const LAYER_MEMBER: &str = "layer";
/// Top-level member mapping layer names to field definitions.
pub const SCHEMA_MEMBER: &str = "schema";
/// Top-level member carrying a geometry type hint for the named layer.
pub const GEOMETRY_TYPE_MEMBER: &str = "geometry_type";

/// Layer name of sounding features.
const SOUNDING_LAYER: &str = "SOUNDG";
/// Field added to split soundings.
const DEPTH_FIELD: &str = "DEPTH";
/// Fields only present when linkage references are requested.
const LINKAGE_FIELDS: [&str; 2] = ["LNAM_REFS", "FFPT_RIND"];

/// A parsed layer with materialized features.
#[derive(Debug, Clone)]
pub struct ParsedLayer {
    pub name: String,
    pub fields: Vec<FieldDefn>,
    pub geometry_type: GeometryType,
    pub features: Vec<Feature>,
}

/// A parsed chart document.
#[derive(Debug, Clone)]
pub struct ParsedDataset {
    pub spatial_ref: SpatialRef,
    pub layers: Vec<ParsedLayer>,
}

/// Intermediate feature before schema resolution.
struct RawFeature {
    fid: Option<u64>,
    properties: JsonObject,
    geometry: Option<Geometry>,
}

/// Parse raw bytes into chart layers.
///
/// # Arguments
///
/// * `bytes` - The `GeoJSON` document
/// * `default_layer` - Layer for features without a `"layer"` member when the
///   document has no `"name"` either
/// * `options` - Open options (`SPLIT_MULTIPOINT`, `ADD_SOUNDG_DEPTH`, `LNAM_REFS`)
/// * `context` - Description of the source, used in error messages
pub fn parse_dataset(
    bytes: &[u8],
    default_layer: &str,
    options: &OpenOptions,
    context: impl Into<String>,
) -> VectorFormatResult<ParsedDataset> {
    let context = context.into();
    let json: JsonValue =
        serde_json::from_slice(bytes).map_err(|err| VectorFormatError::Parse {
            message: err.to_string(),
            position: Some(SourcePosition {
                line: Some(err.line() as u64),
                column: Some(err.column() as u64),
                ..SourcePosition::default()
            }),
            context: Some(context.clone()),
        })?;
    let geojson = GeoJson::from_json_value(json).map_err(|err| VectorFormatError::Parse {
        message: err.to_string(),
        position: None,
        context: Some(context.clone()),
    })?;

    let (features, members) = match geojson {
        GeoJson::FeatureCollection(collection) => (
            collection.features,
            collection.foreign_members.unwrap_or_default(),
        ),
        GeoJson::Feature(feature) => (vec![feature], JsonObject::new()),
        GeoJson::Geometry(geometry) => (
            vec![geojson::Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            JsonObject::new(),
        ),
    };

    let spatial_ref = parse_crs(&members);
    let document_layer = members
        .get("name")
        .and_then(JsonValue::as_str)
        .unwrap_or(default_layer)
        .to_string();
    let declared = parse_schema(&members, &context)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<RawFeature>> = HashMap::new();
    for (index, feature) in features.into_iter().enumerate() {
        let layer = feature
            .foreign_members
            .as_ref()
            .and_then(|m| m.get(LAYER_MEMBER))
            .and_then(JsonValue::as_str)
            .unwrap_or(document_layer.as_str())
            .to_string();
        let geometry = match &feature.geometry {
            Some(geometry) => Some(from_geojson(&geometry.value).map_err(|err| {
                err.with_additional_context(format!(
                    "{context}, {}",
                    SourcePosition {
                        feature: Some(index as u64 + 1),
                        ..SourcePosition::default()
                    }
                ))
            })?),
            None => None,
        };
        let fid = match &feature.id {
            Some(geojson::feature::Id::Number(n)) => n.as_u64(),
            _ => None,
        };
        if !grouped.contains_key(&layer) {
            order.push(layer.clone());
        }
        grouped.entry(layer).or_default().push(RawFeature {
            fid,
            properties: feature.properties.unwrap_or_default(),
            geometry,
        });
    }

    let geometry_type_hint = members
        .get(GEOMETRY_TYPE_MEMBER)
        .and_then(JsonValue::as_str)
        .and_then(geometry_type_from_name);

    let mut layers = Vec::with_capacity(order.len());
    for name in order {
        let raw = grouped.remove(&name).unwrap_or_default();
        let fields = match declared.iter().find(|(declared, _)| *declared == name) {
            Some((_, fields)) => fields.clone(),
            None => infer_fields(&raw),
        };
        let geometry_type = if name == document_layer {
            geometry_type_hint.unwrap_or(GeometryType::UNKNOWN)
        } else {
            GeometryType::UNKNOWN
        };
        let features = raw
            .into_iter()
            .map(|r| Feature {
                fid: r.fid,
                attributes: fields
                    .iter()
                    .map(|f| {
                        let value = r
                            .properties
                            .get(&f.name)
                            .map_or(FieldValue::Null, |v| json_to_value(v, f.field_type));
                        (f.name.clone(), value)
                    })
                    .collect(),
                geometry: r.geometry,
            })
            .collect();
        let mut layer = ParsedLayer {
            name,
            fields,
            geometry_type,
            features,
        };
        apply_open_options(&mut layer, options);
        assign_missing_fids(&mut layer.features);
        layers.push(layer);
    }

    // Declared layers without features still exist, with an empty feature list.
    for (name, fields) in declared {
        if layers.iter().all(|l| l.name != name) {
            layers.push(ParsedLayer {
                name,
                fields,
                geometry_type: GeometryType::UNKNOWN,
                features: Vec::new(),
            });
        }
    }

    Ok(ParsedDataset {
        spatial_ref,
        layers,
    })
}

fn parse_crs(members: &JsonObject) -> SpatialRef {
    members
        .get("crs")
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str)
        .map_or_else(SpatialRef::wgs84, SpatialRef::parse)
}

fn parse_schema(
    members: &JsonObject,
    context: &str,
) -> VectorFormatResult<Vec<(String, Vec<FieldDefn>)>> {
    let Some(schema) = members.get(SCHEMA_MEMBER) else {
        return Ok(Vec::new());
    };
    let schema_error = |message: String| VectorFormatError::Schema {
        message,
        context: Some(context.to_string()),
    };
    let layers = schema
        .as_object()
        .ok_or_else(|| schema_error("\"schema\" must be an object keyed by layer".to_string()))?;

    let mut declared = Vec::with_capacity(layers.len());
    for (layer, fields) in layers {
        let fields = fields.as_array().ok_or_else(|| {
            schema_error(format!("fields of layer '{layer}' must be an array"))
        })?;
        let mut defns = Vec::with_capacity(fields.len());
        for field in fields {
            let name = field
                .get("name")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| schema_error(format!("field without a name in layer '{layer}'")))?;
            let field_type = field
                .get("type")
                .and_then(JsonValue::as_str)
                .unwrap_or("String")
                .parse::<FieldType>()
                .map_err(|err| schema_error(format!("{err} for field '{name}' in layer '{layer}'")))?;
            let width = field.get("width").and_then(JsonValue::as_u64).unwrap_or(0);
            let precision = field
                .get("precision")
                .and_then(JsonValue::as_u64)
                .unwrap_or(0);
            defns.push(
                FieldDefn::new(name, field_type)
                    .with_width(u32::try_from(width).unwrap_or(u32::MAX))
                    .with_precision(u32::try_from(precision).unwrap_or(u32::MAX)),
            );
        }
        declared.push((layer.clone(), defns));
    }
    Ok(declared)
}

fn infer_fields(features: &[RawFeature]) -> Vec<FieldDefn> {
    let mut fields: Vec<FieldDefn> = Vec::new();
    for feature in features {
        for (name, value) in &feature.properties {
            let Some(inferred) = infer_type(value) else {
                continue;
            };
            match fields.iter_mut().find(|f| f.name == *name) {
                Some(existing) => existing.field_type = widen(existing.field_type, inferred),
                None => fields.push(FieldDefn::new(name.clone(), inferred)),
            }
        }
    }
    fields
}

fn infer_type(value: &JsonValue) -> Option<FieldType> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(_) => Some(FieldType::Integer),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => {
            let fits = n.as_i64().is_some_and(|i| i32::try_from(i).is_ok());
            Some(if fits {
                FieldType::Integer
            } else {
                FieldType::Integer64
            })
        },
        JsonValue::Number(_) => Some(FieldType::Real),
        JsonValue::String(_) | JsonValue::Object(_) => Some(FieldType::String),
        JsonValue::Array(items) => {
            let element = items
                .iter()
                .filter_map(infer_type)
                .reduce(widen)
                .unwrap_or(FieldType::String);
            Some(match element {
                FieldType::Integer => FieldType::IntegerList,
                FieldType::Integer64 => FieldType::Integer64List,
                FieldType::Real => FieldType::RealList,
                _ => FieldType::StringList,
            })
        },
    }
}

fn widen(a: FieldType, b: FieldType) -> FieldType {
    use FieldType::{Integer, Integer64, Integer64List, IntegerList, Real, RealList, StringList};
    match (a, b) {
        _ if a == b => a,
        (Integer, Integer64) | (Integer64, Integer) => Integer64,
        (Integer | Integer64 | Real, Integer | Integer64 | Real) => Real,
        (IntegerList, Integer64List) | (Integer64List, IntegerList) => Integer64List,
        (
            IntegerList | Integer64List | RealList,
            IntegerList | Integer64List | RealList,
        ) => RealList,
        (StringList, _) | (_, StringList) if a.is_list_or_binary() && b.is_list_or_binary() => {
            StringList
        },
        _ => FieldType::String,
    }
}

/// Converts a JSON property into a value of the declared field type.
pub(crate) fn json_to_value(value: &JsonValue, field_type: FieldType) -> FieldValue {
    if value.is_null() {
        return FieldValue::Null;
    }
    let scalar = match value {
        JsonValue::Bool(b) => FieldValue::Integer(i32::from(*b)),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => FieldValue::Integer64(i),
            (None, Some(f)) => FieldValue::Real(f),
            (None, None) => FieldValue::String(n.to_string()),
        },
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Array(items) => match field_type {
            FieldType::IntegerList => FieldValue::IntegerList(
                items
                    .iter()
                    .filter_map(JsonValue::as_i64)
                    .filter_map(|i| i32::try_from(i).ok())
                    .collect(),
            ),
            FieldType::Integer64List => {
                FieldValue::Integer64List(items.iter().filter_map(JsonValue::as_i64).collect())
            },
            FieldType::RealList => {
                FieldValue::RealList(items.iter().filter_map(JsonValue::as_f64).collect())
            },
            _ => FieldValue::StringList(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
        },
        JsonValue::Object(_) => FieldValue::String(value.to_string()),
        JsonValue::Null => FieldValue::Null,
    };
    if field_type == FieldType::Binary {
        if let FieldValue::String(hex) = &scalar {
            if let Some(bytes) = decode_hex(hex) {
                return FieldValue::Binary(bytes);
            }
        }
    }
    scalar.coerce_to(field_type).unwrap_or(FieldValue::Null)
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}

fn apply_open_options(layer: &mut ParsedLayer, options: &OpenOptions) {
    if !options.flag("LNAM_REFS", true) {
        layer
            .fields
            .retain(|f| !LINKAGE_FIELDS.contains(&f.name.as_str()));
        for feature in &mut layer.features {
            feature
                .attributes
                .retain(|(name, _)| !LINKAGE_FIELDS.contains(&name.as_str()));
        }
    }

    if !options.flag("SPLIT_MULTIPOINT", false) {
        return;
    }
    let add_depth = layer.name == SOUNDING_LAYER && options.flag("ADD_SOUNDG_DEPTH", false);
    if add_depth && layer.fields.iter().all(|f| f.name != DEPTH_FIELD) {
        layer.fields.push(FieldDefn::new(DEPTH_FIELD, FieldType::Real));
    }

    let mut split = Vec::with_capacity(layer.features.len());
    for feature in layer.features.drain(..) {
        let points = match &feature.geometry {
            Some(Geometry::Container {
                geometry_type,
                children,
            }) if geometry_type.flatten() == GeometryType::MULTI_POINT => children.clone(),
            _ => {
                split.push(feature);
                continue;
            },
        };
        for point in points {
            let mut part = Feature {
                fid: None,
                attributes: feature.attributes.clone(),
                geometry: None,
            };
            if add_depth {
                let depth = match &point {
                    Geometry::Leaf { coords, .. } => coords.first().and_then(|c| c.z),
                    Geometry::Container { .. } => None,
                };
                part.set_field(DEPTH_FIELD, depth.map_or(FieldValue::Null, FieldValue::Real));
            }
            part.geometry = Some(point);
            split.push(part);
        }
    }
    if add_depth {
        for feature in &mut split {
            if feature.field(DEPTH_FIELD).is_none() {
                feature.set_field(DEPTH_FIELD, FieldValue::Null);
            }
        }
    }
    layer.features = split;
}

/// Features without an id take their index in the layer.
fn assign_missing_fids(features: &mut [Feature]) {
    for (index, feature) in features.iter_mut().enumerate() {
        if feature.fid.is_none() {
            feature.fid = Some(index as u64);
        }
    }
}
