//! Conversion between `GeoJSON` geometry values and the chart geometry model.

use chartmerge_core_common::{Coord, Geometry, GeometryType};
use chartmerge_shared::{VectorFormatError, VectorFormatResult};
use geojson::{Position, Value};

/// Converts a `GeoJSON` geometry value, keeping z where positions carry it.
pub fn from_geojson(value: &Value) -> VectorFormatResult<Geometry> {
    let geometry = match value {
        Value::Point(position) => Geometry::point(coord(position)?),
        Value::MultiPoint(positions) => Geometry::multi_point(coords(positions)?),
        Value::LineString(positions) => Geometry::line_string(coords(positions)?),
        Value::MultiLineString(lines) => Geometry::multi_line_string(
            lines
                .iter()
                .map(|line| coords(line))
                .collect::<VectorFormatResult<_>>()?,
        ),
        Value::Polygon(rings) => Geometry::polygon(rings_of(rings)?),
        Value::MultiPolygon(polygons) => Geometry::multi_polygon(
            polygons
                .iter()
                .map(|rings| rings_of(rings))
                .collect::<VectorFormatResult<_>>()?,
        ),
        Value::GeometryCollection(members) => Geometry::collection(
            members
                .iter()
                .map(|member| from_geojson(&member.value))
                .collect::<VectorFormatResult<_>>()?,
        ),
    };
    Ok(geometry)
}

/// Converts a chart geometry into a `GeoJSON` geometry value.
///
/// The container/leaf structure must match the declared type: a polygon's
/// children must be ring leaves, a multi-polygon's children polygons, and so
/// on. Linear rings outside a polygon are written as line strings.
pub fn to_geojson(geometry: &Geometry) -> VectorFormatResult<Value> {
    let geometry_type = geometry.geometry_type().flatten();
    let value = match geometry_type {
        GeometryType::POINT => {
            let points = leaf_coords(geometry)?;
            match points {
                [single] => Value::Point(position(single)),
                _ => {
                    return Err(structure_error(format!(
                        "point has {} vertices",
                        points.len()
                    )));
                },
            }
        },
        GeometryType::LINE_STRING | GeometryType::LINEAR_RING => {
            Value::LineString(positions(leaf_coords(geometry)?))
        },
        GeometryType::POLYGON => Value::Polygon(polygon_rings(geometry)?),
        GeometryType::MULTI_POINT => Value::MultiPoint(
            children(geometry)?
                .iter()
                .map(|child| match leaf_coords(child)? {
                    [single] => Ok(position(single)),
                    _ => Err(structure_error("multipoint member is not a single point")),
                })
                .collect::<VectorFormatResult<_>>()?,
        ),
        GeometryType::MULTI_LINE_STRING => Value::MultiLineString(
            children(geometry)?
                .iter()
                .map(|child| leaf_coords(child).map(positions))
                .collect::<VectorFormatResult<_>>()?,
        ),
        GeometryType::MULTI_POLYGON => Value::MultiPolygon(
            children(geometry)?
                .iter()
                .map(polygon_rings)
                .collect::<VectorFormatResult<_>>()?,
        ),
        GeometryType::GEOMETRY_COLLECTION => Value::GeometryCollection(
            children(geometry)?
                .iter()
                .map(|child| to_geojson(child).map(geojson::Geometry::new))
                .collect::<VectorFormatResult<_>>()?,
        ),
        other => {
            return Err(VectorFormatError::Geometry {
                message: format!("{other} geometries cannot be written as GeoJSON"),
            });
        },
    };
    Ok(value)
}

/// Resolves a geometry type name such as `"MultiPolygon"` or `"Point Z"`.
#[must_use]
pub fn geometry_type_from_name(name: &str) -> Option<GeometryType> {
    let trimmed = name.trim();
    let (base, has_z) = match trimmed.strip_suffix(" Z") {
        Some(base) => (base, true),
        None => (trimmed, false),
    };
    let geometry_type = [
        GeometryType::POINT,
        GeometryType::LINE_STRING,
        GeometryType::POLYGON,
        GeometryType::MULTI_POINT,
        GeometryType::MULTI_LINE_STRING,
        GeometryType::MULTI_POLYGON,
        GeometryType::GEOMETRY_COLLECTION,
        GeometryType::UNKNOWN,
    ]
    .into_iter()
    .find(|t| t.name().eq_ignore_ascii_case(base))?;
    Some(if has_z {
        geometry_type.with_z()
    } else {
        geometry_type
    })
}

fn coord(position: &Position) -> VectorFormatResult<Coord> {
    match position.as_slice() {
        [x, y] => Ok(Coord::xy(*x, *y)),
        [x, y, z, ..] => Ok(Coord::xyz(*x, *y, *z)),
        _ => Err(VectorFormatError::Geometry {
            message: format!("position has {} ordinates, expected 2 or 3", position.len()),
        }),
    }
}

fn coords(positions: &[Position]) -> VectorFormatResult<Vec<Coord>> {
    positions.iter().map(coord).collect()
}

fn rings_of(rings: &[Vec<Position>]) -> VectorFormatResult<Vec<Vec<Coord>>> {
    rings.iter().map(|ring| coords(ring)).collect()
}

fn position(coord: &Coord) -> Position {
    match coord.z {
        Some(z) => vec![coord.x, coord.y, z],
        None => vec![coord.x, coord.y],
    }
}

fn positions(coords: &[Coord]) -> Vec<Position> {
    coords.iter().map(position).collect()
}

fn structure_error(message: impl Into<String>) -> VectorFormatError {
    VectorFormatError::Geometry {
        message: message.into(),
    }
}

fn leaf_coords(geometry: &Geometry) -> VectorFormatResult<&[Coord]> {
    match geometry {
        Geometry::Leaf { coords, .. } => Ok(coords),
        Geometry::Container { geometry_type, .. } => Err(structure_error(format!(
            "expected a vertex sequence, found a {geometry_type} container"
        ))),
    }
}

fn children(geometry: &Geometry) -> VectorFormatResult<&[Geometry]> {
    match geometry {
        Geometry::Container { children, .. } => Ok(children),
        Geometry::Leaf { geometry_type, .. } => Err(structure_error(format!(
            "expected a container, found a {geometry_type} vertex sequence"
        ))),
    }
}

fn polygon_rings(polygon: &Geometry) -> VectorFormatResult<Vec<Vec<Position>>> {
    if polygon.geometry_type().flatten() != GeometryType::POLYGON {
        return Err(structure_error(format!(
            "expected a polygon, found {}",
            polygon.geometry_type()
        )));
    }
    children(polygon)?
        .iter()
        .map(|ring| leaf_coords(ring).map(positions))
        .collect()
}
