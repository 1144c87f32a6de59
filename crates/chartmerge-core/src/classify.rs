//! Generic geometry kinds and per-layer kind discovery.

use std::collections::BTreeSet;
use std::fmt;

use chartmerge_core_common::{GeometryType, Layer};
use log::debug;

use crate::error::{GeometryError, Result};

/// Coarse classification collapsing multi and 2.5D variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericKind {
    Point,
    Arc,
    Polygon,
}

impl GenericKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GenericKind::Point => "Point",
            GenericKind::Arc => "Arc",
            GenericKind::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for GenericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a concrete geometry type to its generic kind.
///
/// # Errors
///
/// Returns [`GeometryError::UnsupportedGeometryKind`] for anything other than
/// points, lines and polygons and their multi forms.
pub fn generic_kind(geometry_type: GeometryType) -> std::result::Result<GenericKind, GeometryError> {
    match geometry_type.flatten() {
        GeometryType::POINT | GeometryType::MULTI_POINT => Ok(GenericKind::Point),
        GeometryType::LINE_STRING | GeometryType::MULTI_LINE_STRING => Ok(GenericKind::Arc),
        GeometryType::POLYGON | GeometryType::MULTI_POLYGON => Ok(GenericKind::Polygon),
        _ => Err(GeometryError::UnsupportedGeometryKind {
            geometry_type: geometry_type.to_string(),
            layer: String::new(),
        }),
    }
}

/// Collects the generic kinds of every geometry in `layer`.
///
/// The read cursor is reset before and after the scan. Features without
/// geometry contribute nothing.
///
/// # Errors
///
/// Fails when reading fails or a geometry has no generic kind.
pub fn observed_kinds(layer: &mut dyn Layer) -> Result<BTreeSet<GenericKind>> {
    layer.reset_reading();
    let mut types = BTreeSet::new();
    while let Some(feature) = layer.next_feature()? {
        if let Some(geometry) = &feature.geometry {
            types.insert(geometry.geometry_type());
        }
    }
    layer.reset_reading();

    let mut kinds = BTreeSet::new();
    for geometry_type in types {
        let kind = generic_kind(geometry_type).map_err(|err| with_layer(err, layer.name()))?;
        kinds.insert(kind);
    }
    debug!("Layer '{}' holds {kinds:?}", layer.name());
    Ok(kinds)
}

/// Names the layer an unsupported geometry was found in.
pub(crate) fn with_layer(err: GeometryError, name: &str) -> GeometryError {
    match err {
        GeometryError::UnsupportedGeometryKind { geometry_type, .. } => {
            GeometryError::UnsupportedGeometryKind {
                geometry_type,
                layer: name.to_string(),
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmerge_core_common::{Coord, Feature, Geometry, MemoryLayer};

    use crate::error::ChartMergeError;

    #[test]
    fn test_generic_kind_is_total_over_supported_types() {
        let cases = [
            (GeometryType::POINT, GenericKind::Point),
            (GeometryType::MULTI_POINT, GenericKind::Point),
            (GeometryType::LINE_STRING, GenericKind::Arc),
            (GeometryType::MULTI_LINE_STRING, GenericKind::Arc),
            (GeometryType::POLYGON, GenericKind::Polygon),
            (GeometryType::MULTI_POLYGON, GenericKind::Polygon),
            (GeometryType::MULTI_POINT.with_z(), GenericKind::Point),
            (GeometryType::from_wkb_code(1003), GenericKind::Polygon),
        ];
        for (geometry_type, kind) in cases {
            assert_eq!(generic_kind(geometry_type).unwrap(), kind, "{geometry_type}");
        }
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        for geometry_type in [
            GeometryType::GEOMETRY_COLLECTION,
            GeometryType::UNKNOWN,
            GeometryType::from_wkb_code(15),
        ] {
            assert!(matches!(
                generic_kind(geometry_type),
                Err(GeometryError::UnsupportedGeometryKind { .. })
            ));
        }
    }

    #[test]
    fn test_observed_kinds_ignores_missing_geometry() {
        let mut layer = MemoryLayer::new("DEPARE")
            .with_feature(Feature::new().with_geometry(Geometry::polygon(vec![vec![
                Coord::xy(0.0, 0.0),
                Coord::xy(1.0, 0.0),
                Coord::xy(0.0, 0.0),
            ]])))
            .with_feature(Feature::new())
            .with_feature(
                Feature::new()
                    .with_geometry(Geometry::line_string(vec![Coord::xy(0.0, 0.0), Coord::xy(1.0, 1.0)])),
            )
            .with_feature(Feature::new().with_geometry(Geometry::multi_polygon(Vec::new())));

        let kinds = observed_kinds(&mut layer).unwrap();
        assert_eq!(
            kinds.into_iter().collect::<Vec<_>>(),
            vec![GenericKind::Arc, GenericKind::Polygon]
        );
        // Cursor is rewound for the next pass.
        assert!(layer.next_feature().unwrap().is_some());
    }

    #[test]
    fn test_observed_kinds_of_empty_layer() {
        let mut layer = MemoryLayer::new("M_QUAL").with_feature(Feature::new());
        assert!(observed_kinds(&mut layer).unwrap().is_empty());
    }

    #[test]
    fn test_observed_kinds_names_layer_on_failure() {
        let mut layer = MemoryLayer::new("MIXED").with_feature(
            Feature::new().with_geometry(Geometry::collection(vec![Geometry::point(Coord::xy(
                1.0, 2.0,
            ))])),
        );
        let err = observed_kinds(&mut layer).unwrap_err();
        assert!(matches!(err, ChartMergeError::Geometry(_)));
        assert!(err.to_string().contains("layer 'MIXED'"));
    }
}
