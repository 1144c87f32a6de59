//! Geometry model shared by the stores and the merge engine.
//!
//! A [`Geometry`] is either a leaf holding an ordered vertex sequence or a
//! container holding child geometries. Polygons are containers of linear-ring
//! leaves, multi-polygons are containers of polygons, and collections nest
//! freely, so every consumer only ever has to match on two shapes.

use std::fmt;

/// Concrete geometry type code, using the OGR / WKB numbering.
///
/// Elevation is carried either as the legacy 2.5D flag bit (`0x8000_0000`) or
/// as the ISO `+1000` (Z), `+2000` (M), `+3000` (ZM) offsets. [`flatten`]
/// removes both encodings.
///
/// [`flatten`]: GeometryType::flatten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryType(u32);

impl GeometryType {
    pub const UNKNOWN: Self = Self(0);
    pub const POINT: Self = Self(1);
    pub const LINE_STRING: Self = Self(2);
    pub const POLYGON: Self = Self(3);
    pub const MULTI_POINT: Self = Self(4);
    pub const MULTI_LINE_STRING: Self = Self(5);
    pub const MULTI_POLYGON: Self = Self(6);
    pub const GEOMETRY_COLLECTION: Self = Self(7);
    pub const NONE: Self = Self(100);
    pub const LINEAR_RING: Self = Self(101);

    /// Legacy 2.5D flag bit.
    pub const Z_FLAG: u32 = 0x8000_0000;

    /// Wraps a raw WKB geometry type code.
    #[must_use]
    pub const fn from_wkb_code(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw WKB geometry type code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Strips the elevation/measure encoding, leaving the 2D type.
    #[must_use]
    pub const fn flatten(self) -> Self {
        let code = self.0 & !Self::Z_FLAG;
        if code >= 1000 && code < 4000 {
            Self(code % 1000)
        } else {
            Self(code)
        }
    }

    /// Returns the same type tagged with the 2.5D flag.
    #[must_use]
    pub const fn with_z(self) -> Self {
        Self(self.flatten().0 | Self::Z_FLAG)
    }

    /// Whether the type carries elevation.
    #[must_use]
    pub const fn has_z(self) -> bool {
        let code = self.0;
        code & Self::Z_FLAG != 0
            || (code >= 1000 && code < 2000)
            || (code >= 3000 && code < 4000)
    }

    /// Name of the flattened type, as used in logs and GeoJSON schemas.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self.flatten() {
            Self::POINT => "Point",
            Self::LINE_STRING => "LineString",
            Self::POLYGON => "Polygon",
            Self::MULTI_POINT => "MultiPoint",
            Self::MULTI_LINE_STRING => "MultiLineString",
            Self::MULTI_POLYGON => "MultiPolygon",
            Self::GEOMETRY_COLLECTION => "GeometryCollection",
            Self::NONE => "None",
            Self::LINEAR_RING => "LinearRing",
            Self::UNKNOWN => "Unknown",
            _ => "Unrecognized",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_z() {
            write!(f, "{} Z", self.name())
        } else {
            f.write_str(self.name())
        }
    }
}

/// A single vertex. `z` is absent for 2D data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    #[must_use]
    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    #[must_use]
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// Recursive geometry: a vertex sequence or a container of geometries.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Leaf {
        geometry_type: GeometryType,
        coords: Vec<Coord>,
    },
    Container {
        geometry_type: GeometryType,
        children: Vec<Geometry>,
    },
}

impl Geometry {
    /// Builds a point.
    #[must_use]
    pub fn point(coord: Coord) -> Self {
        Self::leaf(GeometryType::POINT, vec![coord])
    }

    /// Builds a line string.
    #[must_use]
    pub fn line_string(coords: Vec<Coord>) -> Self {
        Self::leaf(GeometryType::LINE_STRING, coords)
    }

    /// Builds a linear ring, the leaf type that polygons are made of.
    #[must_use]
    pub fn linear_ring(coords: Vec<Coord>) -> Self {
        Self::leaf(GeometryType::LINEAR_RING, coords)
    }

    /// Builds a polygon from its rings, exterior first.
    #[must_use]
    pub fn polygon(rings: Vec<Vec<Coord>>) -> Self {
        let children = rings.into_iter().map(Self::linear_ring).collect();
        Self::container(GeometryType::POLYGON, children)
    }

    #[must_use]
    pub fn multi_point(points: Vec<Coord>) -> Self {
        let children = points.into_iter().map(Self::point).collect();
        Self::container(GeometryType::MULTI_POINT, children)
    }

    #[must_use]
    pub fn multi_line_string(lines: Vec<Vec<Coord>>) -> Self {
        let children = lines.into_iter().map(Self::line_string).collect();
        Self::container(GeometryType::MULTI_LINE_STRING, children)
    }

    #[must_use]
    pub fn multi_polygon(polygons: Vec<Vec<Vec<Coord>>>) -> Self {
        let children = polygons.into_iter().map(Self::polygon).collect();
        Self::container(GeometryType::MULTI_POLYGON, children)
    }

    #[must_use]
    pub fn collection(children: Vec<Geometry>) -> Self {
        Self::container(GeometryType::GEOMETRY_COLLECTION, children)
    }

    /// Builds a leaf, tagging the type with 2.5D when any vertex has z.
    #[must_use]
    pub fn leaf(geometry_type: GeometryType, coords: Vec<Coord>) -> Self {
        let geometry_type = if coords.iter().any(|c| c.z.is_some()) {
            geometry_type.with_z()
        } else {
            geometry_type
        };
        Self::Leaf {
            geometry_type,
            coords,
        }
    }

    /// Builds a container, tagging the type with 2.5D when any child has z.
    #[must_use]
    pub fn container(geometry_type: GeometryType, children: Vec<Geometry>) -> Self {
        let geometry_type = if children.iter().any(|c| c.geometry_type().has_z()) {
            geometry_type.with_z()
        } else {
            geometry_type
        };
        Self::Container {
            geometry_type,
            children,
        }
    }

    /// Concrete type of this geometry.
    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Leaf { geometry_type, .. } | Self::Container { geometry_type, .. } => {
                *geometry_type
            },
        }
    }

    /// Total number of vertices across all leaves.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Leaf { coords, .. } => coords.len(),
            Self::Container { children, .. } => children.iter().map(Self::vertex_count).sum(),
        }
    }

    /// Visits every vertex depth-first in child order.
    pub fn for_each_coord(&self, f: &mut impl FnMut(&Coord)) {
        match self {
            Self::Leaf { coords, .. } => coords.iter().for_each(f),
            Self::Container { children, .. } => {
                for child in children {
                    child.for_each_coord(f);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_strips_legacy_z_flag() {
        let point_z = GeometryType::POINT.with_z();
        assert_eq!(point_z.code(), 0x8000_0001);
        assert!(point_z.has_z());
        assert_eq!(point_z.flatten(), GeometryType::POINT);
    }

    #[test]
    fn test_flatten_strips_iso_offsets() {
        assert_eq!(
            GeometryType::from_wkb_code(1003).flatten(),
            GeometryType::POLYGON
        );
        assert_eq!(
            GeometryType::from_wkb_code(2002).flatten(),
            GeometryType::LINE_STRING
        );
        assert_eq!(
            GeometryType::from_wkb_code(3006).flatten(),
            GeometryType::MULTI_POLYGON
        );
        assert!(GeometryType::from_wkb_code(1001).has_z());
        assert!(!GeometryType::from_wkb_code(2001).has_z());
    }

    #[test]
    fn test_display_includes_elevation() {
        assert_eq!(GeometryType::MULTI_POLYGON.to_string(), "MultiPolygon");
        assert_eq!(GeometryType::POINT.with_z().to_string(), "Point Z");
    }

    #[test]
    fn test_leaf_with_z_coords_is_tagged() {
        let geom = Geometry::point(Coord::xyz(1.0, 2.0, 3.0));
        assert!(geom.geometry_type().has_z());

        let multi = Geometry::multi_point(vec![Coord::xy(0.0, 0.0), Coord::xyz(1.0, 1.0, 5.0)]);
        assert_eq!(multi.geometry_type(), GeometryType::MULTI_POINT.with_z());
    }

    #[test]
    fn test_polygon_is_container_of_rings() {
        let polygon = Geometry::polygon(vec![vec![
            Coord::xy(0.0, 0.0),
            Coord::xy(1.0, 0.0),
            Coord::xy(1.0, 1.0),
            Coord::xy(0.0, 0.0),
        ]]);
        match &polygon {
            Geometry::Container { children, .. } => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].geometry_type(), GeometryType::LINEAR_RING);
            },
            Geometry::Leaf { .. } => panic!("polygon should be a container"),
        }
        assert_eq!(polygon.vertex_count(), 4);
    }

    #[test]
    fn test_for_each_coord_visits_in_order() {
        let geom = Geometry::collection(vec![
            Geometry::point(Coord::xy(1.0, 0.0)),
            Geometry::multi_line_string(vec![vec![Coord::xy(2.0, 0.0), Coord::xy(3.0, 0.0)]]),
        ]);
        let mut xs = Vec::new();
        geom.for_each_coord(&mut |c| xs.push(c.x));
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }
}
