//! Antimeridian-aware longitude renormalization.
//!
//! Charts crossing the 180th meridian are moved into one continuous
//! `[0, 360]` longitude domain. Values already in the domain are left alone,
//! so shifting is idempotent.

use chartmerge_core_common::Geometry;

/// Maps a longitude into the `[0, 360]` domain.
#[must_use]
pub fn shift_longitude(x: f64) -> f64 {
    if x < 0.0 {
        x + 360.0
    } else if x > 360.0 {
        x - 360.0
    } else {
        x
    }
}

/// Shifts every vertex of `geometry` in place.
///
/// Containers are walked depth-first in child order. Only x changes; y, z and
/// vertex order are preserved.
pub fn shift_geometry(geometry: &mut Geometry) {
    match geometry {
        Geometry::Leaf { coords, .. } => {
            for coord in coords {
                coord.x = shift_longitude(coord.x);
            }
        },
        Geometry::Container { children, .. } => {
            for child in children {
                shift_geometry(child);
            }
        },
    }
}

/// Shifts an optional geometry; absent geometries are left as they are.
pub fn shift_optional(geometry: Option<&mut Geometry>) {
    if let Some(geometry) = geometry {
        shift_geometry(geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartmerge_core_common::{Coord, GeometryType};

    #[test]
    fn test_shift_longitude_examples() {
        assert_eq!(shift_longitude(-10.0), 350.0);
        assert_eq!(shift_longitude(370.0), 10.0);
        assert_eq!(shift_longitude(180.0), 180.0);
        assert_eq!(shift_longitude(0.0), 0.0);
        assert_eq!(shift_longitude(360.0), 360.0);
    }

    #[test]
    fn test_shift_longitude_is_idempotent() {
        for x in [-359.5, -180.0, -0.5, 0.0, 12.25, 179.9, 360.0, 400.0, 719.0] {
            let once = shift_longitude(x);
            assert_eq!(shift_longitude(once), once, "x = {x}");
        }
    }

    #[test]
    fn test_nested_collection_is_fully_traversed() {
        let mut geometry = Geometry::collection(vec![Geometry::collection(vec![
            Geometry::line_string(vec![Coord::xy(-5.0, 0.0), Coord::xy(365.0, 0.0)]),
        ])]);
        shift_geometry(&mut geometry);
        let expected = Geometry::collection(vec![Geometry::collection(vec![
            Geometry::line_string(vec![Coord::xy(355.0, 0.0), Coord::xy(5.0, 0.0)]),
        ])]);
        assert_eq!(geometry, expected);
    }

    #[test]
    fn test_multipolygon_rings_shift() {
        let mut geometry = Geometry::multi_polygon(vec![vec![vec![
            Coord::xy(179.0, -40.0),
            Coord::xy(-179.0, -40.0),
            Coord::xy(-179.0, -41.0),
            Coord::xy(179.0, -40.0),
        ]]]);
        shift_geometry(&mut geometry);
        let mut xs = Vec::new();
        geometry.for_each_coord(&mut |c| xs.push(c.x));
        assert_eq!(xs, vec![179.0, 181.0, 181.0, 179.0]);
        assert_eq!(geometry.geometry_type(), GeometryType::MULTI_POLYGON);
    }

    #[test]
    fn test_z_and_y_untouched() {
        let mut geometry = Geometry::multi_point(vec![
            Coord::xyz(-170.0, -41.5, 12.5),
            Coord::xyz(10.0, 42.0, -3.0),
        ]);
        shift_geometry(&mut geometry);
        assert_eq!(
            geometry,
            Geometry::multi_point(vec![
                Coord::xyz(190.0, -41.5, 12.5),
                Coord::xyz(10.0, 42.0, -3.0),
            ])
        );
    }

    #[test]
    fn test_empty_and_absent_are_noops() {
        let mut empty = Geometry::line_string(Vec::new());
        shift_geometry(&mut empty);
        assert_eq!(empty.vertex_count(), 0);

        shift_optional(None);
        let mut point = Geometry::point(Coord::xy(-1.0, 0.0));
        shift_optional(Some(&mut point));
        assert_eq!(point, Geometry::point(Coord::xy(359.0, 0.0)));
    }
}
