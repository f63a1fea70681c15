//! Tagged geometries from `OpenStreetMap` fetches and snapshot files.

use geo::{LineString, MultiLineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::{GeoPoint, Tags};

/// Geometry of a [`GeoRecord`].
///
/// Coordinates are (x = longitude, y = latitude).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "geometry", rename_all = "camelCase")]
pub enum RecordGeometry {
    /// A node.
    Point(Point<f64>),
    /// An open way, or a closed one without area tags.
    LineString(LineString<f64>),
    /// A multi-part line, as rail snapshots are usually exported.
    MultiLineString(MultiLineString<f64>),
    /// A closed way tagged as an area.
    Polygon(Polygon<f64>),
    /// A multipolygon relation.
    MultiPolygon(MultiPolygon<f64>),
}

impl RecordGeometry {
    /// Short name of the geometry kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Converts a general [`geo::Geometry`], returning `None` for kinds the
    /// assessment pipeline does not handle (multi-points, collections,
    /// bare lines, rects, triangles).
    #[must_use]
    pub fn from_geo(geometry: geo::Geometry<f64>) -> Option<Self> {
        match geometry {
            geo::Geometry::Point(p) => Some(Self::Point(p)),
            geo::Geometry::LineString(ls) => Some(Self::LineString(ls)),
            geo::Geometry::MultiLineString(mls) => Some(Self::MultiLineString(mls)),
            geo::Geometry::Polygon(p) => Some(Self::Polygon(p)),
            geo::Geometry::MultiPolygon(mp) => Some(Self::MultiPolygon(mp)),
            _ => None,
        }
    }

    /// Converts back into a general [`geo::Geometry`].
    #[must_use]
    pub fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Self::Point(p) => geo::Geometry::Point(*p),
            Self::LineString(ls) => geo::Geometry::LineString(ls.clone()),
            Self::MultiLineString(mls) => geo::Geometry::MultiLineString(mls.clone()),
            Self::Polygon(p) => geo::Geometry::Polygon(p.clone()),
            Self::MultiPolygon(mp) => geo::Geometry::MultiPolygon(mp.clone()),
        }
    }
}

/// A tagged geographic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRecord {
    /// Source identifier (e.g. `"way/123456"`, or the feature index for
    /// snapshot files without ids).
    pub id: String,
    /// Geometry.
    pub geometry: RecordGeometry,
    /// OSM tags / feature properties.
    pub tags: Tags,
}

impl GeoRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(id: impl Into<String>, geometry: RecordGeometry, tags: Tags) -> Self {
        Self {
            id: id.into(),
            geometry,
            tags,
        }
    }

    /// Creates a point record at the given coordinate.
    #[must_use]
    pub fn point(id: impl Into<String>, at: GeoPoint, tags: Tags) -> Self {
        Self::new(id, RecordGeometry::Point(at.to_geo()), tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_geo_rejects_unsupported_kinds() {
        let multi_point = geo::Geometry::MultiPoint(geo::MultiPoint::new(vec![]));
        assert!(RecordGeometry::from_geo(multi_point).is_none());

        let line = geo::Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        let converted = RecordGeometry::from_geo(line.clone()).unwrap();
        assert_eq!(converted.kind(), "LineString");
        assert_eq!(converted.to_geo(), line);
    }

    #[test]
    fn point_record_stores_longitude_as_x() {
        let record = GeoRecord::point("node/1", GeoPoint::new(51.5, -0.1), Tags::new());
        let RecordGeometry::Point(p) = record.geometry else {
            panic!("expected a point");
        };
        assert!((p.x() - -0.1).abs() < 1e-12);
        assert!((p.y() - 51.5).abs() < 1e-12);
    }
}
