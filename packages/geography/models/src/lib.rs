#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic point, bounding box, and OSM feature types.
//!
//! These types describe what the assessment pipeline works on: coordinates
//! of interest, the latitude/longitude rectangles drawn around them, and the
//! tagged geometries fetched from `OpenStreetMap` or loaded from snapshot
//! files. All of them are plain values built per query and thrown away
//! after the output table is produced.

pub mod record;
pub mod tags;

pub use record::{GeoRecord, RecordGeometry};
pub use tags::{TagFilter, TagQuery, TagValue, Tags};

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Converts to a [`geo::Point`] (x = longitude, y = latitude).
    #[must_use]
    pub fn to_geo(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// An axis-aligned latitude/longitude rectangle.
///
/// Always satisfies `north > south` and `east > west`; the only way to get
/// one is through [`BoundingBox::new`], which checks that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "BoundingBoxEdges")]
pub struct BoundingBox {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

/// Unchecked edges as they appear on the wire.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBoxEdges {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl TryFrom<BoundingBoxEdges> for BoundingBox {
    type Error = InvalidBoundingBoxError;

    fn try_from(edges: BoundingBoxEdges) -> Result<Self, Self::Error> {
        Self::new(edges.north, edges.south, edges.east, edges.west)
    }
}

impl BoundingBox {
    /// Creates a bounding box from its four edges.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBoundingBoxError`] if any edge is not finite or the
    /// box is empty or inverted in either axis.
    pub fn new(
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    ) -> Result<Self, InvalidBoundingBoxError> {
        let finite = [north, south, east, west].iter().all(|v| v.is_finite());
        if !finite || north <= south || east <= west {
            return Err(InvalidBoundingBoxError {
                north,
                south,
                east,
                west,
            });
        }

        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Northern (maximum latitude) edge.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.north
    }

    /// Southern (minimum latitude) edge.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.south
    }

    /// Eastern (maximum longitude) edge.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.east
    }

    /// Western (minimum longitude) edge.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.west
    }

    /// Height in degrees of latitude.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Width in degrees of longitude.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            f64::midpoint(self.north, self.south),
            f64::midpoint(self.east, self.west),
        )
    }

    /// Closed-interval containment test: points on an edge are inside.
    #[must_use]
    pub fn contains_point(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude) && (self.west..=self.east).contains(&longitude)
    }

    /// Converts to a [`geo::Rect`] in (longitude, latitude) space.
    #[must_use]
    pub fn to_rect(&self) -> geo::Rect<f64> {
        geo::Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        )
    }
}

/// Error returned when the edges passed to [`BoundingBox::new`] do not form
/// a non-empty rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidBoundingBoxError {
    /// Requested northern edge.
    pub north: f64,
    /// Requested southern edge.
    pub south: f64,
    /// Requested eastern edge.
    pub east: f64,
    /// Requested western edge.
    pub west: f64,
}

impl std::fmt::Display for InvalidBoundingBoxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid bounding box (north={}, south={}, east={}, west={}): \
             expected finite edges with north > south and east > west",
            self.north, self.south, self.east, self.west
        )
    }
}

impl std::error::Error for InvalidBoundingBoxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializing_checks_edges() {
        let bbox: BoundingBox =
            serde_json::from_str(r#"{"north": 52.21, "south": 52.19, "east": 0.15, "west": 0.13}"#)
                .unwrap();
        assert_eq!(bbox, BoundingBox::new(52.21, 52.19, 0.15, 0.13).unwrap());

        let inverted = serde_json::from_str::<BoundingBox>(
            r#"{"north": 52.19, "south": 52.21, "east": 0.15, "west": 0.13}"#,
        );
        assert!(inverted.is_err());
    }

    #[test]
    fn rejects_inverted_and_empty_boxes() {
        assert!(BoundingBox::new(51.0, 52.0, 0.1, -0.1).is_err());
        assert!(BoundingBox::new(51.5, 51.5, 0.1, -0.1).is_err());
        assert!(BoundingBox::new(52.0, 51.0, -0.1, 0.1).is_err());
        assert!(BoundingBox::new(f64::NAN, 51.0, 0.1, -0.1).is_err());
    }

    #[test]
    fn center_is_midpoint_of_edges() {
        let bbox = BoundingBox::new(52.0, 51.0, 0.5, -0.5).unwrap();
        let center = bbox.center();
        assert!((center.latitude - 51.5).abs() < 1e-12);
        assert!(center.longitude.abs() < 1e-12);
        assert!((bbox.height() - 1.0).abs() < 1e-12);
        assert!((bbox.width() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn contains_point_is_inclusive() {
        let bbox = BoundingBox::new(52.0, 51.0, 0.5, -0.5).unwrap();
        assert!(bbox.contains_point(52.0, 0.5));
        assert!(bbox.contains_point(51.0, -0.5));
        assert!(bbox.contains_point(51.5, 0.0));
        assert!(!bbox.contains_point(52.000_001, 0.0));
        assert!(!bbox.contains_point(51.5, -0.500_001));
    }

    #[test]
    fn rect_uses_longitude_as_x() {
        let rect = BoundingBox::new(52.0, 51.0, 0.5, -0.5).unwrap().to_rect();
        assert!((rect.min().x - -0.5).abs() < 1e-12);
        assert!((rect.min().y - 51.0).abs() < 1e-12);
        assert!((rect.max().x - 0.5).abs() < 1e-12);
        assert!((rect.max().y - 52.0).abs() < 1e-12);
    }

    #[test]
    fn geo_point_conversion_swaps_axes() {
        let point = GeoPoint::new(51.5, -0.1);
        let geo_point = point.to_geo();
        assert!((geo_point.x() - -0.1).abs() < 1e-12);
        assert!((geo_point.y() - 51.5).abs() < 1e-12);
        assert_eq!(GeoPoint::from(geo_point), point);
    }
}
