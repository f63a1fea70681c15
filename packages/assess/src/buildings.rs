//! Building footprints split by address completeness.

use geo::Area;
use housing_map_geography_models::{GeoRecord, RecordGeometry};

use crate::join::BUILDING_TAG;

/// Address tags a building needs to count as fully addressed.
pub const ADDRESS_TAGS: [&str; 4] = [
    "addr:housenumber",
    "addr:street",
    "addr:postcode",
    "addr:city",
];

/// A building with its footprint area.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingArea<'a> {
    /// The building record.
    pub record: &'a GeoRecord,
    /// Planar footprint area in squared degrees; `0` for nodes and lines.
    pub area: f64,
}

/// Whether a record carries every tag in [`ADDRESS_TAGS`].
#[must_use]
pub fn has_full_address(record: &GeoRecord) -> bool {
    ADDRESS_TAGS.iter().all(|tag| record.tags.contains_key(tag))
}

/// Buildings with (`full_address = true`) or without a complete address,
/// in input order, each with its footprint area.
#[must_use]
pub fn buildings_with_area(records: &[GeoRecord], full_address: bool) -> Vec<BuildingArea<'_>> {
    records
        .iter()
        .filter(|r| r.tags.contains_key(BUILDING_TAG) && has_full_address(r) == full_address)
        .map(|record| BuildingArea {
            record,
            area: footprint_area(&record.geometry),
        })
        .collect()
}

/// Unsigned planar area of a geometry in squared degrees.
#[must_use]
pub fn footprint_area(geometry: &RecordGeometry) -> f64 {
    match geometry {
        RecordGeometry::Polygon(poly) => poly.unsigned_area(),
        RecordGeometry::MultiPolygon(mp) => mp.unsigned_area(),
        RecordGeometry::Point(_)
        | RecordGeometry::LineString(_)
        | RecordGeometry::MultiLineString(_) => 0.0,
    }
}
