//! R-tree lookups over a fixed record set.
//!
//! The aggregator queries one record set with a box per target. Scanning
//! every record per target is quadratic; the index narrows candidates by
//! envelope first and then applies the exact [`intersects_box`] test, so
//! results are identical to [`crate::filter_in_box`].

use geo::BoundingRect;
use housing_map_geography_models::{BoundingBox, GeoRecord, RecordGeometry};
use rstar::{AABB, RTree, RTreeObject};

use crate::filter::intersects_box;

/// A record position stored in the R-tree with its envelope.
struct IndexEntry {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index borrowing a slice of records.
pub struct RecordIndex<'a> {
    records: &'a [GeoRecord],
    tree: RTree<IndexEntry>,
}

impl<'a> RecordIndex<'a> {
    /// Builds the index. Records with empty geometries are left out; they
    /// can never touch a box.
    #[must_use]
    pub fn new(records: &'a [GeoRecord]) -> Self {
        let entries: Vec<IndexEntry> = records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| {
                compute_envelope(&record.geometry).map(|envelope| IndexEntry { position, envelope })
            })
            .collect();

        let skipped = records.len() - entries.len();
        if skipped > 0 {
            log::debug!("Skipped {skipped} records with empty geometry while indexing");
        }

        Self {
            records,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Records touching the box, in their original order.
    #[must_use]
    pub fn query(&self, bbox: &BoundingBox) -> Vec<&'a GeoRecord> {
        let query_env = AABB::from_corners([bbox.west(), bbox.south()], [bbox.east(), bbox.north()]);

        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.position)
            .filter(|&position| intersects_box(&self.records[position].geometry, bbox))
            .collect();
        positions.sort_unstable();

        positions.into_iter().map(|p| &self.records[p]).collect()
    }
}

/// Envelope of a record geometry, `None` when it has no coordinates.
fn compute_envelope(geometry: &RecordGeometry) -> Option<AABB<[f64; 2]>> {
    let rect = match geometry {
        RecordGeometry::Point(p) => return Some(AABB::from_point([p.x(), p.y()])),
        RecordGeometry::LineString(ls) => ls.bounding_rect(),
        RecordGeometry::MultiLineString(mls) => mls.bounding_rect(),
        RecordGeometry::Polygon(poly) => poly.bounding_rect(),
        RecordGeometry::MultiPolygon(mp) => mp.bounding_rect(),
    }?;

    Some(AABB::from_corners(
        [rect.min().x, rect.min().y],
        [rect.max().x, rect.max().y],
    ))
}
