//! Record ∩ box tests.

use geo::Intersects;
use housing_map_geography_models::{BoundingBox, GeoRecord, RecordGeometry};

/// Whether a geometry touches the box.
///
/// Points use the closed-interval test, so a node on an edge is inside.
/// Lines and polygons use a full geometric intersection against the box
/// rectangle: a line whose own envelope overlaps the box but which passes
/// beside it does not count.
#[must_use]
pub fn intersects_box(geometry: &RecordGeometry, bbox: &BoundingBox) -> bool {
    let rect = bbox.to_rect();

    match geometry {
        RecordGeometry::Point(p) => bbox.contains_point(p.y(), p.x()),
        RecordGeometry::LineString(ls) => ls.intersects(&rect),
        RecordGeometry::MultiLineString(mls) => mls.intersects(&rect),
        RecordGeometry::Polygon(poly) => poly.intersects(&rect),
        RecordGeometry::MultiPolygon(mp) => mp.intersects(&rect),
    }
}

/// Records touching the box, in their original order.
#[must_use]
pub fn filter_in_box<'a>(records: &'a [GeoRecord], bbox: &BoundingBox) -> Vec<&'a GeoRecord> {
    filter_matching(records, bbox, |_| true)
}

/// Records touching the box that also satisfy `predicate`, in their
/// original order.
#[must_use]
pub fn filter_matching<'a>(
    records: &'a [GeoRecord],
    bbox: &BoundingBox,
    predicate: impl Fn(&GeoRecord) -> bool,
) -> Vec<&'a GeoRecord> {
    records
        .iter()
        .filter(|r| predicate(r) && intersects_box(&r.geometry, bbox))
        .collect()
}

/// Number of records touching the box.
#[must_use]
pub fn count_in_box(records: &[GeoRecord], bbox: &BoundingBox) -> usize {
    records
        .iter()
        .filter(|r| intersects_box(&r.geometry, bbox))
        .count()
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPolygon, Polygon, polygon};
    use housing_map_geography_models::{GeoPoint, Tags};

    use super::*;

    fn unit_box() -> BoundingBox {
        // lat 0..1, lon 0..1
        BoundingBox::new(1.0, 0.0, 1.0, 0.0).unwrap()
    }

    fn record(id: &str, geometry: RecordGeometry) -> GeoRecord {
        GeoRecord::new(id, geometry, Tags::new())
    }

    fn point(id: &str, lat: f64, lon: f64) -> GeoRecord {
        GeoRecord::point(id, GeoPoint::new(lat, lon), Tags::new())
    }

    fn line(id: &str, coords: Vec<(f64, f64)>) -> GeoRecord {
        record(id, RecordGeometry::LineString(LineString::from(coords)))
    }

    #[test]
    fn points_on_edges_are_included() {
        let bbox = unit_box();
        let records = vec![
            point("corner", 1.0, 1.0),
            point("edge", 0.0, 0.5),
            point("inside", 0.5, 0.5),
            point("outside", 1.000_001, 0.5),
        ];
        let ids: Vec<&str> = filter_in_box(&records, &bbox)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["corner", "edge", "inside"]);
    }

    #[test]
    fn line_crossing_box_is_included_even_with_endpoints_outside() {
        let bbox = unit_box();
        let crossing = line("crossing", vec![(-1.0, 0.5), (2.0, 0.5)]);
        assert!(intersects_box(&crossing.geometry, &bbox));
    }

    #[test]
    fn line_with_overlapping_envelope_but_no_contact_is_excluded() {
        let bbox = unit_box();
        // x + y = 3 passes outside the (1, 1) corner.
        let beside = line("beside", vec![(0.5, 2.5), (2.5, 0.5)]);
        assert!(!intersects_box(&beside.geometry, &bbox));
    }

    #[test]
    fn polygon_containing_box_intersects() {
        let bbox = unit_box();
        let big: Polygon<f64> = polygon![
            (x: -5.0, y: -5.0),
            (x: 5.0, y: -5.0),
            (x: 5.0, y: 5.0),
            (x: -5.0, y: 5.0),
        ];
        assert!(intersects_box(&RecordGeometry::Polygon(big.clone()), &bbox));

        let far: Polygon<f64> = polygon![
            (x: 10.0, y: 10.0),
            (x: 11.0, y: 10.0),
            (x: 11.0, y: 11.0),
        ];
        let multi = MultiPolygon::new(vec![far.clone(), big]);
        assert!(intersects_box(&RecordGeometry::MultiPolygon(multi), &bbox));
        assert!(!intersects_box(&RecordGeometry::Polygon(far), &bbox));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(filter_in_box(&[], &unit_box()).is_empty());
        assert_eq!(count_in_box(&[], &unit_box()), 0);
    }

    #[test]
    fn filtering_is_idempotent_and_a_subset() {
        let bbox = unit_box();
        let records = vec![
            point("a", 0.2, 0.2),
            point("b", 3.0, 3.0),
            line("c", vec![(-1.0, 0.5), (2.0, 0.5)]),
            line("d", vec![(5.0, 5.0), (6.0, 6.0)]),
        ];
        let once: Vec<GeoRecord> = filter_in_box(&records, &bbox)
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<GeoRecord> = filter_in_box(&once, &bbox).into_iter().cloned().collect();
        assert_eq!(once, twice);
        assert!(once.iter().all(|r| records.contains(r)));
        assert_eq!(count_in_box(&records, &bbox), 2);
    }

    #[test]
    fn predicate_narrows_the_result() {
        let bbox = unit_box();
        let records = vec![point("keep", 0.5, 0.5), point("drop", 0.5, 0.6)];
        let kept = filter_matching(&records, &bbox, |r| r.id == "keep");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "keep");
    }
}
