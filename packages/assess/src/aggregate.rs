//! Per-coordinate feature counts and snapshot comparisons.

use std::collections::{BTreeMap, BTreeSet};

use housing_map_assess_models::{
    FeatureCount, FeatureCountRow, FeatureDiff, FeatureDiffRow, Target,
};
use housing_map_geography_models::GeoRecord;
use housing_map_spatial::{RecordIndex, count_in_box, scaled_box};

use crate::AssessError;

/// Requested features: tag key → the values to count.
pub type FeatureTags = BTreeMap<String, BTreeSet<String>>;

/// Counts, for each target, the records inside its box carrying each
/// requested `tag=value` pair.
///
/// One row per target, in target order. Each row has one count per
/// requested pair in `(tag, value)` order; a pair that no nearby record
/// carries counts `0`.
///
/// # Errors
///
/// Returns [`AssessError::Spatial`] if a target's size is not a valid box
/// size.
pub fn aggregate(
    targets: &[Target],
    records: &[GeoRecord],
    feature_tags: &FeatureTags,
) -> Result<Vec<FeatureCountRow>, AssessError> {
    let index = RecordIndex::new(records);
    log::debug!(
        "Counting {} features for {} targets over {} records",
        feature_tags.values().map(BTreeSet::len).sum::<usize>(),
        targets.len(),
        index.len()
    );

    targets
        .iter()
        .map(|target| {
            let bbox = scaled_box(target.point, target.size)?;
            let nearby = index.query(&bbox);

            let counts = feature_tags
                .iter()
                .flat_map(|(tag, values)| values.iter().map(move |value| (tag, value)))
                .map(|(tag, value)| FeatureCount {
                    tag: tag.clone(),
                    value: value.clone(),
                    count: nearby.iter().filter(|r| r.tags.has(tag, value)).count() as u64,
                })
                .collect();

            Ok(FeatureCountRow {
                point: target.point,
                counts,
            })
        })
        .collect()
}

/// Elementwise `after - before` of two count tables over the same targets
/// and features.
///
/// # Errors
///
/// Returns [`AssessError::ShapeMismatch`] if the tables differ in row
/// count, target coordinates, or feature columns.
pub fn diff_counts(
    before: &[FeatureCountRow],
    after: &[FeatureCountRow],
) -> Result<Vec<FeatureDiffRow>, AssessError> {
    if before.len() != after.len() {
        return Err(AssessError::ShapeMismatch {
            message: format!("{} rows before vs {} rows after", before.len(), after.len()),
        });
    }

    before
        .iter()
        .zip(after)
        .enumerate()
        .map(|(i, (b, a))| {
            if b.point != a.point {
                return Err(AssessError::ShapeMismatch {
                    message: format!("row {i}: target {:?} vs {:?}", b.point, a.point),
                });
            }
            if b.counts.len() != a.counts.len() {
                return Err(AssessError::ShapeMismatch {
                    message: format!(
                        "row {i}: {} features before vs {} after",
                        b.counts.len(),
                        a.counts.len()
                    ),
                });
            }

            let diffs = b
                .counts
                .iter()
                .zip(&a.counts)
                .map(|(cb, ca)| {
                    if cb.tag != ca.tag || cb.value != ca.value {
                        return Err(AssessError::ShapeMismatch {
                            message: format!(
                                "row {i}: feature {}={} vs {}={}",
                                cb.tag, cb.value, ca.tag, ca.value
                            ),
                        });
                    }
                    Ok(FeatureDiff {
                        tag: ca.tag.clone(),
                        value: ca.value.clone(),
                        delta: signed(ca.count) - signed(cb.count),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(FeatureDiffRow {
                point: a.point,
                diffs,
            })
        })
        .collect()
}

/// Change in the number of snapshot records touching a target's box.
///
/// Both snapshots are expected to hold only the infrastructure being
/// tracked (e.g. rail lines exported in two different years). Negative
/// results mean features were removed.
///
/// # Errors
///
/// Returns [`AssessError::Spatial`] if the target's size is not a valid box
/// size.
pub fn diff_rail_count(
    target: &Target,
    before: &[GeoRecord],
    after: &[GeoRecord],
) -> Result<i64, AssessError> {
    let bbox = scaled_box(target.point, target.size)?;
    Ok(signed(count_in_box(after, &bbox) as u64) - signed(count_in_box(before, &bbox) as u64))
}

/// [`diff_rail_count`] for each target, in target order.
///
/// # Errors
///
/// Returns [`AssessError::Spatial`] if any target's size is not a valid box
/// size.
pub fn rail_change(
    targets: &[Target],
    before: &[GeoRecord],
    after: &[GeoRecord],
) -> Result<Vec<i64>, AssessError> {
    let before_index = RecordIndex::new(before);
    let after_index = RecordIndex::new(after);

    let changes = targets
        .iter()
        .map(|target| {
            let bbox = scaled_box(target.point, target.size)?;
            let was = before_index.query(&bbox).len() as u64;
            let now = after_index.query(&bbox).len() as u64;
            Ok(signed(now) - signed(was))
        })
        .collect::<Result<Vec<_>, AssessError>>()?;

    log::info!(
        "Rail change over {} targets: {} gained, {} lost",
        targets.len(),
        changes.iter().filter(|d| **d > 0).count(),
        changes.iter().filter(|d| **d < 0).count()
    );

    Ok(changes)
}

fn signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use geo::LineString;
    use housing_map_geography_models::{GeoPoint, RecordGeometry, Tags};

    use super::*;
    use crate::fixtures::poi;

    fn features(pairs: &[(&str, &[&str])]) -> FeatureTags {
        pairs
            .iter()
            .map(|(tag, values)| {
                (
                    (*tag).to_string(),
                    values.iter().map(|v| (*v).to_string()).collect(),
                )
            })
            .collect()
    }

    /// A short east-west rail segment through `lat`, crossing `lon`.
    fn rail(id: &str, lat: f64, lon: f64) -> GeoRecord {
        GeoRecord::new(
            id,
            RecordGeometry::LineString(LineString::from(vec![
                (lon - 0.001, lat),
                (lon + 0.001, lat),
            ])),
            [("railway", "rail")].into_iter().collect::<Tags>(),
        )
    }

    #[test]
    fn counts_cafe_and_missing_bar() {
        let targets = vec![Target::new(GeoPoint::new(51.5, -0.1), 1.0)];
        let records = vec![poi("node/1", 51.5, -0.1, &[("amenity", "cafe")])];
        let rows = aggregate(&targets, &records, &features(&[("amenity", &["cafe", "bar"])]))
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count("amenity", "cafe"), 1);
        assert_eq!(rows[0].count("amenity", "bar"), 0);
        let columns: Vec<&str> = rows[0].counts.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(columns, vec!["bar", "cafe"]);
    }

    #[test]
    fn only_records_inside_each_box_count() {
        let targets = vec![
            Target::new(GeoPoint::new(51.5, -0.1), 1.0),
            Target::new(GeoPoint::new(52.2, 0.12), 1.0),
            Target::new(GeoPoint::new(51.5, -0.1), 10.0),
        ];
        let records = vec![
            poi("node/1", 51.5, -0.1, &[("amenity", "pub")]),
            poi("node/2", 51.505, -0.1, &[("amenity", "pub")]),
            // ~0.02° north: outside the unit box, inside the 10x box
            poi("node/3", 51.52, -0.1, &[("amenity", "pub")]),
            poi("node/4", 52.2, 0.12, &[("amenity", "pub"), ("shop", "bakery")]),
        ];
        let rows = aggregate(
            &targets,
            &records,
            &features(&[("amenity", &["pub"]), ("shop", &["bakery"])]),
        )
        .unwrap();

        assert_eq!(rows[0].count("amenity", "pub"), 2);
        assert_eq!(rows[1].count("amenity", "pub"), 1);
        assert_eq!(rows[1].count("shop", "bakery"), 1);
        assert_eq!(rows[2].count("amenity", "pub"), 3);
        assert_eq!(rows[0].point, targets[0].point);
        assert_eq!(rows[1].point, targets[1].point);
    }

    #[test]
    fn tag_match_is_structured_not_substring() {
        let targets = vec![Target::new(GeoPoint::new(51.5, -0.1), 1.0)];
        let records = vec![
            poi("node/1", 51.5, -0.1, &[("amenity", "cafe;bar")]),
            poi("node/2", 51.5, -0.1, &[("name", "bar")]),
        ];
        let rows = aggregate(&targets, &records, &features(&[("amenity", &["bar"])])).unwrap();
        assert_eq!(rows[0].count("amenity", "bar"), 0);
    }

    #[test]
    fn invalid_target_size_is_an_error() {
        let targets = vec![Target::new(GeoPoint::new(51.5, -0.1), 0.0)];
        assert!(matches!(
            aggregate(&targets, &[], &FeatureTags::new()),
            Err(AssessError::Spatial(_))
        ));
    }

    #[test]
    fn rail_change_counts_gained_segments() {
        let target = Target::new(GeoPoint::new(53.0, -1.5), 1.0);
        let before: Vec<GeoRecord> = (0..3)
            .map(|i| rail(&format!("way/{i}"), 53.0 + f64::from(i) * 0.001, -1.5))
            .collect();
        let after: Vec<GeoRecord> = (0..5)
            .map(|i| rail(&format!("way/{i}"), 53.0 + f64::from(i) * 0.001, -1.5))
            .collect();

        assert_eq!(diff_rail_count(&target, &before, &after).unwrap(), 2);
        assert_eq!(diff_rail_count(&target, &after, &before).unwrap(), -2);
        assert_eq!(rail_change(&[target], &before, &after).unwrap(), vec![2]);
    }

    #[test]
    fn rail_change_ignores_segments_elsewhere() {
        let targets = vec![
            Target::new(GeoPoint::new(53.0, -1.5), 1.0),
            Target::new(GeoPoint::new(50.0, 0.0), 1.0),
        ];
        let before = vec![rail("way/1", 50.0, 0.0)];
        let after = vec![rail("way/2", 53.0, -1.5), rail("way/3", 53.0, -1.5)];
        assert_eq!(rail_change(&targets, &before, &after).unwrap(), vec![2, -1]);
    }

    #[test]
    fn diff_counts_subtracts_elementwise() {
        let targets = vec![Target::new(GeoPoint::new(51.5, -0.1), 1.0)];
        let wanted = features(&[("railway", &["rail", "station"])]);
        let before = aggregate(
            &targets,
            &[
                poi("n/1", 51.5, -0.1, &[("railway", "station")]),
                poi("n/2", 51.5, -0.1, &[("railway", "station")]),
            ],
            &wanted,
        )
        .unwrap();
        let after = aggregate(
            &targets,
            &[poi("n/3", 51.5, -0.1, &[("railway", "rail")])],
            &wanted,
        )
        .unwrap();

        let diff = diff_counts(&before, &after).unwrap();
        assert_eq!(diff.len(), 1);
        let deltas: Vec<(&str, i64)> = diff[0]
            .diffs
            .iter()
            .map(|d| (d.value.as_str(), d.delta))
            .collect();
        assert_eq!(deltas, vec![("rail", 1), ("station", -2)]);
    }

    #[test]
    fn diff_counts_rejects_mismatched_tables() {
        let targets = vec![Target::new(GeoPoint::new(51.5, -0.1), 1.0)];
        let a = aggregate(&targets, &[], &features(&[("railway", &["rail"])])).unwrap();
        let b = aggregate(&targets, &[], &features(&[("railway", &["station"])])).unwrap();
        assert!(matches!(
            diff_counts(&a, &b),
            Err(AssessError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            diff_counts(&a, &[]),
            Err(AssessError::ShapeMismatch { .. })
        ));
    }
}
