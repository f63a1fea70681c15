//! Points-of-interest presence counts around a coordinate.

use std::collections::BTreeMap;

use housing_map_geography_models::{GeoPoint, GeoRecord};
use housing_map_spatial::{filter_in_box, km_box};

use crate::AssessError;

/// For each tag key, the number of records carrying it with any value.
///
/// Keys no record carries count `0`.
pub fn count_tag_presence<'a, I, K>(records: I, tags: &[K]) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a GeoRecord>,
    K: AsRef<str>,
{
    let mut counts: BTreeMap<String, u64> = tags
        .iter()
        .map(|tag| (tag.as_ref().to_string(), 0))
        .collect();

    for record in records {
        for (tag, count) in &mut counts {
            if record.tags.contains_key(tag) {
                *count += 1;
            }
        }
    }

    counts
}

/// [`count_tag_presence`] over the records within `distance_km` of
/// `point`.
///
/// # Errors
///
/// Returns [`AssessError::Spatial`] if `distance_km` is not a valid
/// distance.
pub fn count_pois_near<K: AsRef<str>>(
    records: &[GeoRecord],
    point: GeoPoint,
    distance_km: f64,
    tags: &[K],
) -> Result<BTreeMap<String, u64>, AssessError> {
    let bbox = km_box(point, distance_km)?;
    let nearby = filter_in_box(records, &bbox);
    log::debug!(
        "{} of {} records within {distance_km} km of ({}, {})",
        nearby.len(),
        records.len(),
        point.latitude,
        point.longitude
    );
    Ok(count_tag_presence(nearby, tags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::poi;

    #[test]
    fn counts_presence_of_each_key() {
        let records = vec![
            poi("n/1", 51.5, -0.1, &[("amenity", "cafe")]),
            poi("n/2", 51.5, -0.1, &[("amenity", "school"), ("tourism", "museum")]),
            poi("n/3", 51.5, -0.1, &[("shop", "bakery")]),
        ];
        let counts = count_tag_presence(&records, &["amenity", "tourism", "leisure"]);
        assert_eq!(counts["amenity"], 2);
        assert_eq!(counts["tourism"], 1);
        assert_eq!(counts["leisure"], 0);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn near_excludes_distant_records() {
        let records = vec![
            poi("n/1", 51.5, -0.1, &[("amenity", "cafe")]),
            poi("n/2", 51.6, -0.1, &[("amenity", "cafe")]),
        ];
        let counts = count_pois_near(&records, GeoPoint::new(51.5, -0.1), 1.0, &["amenity"]).unwrap();
        assert_eq!(counts["amenity"], 1);

        let wide = count_pois_near(&records, GeoPoint::new(51.5, -0.1), 20.0, &["amenity"]).unwrap();
        assert_eq!(wide["amenity"], 2);
    }

    #[test]
    fn rejects_invalid_distance() {
        assert!(count_pois_near(&[], GeoPoint::new(51.5, -0.1), -1.0, &["amenity"]).is_err());
    }
}
