//! Parsers for command-line values and the tag queries derived from them.

use std::collections::BTreeSet;

use housing_map_assess::aggregate::FeatureTags;
use housing_map_assess_models::Target;
use housing_map_geography_models::{BoundingBox, GeoPoint, TagFilter, TagQuery};
use housing_map_spatial::{SpatialError, scaled_box};

/// Parses `lat,lon` or `lat,lon,size` (size defaults to `1`).
///
/// # Errors
///
/// Returns a message if the value does not have two or three numeric
/// fields.
pub fn parse_target(value: &str) -> Result<Target, String> {
    let fields = value
        .split(',')
        .map(|f| {
            f.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number '{}' in target '{value}': {e}", f.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match fields.as_slice() {
        [lat, lon] => Ok(Target::new(GeoPoint::new(*lat, *lon), 1.0)),
        [lat, lon, size] => Ok(Target::new(GeoPoint::new(*lat, *lon), *size)),
        _ => Err(format!("expected 'lat,lon[,size]', got '{value}'")),
    }
}

/// Parses a `tag=value` pair.
///
/// # Errors
///
/// Returns a message if there is no `=` or either side is empty.
pub fn parse_feature(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((tag, val)) if !tag.trim().is_empty() && !val.trim().is_empty() => {
            Ok((tag.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(format!("expected 'tag=value', got '{value}'")),
    }
}

/// Groups `tag=value` pairs by tag.
#[must_use]
pub fn feature_tags(pairs: &[(String, String)]) -> FeatureTags {
    let mut tags = FeatureTags::new();
    for (tag, value) in pairs {
        tags.entry(tag.clone()).or_default().insert(value.clone());
    }
    tags
}

/// Overpass query fetching exactly the requested feature values.
#[must_use]
pub fn feature_query(features: &FeatureTags) -> TagQuery {
    features
        .iter()
        .map(|(tag, values)| (tag.clone(), TagFilter::Values(values.clone())))
        .collect()
}

/// Overpass query fetching anything carrying one of the keys.
#[must_use]
pub fn presence_query<K: AsRef<str>>(keys: &[K]) -> TagQuery {
    keys.iter()
        .map(|k| (k.as_ref().to_string(), TagFilter::Any))
        .collect()
}

/// Smallest box covering every target's scaled box, or `None` for no
/// targets.
///
/// # Errors
///
/// Returns [`SpatialError`] if a target's size is invalid.
pub fn targets_box(targets: &[Target]) -> Result<Option<BoundingBox>, SpatialError> {
    let boxes = targets
        .iter()
        .map(|t| scaled_box(t.point, t.size))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(first) = boxes.first() else {
        return Ok(None);
    };

    let (north, south, east, west) = boxes.iter().skip(1).fold(
        (first.north(), first.south(), first.east(), first.west()),
        |(n, s, e, w), b| (n.max(b.north()), s.min(b.south()), e.max(b.east()), w.min(b.west())),
    );

    Ok(Some(BoundingBox::new(north, south, east, west)?))
}

/// Distinct tag keys, in order of first appearance.
#[must_use]
pub fn distinct_keys(keys: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    keys.iter()
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_with_and_without_size() {
        let t = parse_target("52.2, 0.14").unwrap();
        assert_eq!(t, Target::new(GeoPoint::new(52.2, 0.14), 1.0));

        let t = parse_target("51.5,-0.1,2.5").unwrap();
        assert_eq!(t, Target::new(GeoPoint::new(51.5, -0.1), 2.5));
    }

    #[test]
    fn target_rejects_bad_input() {
        assert!(parse_target("52.2").is_err());
        assert!(parse_target("52.2,0.14,1,2").is_err());
        assert!(parse_target("north,0.14").is_err());
    }

    #[test]
    fn feature_pairs() {
        assert_eq!(
            parse_feature("amenity=cafe").unwrap(),
            ("amenity".to_string(), "cafe".to_string())
        );
        assert_eq!(
            parse_feature("addr:city = Cambridge").unwrap(),
            ("addr:city".to_string(), "Cambridge".to_string())
        );
        assert!(parse_feature("amenity").is_err());
        assert!(parse_feature("=cafe").is_err());
        assert!(parse_feature("amenity=").is_err());
    }

    #[test]
    fn features_group_by_tag() {
        let pairs = vec![
            ("amenity".to_string(), "cafe".to_string()),
            ("shop".to_string(), "bakery".to_string()),
            ("amenity".to_string(), "bar".to_string()),
            ("amenity".to_string(), "cafe".to_string()),
        ];
        let tags = feature_tags(&pairs);
        assert_eq!(tags.len(), 2);
        assert_eq!(
            tags["amenity"].iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["bar", "cafe"]
        );

        let query = feature_query(&tags);
        assert_eq!(
            query["shop"],
            TagFilter::Values(BTreeSet::from(["bakery".to_string()]))
        );
    }

    #[test]
    fn presence_query_matches_any_value() {
        let query = presence_query(&["amenity", "tourism"]);
        assert_eq!(query.len(), 2);
        assert_eq!(query["tourism"], TagFilter::Any);
    }

    #[test]
    fn targets_box_covers_all_targets() {
        let targets = vec![
            Target::new(GeoPoint::new(52.2, 0.14), 1.0),
            Target::new(GeoPoint::new(52.3, 0.20), 2.0),
        ];
        let bbox = targets_box(&targets).unwrap().unwrap();

        for t in &targets {
            let own = scaled_box(t.point, t.size).unwrap();
            assert!(bbox.north() >= own.north());
            assert!(bbox.south() <= own.south());
            assert!(bbox.east() >= own.east());
            assert!(bbox.west() <= own.west());
        }
        assert!((bbox.south() - (52.2 - 0.009)).abs() < 1e-9);
        assert!((bbox.north() - (52.3 + 0.018)).abs() < 1e-9);
    }

    #[test]
    fn targets_box_of_nothing() {
        assert!(targets_box(&[]).unwrap().is_none());
        assert!(targets_box(&[Target::new(GeoPoint::new(0.0, 0.0), 0.0)]).is_err());
    }

    #[test]
    fn distinct_keys_keep_first_order() {
        let keys = vec![
            "tourism".to_string(),
            "amenity".to_string(),
            "tourism".to_string(),
        ];
        assert_eq!(distinct_keys(&keys), vec!["tourism", "amenity"]);
    }
}
