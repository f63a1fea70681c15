//! New-build sales counts.

use housing_map_assess_models::Target;
use housing_map_geography_models::BoundingBox;
use housing_map_price_models::PriceRecord;
use housing_map_spatial::scaled_box;

use crate::AssessError;

/// Number of new-build sales whose postcode coordinate is inside the box.
///
/// Records without coordinates are not counted.
#[must_use]
pub fn count_new_builds(prices: &[PriceRecord], bbox: &BoundingBox) -> usize {
    prices
        .iter()
        .filter(|p| p.is_new_build())
        .filter_map(PriceRecord::location)
        .filter(|at| bbox.contains_point(at.latitude, at.longitude))
        .count()
}

/// [`count_new_builds`] in each target's box, in target order.
///
/// # Errors
///
/// Returns [`AssessError::Spatial`] if a target's size is not a valid box
/// size.
pub fn new_builds_near(prices: &[PriceRecord], targets: &[Target]) -> Result<Vec<u64>, AssessError> {
    targets
        .iter()
        .map(|target| {
            let bbox = scaled_box(target.point, target.size)?;
            Ok(count_new_builds(prices, &bbox) as u64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use housing_map_geography_models::GeoPoint;

    use super::*;
    use crate::fixtures::priced_at;

    #[test]
    fn counts_only_new_builds_inside() {
        let bbox = BoundingBox::new(52.21, 52.19, 0.15, 0.13).unwrap();
        let mut no_coords = priced_at(52.2, 0.14, true);
        no_coords.latitude = None;

        let prices = vec![
            priced_at(52.2, 0.14, true),
            priced_at(52.21, 0.15, true),
            priced_at(52.2, 0.14, false),
            priced_at(53.0, 0.14, true),
            no_coords,
        ];
        assert_eq!(count_new_builds(&prices, &bbox), 2);
    }

    #[test]
    fn per_target_counts_follow_target_order() {
        let prices = vec![
            priced_at(52.2, 0.14, true),
            priced_at(52.2, 0.141, true),
            priced_at(51.5, -0.1, true),
        ];
        let targets = vec![
            Target::new(GeoPoint::new(51.5, -0.1), 1.0),
            Target::new(GeoPoint::new(52.2, 0.14), 1.0),
            Target::new(GeoPoint::new(55.0, -3.0), 1.0),
        ];
        assert_eq!(new_builds_near(&prices, &targets).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn sales_between_targets_count_for_neither() {
        // One store query covers the union of the target boxes, so sales in
        // the gap between two targets arrive here and must be filtered out.
        let prices = vec![
            priced_at(52.2, 0.14, true),
            priced_at(52.2, 0.5, true),
            priced_at(52.2, 0.86, true),
        ];
        let targets = vec![
            Target::new(GeoPoint::new(52.2, 0.14), 1.0),
            Target::new(GeoPoint::new(52.2, 0.86), 1.0),
        ];
        assert_eq!(new_builds_near(&prices, &targets).unwrap(), vec![1, 1]);
    }
}
