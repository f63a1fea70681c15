//! Outer join of price records with OSM buildings on house number +
//! postcode.

use std::collections::BTreeMap;

use housing_map_assess_models::{JoinSummary, MergeStatus, MergedRow};
use housing_map_geography_models::GeoRecord;
use housing_map_price_models::{PriceField, PriceRecord};

/// OSM tag holding the house number.
pub const HOUSENUMBER_TAG: &str = "addr:housenumber";

/// OSM tag holding the postcode.
pub const POSTCODE_TAG: &str = "addr:postcode";

/// OSM tag marking a building.
pub const BUILDING_TAG: &str = "building";

/// Composite join key definition.
///
/// The first element of each pair is the house number, the second the
/// postcode. Rows match when both fields are equal (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKeys {
    /// Price record fields.
    pub left: (PriceField, PriceField),
    /// OSM tag names.
    pub right: (String, String),
}

impl Default for JoinKeys {
    fn default() -> Self {
        Self {
            left: (PriceField::PrimaryAddressableObjectName, PriceField::Postcode),
            right: (HOUSENUMBER_TAG.to_string(), POSTCODE_TAG.to_string()),
        }
    }
}

/// Rows and per-category counts of an outer join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// Joined rows: price rows in input order (each followed by its
    /// matches), then unmatched buildings in input order.
    pub rows: Vec<MergedRow>,
    /// Row counts per [`MergeStatus`].
    pub summary: JoinSummary,
}

impl JoinOutcome {
    /// Rows with the given status.
    pub fn rows_with(&self, status: MergeStatus) -> impl Iterator<Item = &MergedRow> {
        self.rows.iter().filter(move |r| r.status == status)
    }
}

/// Full outer join of `left` and `right` on the composite key.
///
/// A price row matching several buildings produces one `both` row per
/// building. A row missing either key field never matches. Unmatched
/// buildings are only reported when they carry the postcode tag; untagged
/// footprints are dropped from both the rows and the counts.
///
/// The three counts are logged at `info`.
#[must_use]
pub fn outer_join(left: &[PriceRecord], right: &[GeoRecord], keys: &JoinKeys) -> JoinOutcome {
    let mut by_key: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (position, building) in right.iter().enumerate() {
        if let Some(key) = right_key(building, keys) {
            by_key.entry(key).or_default().push(position);
        }
    }

    let mut matched_right = vec![false; right.len()];
    let mut rows = Vec::with_capacity(left.len());
    let mut summary = JoinSummary::default();

    for price in left {
        let matches = left_key(price, keys).and_then(|key| by_key.get(&key));

        if let Some(positions) = matches {
            for &position in positions {
                matched_right[position] = true;
                summary.matched += 1;
                rows.push(MergedRow {
                    status: MergeStatus::Both,
                    price: Some(price.clone()),
                    building: Some(right[position].clone()),
                });
            }
        } else {
            summary.left_only += 1;
            rows.push(MergedRow {
                status: MergeStatus::LeftOnly,
                price: Some(price.clone()),
                building: None,
            });
        }
    }

    let postcode_tag = keys.right.1.as_str();
    let mut unreported = 0u64;

    for (building, matched) in right.iter().zip(&matched_right) {
        if *matched {
            continue;
        }
        if !building.tags.contains_key(postcode_tag) {
            unreported += 1;
            continue;
        }
        summary.right_only += 1;
        rows.push(MergedRow {
            status: MergeStatus::RightOnly,
            price: None,
            building: Some(building.clone()),
        });
    }

    log::info!("{summary}");
    if unreported > 0 {
        log::debug!("Dropped {unreported} unmatched buildings without a {postcode_tag} tag");
    }

    JoinOutcome { rows, summary }
}

/// Joins price records with the buildings among `pois` (records carrying a
/// `building` tag) using the default house number + postcode keys.
#[must_use]
pub fn merge_buildings(prices: &[PriceRecord], pois: &[GeoRecord]) -> JoinOutcome {
    let buildings: Vec<GeoRecord> = pois
        .iter()
        .filter(|r| r.tags.contains_key(BUILDING_TAG))
        .cloned()
        .collect();

    log::debug!(
        "Joining {} price records with {} of {} OSM records that are buildings",
        prices.len(),
        buildings.len(),
        pois.len()
    );

    outer_join(prices, &buildings, &JoinKeys::default())
}

fn left_key<'a>(price: &'a PriceRecord, keys: &JoinKeys) -> Option<(&'a str, &'a str)> {
    Some((price.field(keys.left.0)?, price.field(keys.left.1)?))
}

fn right_key<'a>(building: &'a GeoRecord, keys: &JoinKeys) -> Option<(&'a str, &'a str)> {
    let number = building.tags.get_str(&keys.right.0).filter(|v| !v.is_empty())?;
    let postcode = building.tags.get_str(&keys.right.1).filter(|v| !v.is_empty())?;
    Some((number, postcode))
}
