#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types of the assessment pipeline.
//!
//! The pipeline produces either a merged price/building table
//! ([`MergedRow`] + [`JoinSummary`]) or one feature-count row per queried
//! coordinate ([`FeatureCountRow`], and [`FeatureDiffRow`] for snapshot
//! comparisons).

use housing_map_geography_models::{GeoPoint, GeoRecord};
use housing_map_price_models::PriceRecord;
use serde::{Deserialize, Serialize};

/// A coordinate to assess together with its box size multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Coordinate of interest.
    pub point: GeoPoint,
    /// Linear box scale; `1.0` is the base box.
    pub size: f64,
}

impl Target {
    /// Creates a target.
    #[must_use]
    pub const fn new(point: GeoPoint, size: f64) -> Self {
        Self { point, size }
    }
}

/// Which side(s) of an outer join a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// Price record matched a building.
    Both,
    /// Price record without a matching building.
    LeftOnly,
    /// Building without a matching price record.
    RightOnly,
}

impl MergeStatus {
    /// Indicator label, as written to output tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::LeftOnly => "left_only",
            Self::RightOnly => "right_only",
        }
    }
}

impl std::fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a price/building outer join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRow {
    /// Match indicator.
    pub status: MergeStatus,
    /// Price side, absent for `right_only`.
    pub price: Option<PriceRecord>,
    /// Building side, absent for `left_only`.
    pub building: Option<GeoRecord>,
}

/// Row counts per match category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSummary {
    /// `both` rows.
    pub matched: u64,
    /// `left_only` rows.
    pub left_only: u64,
    /// Reported `right_only` rows.
    pub right_only: u64,
}

impl JoinSummary {
    /// Total number of rows.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.matched + self.left_only + self.right_only
    }
}

impl std::fmt::Display for JoinSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "num matches: {} | num unmatched pp: {} | num unmatched osm: {}",
            self.matched, self.left_only, self.right_only
        )
    }
}

/// Count of records carrying one `tag=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCount {
    /// Tag key (e.g. `"amenity"`).
    pub tag: String,
    /// Tag value (e.g. `"cafe"`).
    pub value: String,
    /// Number of matching records in the target's box.
    pub count: u64,
}

/// Feature counts for one target coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCountRow {
    /// Target coordinate.
    pub point: GeoPoint,
    /// One entry per requested feature, in `(tag, value)` order.
    pub counts: Vec<FeatureCount>,
}

impl FeatureCountRow {
    /// Count for a feature, `0` if it was not requested.
    #[must_use]
    pub fn count(&self, tag: &str, value: &str) -> u64 {
        self.counts
            .iter()
            .find(|c| c.tag == tag && c.value == value)
            .map_or(0, |c| c.count)
    }
}

/// Change in one feature count between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDiff {
    /// Tag key.
    pub tag: String,
    /// Tag value.
    pub value: String,
    /// `after - before`; negative when features were removed.
    pub delta: i64,
}

/// Feature count changes for one target coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDiffRow {
    /// Target coordinate.
    pub point: GeoPoint,
    /// One entry per feature, same order as the compared rows.
    pub diffs: Vec<FeatureDiff>,
}
