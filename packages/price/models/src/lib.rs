#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HM Land Registry price-paid record types.
//!
//! A [`PriceRecord`] is one property transaction joined with the
//! coordinates of its postcode. House number (the primary addressable
//! object name) and postcode are the fields matched against OSM address
//! tags.

use chrono::NaiveDate;
use housing_map_geography_models::GeoPoint;
use serde::{Deserialize, Serialize};

/// New-build flag value marking a newly built property.
pub const NEW_BUILD: &str = "Y";

/// One price-paid transaction with postcode coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// Sale price in pounds.
    pub price: i64,
    /// Completion date of the transfer.
    pub date_of_transfer: NaiveDate,
    /// Full postcode (e.g. `"CB2 1TN"`).
    pub postcode: String,
    /// `D` detached, `S` semi-detached, `T` terraced, `F` flat, `O` other.
    pub property_type: String,
    /// `Y` for a newly built property, `N` otherwise.
    pub new_build_flag: String,
    /// `F` freehold, `L` leasehold.
    pub tenure_type: String,
    /// House number or name (PAON).
    pub primary_addressable_object_name: Option<String>,
    /// Street name.
    pub street: Option<String>,
    /// Locality.
    pub locality: Option<String>,
    /// Town or city.
    pub town_city: Option<String>,
    /// District.
    pub district: Option<String>,
    /// County.
    pub county: Option<String>,
    /// Country from the postcode table.
    pub country: Option<String>,
    /// Postcode latitude.
    pub latitude: Option<f64>,
    /// Postcode longitude.
    pub longitude: Option<f64>,
}

impl PriceRecord {
    /// Returns a textual field by name, `None` when it is empty or unset.
    #[must_use]
    pub fn field(&self, field: PriceField) -> Option<&str> {
        let value = match field {
            PriceField::Postcode => Some(self.postcode.as_str()),
            PriceField::PropertyType => Some(self.property_type.as_str()),
            PriceField::NewBuildFlag => Some(self.new_build_flag.as_str()),
            PriceField::TenureType => Some(self.tenure_type.as_str()),
            PriceField::PrimaryAddressableObjectName => {
                self.primary_addressable_object_name.as_deref()
            }
            PriceField::Street => self.street.as_deref(),
            PriceField::Locality => self.locality.as_deref(),
            PriceField::TownCity => self.town_city.as_deref(),
            PriceField::District => self.district.as_deref(),
            PriceField::County => self.county.as_deref(),
            PriceField::Country => self.country.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Postcode coordinate, if the record was joined with one.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    /// Whether this is a new-build sale.
    #[must_use]
    pub fn is_new_build(&self) -> bool {
        self.new_build_flag == NEW_BUILD
    }
}

/// Textual fields of a [`PriceRecord`] usable as join keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// `postcode`
    Postcode,
    /// `property_type`
    PropertyType,
    /// `new_build_flag`
    NewBuildFlag,
    /// `tenure_type`
    TenureType,
    /// `primary_addressable_object_name`
    PrimaryAddressableObjectName,
    /// `street`
    Street,
    /// `locality`
    Locality,
    /// `town_city`
    TownCity,
    /// `district`
    District,
    /// `county`
    County,
    /// `country`
    Country,
}

/// Selection of joined price records around a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    /// Center of the search box.
    pub center: GeoPoint,
    /// Half-extent of the search box in km.
    pub distance_km: f64,
    /// Postcode prefix both tables are restricted to (e.g. `"CB2"`).
    pub postcode_prefix: String,
    /// First transfer date included.
    pub start_date: NaiveDate,
    /// Last transfer date included.
    pub end_date: NaiveDate,
}

impl PriceQuery {
    /// Creates a 1 km query over 2020-2024 transfers.
    #[must_use]
    pub fn new(center: GeoPoint, postcode_prefix: impl Into<String>) -> Self {
        Self {
            center,
            distance_km: 1.0,
            postcode_prefix: postcode_prefix.into(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }

    /// Sets the search box half-extent.
    #[must_use]
    pub const fn with_distance_km(mut self, distance_km: f64) -> Self {
        self.distance_km = distance_km;
        self
    }

    /// Sets the transfer date range (inclusive).
    #[must_use]
    pub const fn with_dates(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PriceRecord {
        PriceRecord {
            price: 450_000,
            date_of_transfer: NaiveDate::from_ymd_opt(2021, 6, 30).unwrap(),
            postcode: "CB2 1TN".to_string(),
            property_type: "T".to_string(),
            new_build_flag: "N".to_string(),
            tenure_type: "F".to_string(),
            primary_addressable_object_name: Some("10".to_string()),
            street: Some(String::new()),
            locality: None,
            town_city: Some("CAMBRIDGE".to_string()),
            district: None,
            county: None,
            country: Some("England".to_string()),
            latitude: Some(52.2),
            longitude: Some(0.12),
        }
    }

    #[test]
    fn field_lookup_treats_empty_as_missing() {
        let r = record();
        assert_eq!(r.field(PriceField::Postcode), Some("CB2 1TN"));
        assert_eq!(r.field(PriceField::PrimaryAddressableObjectName), Some("10"));
        assert_eq!(r.field(PriceField::Street), None);
        assert_eq!(r.field(PriceField::Locality), None);
    }

    #[test]
    fn location_requires_both_coordinates() {
        let mut r = record();
        assert_eq!(r.location(), Some(GeoPoint::new(52.2, 0.12)));
        r.longitude = None;
        assert_eq!(r.location(), None);
    }

    #[test]
    fn new_build_flag() {
        let mut r = record();
        assert!(!r.is_new_build());
        r.new_build_flag = NEW_BUILD.to_string();
        assert!(r.is_new_build());
    }

    #[test]
    fn default_query_covers_2020_to_2024() {
        let q = PriceQuery::new(GeoPoint::new(52.2, 0.12), "CB2");
        assert_eq!(q.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(q.end_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!((q.distance_km - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_dates_as_iso() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["dateOfTransfer"], "2021-06-30");
        assert_eq!(json["primaryAddressableObjectName"], "10");
    }
}
