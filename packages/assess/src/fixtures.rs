//! Shared test records.

use chrono::NaiveDate;
use geo::polygon;
use housing_map_geography_models::{GeoPoint, GeoRecord, RecordGeometry, Tags};
use housing_map_price_models::PriceRecord;

pub fn price(house_number: Option<&str>, postcode: &str) -> PriceRecord {
    PriceRecord {
        price: 325_000,
        date_of_transfer: NaiveDate::from_ymd_opt(2022, 3, 14).unwrap(),
        postcode: postcode.to_string(),
        property_type: "S".to_string(),
        new_build_flag: "N".to_string(),
        tenure_type: "F".to_string(),
        primary_addressable_object_name: house_number.map(str::to_string),
        street: Some("MILL ROAD".to_string()),
        locality: None,
        town_city: Some("CAMBRIDGE".to_string()),
        district: Some("CAMBRIDGE".to_string()),
        county: Some("CAMBRIDGESHIRE".to_string()),
        country: Some("England".to_string()),
        latitude: Some(52.2),
        longitude: Some(0.14),
    }
}

pub fn priced_at(lat: f64, lon: f64, new_build: bool) -> PriceRecord {
    let mut record = price(Some("1"), "CB1 2AB");
    record.latitude = Some(lat);
    record.longitude = Some(lon);
    record.new_build_flag = if new_build { "Y" } else { "N" }.to_string();
    record
}

/// A 10 m-ish square building footprint near (52.2, 0.14).
pub fn building(id: &str, tags: &[(&str, &str)]) -> GeoRecord {
    let footprint = polygon![
        (x: 0.1400, y: 52.2000),
        (x: 0.1401, y: 52.2000),
        (x: 0.1401, y: 52.2001),
        (x: 0.1400, y: 52.2001),
    ];
    GeoRecord::new(
        id,
        RecordGeometry::Polygon(footprint),
        tags.iter().copied().collect(),
    )
}

pub fn addressed_building(id: &str, house_number: &str, postcode: &str) -> GeoRecord {
    building(
        id,
        &[
            ("building", "yes"),
            ("addr:housenumber", house_number),
            ("addr:postcode", postcode),
        ],
    )
}

pub fn poi(id: &str, lat: f64, lon: f64, tags: &[(&str, &str)]) -> GeoRecord {
    GeoRecord::point(
        id,
        GeoPoint::new(lat, lon),
        tags.iter().copied().collect::<Tags>(),
    )
}
