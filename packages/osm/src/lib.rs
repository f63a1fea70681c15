#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `OpenStreetMap` inputs for the assessments.
//!
//! [`overpass`] fetches tagged features live from the Overpass API;
//! [`snapshot`] reads previously exported `GeoJSON` files. Both produce
//! [`GeoRecord`]s.
//!
//! [`GeoRecord`]: housing_map_geography_models::GeoRecord

pub mod overpass;
pub mod snapshot;

pub use overpass::{OverpassClient, build_query, building_query, parse_overpass_json};
pub use snapshot::{load_geojson_records, parse_geojson_records};

/// Errors that can occur while fetching or loading OSM data.
#[derive(Debug, thiserror::Error)]
pub enum OsmError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Overpass answered 429 Too Many Requests.
    #[error("Rate limited by Overpass API")]
    RateLimited,

    /// Overpass answered with another non-success status.
    #[error("Overpass returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// Response JSON did not have the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Snapshot file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
