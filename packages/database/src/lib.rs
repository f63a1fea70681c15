#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Local relational store for price-paid and postcode data.
//!
//! Land Registry CSVs and the postcode coordinate table are loaded into a
//! `DuckDB` file, joined per year into `prices_coordinates_data`, and
//! queried around a coordinate to produce [`PriceRecord`]s for the
//! assessment pipeline. The store is append-only: loads insert, nothing
//! updates or deletes.
//!
//! [`PriceRecord`]: housing_map_price_models::PriceRecord

pub mod paths;
pub mod prices_db;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` query error.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The query box could not be built.
    #[error("Spatial error: {0}")]
    Spatial(#[from] housing_map_spatial::SpatialError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
