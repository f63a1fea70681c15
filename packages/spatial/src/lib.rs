#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Bounding boxes and spatial filtering for the assessment pipeline.
//!
//! [`bbox`] turns a coordinate and a size into a latitude/longitude box,
//! [`filter`] restricts tagged records to the ones touching a box, and
//! [`index`] answers the same question from an R-tree when many boxes are
//! queried against one record set.

pub mod bbox;
pub mod filter;
pub mod index;

pub use bbox::{area_box, fixed_box, km_box, scaled_box};
pub use filter::{count_in_box, filter_in_box, filter_matching, intersects_box};
pub use index::RecordIndex;

use housing_map_geography_models::InvalidBoundingBoxError;
use thiserror::Error;

/// Errors that can occur while building boxes.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A box size or distance was zero, negative, or not finite.
    #[error("Invalid {what}: {value} (must be finite and > 0)")]
    InvalidSize {
        /// Name of the offending parameter.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The computed edges did not form a valid box.
    #[error(transparent)]
    InvalidBox(#[from] InvalidBoundingBoxError),
}
