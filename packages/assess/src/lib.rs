#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Assessment of price records against `OpenStreetMap` features.
//!
//! Everything here works on data that is already in memory: the joins and
//! counts are pure and deterministic, and the only side effect is logging
//! of the join diagnostics.

pub mod aggregate;
pub mod buildings;
pub mod join;
pub mod new_builds;
pub mod pois;

#[cfg(test)]
pub(crate) mod fixtures;

use thiserror::Error;

/// Errors that can occur during assessment.
#[derive(Debug, Error)]
pub enum AssessError {
    /// A target's box could not be built.
    #[error("Spatial error: {0}")]
    Spatial(#[from] housing_map_spatial::SpatialError),

    /// Two count tables being compared do not line up.
    #[error("Shape mismatch: {message}")]
    ShapeMismatch {
        /// Description of what differs.
        message: String,
    },
}
