//! Coordinate → bounding box conversions.
//!
//! Two families of constants are in use. The box helpers work from a base
//! box of 0.018° × 0.029° (roughly 2 km × 2 km in southern England); the
//! price query works from per-km half-extents of 0.009° latitude and 0.014°
//! longitude. They are kept as separate operations rather than reconciled.

use housing_map_geography_models::{BoundingBox, GeoPoint};

use crate::SpatialError;

/// Height of the base box in degrees of latitude.
pub const BASE_BOX_HEIGHT_DEG: f64 = 0.018;

/// Width of the base box in degrees of longitude.
pub const BASE_BOX_WIDTH_DEG: f64 = 0.029;

/// Degrees of latitude per km.
pub const LAT_DEG_PER_KM: f64 = 0.009;

/// Degrees of longitude per km.
pub const LON_DEG_PER_KM: f64 = 0.014;

/// The base box centered on `point`, independent of any size.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidBox`] if the point is not finite.
pub fn fixed_box(point: GeoPoint) -> Result<BoundingBox, SpatialError> {
    centered(point, BASE_BOX_HEIGHT_DEG, BASE_BOX_WIDTH_DEG)
}

/// The base box scaled linearly by `size` (`1.0` = [`fixed_box`]).
///
/// # Errors
///
/// Returns [`SpatialError::InvalidSize`] if `size` is not finite and
/// positive.
pub fn scaled_box(point: GeoPoint, size: f64) -> Result<BoundingBox, SpatialError> {
    check_positive("box size", size)?;
    centered(
        point,
        BASE_BOX_HEIGHT_DEG * size,
        BASE_BOX_WIDTH_DEG * size,
    )
}

/// A box reaching `distance_km` from `point` in each direction.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidSize`] if `distance_km` is not finite and
/// positive.
pub fn km_box(point: GeoPoint, distance_km: f64) -> Result<BoundingBox, SpatialError> {
    check_positive("distance", distance_km)?;
    centered(
        point,
        2.0 * LAT_DEG_PER_KM * distance_km,
        2.0 * LON_DEG_PER_KM * distance_km,
    )
}

/// A box sized from an area in km²: the distance is the whole part of the
/// area's square root plus one km, then as [`km_box`].
///
/// # Errors
///
/// Returns [`SpatialError::InvalidSize`] if `area_km2` is not finite and
/// positive.
pub fn area_box(point: GeoPoint, area_km2: f64) -> Result<BoundingBox, SpatialError> {
    check_positive("area", area_km2)?;
    km_box(point, area_km2.sqrt().floor() + 1.0)
}

fn centered(point: GeoPoint, height: f64, width: f64) -> Result<BoundingBox, SpatialError> {
    let half_height = height / 2.0;
    let half_width = width / 2.0;

    Ok(BoundingBox::new(
        point.latitude + half_height,
        point.latitude - half_height,
        point.longitude + half_width,
        point.longitude - half_width,
    )?)
}

fn check_positive(what: &'static str, value: f64) -> Result<(), SpatialError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SpatialError::InvalidSize { what, value })
    }
}
