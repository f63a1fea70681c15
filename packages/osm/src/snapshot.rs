//! `GeoJSON` snapshot files.

use std::path::Path;

use geojson::{Feature, GeoJson};
use housing_map_geography_models::{GeoRecord, RecordGeometry, TagValue, Tags};

use crate::OsmError;

/// Reads a `GeoJSON` file into records. See [`parse_geojson_records`].
///
/// # Errors
///
/// Returns [`OsmError::Io`] if the file cannot be read and
/// [`OsmError::GeoJson`] if it is not valid `GeoJSON`.
pub fn load_geojson_records(path: &Path) -> Result<Vec<GeoRecord>, OsmError> {
    let text = std::fs::read_to_string(path)?;
    let records = parse_geojson_records(&text)?;
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses a `FeatureCollection` or a single `Feature`.
///
/// Properties become tags: strings as text, booleans as flags, numbers
/// (and nested values) as their JSON text; nulls are dropped. Features
/// without an id get their position in the file. Features with no geometry
/// or an unsupported geometry kind are skipped with a warning.
///
/// # Errors
///
/// Returns [`OsmError::GeoJson`] if the text is not valid `GeoJSON`.
pub fn parse_geojson_records(text: &str) -> Result<Vec<GeoRecord>, OsmError> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            log::warn!("GeoJSON document is a bare geometry with no properties, skipping");
            Vec::new()
        }
    };

    Ok(features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| to_record(index, feature))
        .collect())
}

fn to_record(index: usize, feature: Feature) -> Option<GeoRecord> {
    let id = match &feature.id {
        Some(geojson::feature::Id::String(s)) => s.clone(),
        Some(geojson::feature::Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    };

    let Some(geometry) = feature.geometry else {
        log::warn!("Feature {id} has no geometry, skipping");
        return None;
    };

    let geometry = match geo::Geometry::<f64>::try_from(geometry) {
        Ok(g) => g,
        Err(e) => {
            log::warn!("Feature {id} geometry does not convert: {e}");
            return None;
        }
    };

    let Some(geometry) = RecordGeometry::from_geo(geometry) else {
        log::warn!("Feature {id} has an unsupported geometry kind, skipping");
        return None;
    };

    let tags = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| to_tag_value(value).map(|v| (key, v)))
        .collect::<Tags>();

    Some(GeoRecord::new(id, geometry, tags))
}

fn to_tag_value(value: serde_json::Value) -> Option<TagValue> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(TagValue::Flag(b)),
        serde_json::Value::String(s) => Some(TagValue::Text(s)),
        other => Some(TagValue::Text(other.to_string())),
    }
}
