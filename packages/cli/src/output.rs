//! JSON and CSV writers for command results.

use std::io::Write;

use housing_map_assess_models::{FeatureCountRow, FeatureDiffRow, MergedRow};
use serde::Serialize;

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Pretty-printed JSON.
    Json,
    /// CSV with a header row.
    Csv,
}

/// Errors that can occur while writing results.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes flat rows as a JSON array or one CSV line each.
///
/// # Errors
///
/// Returns [`OutputError`] if a row does not serialize or the sink fails.
pub fn write_rows<W: Write, T: Serialize>(
    mut out: W,
    format: Format,
    rows: &[T],
) -> Result<(), OutputError> {
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, rows)?;
            writeln!(out)?;
        }
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

/// Writes a nested value as JSON, or its flat rows as CSV.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or the sink fails.
pub fn write_nested<W: Write, T: Serialize + ?Sized, R: Serialize>(
    mut out: W,
    format: Format,
    value: &T,
    flat_rows: impl FnOnce() -> Vec<R>,
) -> Result<(), OutputError> {
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
            Ok(())
        }
        Format::Csv => write_rows(out, format, &flat_rows()),
    }
}

/// Writes per-target feature counts; in CSV each `tag=value` pair is a
/// column.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or the sink fails.
pub fn write_count_table<W: Write>(
    mut out: W,
    format: Format,
    rows: &[FeatureCountRow],
) -> Result<(), OutputError> {
    if format == Format::Json {
        serde_json::to_writer_pretty(&mut out, rows)?;
        writeln!(out)?;
        return Ok(());
    }

    let columns = rows.first().map_or_else(Vec::new, |row| {
        row.counts
            .iter()
            .map(|c| format!("{}={}", c.tag, c.value))
            .collect()
    });
    let values = rows.iter().map(|row| {
        (
            row.point,
            row.counts.iter().map(|c| c.count.to_string()).collect(),
        )
    });

    write_point_table(out, &columns, values)
}

/// Writes per-target feature count differences; see [`write_count_table`].
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or the sink fails.
pub fn write_diff_table<W: Write>(
    mut out: W,
    format: Format,
    rows: &[FeatureDiffRow],
) -> Result<(), OutputError> {
    if format == Format::Json {
        serde_json::to_writer_pretty(&mut out, rows)?;
        writeln!(out)?;
        return Ok(());
    }

    let columns = rows.first().map_or_else(Vec::new, |row| {
        row.diffs
            .iter()
            .map(|d| format!("{}={}", d.tag, d.value))
            .collect()
    });
    let values = rows.iter().map(|row| {
        (
            row.point,
            row.diffs.iter().map(|d| d.delta.to_string()).collect(),
        )
    });

    write_point_table(out, &columns, values)
}

fn write_point_table<W: Write>(
    out: W,
    columns: &[String],
    rows: impl Iterator<Item = (housing_map_geography_models::GeoPoint, Vec<String>)>,
) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["latitude".to_string(), "longitude".to_string()];
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for (point, values) in rows {
        let mut record = vec![point.latitude.to_string(), point.longitude.to_string()];
        record.extend(values);
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// One CSV line of a join.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCsvRow {
    /// Which side(s) the row came from.
    pub status: &'static str,
    /// Sale price.
    pub price: Option<i64>,
    /// Transfer date.
    pub date_of_transfer: Option<String>,
    /// Price record postcode.
    pub postcode: Option<String>,
    /// Price record house number / name.
    pub primary_addressable_object_name: Option<String>,
    /// Price record street.
    pub street: Option<String>,
    /// Building id.
    pub building_id: Option<String>,
    /// Building `addr:housenumber`.
    pub housenumber: Option<String>,
    /// Building `addr:postcode`.
    pub osm_postcode: Option<String>,
}

impl From<&MergedRow> for JoinCsvRow {
    fn from(row: &MergedRow) -> Self {
        let price = row.price.as_ref();
        let building = row.building.as_ref();
        let tag = |key: &str| building.and_then(|b| b.tags.get_str(key)).map(str::to_string);

        Self {
            status: row.status.as_str(),
            price: price.map(|p| p.price),
            date_of_transfer: price.map(|p| p.date_of_transfer.to_string()),
            postcode: price.map(|p| p.postcode.clone()),
            primary_addressable_object_name: price
                .and_then(|p| p.primary_addressable_object_name.clone()),
            street: price.and_then(|p| p.street.clone()),
            building_id: building.map(|b| b.id.clone()),
            housenumber: tag("addr:housenumber"),
            osm_postcode: tag("addr:postcode"),
        }
    }
}
