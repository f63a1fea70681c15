//! Price-paid and postcode tables in `DuckDB`.
//!
//! `pp_data` mirrors the 16 columns of the Land Registry price-paid CSVs,
//! `postcode_data` holds one coordinate per postcode, and
//! `prices_coordinates_data` accumulates their per-year inner join.

use std::path::Path;

use chrono::NaiveDate;
use duckdb::{Connection, params};
use housing_map_geography_models::BoundingBox;
use housing_map_price_models::{PriceQuery, PriceRecord};
use housing_map_spatial::km_box;

use crate::DbError;
use crate::paths::{ensure_dir, sql_path_literal};

/// Tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Raw price-paid transactions.
    PricePaid,
    /// Postcode coordinates.
    Postcode,
    /// Price-paid transactions joined with postcode coordinates.
    PricesCoordinates,
}

impl Table {
    /// SQL table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PricePaid => "pp_data",
            Self::Postcode => "postcode_data",
            Self::PricesCoordinates => "prices_coordinates_data",
        }
    }
}

/// Opens (or creates) the store and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    log::debug!("Opened price store at {}", path.display());

    Ok(conn)
}

/// Opens a throwaway in-memory store with the schema in place.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pp_data (
            transaction_unique_identifier TEXT,
            price BIGINT NOT NULL,
            date_of_transfer DATE NOT NULL,
            postcode TEXT,
            property_type TEXT,
            new_build_flag TEXT,
            tenure_type TEXT,
            primary_addressable_object_name TEXT,
            secondary_addressable_object_name TEXT,
            street TEXT,
            locality TEXT,
            town_city TEXT,
            district TEXT,
            county TEXT,
            ppd_category_type TEXT,
            record_status TEXT
        );

        CREATE TABLE IF NOT EXISTS postcode_data (
            postcode TEXT PRIMARY KEY,
            country TEXT,
            latitude DOUBLE,
            longitude DOUBLE
        );

        CREATE TABLE IF NOT EXISTS prices_coordinates_data (
            price BIGINT NOT NULL,
            date_of_transfer DATE NOT NULL,
            postcode TEXT NOT NULL,
            property_type TEXT,
            new_build_flag TEXT,
            tenure_type TEXT,
            primary_addressable_object_name TEXT,
            street TEXT,
            locality TEXT,
            town_city TEXT,
            district TEXT,
            county TEXT,
            country TEXT,
            latitude DOUBLE,
            longitude DOUBLE
        );",
    )?;

    Ok(())
}

/// Appends a headerless Land Registry price-paid CSV to `pp_data`.
///
/// Dates arrive as `YYYY-MM-DD 00:00`; only the date part is kept. Empty
/// fields are stored as NULL.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or a row does not
/// convert (e.g. a non-numeric price).
pub fn load_price_paid_csv(conn: &Connection, path: &Path) -> Result<u64, DbError> {
    let source = sql_path_literal(path);
    let inserted = conn.execute(
        &format!(
            "INSERT INTO pp_data
             SELECT
                NULLIF(transaction_unique_identifier, ''),
                CAST(price AS BIGINT),
                CAST(left(date_of_transfer, 10) AS DATE),
                NULLIF(postcode, ''),
                NULLIF(property_type, ''),
                NULLIF(new_build_flag, ''),
                NULLIF(tenure_type, ''),
                NULLIF(primary_addressable_object_name, ''),
                NULLIF(secondary_addressable_object_name, ''),
                NULLIF(street, ''),
                NULLIF(locality, ''),
                NULLIF(town_city, ''),
                NULLIF(district, ''),
                NULLIF(county, ''),
                NULLIF(ppd_category_type, ''),
                NULLIF(record_status, '')
             FROM read_csv({source},
                header = false,
                quote = '\"',
                columns = {{
                    'transaction_unique_identifier': 'VARCHAR',
                    'price': 'VARCHAR',
                    'date_of_transfer': 'VARCHAR',
                    'postcode': 'VARCHAR',
                    'property_type': 'VARCHAR',
                    'new_build_flag': 'VARCHAR',
                    'tenure_type': 'VARCHAR',
                    'primary_addressable_object_name': 'VARCHAR',
                    'secondary_addressable_object_name': 'VARCHAR',
                    'street': 'VARCHAR',
                    'locality': 'VARCHAR',
                    'town_city': 'VARCHAR',
                    'district': 'VARCHAR',
                    'county': 'VARCHAR',
                    'ppd_category_type': 'VARCHAR',
                    'record_status': 'VARCHAR'
                }})"
        ),
        [],
    )?;

    log::info!("Loaded {inserted} price-paid rows from {}", path.display());
    Ok(inserted as u64)
}

/// Appends a postcode CSV (with a header row containing at least
/// `postcode`, `country`, `latitude`, `longitude`) to `postcode_data`.
///
/// A postcode repeated in the file keeps its first row (the file is read
/// sequentially and numbered). Postcodes already present are skipped.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or lacks those columns.
pub fn load_postcode_csv(conn: &Connection, path: &Path) -> Result<u64, DbError> {
    let source = sql_path_literal(path);
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO postcode_data
             SELECT DISTINCT ON (postcode)
                postcode,
                NULLIF(country, ''),
                TRY_CAST(latitude AS DOUBLE),
                TRY_CAST(longitude AS DOUBLE)
             FROM (
                SELECT *, row_number() OVER () AS row_no
                FROM read_csv({source}, header = true, all_varchar = true, parallel = false)
             )
             WHERE postcode IS NOT NULL AND postcode <> ''
             ORDER BY postcode, row_no"
        ),
        [],
    )?;

    log::info!("Loaded {inserted} postcode rows from {}", path.display());
    Ok(inserted as u64)
}

/// Appends the year's price-paid rows joined with their postcode
/// coordinates to `prices_coordinates_data`.
///
/// Returns the number of rows appended.
///
/// # Errors
///
/// Returns [`DbError`] if the year is out of range or the insert fails.
pub fn upload_join_year(conn: &Connection, year: i32) -> Result<u64, DbError> {
    let (start, end) = year_bounds(year)?;
    log::info!("Selecting data for year: {year}");

    let inserted = conn.execute(
        "INSERT INTO prices_coordinates_data
         SELECT pp.price, pp.date_of_transfer, po.postcode, pp.property_type,
                pp.new_build_flag, pp.tenure_type, pp.primary_addressable_object_name,
                pp.street, pp.locality, pp.town_city, pp.district, pp.county,
                po.country, po.latitude, po.longitude
         FROM pp_data AS pp
         INNER JOIN postcode_data AS po ON pp.postcode = po.postcode
         WHERE pp.date_of_transfer BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)",
        params![start.to_string(), end.to_string()],
    )?;

    log::info!("Data stored for year: {year} ({inserted} rows)");
    Ok(inserted as u64)
}

/// Price-paid rows joined with postcode coordinates inside the query's
/// [`km_box`], restricted to the postcode prefix and transfer date range.
///
/// Rows come back ordered by transfer date, then postcode.
///
/// # Errors
///
/// Returns [`DbError`] if the query distance is invalid, the query fails,
/// or a stored date does not parse.
pub fn query_prices_near(conn: &Connection, query: &PriceQuery) -> Result<Vec<PriceRecord>, DbError> {
    let bbox = km_box(query.center, query.distance_km)?;
    let records = query_prices_in_box(
        conn,
        &bbox,
        &query.postcode_prefix,
        query.start_date,
        query.end_date,
    )?;

    log::info!(
        "Found {} price records within {} km of ({}, {}) in {}*",
        records.len(),
        query.distance_km,
        query.center.latitude,
        query.center.longitude,
        query.postcode_prefix
    );

    Ok(records)
}

/// Price-paid rows joined with postcode coordinates whose coordinate lies
/// in `bbox` (edges inclusive), whose postcode starts with
/// `postcode_prefix` (empty matches all) and whose transfer date is in
/// `start..=end`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored date does not parse.
pub fn query_prices_in_box(
    conn: &Connection,
    bbox: &BoundingBox,
    postcode_prefix: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceRecord>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT pp.price, CAST(pp.date_of_transfer AS VARCHAR), po.postcode, pp.property_type,
                pp.new_build_flag, pp.tenure_type, pp.primary_addressable_object_name,
                pp.street, pp.locality, pp.town_city, pp.district, pp.county,
                po.country, po.latitude, po.longitude
         FROM pp_data AS pp
         INNER JOIN postcode_data AS po ON pp.postcode = po.postcode
         WHERE pp.date_of_transfer BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)
           AND starts_with(pp.postcode, ?)
           AND po.latitude BETWEEN ? AND ?
           AND po.longitude BETWEEN ? AND ?
         ORDER BY pp.date_of_transfer, po.postcode",
    )?;

    let mut rows = stmt.query(params![
        start.to_string(),
        end.to_string(),
        postcode_prefix,
        bbox.south(),
        bbox.north(),
        bbox.west(),
        bbox.east(),
    ])?;

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let date: String = row.get(1)?;
        let date_of_transfer =
            NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| DbError::Conversion {
                message: format!("invalid date_of_transfer '{date}': {e}"),
            })?;

        records.push(PriceRecord {
            price: row.get(0)?,
            date_of_transfer,
            postcode: row.get(2)?,
            property_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            new_build_flag: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            tenure_type: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            primary_addressable_object_name: row.get(6)?,
            street: row.get(7)?,
            locality: row.get(8)?,
            town_city: row.get(9)?,
            district: row.get(10)?,
            county: row.get(11)?,
            country: row.get(12)?,
            latitude: row.get(13)?,
            longitude: row.get(14)?,
        });
    }

    log::debug!(
        "{} price records in box N{} S{} E{} W{}",
        records.len(),
        bbox.north(),
        bbox.south(),
        bbox.east(),
        bbox.west()
    );

    Ok(records)
}

/// Number of rows in a table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn count_rows(conn: &Connection, table: Table) -> Result<u64, DbError> {
    let count: i64 = conn
        .prepare(&format!("SELECT COUNT(*) FROM {}", table.name()))?
        .query_row([], |row| row.get(0))?;

    u64::try_from(count).map_err(|e| DbError::Conversion {
        message: format!("negative row count {count}: {e}"),
    })
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), DbError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);

    start.zip(end).ok_or_else(|| DbError::Conversion {
        message: format!("year {year} is out of range"),
    })
}
