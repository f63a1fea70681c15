#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the housing map toolkit.
//!
//! Downloads and stores price-paid data, fetches or loads `OpenStreetMap`
//! features, and prints assessments as JSON or CSV on stdout. Logging goes
//! to stderr through `pretty_env_logger` (`RUST_LOG=info` for progress).

mod args;
mod output;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use housing_map_assess::aggregate::{aggregate, diff_counts, rail_change};
use housing_map_assess::buildings::buildings_with_area;
use housing_map_assess::join::merge_buildings;
use housing_map_assess::new_builds::new_builds_near;
use housing_map_assess::pois::count_pois_near;
use housing_map_assess_models::Target;
use housing_map_config::Config;
use housing_map_database::prices_db;
use housing_map_geography_models::{BoundingBox, GeoPoint, GeoRecord, TagQuery};
use housing_map_osm::{OverpassClient, building_query, load_geojson_records};
use housing_map_price_models::{PriceQuery, PriceRecord};
use housing_map_spatial::{filter_in_box, km_box};
use serde::Serialize;

use crate::args::{
    distinct_keys, feature_query, feature_tags, parse_feature, parse_target, presence_query,
    targets_box,
};
use crate::output::{Format, JoinCsvRow, write_count_table, write_diff_table, write_nested, write_rows};

#[derive(Parser)]
#[command(name = "housing_map", about = "UK house price and OpenStreetMap assessment toolkit")]
struct Cli {
    /// Config file layered over the built-in defaults (overrides
    /// `HOUSING_MAP_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

/// Transfer date range shared by the price queries.
#[derive(clap::Args)]
struct DateRange {
    /// First transfer date (inclusive, `YYYY-MM-DD`)
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Last transfer date (inclusive, `YYYY-MM-DD`)
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

/// A coordinate with a search distance.
#[derive(clap::Args)]
struct Around {
    /// Latitude of the center
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Longitude of the center
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// Distance from the center in km
    #[arg(long, default_value = "1")]
    distance_km: f64,
}

impl Around {
    const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download price-paid CSVs for a range of years
    Download {
        /// First year
        #[arg(long)]
        start_year: i32,
        /// Year after the last one downloaded
        #[arg(long)]
        end_year: i32,
        /// Destination directory (defaults to `land_registry.download_dir`)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Load price-paid and postcode CSVs into the store
    Load {
        /// Headerless Land Registry price-paid CSV
        #[arg(long = "price-paid")]
        price_paid: Vec<PathBuf>,
        /// Postcode CSV with `postcode,country,latitude,longitude` columns
        #[arg(long = "postcodes")]
        postcodes: Vec<PathBuf>,
    },
    /// Join each year's prices with postcode coordinates into
    /// `prices_coordinates_data`
    UploadJoin {
        /// Years to join
        #[arg(required = true)]
        years: Vec<i32>,
    },
    /// Price records near a coordinate
    Prices {
        #[command(flatten)]
        around: Around,
        /// Postcode prefix, e.g. `CB1`
        #[arg(long, default_value = "")]
        prefix: String,
        #[command(flatten)]
        dates: DateRange,
    },
    /// Join price records near a coordinate with OSM buildings
    Join {
        #[command(flatten)]
        around: Around,
        /// Postcode prefix, e.g. `CB1`
        #[arg(long, default_value = "")]
        prefix: String,
        #[command(flatten)]
        dates: DateRange,
        /// Buildings `GeoJSON` snapshot (fetched from Overpass when omitted)
        #[arg(long)]
        buildings: Option<PathBuf>,
    },
    /// Count records carrying each tag key near a coordinate
    Pois {
        #[command(flatten)]
        around: Around,
        /// Tag key to count (repeatable)
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
        /// `GeoJSON` snapshot (fetched from Overpass when omitted)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Count `tag=value` features around each target
    Aggregate {
        /// Target as `lat,lon[,size]` (repeatable)
        #[arg(long = "target", required = true, value_parser = parse_target, allow_hyphen_values = true)]
        targets: Vec<Target>,
        /// Feature as `tag=value` (repeatable)
        #[arg(long = "feature", required = true, value_parser = parse_feature)]
        features: Vec<(String, String)>,
        /// `GeoJSON` snapshot (fetched from Overpass when omitted)
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Earlier snapshot; when given, print the change since it instead
        /// of the counts
        #[arg(long)]
        compare: Option<PathBuf>,
    },
    /// Change in the number of rail features around each target between two
    /// snapshots
    RailChange {
        /// Target as `lat,lon[,size]` (repeatable)
        #[arg(long = "target", required = true, value_parser = parse_target, allow_hyphen_values = true)]
        targets: Vec<Target>,
        /// Earlier rail snapshot
        #[arg(long)]
        before: PathBuf,
        /// Later rail snapshot
        #[arg(long)]
        after: PathBuf,
    },
    /// Count new-build sales around each target
    NewBuilds {
        /// Target as `lat,lon[,size]` (repeatable)
        #[arg(long = "target", required = true, value_parser = parse_target, allow_hyphen_values = true)]
        targets: Vec<Target>,
        /// Postcode prefix (empty for all)
        #[arg(long, default_value = "")]
        prefix: String,
        #[command(flatten)]
        dates: DateRange,
    },
    /// Buildings near a coordinate with their footprint areas
    Buildings {
        #[command(flatten)]
        around: Around,
        /// List fully addressed buildings instead of incomplete ones
        #[arg(long)]
        full_address: bool,
        /// Buildings `GeoJSON` snapshot (fetched from Overpass when omitted)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagCountRow {
    tag: String,
    count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RailChangeRow {
    latitude: f64,
    longitude: f64,
    size: f64,
    change: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewBuildRow {
    latitude: f64,
    longitude: f64,
    size: f64,
    new_builds: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildingRow {
    id: String,
    area: f64,
    housenumber: Option<String>,
    street: Option<String>,
    postcode: Option<String>,
    city: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinReport<'a> {
    summary: housing_map_assess_models::JoinSummary,
    rows: &'a [housing_map_assess_models::MergedRow],
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let format = cli.format;
    let stdout = io::stdout().lock();

    match cli.command {
        Commands::Download {
            start_year,
            end_year,
            dest,
        } => {
            let dest = dest.unwrap_or_else(|| config.land_registry.download_dir.clone());
            let client = reqwest::Client::new();
            let start = Instant::now();
            let written = housing_map_land_registry::download_price_paid_data(
                &client,
                &config.land_registry,
                start_year,
                end_year,
                &dest,
            )
            .await?;
            log::info!(
                "Download complete: {} files in {:.1}s",
                written.len(),
                start.elapsed().as_secs_f64()
            );
            let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            write_rows(stdout, format, &paths)?;
        }
        Commands::Load {
            price_paid,
            postcodes,
        } => {
            if price_paid.is_empty() && postcodes.is_empty() {
                return Err("nothing to load: pass --price-paid and/or --postcodes".into());
            }
            let conn = prices_db::open(&config.store.path)?;
            let mut total = 0;
            for path in &price_paid {
                total += prices_db::load_price_paid_csv(&conn, path)?;
            }
            for path in &postcodes {
                total += prices_db::load_postcode_csv(&conn, path)?;
            }
            log::info!("Loaded {total} rows into {}", config.store.path.display());
        }
        Commands::UploadJoin { years } => {
            let conn = prices_db::open(&config.store.path)?;
            for year in years {
                prices_db::upload_join_year(&conn, year)?;
            }
            let rows = prices_db::count_rows(&conn, prices_db::Table::PricesCoordinates)?;
            log::info!("prices_coordinates_data now holds {rows} rows");
        }
        Commands::Prices {
            around,
            prefix,
            dates,
        } => {
            let prices = query_prices(&config, &around, prefix, &dates)?;
            write_rows(stdout, format, &prices)?;
        }
        Commands::Join {
            around,
            prefix,
            dates,
            buildings,
        } => {
            let prices = query_prices(&config, &around, prefix, &dates)?;
            let bbox = km_box(around.point(), around.distance_km)?;
            let buildings = records_for(&config, buildings.as_deref(), &bbox, &building_query()).await?;

            let outcome = merge_buildings(&prices, &buildings);
            let report = JoinReport {
                summary: outcome.summary,
                rows: &outcome.rows,
            };
            write_nested(stdout, format, &report, || {
                outcome.rows.iter().map(JoinCsvRow::from).collect()
            })?;
        }
        Commands::Pois {
            around,
            tags,
            snapshot,
        } => {
            let keys = distinct_keys(&tags);
            let bbox = km_box(around.point(), around.distance_km)?;
            let records = records_for(&config, snapshot.as_deref(), &bbox, &presence_query(&keys)).await?;
            let counts = count_pois_near(&records, around.point(), around.distance_km, &keys)?;

            write_nested(stdout, format, &counts, || {
                counts
                    .iter()
                    .map(|(tag, count)| TagCountRow {
                        tag: tag.clone(),
                        count: *count,
                    })
                    .collect()
            })?;
        }
        Commands::Aggregate {
            targets,
            features,
            snapshot,
            compare,
        } => {
            let features = feature_tags(&features);
            let Some(bbox) = targets_box(&targets)? else {
                return Err("no targets".into());
            };
            let records = records_for(&config, snapshot.as_deref(), &bbox, &feature_query(&features)).await?;
            let counts = aggregate(&targets, &records, &features)?;

            if let Some(compare) = compare {
                let earlier = load_geojson_records(&compare)?;
                let before = aggregate(&targets, &earlier, &features)?;
                let diffs = diff_counts(&before, &counts)?;
                write_diff_table(stdout, format, &diffs)?;
            } else {
                write_count_table(stdout, format, &counts)?;
            }
        }
        Commands::RailChange {
            targets,
            before,
            after,
        } => {
            let before = load_geojson_records(&before)?;
            let after = load_geojson_records(&after)?;
            let changes = rail_change(&targets, &before, &after)?;

            let rows: Vec<_> = targets
                .iter()
                .zip(changes)
                .map(|(t, change)| RailChangeRow {
                    latitude: t.point.latitude,
                    longitude: t.point.longitude,
                    size: t.size,
                    change,
                })
                .collect();
            write_rows(stdout, format, &rows)?;
        }
        Commands::NewBuilds {
            targets,
            prefix,
            dates,
        } => {
            let Some(bbox) = targets_box(&targets)? else {
                return Err("no targets".into());
            };
            let conn = prices_db::open(&config.store.path)?;
            let (start_date, end_date) = date_bounds(&dates);
            let prices = prices_db::query_prices_in_box(&conn, &bbox, &prefix, start_date, end_date)?;

            let rows: Vec<NewBuildRow> = targets
                .iter()
                .zip(new_builds_near(&prices, &targets)?)
                .map(|(target, new_builds)| NewBuildRow {
                    latitude: target.point.latitude,
                    longitude: target.point.longitude,
                    size: target.size,
                    new_builds,
                })
                .collect();
            write_rows(stdout, format, &rows)?;
        }
        Commands::Buildings {
            around,
            full_address,
            snapshot,
        } => {
            let bbox = km_box(around.point(), around.distance_km)?;
            let records = records_for(&config, snapshot.as_deref(), &bbox, &building_query()).await?;
            let nearby: Vec<GeoRecord> = filter_in_box(&records, &bbox).into_iter().cloned().collect();

            let rows: Vec<BuildingRow> = buildings_with_area(&nearby, full_address)
                .into_iter()
                .map(|b| {
                    let tag = |key: &str| b.record.tags.get_str(key).map(str::to_string);
                    BuildingRow {
                        id: b.record.id.clone(),
                        area: b.area,
                        housenumber: tag("addr:housenumber"),
                        street: tag("addr:street"),
                        postcode: tag("addr:postcode"),
                        city: tag("addr:city"),
                    }
                })
                .collect();
            log::info!(
                "{} buildings {} a full address",
                rows.len(),
                if full_address { "with" } else { "without" }
            );
            write_rows(stdout, format, &rows)?;
        }
    }

    Ok(())
}

fn query_prices(
    config: &Config,
    around: &Around,
    prefix: String,
    dates: &DateRange,
) -> Result<Vec<PriceRecord>, Box<dyn std::error::Error>> {
    let conn = prices_db::open(&config.store.path)?;
    let defaults = PriceQuery::new(around.point(), prefix);
    let query = defaults
        .clone()
        .with_distance_km(around.distance_km)
        .with_dates(
            dates.start_date.unwrap_or(defaults.start_date),
            dates.end_date.unwrap_or(defaults.end_date),
        );
    Ok(prices_db::query_prices_near(&conn, &query)?)
}

fn date_bounds(dates: &DateRange) -> (NaiveDate, NaiveDate) {
    let defaults = PriceQuery::new(GeoPoint::new(0.0, 0.0), "");
    (
        dates.start_date.unwrap_or(defaults.start_date),
        dates.end_date.unwrap_or(defaults.end_date),
    )
}

/// Records from the snapshot when one is given, otherwise fetched from
/// Overpass for the box.
async fn records_for(
    config: &Config,
    snapshot: Option<&Path>,
    bbox: &BoundingBox,
    tags: &TagQuery,
) -> Result<Vec<GeoRecord>, Box<dyn std::error::Error>> {
    if let Some(path) = snapshot {
        return Ok(load_geojson_records(path)?);
    }
    let client = OverpassClient::new(&config.overpass)?;
    Ok(client.fetch_in_box(bbox, tags).await?)
}
