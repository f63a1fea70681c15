//! Overpass API client.
//!
//! Queries use `out geom;` so every way and relation member arrives with its
//! coordinates inline and no node lookup table is needed.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use housing_map_config::OverpassConfig;
use housing_map_geography_models::{
    BoundingBox, GeoRecord, RecordGeometry, TagFilter, TagQuery, Tags,
};
use serde::Deserialize;

use crate::OsmError;

/// Tag marking building footprints.
pub const BUILDING_TAG: &str = "building";

const ERROR_BODY_PREVIEW: usize = 200;

/// Keys that make a closed way an area rather than a loop of line.
const AREA_KEYS: [&str; 16] = [
    "building",
    "building:part",
    "landuse",
    "leisure",
    "natural",
    "amenity",
    "shop",
    "tourism",
    "historic",
    "man_made",
    "military",
    "aeroway",
    "office",
    "place",
    "water",
    "area:highway",
];

/// Client for an Overpass interpreter endpoint.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl OverpassClient {
    /// Builds a client from config; the configured timeout applies both to
    /// the HTTP request and to the server-side query.
    ///
    /// # Errors
    ///
    /// Returns [`OsmError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &OverpassConfig) -> Result<Self, OsmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Fetches every node, way and relation in the box matching any entry
    /// of `tags`.
    ///
    /// An empty query returns no records without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns [`OsmError::RateLimited`] on HTTP 429, [`OsmError::Status`]
    /// on any other non-success status, and [`OsmError::Http`] /
    /// [`OsmError::Json`] if the request or the response body fails.
    pub async fn fetch_in_box(
        &self,
        bbox: &BoundingBox,
        tags: &TagQuery,
    ) -> Result<Vec<GeoRecord>, OsmError> {
        let Some(query) = build_query(bbox, tags, self.timeout_secs) else {
            log::debug!("Empty tag query, nothing to fetch");
            return Ok(Vec::new());
        };

        log::debug!("Overpass query:\n{query}");

        let resp = self.client.post(&self.url).body(query).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            log::warn!("Rate limited by Overpass API");
            return Err(OsmError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OsmError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        let body = resp.text().await?;
        let records = parse_overpass_json(&body)?;

        log::info!(
            "Fetched {} OSM records in box N{} S{} E{} W{}",
            records.len(),
            bbox.north(),
            bbox.south(),
            bbox.east(),
            bbox.west()
        );

        Ok(records)
    }
}

/// Tag query selecting building footprints of any kind.
#[must_use]
pub fn building_query() -> TagQuery {
    BTreeMap::from([(BUILDING_TAG.to_string(), TagFilter::Any)])
}

/// Builds an Overpass QL query for the union of the tag filters inside the
/// box, or `None` if no filter can match anything.
///
/// ```text
/// [out:json][timeout:180];
/// (
///   nwr["amenity"~"^(cafe|bar)$"](south,west,north,east);
///   nwr["building"](south,west,north,east);
/// );
/// out geom;
/// ```
#[must_use]
pub fn build_query(bbox: &BoundingBox, tags: &TagQuery, timeout_secs: u64) -> Option<String> {
    let area = format!(
        "({},{},{},{})",
        bbox.south(),
        bbox.west(),
        bbox.north(),
        bbox.east()
    );

    let mut clauses = String::new();
    for (key, filter) in tags {
        let key = escape_string(key);
        match filter {
            TagFilter::Any => {
                let _ = writeln!(clauses, "  nwr[\"{key}\"]{area};");
            }
            TagFilter::Values(values) if values.is_empty() => {
                log::debug!("Tag '{key}' has no accepted values, skipping");
            }
            TagFilter::Values(values) => {
                let alternatives = values
                    .iter()
                    .map(|v| escape_string(&escape_regex(v)))
                    .collect::<Vec<_>>()
                    .join("|");
                let _ = writeln!(clauses, "  nwr[\"{key}\"~\"^({alternatives})$\"]{area};");
            }
        }
    }

    if clauses.is_empty() {
        return None;
    }

    Some(format!(
        "[out:json][timeout:{timeout_secs}];\n(\n{clauses});\nout geom;"
    ))
}

fn escape_regex(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OverpassElement {
    Node {
        id: u64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: u64,
        #[serde(default)]
        geometry: Vec<Option<LatLon>>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: u64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

/// Parses an Overpass `out geom` JSON response.
///
/// Nodes become points and ways line strings, except closed ways with area
/// tags (see [`is_area`]), which become polygons. `multipolygon` relations
/// become multipolygons: member ways of each role are joined end to end
/// into closed rings, and inner rings become holes of the outer ring
/// containing them. Elements without usable geometry are skipped.
///
/// # Errors
///
/// Returns [`OsmError::Json`] if the body is not an Overpass JSON document.
pub fn parse_overpass_json(body: &str) -> Result<Vec<GeoRecord>, OsmError> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    let mut records = Vec::with_capacity(response.elements.len());

    for element in response.elements {
        match element {
            OverpassElement::Node { id, lat, lon, tags } => {
                records.push(GeoRecord::new(
                    format!("node/{id}"),
                    RecordGeometry::Point(Point::new(lon, lat)),
                    to_tags(tags),
                ));
            }
            OverpassElement::Way { id, geometry, tags } => {
                let Some(coords) = complete_coords(&geometry) else {
                    log::debug!("way/{id} has missing or too few coordinates, skipping");
                    continue;
                };
                let geometry = if is_closed_ring(&coords) && is_area(&tags) {
                    RecordGeometry::Polygon(Polygon::new(LineString::new(coords), vec![]))
                } else {
                    RecordGeometry::LineString(LineString::new(coords))
                };
                records.push(GeoRecord::new(format!("way/{id}"), geometry, to_tags(tags)));
            }
            OverpassElement::Relation { id, members, tags } => {
                if tags.get("type").map(String::as_str) != Some("multipolygon") {
                    log::debug!("relation/{id} is not a multipolygon, skipping");
                    continue;
                }
                let Some(multi) = relation_multipolygon(&members) else {
                    log::warn!("relation/{id} has no closed outer ring, skipping");
                    continue;
                };
                records.push(GeoRecord::new(
                    format!("relation/{id}"),
                    RecordGeometry::MultiPolygon(multi),
                    to_tags(tags),
                ));
            }
            OverpassElement::Other => {}
        }
    }

    Ok(records)
}

fn to_tags(tags: BTreeMap<String, String>) -> Tags {
    tags.into_iter().collect()
}

/// Coordinates of a way, or `None` if any are missing or there are fewer
/// than two.
fn complete_coords(geometry: &[Option<LatLon>]) -> Option<Vec<Coord<f64>>> {
    let coords = geometry
        .iter()
        .map(|p| p.map(|p| Coord { x: p.lon, y: p.lat }))
        .collect::<Option<Vec<_>>>()?;
    (coords.len() >= 2).then_some(coords)
}

fn is_closed_ring(coords: &[Coord<f64>]) -> bool {
    coords.len() >= 4 && coords.first() == coords.last()
}

/// Whether a closed way's tags describe an area: `area=yes`, or any of
/// [`AREA_KEYS`] unless `area=no`. Closed `highway`/`railway` loops and
/// barriers stay lines.
fn is_area(tags: &BTreeMap<String, String>) -> bool {
    match tags.get("area").map(String::as_str) {
        Some("yes") => true,
        Some("no") => false,
        _ => AREA_KEYS.iter().any(|key| tags.contains_key(*key)),
    }
}

/// Joins member ways into closed rings.
///
/// Ways sharing an endpoint are chained, reversing a way where its
/// direction disagrees, until the chain closes. Chains that never close
/// are dropped.
fn assemble_rings(mut open: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut rings = Vec::new();

    while let Some(mut chain) = open.pop() {
        while !is_closed_ring(&chain) {
            let Some(&end) = chain.last() else {
                break;
            };
            let Some(next) = open
                .iter()
                .position(|way| way.first() == Some(&end) || way.last() == Some(&end))
            else {
                break;
            };

            let mut way = open.swap_remove(next);
            if way.first() != Some(&end) {
                way.reverse();
            }
            chain.extend(way.into_iter().skip(1));
        }

        if is_closed_ring(&chain) {
            rings.push(LineString::new(chain));
        } else {
            log::debug!("Dropping unclosed ring of {} coordinates", chain.len());
        }
    }

    rings.reverse();
    rings
}

fn relation_multipolygon(members: &[Member]) -> Option<MultiPolygon<f64>> {
    let rings = |role: &str| {
        let ways = members
            .iter()
            .filter(|m| m.kind == "way" && m.role == role)
            .filter_map(|m| complete_coords(&m.geometry))
            .rev()
            .collect::<Vec<_>>();
        assemble_rings(ways)
    };

    let mut outers: Vec<Polygon<f64>> = rings("outer")
        .into_iter()
        .map(|ring| Polygon::new(ring, vec![]))
        .collect();
    if outers.is_empty() {
        return None;
    }

    for inner in rings("inner") {
        let hole = Polygon::new(inner.clone(), vec![]);
        if let Some(outer) = outers.iter_mut().find(|outer| outer.contains(&hole)) {
            outer.interiors_push(inner);
        }
    }

    Some(MultiPolygon::new(outers))
}
