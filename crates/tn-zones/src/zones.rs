//! Taxi zone polygons loaded from GeoJSON.
//!
//! Input is a `FeatureCollection` whose features carry an integer
//! `LocationID` property and a `Polygon` or `MultiPolygon` geometry:
//!
//! ```json
//! { "type": "FeatureCollection",
//!   "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::2263" } },
//!   "features": [
//!     { "type": "Feature",
//!       "properties": { "LocationID": 4, "zone": "Alphabet City" },
//!       "geometry": { "type": "Polygon", "coordinates": [[[992073.5, 203714.1], …]] } } ] }
//! ```
//!
//! The legacy `crs` member is honoured (the TLC file still ships in
//! EPSG:2263); without one, RFC 7946 WGS-84 is assumed.  A `LocationID` may
//! appear on several features; each becomes its own [`Zone`] with the same id.

use std::path::Path;
use std::time::Instant;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonValue, PolygonType, Value};
use log::{debug, info};

use tn_core::ZoneId;

use crate::crs::Crs;
use crate::{ZoneError, ZoneResult};

const LOCATION_ID: &str = "LocationID";

/// One zone polygon, in WGS-84 lon/lat.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id:      ZoneId,
    pub polygon: MultiPolygon<f64>,
}

/// Load zones from a GeoJSON file.
///
/// `crs_override`, when set, takes precedence over any CRS declared in the
/// file.
pub fn load_zones_geojson(path: &Path, crs_override: Option<Crs>) -> ZoneResult<Vec<Zone>> {
    let started = Instant::now();
    let text = std::fs::read_to_string(path)?;
    let zones = parse_zones_geojson(&text, crs_override)?;
    info!("loaded {}: {} zone polygons in {:.2?}", path.display(), zones.len(), started.elapsed());
    Ok(zones)
}

/// Parse zones from GeoJSON text.  See [`load_zones_geojson`].
pub fn parse_zones_geojson(text: &str, crs_override: Option<Crs>) -> ZoneResult<Vec<Zone>> {
    let geojson: GeoJson = text.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;

    let crs = match crs_override {
        Some(crs) => crs,
        None => declared_crs(&collection)?.unwrap_or_default(),
    };
    debug!("zone polygons in {crs:?}");

    collection
        .features
        .iter()
        .enumerate()
        .map(|(i, feature)| zone_from_feature(i, feature, crs))
        .collect()
}

/// The CRS named by a legacy `"crs": {"type": "name", …}` member, if any.
fn declared_crs(collection: &FeatureCollection) -> ZoneResult<Option<Crs>> {
    collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str)
        .map(Crs::from_name)
        .transpose()
}

fn zone_from_feature(index: usize, feature: &Feature, crs: Crs) -> ZoneResult<Zone> {
    let raw = feature
        .property(LOCATION_ID)
        .ok_or(ZoneError::MissingLocationId { feature: index })?;
    let id = location_id(raw).ok_or_else(|| ZoneError::InvalidLocationId {
        feature: index,
        value:   raw.to_string(),
    })?;

    let value = feature.geometry.as_ref().map(|g| &g.value);
    let polygons: Vec<Polygon<f64>> = match value {
        Some(Value::Polygon(rings)) => vec![polygon(rings, crs)],
        Some(Value::MultiPolygon(parts)) => parts.iter().map(|rings| polygon(rings, crs)).collect(),
        other => {
            return Err(ZoneError::UnsupportedGeometry {
                feature: index,
                kind:    geometry_kind(other).to_owned(),
            });
        }
    };

    Ok(Zone { id, polygon: MultiPolygon::new(polygons) })
}

/// `LocationID` as written by the various exporters: an integer, an
/// integral float (`4.0`), or a numeric string (`"4"`).
fn location_id(value: &JsonValue) -> Option<ZoneId> {
    let raw = match value {
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || !f.is_finite() {
                    return None;
                }
                f as i64
            }
        },
        JsonValue::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    ZoneId::from_raw(raw)
}

fn polygon(rings: &PolygonType, crs: Crs) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| line_string(ring, crs));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

fn line_string(positions: &[Vec<f64>], crs: Crs) -> LineString<f64> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| {
            let g = crs.to_wgs84(p[0], p[1]);
            Coord { x: g.lon, y: g.lat }
        })
        .collect()
}

fn geometry_kind(value: Option<&Value>) -> &'static str {
    match value {
        None => "null",
        Some(Value::Point(_)) => "Point",
        Some(Value::MultiPoint(_)) => "MultiPoint",
        Some(Value::LineString(_)) => "LineString",
        Some(Value::MultiLineString(_)) => "MultiLineString",
        Some(Value::Polygon(_)) => "Polygon",
        Some(Value::MultiPolygon(_)) => "MultiPolygon",
        Some(Value::GeometryCollection(_)) => "GeometryCollection",
    }
}
