use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::calendar::{from_epoch_millis, parse_local};
use crate::feature::{
    BoundaryLayer, Dataset, Feature, Geometry, LoadError, LoadReport, LonLat, SkipReason,
    SkippedFeature,
};

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

fn parse_collection(text: &str) -> Result<RawCollection, LoadError> {
    let raw: RawCollection = serde_json::from_str(text)?;
    if raw.kind != "FeatureCollection" {
        return Err(LoadError::NotAFeatureCollection(raw.kind));
    }
    Ok(raw)
}

fn coord(value: &Value) -> Option<LonLat> {
    let arr = value.as_array()?;
    let lon = arr.first()?.as_f64()?;
    let lat = arr.get(1)?.as_f64()?;
    (lon.is_finite() && lat.is_finite()).then_some(LonLat::new(lon, lat))
}

fn coord_list(value: &Value) -> Vec<LonLat> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(coord).collect())
        .unwrap_or_default()
}

/// Event geometry: a point, a line string, or the longest member of a
/// multi-line string.
fn event_geometry(geometry: Option<&Value>) -> Result<(Geometry, Option<f64>), SkipReason> {
    let geometry = geometry
        .filter(|g| !g.is_null())
        .ok_or(SkipReason::MissingGeometry)?;
    let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("");
    let coordinates = geometry.get("coordinates").unwrap_or(&Value::Null);
    match kind {
        "Point" => {
            let point = coord(coordinates).ok_or(SkipReason::EmptyGeometry)?;
            let depth = coordinates
                .as_array()
                .and_then(|arr| arr.get(2))
                .and_then(Value::as_f64);
            Ok((Geometry::Point(point), depth))
        }
        "LineString" => {
            let points = coord_list(coordinates);
            if points.is_empty() {
                return Err(SkipReason::EmptyGeometry);
            }
            Ok((Geometry::LineString(points), None))
        }
        "MultiLineString" => coordinates
            .as_array()
            .into_iter()
            .flatten()
            .map(coord_list)
            .max_by_key(Vec::len)
            .filter(|points| !points.is_empty())
            .map(|points| (Geometry::LineString(points), None))
            .ok_or(SkipReason::EmptyGeometry),
        other => Err(SkipReason::UnsupportedGeometry(other.to_string())),
    }
}

fn number(props: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// `time` as epoch milliseconds, or `date` with an optional `time` wall clock.
fn occurrence(props: &Map<String, Value>) -> Result<DateTime<FixedOffset>, SkipReason> {
    let time = props.get("time");
    if let Some(millis) = time.and_then(Value::as_i64) {
        return from_epoch_millis(millis).ok_or_else(|| SkipReason::InvalidDate(millis.to_string()));
    }
    let date = props
        .get("date")
        .and_then(Value::as_str)
        .ok_or(SkipReason::MissingDate)?;
    parse_local(date, time.and_then(Value::as_str))
        .ok_or_else(|| SkipReason::InvalidDate(date.to_string()))
}

/// Bearing from an explicit `angle`, else from `slat/slon/elat/elon`.
/// An end point of (0, 0) means "not recorded" in storm track exports.
fn property_direction(props: &Map<String, Value>) -> Option<f64> {
    if let Some(angle) = number(props, "angle") {
        return Some(angle.rem_euclid(std::f64::consts::TAU));
    }
    let start = LonLat::new(number(props, "slon")?, number(props, "slat")?);
    let end = LonLat::new(number(props, "elon")?, number(props, "elat")?);
    if end.lat == 0.0 && end.lon == 0.0 {
        return None;
    }
    start.bearing_to(end)
}

fn string(props: &Map<String, Value>, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn build_feature(raw: &RawFeature, index: usize) -> Result<Feature, SkipReason> {
    let empty = Map::new();
    let props = raw.properties.as_ref().unwrap_or(&empty);
    let (geometry, depth_km) = event_geometry(raw.geometry.as_ref())?;
    let occurred_at = occurrence(props)?;
    let magnitude = number(props, "mag").unwrap_or(0.0);

    let mut feature = Feature::new(index, geometry, occurred_at, magnitude);
    if let Some(direction) = property_direction(props) {
        feature.direction = Some(direction);
    }
    feature.place = string(props, "place");
    feature.url = string(props, "url");
    feature.depth_km = depth_km;
    Ok(feature)
}

impl Dataset {
    /// Parse a GeoJSON FeatureCollection of dated events.
    pub fn from_geojson(text: &str) -> Result<Self, LoadError> {
        let raw = parse_collection(text)?;
        let mut report = LoadReport {
            total: raw.features.len(),
            ..Default::default()
        };
        let mut features = Vec::with_capacity(raw.features.len());
        for (index, raw_feature) in raw.features.iter().enumerate() {
            match build_feature(raw_feature, index) {
                Ok(feature) => {
                    if feature.direction.is_none() {
                        report.without_direction += 1;
                    }
                    features.push(feature);
                }
                Err(reason) => report.skipped.push(SkippedFeature { index, reason }),
            }
        }
        Dataset::new(features, report)
    }
}

impl BoundaryLayer {
    /// Collect every line and polygon ring. Anything else is ignored.
    pub fn from_geojson(text: &str) -> Result<Self, LoadError> {
        let raw = parse_collection(text)?;
        let mut lines = Vec::new();
        for geometry in raw.features.iter().filter_map(|f| f.geometry.as_ref()) {
            let coordinates = geometry.get("coordinates").unwrap_or(&Value::Null);
            let parts: Vec<Vec<LonLat>> =
                match geometry.get("type").and_then(Value::as_str).unwrap_or("") {
                    "LineString" => vec![coord_list(coordinates)],
                    "MultiLineString" | "Polygon" => coordinates
                        .as_array()
                        .into_iter()
                        .flatten()
                        .map(coord_list)
                        .collect(),
                    "MultiPolygon" => coordinates
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_array)
                        .flatten()
                        .map(coord_list)
                        .collect(),
                    _ => Vec::new(),
                };
            lines.extend(parts.into_iter().filter(|line| line.len() >= 2));
        }
        Ok(Self { lines })
    }
}
