use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{DateBounds, calendar_date};
use crate::season::Season;

/// Position of a feature in its loaded [`Dataset`].
pub type FeatureId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Initial great-circle bearing toward `other`, radians clockwise from
    /// north in `[0, 2π)`. `None` when both points coincide.
    pub fn bearing_to(&self, other: LonLat) -> Option<f64> {
        if self == &other {
            return None;
        }
        let (phi1, phi2) = (self.lat.to_radians(), other.lat.to_radians());
        let delta = (other.lon - self.lon).to_radians();
        let y = delta.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta.cos();
        let theta = y.atan2(x);
        Some(theta.rem_euclid(std::f64::consts::TAU))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LonLat),
    LineString(Vec<LonLat>),
}

impl Geometry {
    pub fn vertices(&self) -> &[LonLat] {
        match self {
            Geometry::Point(p) => std::slice::from_ref(p),
            Geometry::LineString(points) => points,
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Geometry::LineString(_))
    }

    /// Bearing from the first to the last vertex of a path.
    pub fn endpoint_bearing(&self) -> Option<f64> {
        let Geometry::LineString(points) = self else {
            return None;
        };
        let (first, last) = (points.first()?, points.last()?);
        first.bearing_to(*last)
    }
}

/// One dated event: an earthquake epicenter or a tornado track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub season: Season,
    pub magnitude: f64,
    /// Radians clockwise from north. Absent when the source carries no
    /// usable start/end or bearing.
    pub direction: Option<f64>,
    pub occurred_at: DateTime<FixedOffset>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_km: Option<f64>,
}

impl Feature {
    pub fn new(
        id: FeatureId,
        geometry: Geometry,
        occurred_at: DateTime<FixedOffset>,
        magnitude: f64,
    ) -> Self {
        let date = calendar_date(occurred_at);
        Self {
            id,
            direction: geometry.endpoint_bearing(),
            geometry,
            season: Season::of(date),
            magnitude,
            occurred_at,
            date,
            place: None,
            url: None,
            depth_km: None,
        }
    }
}

/// Undated line work drawn under the events, e.g. tectonic plate boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLayer {
    pub lines: Vec<Vec<LonLat>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("no date or time property")]
    MissingDate,
    #[error("unparseable date: {0}")]
    InvalidDate(String),
    #[error("no geometry")]
    MissingGeometry,
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),
    #[error("geometry has no valid coordinates")]
    EmptyGeometry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFeature {
    /// Index in the source document's `features` array.
    pub index: usize,
    pub reason: SkipReason,
}

/// Per-feature problems found while loading. Skips never fail the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub total: usize,
    pub skipped: Vec<SkippedFeature>,
    pub without_direction: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a FeatureCollection, found {0:?}")]
    NotAFeatureCollection(String),
    #[error("none of the {total} features could be used")]
    NoUsableFeatures { total: usize },
}

/// Loaded, immutable event collection. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Feature>,
    bounds: DateBounds,
    boundaries: Option<BoundaryLayer>,
    report: LoadReport,
}

impl Dataset {
    /// Renumbers feature ids to their position in `features`.
    pub fn new(mut features: Vec<Feature>, report: LoadReport) -> Result<Self, LoadError> {
        for (idx, feature) in features.iter_mut().enumerate() {
            feature.id = idx;
        }
        let bounds = DateBounds::enclosing(features.iter().map(|f| f.date))
            .ok_or(LoadError::NoUsableFeatures { total: report.total })?;
        Ok(Self {
            features,
            bounds,
            boundaries: None,
            report,
        })
    }

    pub fn with_boundaries(mut self, layer: BoundaryLayer) -> Self {
        self.boundaries = Some(layer);
        self
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn date_bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn boundaries(&self) -> Option<&BoundaryLayer> {
        self.boundaries.as_ref()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Smallest and largest finite magnitude. Magnitudes may be zero or
    /// negative (EF0 tracks, micro-quakes).
    pub fn magnitude_range(&self) -> Option<(f64, f64)> {
        self.features
            .iter()
            .map(|f| f.magnitude)
            .filter(|m| m.is_finite())
            .fold(None, |range, m| match range {
                None => Some((m, m)),
                Some((lo, hi)) => Some((m.min(lo), m.max(hi))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_local;

    #[test]
    fn bearing_points_clockwise_from_north() {
        let origin = LonLat::new(0.0, 0.0);
        let north = origin.bearing_to(LonLat::new(0.0, 1.0)).unwrap();
        let east = origin.bearing_to(LonLat::new(1.0, 0.0)).unwrap();
        let west = origin.bearing_to(LonLat::new(-1.0, 0.0)).unwrap();
        assert!(north.abs() < 1e-9);
        assert!((east - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!((west - 3.0 * std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(origin.bearing_to(origin), None);
    }

    #[test]
    fn feature_derives_date_season_and_direction() {
        let at = parse_local("2012-04-02", Some("16:30:00")).unwrap();
        let track = Geometry::LineString(vec![LonLat::new(-90.0, 35.0), LonLat::new(-89.0, 35.0)]);
        let feature = Feature::new(0, track, at, 2.0);
        assert_eq!(feature.date, NaiveDate::from_ymd_opt(2012, 4, 2).unwrap());
        assert_eq!(feature.season, Season::Spring);
        assert!(feature.direction.is_some());

        let quake = Feature::new(1, Geometry::Point(LonLat::new(0.0, 0.0)), at, 4.5);
        assert_eq!(quake.direction, None);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = Dataset::new(Vec::new(), LoadReport { total: 3, ..Default::default() });
        assert!(matches!(err, Err(LoadError::NoUsableFeatures { total: 3 })));
    }

    #[test]
    fn dataset_renumbers_ids() {
        let at = parse_local("2012-01-01", None).unwrap();
        let features = vec![
            Feature::new(7, Geometry::Point(LonLat::new(0.0, 0.0)), at, 1.0),
            Feature::new(9, Geometry::Point(LonLat::new(1.0, 1.0)), at, 3.0),
        ];
        let dataset = Dataset::new(features, LoadReport::default()).unwrap();
        assert_eq!(dataset.features()[1].id, 1);
        assert_eq!(dataset.magnitude_range(), Some((1.0, 3.0)));
    }
}
