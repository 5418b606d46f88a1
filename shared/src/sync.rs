use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::DateBounds;
use crate::feature::{Dataset, Feature, FeatureId};
use crate::filter::{FeatureState, FilterMode, FilterState};
use crate::index::DayIndex;
use crate::playback::{Playback, PlaybackState, SpeedTier, TickScheduler};
use crate::projection::{
    GeoBounds, Pixel, PixelBounds, ViewState, path_length, project_geometry, project_line,
};
use crate::season::{Season, SeasonSet};

/// Sizes of the derived visuals, in their own pixel spaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub compass_radius: f64,
    pub graph_height: f64,
    pub max_marker_radius: f64,
    pub min_marker_radius: f64,
    /// Compass bar length for the weakest visible event.
    pub min_compass_length: f64,
    /// Margin added around the overlay's pixel bounds.
    pub surface_padding: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            compass_radius: 90.0,
            min_compass_length: 12.0,
            graph_height: 120.0,
            max_marker_radius: 14.0,
            min_marker_radius: 2.0,
            surface_padding: 16.0,
        }
    }
}

/// Input from the UI chrome or the playback timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Programmatic cursor move (step buttons, keyboard).
    CursorChanged(NaiveDate),
    /// The viewer dragged the slider. Always stops playback first.
    SliderDragged(NaiveDate),
    CategoryToggled(Season),
    ModeChanged(FilterMode),
    SpeedChanged(SpeedTier),
    PlayClicked,
    PauseClicked,
    Tick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedFeature {
    pub id: FeatureId,
    pub season: Season,
    pub points: Vec<Pixel>,
    pub is_path: bool,
    pub length: f64,
}

/// Map overlay styling for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub id: FeatureId,
    pub state: FeatureState,
    /// Paths are drawn with a dash as long as the path; offsetting it by the
    /// full length leaves the path undrawn.
    pub dash_offset: f64,
    pub opacity: f64,
    pub marker_radius: f64,
}

/// One feature's bar on the compass diagram, in compass-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompassBar {
    pub id: FeatureId,
    pub season: Season,
    /// Radians clockwise from north.
    pub angle: f64,
    pub length: f64,
    pub visible: bool,
}

/// One day-of-year bar on the aggregate graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphBar {
    pub day_of_year: u16,
    pub count: usize,
    pub total: usize,
    pub height: f64,
}

/// The three filter-driven visuals for one cursor state. Produced together
/// and applied together; `revision` identifies the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterFrame {
    pub revision: u64,
    pub cursor: NaiveDate,
    pub mode: FilterMode,
    pub active: SeasonSet,
    pub visible_count: usize,
    pub overlay: Vec<OverlayStyle>,
    pub compass: Vec<CompassBar>,
    pub graph: Vec<GraphBar>,
}

/// Reprojected geometry with the last filter result reapplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    pub revision: u64,
    pub view: ViewState,
    pub features: Vec<ProjectedFeature>,
    pub boundaries: Vec<Vec<Pixel>>,
    pub surface: Option<PixelBounds>,
    pub overlay: Vec<OverlayStyle>,
}

/// What the slider needs: its range and the days that have events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderScale {
    pub bounds: DateBounds,
    pub day_count: usize,
    pub event_days: Vec<NaiveDate>,
}

/// Sole owner of view, filter and playback state. Every redraw goes through
/// here so geometry and filter results never disagree.
pub struct RenderSync<S: TickScheduler> {
    dataset: Dataset,
    index: DayIndex,
    bounds: DateBounds,
    magnitudes: Option<(f64, f64)>,
    config: SyncConfig,
    view: ViewState,
    filter: FilterState,
    playback: Playback<S>,
    predicate: Vec<FeatureState>,
    projected: Vec<ProjectedFeature>,
    boundaries: Vec<Vec<Pixel>>,
    revision: u64,
}

impl<S: TickScheduler> RenderSync<S> {
    /// The cursor starts on the latest date so the cumulative view shows the
    /// whole dataset.
    pub fn new(dataset: Dataset, view: ViewState, scheduler: S, config: SyncConfig) -> Self {
        let index = DayIndex::build(dataset.features());
        let bounds = dataset.date_bounds();
        let filter = FilterState::new(bounds.latest);
        let predicate = filter.evaluate(dataset.features());
        let mut sync = Self {
            magnitudes: dataset.magnitude_range(),
            index,
            bounds,
            config,
            view,
            playback: Playback::new(scheduler, filter.speed),
            filter,
            predicate,
            projected: Vec::new(),
            boundaries: Vec::new(),
            revision: 0,
            dataset,
        };
        sync.reproject();
        sync
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn scheduler(&self) -> &S {
        self.playback.scheduler()
    }

    pub fn date_bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn slider_scale(&self) -> SliderScale {
        SliderScale {
            bounds: self.bounds,
            day_count: self.bounds.day_count(),
            event_days: self.index.dates().collect(),
        }
    }

    fn reproject(&mut self) {
        self.projected = self
            .dataset
            .features()
            .iter()
            .map(|f| {
                let points = project_geometry(&self.view, &f.geometry);
                ProjectedFeature {
                    id: f.id,
                    season: f.season,
                    is_path: f.geometry.is_path(),
                    length: path_length(&points),
                    points,
                }
            })
            .collect();
        self.boundaries = self
            .dataset
            .boundaries()
            .map(|layer| {
                layer
                    .lines
                    .iter()
                    .map(|line| project_line(&self.view, line))
                    .collect()
            })
            .unwrap_or_default();
    }

    /// Lon/lat box around every feature, for fitting the view to the data.
    pub fn data_bounds(&self) -> Option<GeoBounds> {
        GeoBounds::enclosing(
            self.dataset
                .features()
                .iter()
                .flat_map(|f| f.geometry.vertices()),
        )
    }

    /// Smallest padded pixel rectangle holding every projected feature.
    pub fn surface_bounds(&self) -> Option<PixelBounds> {
        PixelBounds::enclosing(self.projected.iter().flat_map(|p| p.points.iter()))
            .map(|b| b.padded(self.config.surface_padding))
    }

    /// Pan, zoom, resize or first draw: reproject everything, then restyle
    /// with the predicate already in force.
    pub fn on_view_change(&mut self, view: ViewState) -> ViewFrame {
        self.view = view;
        self.reproject();
        self.revision += 1;
        ViewFrame {
            revision: self.revision,
            view: self.view,
            features: self.projected.clone(),
            boundaries: self.boundaries.clone(),
            surface: self.surface_bounds(),
            overlay: self.overlay_styles(),
        }
    }

    /// Apply one UI or timer event. Returns the redraw for all three visuals
    /// when the filter result may have changed.
    pub fn apply(&mut self, event: SyncEvent) -> Option<FilterFrame> {
        match event {
            SyncEvent::CursorChanged(date) => {
                self.filter.set_cursor(date, self.bounds);
            }
            SyncEvent::SliderDragged(date) => {
                self.playback.pause();
                self.filter.playing = false;
                self.filter.set_cursor(date, self.bounds);
            }
            SyncEvent::CategoryToggled(season) => {
                self.filter.active.toggle(season);
            }
            SyncEvent::ModeChanged(mode) => {
                if mode == self.filter.mode {
                    return None;
                }
                self.filter.mode = mode;
            }
            SyncEvent::SpeedChanged(speed) => {
                self.filter.speed = speed;
                self.playback.set_speed(speed);
                return None;
            }
            SyncEvent::PlayClicked => {
                self.playback.play();
                self.filter.playing = true;
                return None;
            }
            SyncEvent::PauseClicked => {
                self.playback.pause();
                self.filter.playing = false;
                return None;
            }
            SyncEvent::Tick => {
                if !self.playback.on_tick() {
                    return None;
                }
                self.filter.cursor = self.bounds.next_wrapping(self.filter.cursor);
            }
        }
        Some(self.refilter())
    }

    /// Current filter frame without changing any state.
    pub fn current_frame(&mut self) -> FilterFrame {
        self.refilter()
    }

    fn refilter(&mut self) -> FilterFrame {
        self.predicate = self.filter.evaluate(self.dataset.features());
        self.revision += 1;
        FilterFrame {
            revision: self.revision,
            cursor: self.filter.cursor,
            mode: self.filter.mode,
            active: self.filter.active,
            visible_count: self.predicate.iter().filter(|s| s.is_visible()).count(),
            overlay: self.overlay_styles(),
            compass: self.compass_bars(),
            graph: self.graph_bars(),
        }
    }

    /// Magnitude mapped onto [0, 1] across the dataset's own range. A
    /// dataset where every event has the same magnitude maps to 1.
    fn magnitude_ratio(&self, feature: &Feature) -> f64 {
        let Some((lo, hi)) = self.magnitudes else {
            return 1.0;
        };
        if hi <= lo || !feature.magnitude.is_finite() {
            return 1.0;
        }
        ((feature.magnitude - lo) / (hi - lo)).clamp(0.0, 1.0)
    }

    fn marker_radius(&self, feature: &Feature) -> f64 {
        self.config.min_marker_radius
            + (self.config.max_marker_radius - self.config.min_marker_radius)
                * self.magnitude_ratio(feature).sqrt()
    }

    /// Visible bars never collapse; only hidden features get length 0.
    fn compass_length(&self, feature: &Feature) -> f64 {
        let min = self.config.min_compass_length.min(self.config.compass_radius);
        min + (self.config.compass_radius - min) * self.magnitude_ratio(feature)
    }

    fn overlay_styles(&self) -> Vec<OverlayStyle> {
        let features = self.dataset.features();
        self.predicate
            .iter()
            .zip(&self.projected)
            .zip(features)
            .map(|((state, projected), feature)| {
                let shown = state.is_visible();
                let radius = self.marker_radius(feature);
                OverlayStyle {
                    id: feature.id,
                    state: *state,
                    dash_offset: if shown { 0.0 } else { projected.length },
                    opacity: if shown { 1.0 } else { 0.0 },
                    marker_radius: radius,
                }
            })
            .collect()
    }

    fn compass_bars(&self) -> Vec<CompassBar> {
        self.dataset
            .features()
            .iter()
            .zip(&self.predicate)
            .filter_map(|(feature, state)| {
                let angle = feature.direction?;
                let shown = state.is_visible();
                Some(CompassBar {
                    id: feature.id,
                    season: feature.season,
                    angle,
                    length: if shown {
                        self.compass_length(feature)
                    } else {
                        0.0
                    },
                    visible: shown,
                })
            })
            .collect()
    }

    fn graph_bars(&self) -> Vec<GraphBar> {
        let max = self.index.max_bucket().max(1) as f64;
        self.index
            .day_of_year_buckets()
            .map(|(day, ids)| {
                let count = ids
                    .iter()
                    .filter(|id| self.predicate.get(**id).is_some_and(FeatureState::is_visible))
                    .count();
                GraphBar {
                    day_of_year: day,
                    count,
                    total: ids.len(),
                    height: self.config.graph_height * count as f64 / max,
                }
            })
            .collect()
    }

    /// Nearest visible feature within `tolerance` pixels of `at`. Point
    /// markers also count their drawn radius, measured from the edge.
    pub fn hit_test(&self, at: Pixel, tolerance: f64) -> Option<FeatureId> {
        self.projected
            .iter()
            .zip(&self.predicate)
            .zip(self.dataset.features())
            .filter(|((_, state), _)| state.is_visible())
            .filter_map(|((projected, _), feature)| {
                let mut distance = distance_to_polyline(at, &projected.points)?;
                if !projected.is_path {
                    distance = (distance - self.marker_radius(feature)).max(0.0);
                }
                (distance <= tolerance).then_some((projected.id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

fn distance_to_segment(p: Pixel, a: Pixel, b: Pixel) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Pixel::new(a.x + t * dx, a.y + t * dy))
}

fn distance_to_polyline(p: Pixel, points: &[Pixel]) -> Option<f64> {
    match points {
        [] => None,
        [single] => Some(p.distance(*single)),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .min_by(f64::total_cmp),
    }
}
