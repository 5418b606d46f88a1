//! Spherical Web Mercator, matching the tiling scheme of slippy-map
//! basemaps so overlay geometry lines up with the tiles beneath it.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::feature::{Geometry, LonLat};

pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 18.0;
const MAX_LATITUDE: f64 = 85.051_128_779_8;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Pixel) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Width of the whole world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Normalized Mercator position: both axes in `[0, 1]`, origin top-left.
fn mercator(p: LonLat) -> (f64, f64) {
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lon + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn inverse_mercator(x: f64, y: f64) -> LonLat {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LonLat::new(lon, lat)
}

/// World pixel coordinate of `p` at `zoom`.
pub fn project(p: LonLat, zoom: f64) -> Pixel {
    let (x, y) = mercator(p);
    let size = world_size(zoom);
    Pixel::new(x * size, y * size)
}

pub fn unproject(px: Pixel, zoom: f64) -> LonLat {
    let size = world_size(zoom);
    inverse_mercator(px.x / size, px.y / size)
}

/// Affine map from normalized Mercator space to container pixels:
/// `pixel = normalized * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl ViewTransform {
    pub fn apply(&self, p: LonLat) -> Pixel {
        let (x, y) = mercator(p);
        Pixel::new(
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }

    pub fn invert(&self, px: Pixel) -> LonLat {
        inverse_mercator(
            (px.x - self.translate_x) / self.scale,
            (px.y - self.translate_y) / self.scale,
        )
    }
}

/// Lon/lat rectangle, west/south/east/north in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a LonLat>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = Self {
            west: first.lon,
            south: first.lat,
            east: first.lon,
            north: first.lat,
        };
        Some(iter.fold(init, |b, p| Self {
            west: b.west.min(p.lon),
            south: b.south.min(p.lat),
            east: b.east.max(p.lon),
            north: b.north.max(p.lat),
        }))
    }
}

/// The map's current view: what the basemap shows and how lon/lat lands on
/// the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: LonLat,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewState {
    pub fn new(center: LonLat, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// World pixel shown at the container's top-left corner.
    pub fn pixel_origin(&self) -> Pixel {
        let c = project(self.center, self.zoom);
        Pixel::new(c.x - self.width / 2.0, c.y - self.height / 2.0)
    }

    pub fn transform(&self) -> ViewTransform {
        let origin = self.pixel_origin();
        ViewTransform {
            scale: world_size(self.zoom),
            translate_x: -origin.x,
            translate_y: -origin.y,
        }
    }

    /// Container pixel of a geographic coordinate.
    pub fn to_container(&self, p: LonLat) -> Pixel {
        self.transform().apply(p)
    }

    pub fn to_lonlat(&self, px: Pixel) -> LonLat {
        self.transform().invert(px)
    }

    /// Move the content by `(dx, dy)` screen pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let c = project(self.center, self.zoom);
        self.center = unproject(Pixel::new(c.x - dx, c.y - dy), self.zoom);
    }

    /// Change zoom by `delta` levels, keeping the point under `focus` fixed.
    pub fn zoom_at(&mut self, delta: f64, focus: Pixel) {
        let new_zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_zoom == self.zoom {
            return;
        }
        let anchor = self.to_lonlat(focus);
        let anchor_world = project(anchor, new_zoom);
        let center_world = Pixel::new(
            anchor_world.x - (focus.x - self.width / 2.0),
            anchor_world.y - (focus.y - self.height / 2.0),
        );
        self.zoom = new_zoom;
        self.center = unproject(center_world, new_zoom);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Tightest zoom and center showing all of `bounds` inside a `padding`
    /// pixel margin.
    pub fn fit_bounds(&mut self, bounds: GeoBounds, padding: f64) {
        let nw = project(LonLat::new(bounds.west, bounds.north), 0.0);
        let se = project(LonLat::new(bounds.east, bounds.south), 0.0);
        let span_x = se.x - nw.x;
        let span_y = se.y - nw.y;
        let avail_w = self.width - 2.0 * padding;
        let avail_h = self.height - 2.0 * padding;

        let mid = unproject(Pixel::new((nw.x + se.x) / 2.0, (nw.y + se.y) / 2.0), 0.0);
        self.center = mid;
        if span_x <= 0.0 || span_y <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
            return;
        }
        let scale = (avail_w / span_x).min(avail_h / span_y);
        self.zoom = scale.log2().clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

pub fn project_geometry(view: &ViewState, geometry: &Geometry) -> Vec<Pixel> {
    let transform = view.transform();
    geometry
        .vertices()
        .iter()
        .map(|p| transform.apply(*p))
        .collect()
}

pub fn project_line(view: &ViewState, line: &[LonLat]) -> Vec<Pixel> {
    let transform = view.transform();
    line.iter().map(|p| transform.apply(*p)).collect()
}

/// Total polyline length in pixels.
pub fn path_length(points: &[Pixel]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Axis-aligned rectangle in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PixelBounds {
    /// Smallest rectangle containing every point.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Pixel>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(iter.fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn padded(&self, amount: f64) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// One basemap tile and where it lands in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile: TileCoord,
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

pub const MAX_TILE_ZOOM: u32 = 19;

/// Tiles covering the viewport at the nearest integer zoom, scaled to the
/// fractional view zoom. Columns wrap around the anti-meridian.
pub fn visible_tiles(view: &ViewState) -> Vec<PlacedTile> {
    if view.width <= 0.0 || view.height <= 0.0 {
        return Vec::new();
    }
    let z = view.zoom.round().clamp(0.0, MAX_TILE_ZOOM as f64) as u32;
    let scale = (view.zoom - z as f64).exp2();
    let size = TILE_SIZE * scale;
    let origin = view.pixel_origin();
    let count = 1i64 << z;

    let first_col = (origin.x / size).floor() as i64;
    let last_col = ((origin.x + view.width) / size).floor() as i64;
    let first_row = ((origin.y / size).floor() as i64).max(0);
    let last_row = (((origin.y + view.height) / size).floor() as i64).min(count - 1);

    let mut tiles = Vec::new();
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            tiles.push(PlacedTile {
                tile: TileCoord {
                    x: col.rem_euclid(count) as u32,
                    y: row as u32,
                    z,
                },
                left: col as f64 * size - origin.x,
                top: row as f64 * size - origin.y,
                size,
            });
        }
    }
    tiles
}
