use std::cell::Cell;
use std::fmt::Write as FmtWrite;
use std::rc::Rc;

use hazardmap_shared::projection::{PlacedTile, TileCoord, visible_tiles};
use hazardmap_shared::sync::{OverlayStyle, ProjectedFeature};
use hazardmap_shared::{LonLat, Pixel, ViewState};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{PointerEvent, WheelEvent};

use crate::app::{Hovered, MousePos, Pinned, TargetView};
use crate::colors::season_css;
use crate::engine::{self, Frames};
use crate::render_loop::RenderScheduler;

const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
/// Zoom levels per wheel pixel.
const WHEEL_ZOOM_RATE: f64 = 0.002;
const HOVER_TOLERANCE_PX: f64 = 6.0;
const PATH_STROKE_WIDTH: f64 = 2.5;
/// A press that moves less than this is a click, not a pan.
const CLICK_SLOP_PX: f64 = 4.0;
/// Reference pin over downtown Raleigh.
pub(crate) const LANDMARK: LonLat = LonLat {
    lon: -78.6394,
    lat: 35.7822,
};

pub fn tile_url(tile: TileCoord) -> String {
    TILE_URL
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

/// SVG path data for a projected polyline.
pub fn path_data(points: &[Pixel]) -> String {
    let mut d = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{:.1},{:.1}", p.x, p.y);
    }
    d
}

/// Teardrop marker with its tip on `tip`.
pub fn pin_path(tip: Pixel) -> String {
    format!(
        "M{:.1},{:.1}c-2,-6 -7,-9 -7,-14a7,7 0 1,1 14,0c0,5 -5,8 -7,14z",
        tip.x, tip.y
    )
}

fn element_offset(e: &web_sys::MouseEvent) -> (f64, f64) {
    e.current_target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        })
        .unwrap_or((e.offset_x() as f64, e.offset_y() as f64))
}

fn tile_view(tile: PlacedTile) -> impl IntoView {
    view! {
        <image
            href=tile_url(tile.tile)
            x=format!("{:.2}", tile.left)
            y=format!("{:.2}", tile.top)
            width=format!("{:.2}", tile.size + 0.5)
            height=format!("{:.2}", tile.size + 0.5)
            preserveAspectRatio="none"
        />
    }
}

fn feature_view(feature: &ProjectedFeature, style: Option<&OverlayStyle>) -> AnyView {
    let color = season_css(feature.season, 0.9);
    let opacity = style.map_or(1.0, |s| s.opacity);
    if feature.is_path && feature.length > 0.0 {
        let dash_offset = style.map_or(0.0, |s| s.dash_offset);
        view! {
            <path
                d=path_data(&feature.points)
                fill="none"
                stroke=color
                stroke-width=PATH_STROKE_WIDTH.to_string()
                stroke-linecap="round"
                stroke-dasharray=format!("{:.2}", feature.length)
                stroke-dashoffset=format!("{dash_offset:.2}")
                opacity=opacity.to_string()
                style="transition: stroke-dashoffset 0.6s ease-out, opacity 0.3s;"
            />
        }
        .into_any()
    } else {
        let Some(center) = feature.points.first().copied() else {
            return ().into_any();
        };
        let radius = style.map_or(3.0, |s| s.marker_radius);
        view! {
            <circle
                cx=format!("{:.1}", center.x)
                cy=format!("{:.1}", center.y)
                r=format!("{radius:.1}")
                fill=color
                fill-opacity="0.55"
                stroke="rgba(12,14,23,0.8)"
                stroke-width="0.8"
                opacity=opacity.to_string()
                style="transition: opacity 0.3s;"
            />
        }
        .into_any()
    }
}

/// Basemap tiles, boundary lines and the event overlay in one SVG.
#[component]
pub fn MapView() -> impl IntoView {
    let TargetView(target_view) = expect_context();
    let Hovered(hovered) = expect_context();
    let MousePos(mouse_pos) = expect_context();
    let Pinned(pinned) = expect_context();
    let frames: Frames = expect_context();

    // What is on screen; trails `target_view` by at most one frame.
    let drawn_view: RwSignal<ViewState> = RwSignal::new(target_view.get_untracked());

    let scheduler = RenderScheduler::new(move || {
        let view = target_view.get_untracked();
        drawn_view.set(view);
        engine::set_view(view);
    });
    let sched_view = scheduler.clone();
    Effect::new(move || {
        target_view.track();
        sched_view.mark_dirty();
    });
    // First frame after the dataset arrives.
    Effect::new(move || {
        if frames.slider.with(Option::is_some) {
            scheduler.mark_dirty();
        }
    });

    let tiles = Memo::new(move |_| visible_tiles(&drawn_view.get()));

    // Geometry from the last view pass, styles from whichever pass is newer.
    let overlay = move || {
        let view_frame = frames.view.get()?;
        let filter_frame = frames.filter.get();
        let styles = match filter_frame {
            Some(f) if f.revision > view_frame.revision => f.overlay,
            _ => view_frame.overlay,
        };
        Some((view_frame.features, view_frame.boundaries, styles))
    };

    let dragging = Rc::new(Cell::new(false));
    let last = Rc::new(Cell::new((0.0f64, 0.0f64)));
    // Distance travelled since the last pointerdown.
    let travel = Rc::new(Cell::new(0.0f64));

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let (x, y) = element_offset(&e);
        let delta = -e.delta_y() * WHEEL_ZOOM_RATE;
        target_view.update(|v| v.zoom_at(delta, Pixel::new(x, y)));
    };

    let on_pointer_down = {
        let dragging = dragging.clone();
        let last = last.clone();
        let travel = travel.clone();
        move |e: PointerEvent| {
            dragging.set(true);
            travel.set(0.0);
            hovered.set(None);
            last.set((e.client_x() as f64, e.client_y() as f64));
            if let Some(target) = e.current_target()
                && let Ok(el) = target.dyn_into::<web_sys::Element>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
        }
    };

    let on_pointer_move = {
        let dragging = dragging.clone();
        let last = last.clone();
        let travel = travel.clone();
        move |e: PointerEvent| {
            let (cx, cy) = (e.client_x() as f64, e.client_y() as f64);
            if dragging.get() {
                let (lx, ly) = last.get();
                last.set((cx, cy));
                travel.set(travel.get() + (cx - lx).hypot(cy - ly));
                if travel.get() >= CLICK_SLOP_PX && pinned.get_untracked().is_some() {
                    pinned.set(None);
                }
                target_view.update(|v| v.pan_by(cx - lx, cy - ly));
                return;
            }
            let (x, y) = element_offset(&e);
            let hit = engine::with_sync(|sync| sync.hit_test(Pixel::new(x, y), HOVER_TOLERANCE_PX))
                .flatten();
            if hit != hovered.get_untracked() {
                hovered.set(hit);
            }
            if hit.is_some() {
                mouse_pos.set((cx, cy));
            }
        }
    };

    let on_pointer_up = {
        let dragging = dragging.clone();
        move |e: PointerEvent| {
            dragging.set(false);
            if travel.get() >= CLICK_SLOP_PX {
                return;
            }
            let (x, y) = element_offset(&e);
            let hit = engine::with_sync(|sync| sync.hit_test(Pixel::new(x, y), HOVER_TOLERANCE_PX))
                .flatten();
            pinned.set(hit.map(|id| (id, (e.client_x() as f64, e.client_y() as f64))));
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        if hovered.get_untracked().is_some() {
            hovered.set(None);
        }
    };

    view! {
        <svg
            style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab; user-select: none;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
        >
            <g class="basemap">
                {move || tiles.get().into_iter().map(tile_view).collect::<Vec<_>>()}
            </g>
            {move || {
                let (features, boundaries, styles) = overlay()?;
                let lines = boundaries
                    .iter()
                    .map(|line| view! {
                        <path
                            d=path_data(line)
                            fill="none"
                            stroke="rgba(226,224,216,0.45)"
                            stroke-width="1"
                            stroke-dasharray="4 3"
                        />
                    })
                    .collect::<Vec<_>>();
                let events = features
                    .iter()
                    .map(|f| feature_view(f, styles.get(f.id)))
                    .collect::<Vec<_>>();
                Some(view! {
                    <g class="boundaries">{lines}</g>
                    <g class="events">{events}</g>
                })
            }}
            {move || {
                let tip = drawn_view.get().to_container(LANDMARK);
                view! {
                    <g class="landmark" style="pointer-events: none;">
                        <path d=pin_path(tip) fill="#db7036" stroke="#0c0e17" stroke-width="1" />
                        <circle
                            cx=format!("{:.1}", tip.x)
                            cy=format!("{:.1}", tip.y - 14.0)
                            r="2.5"
                            fill="#e2e0d8"
                        />
                    </g>
                }
            }}
        </svg>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_url_fills_template() {
        let tile = TileCoord { x: 4, y: 6, z: 4 };
        assert_eq!(tile_url(tile), "https://tile.openstreetmap.org/4/4/6.png");
    }

    #[test]
    fn pin_tip_sits_on_the_anchor() {
        assert!(pin_path(Pixel::new(10.0, 20.0)).starts_with("M10.0,20.0c"));
    }

    #[test]
    fn landmark_is_near_the_initial_center() {
        use crate::app::{INITIAL_CENTER, INITIAL_ZOOM};
        let view = ViewState::new(INITIAL_CENTER, INITIAL_ZOOM, 800.0, 600.0);
        let tip = view.to_container(LANDMARK);
        assert!((tip.x - 400.0).abs() < 2.0, "{tip:?}");
        assert!((tip.y - 300.0).abs() < 2.0, "{tip:?}");
    }

    #[test]
    fn path_data_starts_with_move() {
        let d = path_data(&[Pixel::new(1.0, 2.0), Pixel::new(3.5, 4.0)]);
        assert_eq!(d, "M1.0,2.0L3.5,4.0");
        assert_eq!(path_data(&[]), "");
    }
}
