use hazardmap_shared::SyncConfig;
use hazardmap_shared::sync::{CompassBar, GraphBar};
use leptos::prelude::*;

use crate::colors::season_css;
use crate::engine::Frames;
use crate::time_format::{day_of_year_offset, format_month_day};

const GRAPH_WIDTH: f64 = 366.0;
const GRAPH_MARGIN: f64 = 14.0;
const PANEL_STYLE: &str = "background: rgba(19,22,31,0.92); border: 1px solid #282c3e; border-radius: 6px; padding: 8px 10px; font-family: 'JetBrains Mono', monospace; font-size: 0.65rem; color: #9a9590;";

/// Tip of a compass bar drawn from `center`. Angles are clockwise from north,
/// so north points up the screen.
pub fn compass_tip(center: (f64, f64), angle: f64, length: f64) -> (f64, f64) {
    (
        center.0 + length * angle.sin(),
        center.1 - length * angle.cos(),
    )
}

/// Left edge and width of a day-of-year bar on a 366-day axis.
pub fn graph_bar_x(day_of_year: u16, width: f64) -> (f64, f64) {
    let slot = width / 366.0;
    (f64::from(day_of_year.saturating_sub(1)) * slot, slot.max(1.0))
}

fn graph_bar_view(bar: GraphBar, height: f64) -> impl IntoView {
    let (x, w) = graph_bar_x(bar.day_of_year, GRAPH_WIDTH);
    view! {
        <rect
            x=format!("{x:.2}")
            y=format!("{:.2}", height - bar.height)
            width=format!("{w:.2}")
            height=format!("{:.2}", bar.height)
            fill="rgba(245,197,66,0.8)"
            style="transition: y 0.2s, height 0.2s;"
        />
    }
}

fn compass_bar_view(bar: CompassBar, center: (f64, f64)) -> impl IntoView {
    let (x2, y2) = compass_tip(center, bar.angle, bar.length);
    view! {
        <line
            x1=format!("{:.1}", center.0)
            y1=format!("{:.1}", center.1)
            x2=format!("{x2:.1}")
            y2=format!("{y2:.1}")
            stroke=season_css(bar.season, 0.75)
            stroke-width="1.5"
            stroke-linecap="round"
            style="transition: x2 0.3s, y2 0.3s;"
        />
    }
}

/// Day-of-year aggregate graph.
#[component]
fn GraphPanel() -> impl IntoView {
    let frames: Frames = expect_context();
    let height = SyncConfig::default().graph_height;

    let bars = move || {
        frames
            .filter
            .get()
            .map(|f| f.graph)
            .unwrap_or_default()
            .into_iter()
            .map(|bar| graph_bar_view(bar, height))
            .collect::<Vec<_>>()
    };
    let cursor_x = move || {
        frames
            .filter
            .get()
            .map(|f| f64::from(day_of_year_offset(f.cursor)) * GRAPH_WIDTH / 366.0)
            .unwrap_or(0.0)
    };

    let cursor_label = move || {
        frames
            .filter
            .get()
            .map(|f| format_month_day(f.cursor))
            .unwrap_or_default()
    };

    view! {
        <div style=PANEL_STYLE>
            <div style="margin-bottom: 4px; color: #e2e0d8; display: flex; justify-content: space-between;">
                <span>"Events by day of year"</span>
                <span style="color: #9a9590;">{cursor_label}</span>
            </div>
            <svg
                width=format!("{}", GRAPH_WIDTH + GRAPH_MARGIN)
                height=format!("{}", height + GRAPH_MARGIN)
                viewBox=format!("0 0 {} {}", GRAPH_WIDTH, height + GRAPH_MARGIN)
            >
                <g>{bars}</g>
                <line
                    x1=move || format!("{:.1}", cursor_x())
                    x2=move || format!("{:.1}", cursor_x())
                    y1="0"
                    y2=format!("{height}")
                    stroke="rgba(226,224,216,0.5)"
                    stroke-width="1"
                />
                <text x="0" y=format!("{}", height + 11.0) fill="#5a5860">"Jan"</text>
                <text x=format!("{}", GRAPH_WIDTH - 18.0) y=format!("{}", height + 11.0) fill="#5a5860">"Dec"</text>
            </svg>
        </div>
    }
}

/// Direction of travel for each event, bar length by magnitude.
#[component]
fn CompassPanel() -> impl IntoView {
    let frames: Frames = expect_context();
    let radius = SyncConfig::default().compass_radius;
    let size = radius * 2.0 + 24.0;
    let center = (size / 2.0, size / 2.0);

    let bars = move || {
        frames
            .filter
            .get()
            .map(|f| f.compass)
            .unwrap_or_default()
            .into_iter()
            .map(|bar| compass_bar_view(bar, center))
            .collect::<Vec<_>>()
    };

    view! {
        <div style=PANEL_STYLE>
            <div style="margin-bottom: 4px; color: #e2e0d8;">"Direction"</div>
            <svg width=format!("{size}") height=format!("{size}")>
                <circle
                    cx=format!("{}", center.0)
                    cy=format!("{}", center.1)
                    r=format!("{radius}")
                    fill="none"
                    stroke="#282c3e"
                />
                <circle
                    cx=format!("{}", center.0)
                    cy=format!("{}", center.1)
                    r=format!("{}", radius / 2.0)
                    fill="none"
                    stroke="#1f2332"
                />
                <text x=format!("{}", center.0 - 3.0) y="10" fill="#5a5860">"N"</text>
                <g>{bars}</g>
            </svg>
        </div>
    }
}

#[component]
pub fn Panels() -> impl IntoView {
    view! {
        <div style="position: absolute; top: 16px; right: 16px; z-index: 20; display: flex; flex-direction: column; gap: 8px;">
            <GraphPanel />
            <CompassPanel />
        </div>
    }
}
