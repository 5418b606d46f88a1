use hazardmap_shared::{FilterMode, Season, SpeedTier, SyncEvent};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::colors::{muted, rgba_css, season_rgb};
use crate::engine::{self, Frames};
use crate::time_format::{format_date, format_month};

const PLAY_SVG: &str = r#"<svg width="12" height="14" viewBox="0 0 12 14" fill="currentColor" xmlns="http://www.w3.org/2000/svg"><path d="M1 1.5v11l10-5.5z"/></svg>"#;
const PAUSE_SVG: &str = r#"<svg width="12" height="14" viewBox="0 0 12 14" fill="currentColor" xmlns="http://www.w3.org/2000/svg"><rect x="1" y="1" width="3.5" height="12" rx="0.75"/><rect x="7.5" y="1" width="3.5" height="12" rx="0.75"/></svg>"#;
const SKIP_BACK_SVG: &str = r#"<svg width="14" height="12" viewBox="0 0 14 12" fill="currentColor" xmlns="http://www.w3.org/2000/svg"><rect x="1" y="1" width="2" height="10" rx="0.5"/><path d="M13 1v10L5.5 6z"/></svg>"#;
const SKIP_FWD_SVG: &str = r#"<svg width="14" height="12" viewBox="0 0 14 12" fill="currentColor" xmlns="http://www.w3.org/2000/svg"><rect x="11" y="1" width="2" height="10" rx="0.5"/><path d="M1 1v10l7.5-5z"/></svg>"#;

const BUTTON_STYLE: &str = "background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; cursor: pointer; color: #9a9590; width: 28px; height: 28px; display: flex; align-items: center; justify-content: center; flex-shrink: 0; margin-left: 4px; touch-action: manipulation;";
const DIVIDER: &str = "width: 1px; height: 24px; background: #282c3e; margin: 0 10px; flex-shrink: 0;";

/// Percent position of slider offset `offset` on a slider with `day_count` stops.
pub fn tick_percent(offset: usize, day_count: usize) -> f64 {
    if day_count <= 1 {
        return 0.0;
    }
    offset as f64 * 100.0 / (day_count - 1) as f64
}

fn input_value(e: &web_sys::Event) -> Option<String> {
    let target = e.target()?;
    if let Some(input) = target.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(input.value());
    }
    target
        .dyn_ref::<web_sys::HtmlSelectElement>()
        .map(|select| select.value())
}

#[component]
fn SeasonToggle(season: Season) -> impl IntoView {
    let frames: Frames = expect_context();
    let active = move || {
        frames
            .filter
            .with(|f| f.as_ref().is_none_or(|f| f.active.contains(season)))
    };
    let (r, g, b) = season_rgb(season);
    let (mr, mg, mb) = muted(r, g, b);

    view! {
        <button
            title=format!("Show or hide {} events", season.label())
            style="border-radius: 4px; padding: 4px 8px; margin-left: 4px; cursor: pointer; font-family: 'JetBrains Mono', monospace; font-size: 0.65rem; background: #1a1d2a; flex-shrink: 0;"
            style:color=move || if active() { rgba_css(r, g, b, 1.0) } else { rgba_css(mr, mg, mb, 1.0) }
            style:border=move || {
                if active() {
                    format!("1px solid {}", rgba_css(r, g, b, 0.6))
                } else {
                    "1px solid #282c3e".to_string()
                }
            }
            style:text-decoration=move || if active() { "none" } else { "line-through" }
            on:click=move |_| engine::dispatch(SyncEvent::CategoryToggled(season))
        >
            {season.label()}
        </button>
    }
}

/// Date slider with playback, filter mode and season controls.
#[component]
pub fn Timeline() -> impl IntoView {
    let frames: Frames = expect_context();
    let playing = frames.playing;
    let speed = frames.speed;
    let slider = frames.slider;

    let cursor = move || frames.filter.with(|f| f.as_ref().map(|f| f.cursor));
    let mode = move || frames.filter.with(|f| f.as_ref().map(|f| f.mode).unwrap_or_default());
    let offset = move || {
        let cursor = cursor()?;
        slider.with(|s| s.as_ref().map(|s| s.bounds.offset_of(cursor)))
    };
    let max_offset = move || {
        slider
            .with(|s| s.as_ref().map(|s| s.day_count.saturating_sub(1)))
            .unwrap_or(0)
    };

    let on_slider_input = move |e: web_sys::Event| {
        let Some(value) = input_value(&e).and_then(|v| v.parse::<usize>().ok()) else {
            return;
        };
        let Some(date) = slider.with_untracked(|s| s.as_ref().map(|s| s.bounds.date_at(value)))
        else {
            return;
        };
        engine::dispatch(SyncEvent::SliderDragged(date));
    };

    let on_speed_change = move |e: web_sys::Event| {
        if let Some(tier) = input_value(&e).and_then(|v| SpeedTier::from_label(&v)) {
            engine::dispatch(SyncEvent::SpeedChanged(tier));
        }
    };

    let ticks = move || {
        slider.with(|s| {
            let Some(scale) = s.as_ref() else {
                return Vec::new();
            };
            scale
                .event_days
                .iter()
                .map(|day| {
                    let left = tick_percent(scale.bounds.offset_of(*day), scale.day_count);
                    view! {
                        <div style=format!(
                            "position: absolute; left: {left:.3}%; top: 0; width: 1px; height: 5px; background: rgba(245,197,66,0.45);"
                        ) />
                    }
                })
                .collect::<Vec<_>>()
        })
    };

    let mode_button = move |target: FilterMode, label: &'static str| {
        view! {
            <button
                style="border: 1px solid #282c3e; padding: 4px 8px; cursor: pointer; font-family: 'JetBrains Mono', monospace; font-size: 0.65rem; flex-shrink: 0;"
                style:background=move || if mode() == target { "#232738" } else { "#1a1d2a" }
                style:color=move || if mode() == target { "#f5c542" } else { "#9a9590" }
                on:click=move |_| engine::dispatch(SyncEvent::ModeChanged(target))
            >
                {label}
            </button>
        }
    };

    view! {
        <div
            class="timeline-bar"
            style="position: absolute; bottom: 0; left: 0; right: 0; z-index: 25; height: 52px; padding: 0 16px; display: flex; align-items: center; background: #13161f; border-top: 1px solid rgba(245,197,66,0.15); font-family: 'JetBrains Mono', monospace; font-size: 0.72rem;"
        >
            <button
                title=move || if playing.get() { "Pause (Space)" } else { "Play (Space)" }
                style="background: #1a1d2a; border: 1px solid #282c3e; border-radius: 6px; cursor: pointer; color: #f5c542; width: 32px; height: 32px; display: flex; align-items: center; justify-content: center; flex-shrink: 0;"
                inner_html=move || if playing.get() { PAUSE_SVG } else { PLAY_SVG }
                on:click=move |_| {
                    let event = if playing.get_untracked() {
                        SyncEvent::PauseClicked
                    } else {
                        SyncEvent::PlayClicked
                    };
                    engine::dispatch(event);
                }
            />
            <button title="Previous day ([)" style=BUTTON_STYLE inner_html=SKIP_BACK_SVG on:click=move |_| engine::step_cursor(false) />
            <button title="Next day (])" style=BUTTON_STYLE inner_html=SKIP_FWD_SVG on:click=move |_| engine::step_cursor(true) />

            <div style=DIVIDER />

            <select
                prop:value=move || speed.get().label()
                style="background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #9a9590; font-size: 0.68rem; padding: 4px 6px; cursor: pointer; font-family: 'JetBrains Mono', monospace; flex-shrink: 0; outline: none;"
                on:change=on_speed_change
            >
                {SpeedTier::ALL
                    .into_iter()
                    .map(|tier| view! { <option value=tier.label()>{tier.label()}</option> })
                    .collect::<Vec<_>>()}
            </select>

            <div style=DIVIDER />

            <div style="display: flex; flex-shrink: 0;">
                {mode_button(FilterMode::Cumulative, "Cumulative")}
                {mode_button(FilterMode::Daily, "Daily")}
            </div>

            <div style=DIVIDER />

            <span style="color: #5a5860; flex-shrink: 0; font-size: 0.65rem;">
                {move || slider.with(|s| s.as_ref().map(|s| format_month(s.bounds.earliest))).unwrap_or_default()}
            </span>
            <div style="position: relative; flex: 1; margin: 0 8px; min-width: 80px;">
                <input
                    type="range"
                    class="timeline-slider"
                    style="width: 100%;"
                    min="0"
                    max=move || max_offset().to_string()
                    prop:value=move || offset().unwrap_or(0).to_string()
                    on:input=on_slider_input
                />
                <div style="position: absolute; left: 0; right: 0; bottom: -4px; height: 5px; pointer-events: none;">
                    {ticks}
                </div>
            </div>
            <span style="color: #5a5860; flex-shrink: 0; font-size: 0.65rem;">
                {move || slider.with(|s| s.as_ref().map(|s| format_month(s.bounds.latest))).unwrap_or_default()}
            </span>

            <div style=DIVIDER />
            <span style="color: #e2e0d8; flex-shrink: 0; min-width: 100px; text-align: center; font-size: 0.7rem;">
                {move || cursor().map(format_date).unwrap_or_default()}
            </span>
            <span style="color: #5a5860; flex-shrink: 0; font-size: 0.65rem; margin-left: 6px;">
                {move || frames.filter.with(|f| f.as_ref().map(|f| format!("{} shown", f.visible_count))).unwrap_or_default()}
            </span>

            <div style=DIVIDER />
            {Season::ALL.into_iter().map(|season| view! { <SeasonToggle season=season /> }).collect::<Vec<_>>()}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::tick_percent;

    #[test]
    fn ticks_span_the_slider() {
        assert_eq!(tick_percent(0, 93), 0.0);
        assert_eq!(tick_percent(92, 93), 100.0);
        assert_eq!(tick_percent(46, 93), 50.0);
    }

    #[test]
    fn single_day_range_pins_ticks_left() {
        assert_eq!(tick_percent(0, 1), 0.0);
        assert_eq!(tick_percent(0, 0), 0.0);
    }
}
