use hazardmap_shared::Season;
use leptos::prelude::*;

use crate::app::{Hovered, MousePos, Pinned};
use crate::colors::season_css;
use crate::engine;
use crate::time_format::{format_date, format_time};

#[derive(Clone, PartialEq)]
struct TooltipInfo {
    title: String,
    season: Season,
    magnitude: f64,
    depth_km: Option<f64>,
    date: String,
    time: String,
    url: Option<String>,
}

/// Only web links become "More info" anchors.
pub fn more_info_href(url: &str) -> Option<&str> {
    let url = url.trim();
    (url.starts_with("https://") || url.starts_with("http://")).then_some(url)
}

/// Details for the event under the pointer, or for a clicked event until the
/// next click elsewhere.
#[component]
pub fn Tooltip() -> impl IntoView {
    let Hovered(hovered) = expect_context();
    let MousePos(mouse_pos) = expect_context();
    let Pinned(pinned) = expect_context();

    let info = Memo::new(move |_| {
        let id = pinned
            .with(|p| p.map(|(id, _)| id))
            .or_else(|| hovered.get())?;
        engine::with_sync(|sync| {
            let feature = sync.dataset().get(id)?;
            Some(TooltipInfo {
                title: feature
                    .place
                    .clone()
                    .unwrap_or_else(|| format!("Event #{}", feature.id + 1)),
                season: feature.season,
                magnitude: feature.magnitude,
                depth_km: feature.depth_km,
                date: format_date(feature.date),
                time: format_time(feature.occurred_at),
                url: feature
                    .url
                    .as_deref()
                    .and_then(more_info_href)
                    .map(str::to_owned),
            })
        })
        .flatten()
    });

    view! {
        {move || {
            let info = info.get()?;
            let pinned_at = pinned.get().map(|(_, at)| at);
            let (x, y) = pinned_at.unwrap_or_else(|| mouse_pos.get());
            let link = info.url.clone().filter(|_| pinned_at.is_some());
            Some(view! {
                <div
                    class="tooltip-animate"
                    style:left=format!("{}px", x + 16.0)
                    style:top=format!("{}px", y - 8.0)
                    style:pointer-events=if pinned_at.is_some() { "auto" } else { "none" }
                    style="position: fixed; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; overflow: hidden; box-shadow: 0 4px 16px rgba(0,0,0,0.5); max-width: 240px; display: flex; flex-direction: row;"
                >
                    <div style=format!("width: 3px; flex-shrink: 0; background: {};", season_css(info.season, 0.85)) />
                    <div style="padding: 8px 10px; flex: 1; font-family: 'JetBrains Mono', monospace;">
                        <div style="font-size: 0.78rem; font-weight: 700; color: #e2e0d8; line-height: 1.3;">
                            {info.title}
                        </div>
                        <div style="font-size: 0.65rem; color: #9a9590; margin-top: 2px;">
                            {format!("{} \u{00B7} {}", info.date, info.time)}
                        </div>
                        <div style="font-size: 0.65rem; margin-top: 5px; padding-top: 4px; border-top: 1px solid rgba(40,44,62,0.5); display: flex; justify-content: space-between; gap: 8px;">
                            <span style="color: #9a9590;">"Magnitude"</span>
                            <span style="color: #e2e0d8;">{format!("{:.1}", info.magnitude)}</span>
                        </div>
                        {info.depth_km.map(|depth| view! {
                            <div style="font-size: 0.65rem; margin-top: 3px; display: flex; justify-content: space-between; gap: 8px;">
                                <span style="color: #9a9590;">"Depth"</span>
                                <span style="color: #e2e0d8;">{format!("{depth:.1} km")}</span>
                            </div>
                        })}
                        <div style=format!("font-size: 0.6rem; margin-top: 3px; color: {};", season_css(info.season, 0.9))>
                            {info.season.label()}
                        </div>
                        {link.map(|href| view! {
                            <a
                                href=href
                                target="_blank"
                                rel="noopener noreferrer"
                                style="display: block; font-size: 0.65rem; margin-top: 5px; color: #f5c542; text-decoration: none;"
                            >
                                "More info \u{2197}"
                            </a>
                        })}
                    </div>
                </div>
            })
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::more_info_href;

    #[test]
    fn only_web_links_are_offered() {
        assert_eq!(
            more_info_href(" https://earthquake.usgs.gov/earthquakes/eventpage/us1 "),
            Some("https://earthquake.usgs.gov/earthquakes/eventpage/us1")
        );
        assert_eq!(more_info_href("http://example.org/q"), Some("http://example.org/q"));
        assert_eq!(more_info_href("javascript:alert(1)"), None);
        assert_eq!(more_info_href(""), None);
    }
}
