use std::cell::RefCell;

use hazardmap_shared::{FeatureId, LonLat, RenderSync, SyncConfig, SyncEvent, ViewState};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::engine::{self, Frames};
use crate::loader::{self, DataRequest};
use crate::map::MapView;
use crate::panels::Panels;
use crate::playback::TimeoutScheduler;
use crate::timeline::Timeline;
use crate::tooltip::Tooltip;

pub(crate) const INITIAL_CENTER: LonLat = LonLat {
    lon: -78.6389,
    lat: 35.7806,
};
pub(crate) const INITIAL_ZOOM: f64 = 3.0;
/// Margin kept around the data when fitting the view to it.
const FIT_PADDING_PX: f64 = 48.0;

pub(crate) fn window_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

pub(crate) fn initial_view() -> ViewState {
    let (w, h) = window_dimensions();
    ViewState::new(INITIAL_CENTER, INITIAL_ZOOM, w, h)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadPhase {
    Loading,
    Ready,
    Failed(String),
}

/// The view the viewer is steering; redraws catch up on the next frame.
#[derive(Clone, Copy)]
pub(crate) struct TargetView(pub RwSignal<ViewState>);
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<FeatureId>>);
#[derive(Clone, Copy)]
pub(crate) struct MousePos(pub RwSignal<(f64, f64)>);
/// Feature whose popup was opened by a click, with the click position.
#[derive(Clone, Copy)]
pub(crate) struct Pinned(pub RwSignal<Option<(FeatureId, (f64, f64))>>);

struct WindowListener {
    window: web_sys::Window,
    event: &'static str,
    handler: Closure<dyn Fn(web_sys::Event)>,
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback(self.event, self.handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<WindowListener>> = const { RefCell::new(None) };
    static RESIZE_BINDING: RefCell<Option<WindowListener>> = const { RefCell::new(None) };
}

fn listen(
    slot: &'static std::thread::LocalKey<RefCell<Option<WindowListener>>>,
    event: &'static str,
    handler: impl Fn(web_sys::Event) + 'static,
) {
    let Some(window) = web_sys::window() else {
        return;
    };
    slot.with(|slot| slot.borrow_mut().take());

    let handler = Closure::<dyn Fn(web_sys::Event)>::new(handler);
    if window
        .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
        .is_ok()
    {
        slot.with(|slot| {
            *slot.borrow_mut() = Some(WindowListener {
                window,
                event,
                handler,
            });
        });
    }
}

fn fit_to_data(target_view: RwSignal<ViewState>) {
    if let Some(bounds) = engine::with_sync(|sync| sync.data_bounds()).flatten() {
        target_view.update(|v| v.fit_bounds(bounds, FIT_PADDING_PX));
    }
}

fn on_keydown(
    e: web_sys::Event,
    target_view: RwSignal<ViewState>,
    pinned: RwSignal<Option<(FeatureId, (f64, f64))>>,
    frames: Frames,
) {
    let Ok(e) = e.dyn_into::<web_sys::KeyboardEvent>() else {
        return;
    };
    let typing = e
        .target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
        .map(|el| el.tag_name())
        .is_some_and(|tag| tag == "INPUT" || tag == "SELECT");
    if typing {
        return;
    }

    match e.key().as_str() {
        " " => {
            e.prevent_default();
            let event = if frames.playing.get_untracked() {
                SyncEvent::PauseClicked
            } else {
                SyncEvent::PlayClicked
            };
            engine::dispatch(event);
        }
        "[" => engine::step_cursor(false),
        "]" => engine::step_cursor(true),
        "s" => engine::dispatch(SyncEvent::SpeedChanged(frames.speed.get_untracked().cycle())),
        "f" => fit_to_data(target_view),
        "r" | "0" => target_view.set(initial_view()),
        "Escape" => pinned.set(None),
        _ => {}
    }
}

/// Root component: owns the load lifecycle and the page-wide signals.
#[component]
pub fn App() -> impl IntoView {
    let phase = RwSignal::new(LoadPhase::Loading);
    let target_view = RwSignal::new(initial_view());
    let hovered: RwSignal<Option<FeatureId>> = RwSignal::new(None);
    let mouse_pos = RwSignal::new((0.0, 0.0));
    let pinned = RwSignal::new(None);
    let frames = Frames::default();

    provide_context(TargetView(target_view));
    provide_context(Hovered(hovered));
    provide_context(MousePos(mouse_pos));
    provide_context(Pinned(pinned));
    provide_context(frames);

    // One load per mount. The basemap keeps working if it fails.
    Effect::new(move || {
        let request = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .map(|search| DataRequest::from_query(&search))
            .unwrap_or_else(|| DataRequest::from_query(""));
        spawn_local(async move {
            match loader::load(&request).await {
                Ok(dataset) => {
                    let sync = RenderSync::new(
                        dataset,
                        target_view.get_untracked(),
                        TimeoutScheduler::default(),
                        SyncConfig::default(),
                    );
                    engine::install(sync, frames);
                    phase.set(LoadPhase::Ready);
                }
                Err(e) => {
                    web_sys::console::warn_1(
                        &format!("failed to load {}: {e}", request.dataset).into(),
                    );
                    phase.set(LoadPhase::Failed(e));
                }
            }
        });
        on_cleanup(engine::uninstall);
    });

    Effect::new(move || {
        listen(&KEYDOWN_BINDING, "keydown", move |e| {
            on_keydown(e, target_view, pinned, frames)
        });
        listen(&RESIZE_BINDING, "resize", move |_| {
            let (w, h) = window_dimensions();
            target_view.update(|v| v.resize(w, h));
        });
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
            <MapView />
            {move || match phase.get() {
                LoadPhase::Ready => view! {
                    <Panels />
                    <Timeline />
                }.into_any(),
                LoadPhase::Loading => view! {
                    <div class="status-banner" style="position: absolute; top: 16px; left: 50%; transform: translateX(-50%); z-index: 30; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; padding: 6px 14px; color: #9a9590; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem;">
                        "Loading events\u{2026}"
                    </div>
                }.into_any(),
                LoadPhase::Failed(message) => view! {
                    <div class="status-banner" style="position: absolute; top: 16px; left: 50%; transform: translateX(-50%); z-index: 30; background: #13161f; border: 1px solid rgba(219,112,54,0.5); border-radius: 6px; padding: 6px 14px; color: #db7036; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem;">
                        {format!("Could not load events: {message}")}
                    </div>
                }.into_any(),
            }}
        </div>
        <Tooltip />
    }
}
