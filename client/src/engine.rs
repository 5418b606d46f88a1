use std::cell::RefCell;

use hazardmap_shared::sync::SliderScale;
use hazardmap_shared::{
    FilterFrame, PlaybackState, RenderSync, SpeedTier, SyncEvent, ViewFrame, ViewState,
};
use leptos::prelude::*;

use crate::playback::TimeoutScheduler;

pub type Pipeline = RenderSync<TimeoutScheduler>;

/// Signals the engine publishes into after every pass.
#[derive(Clone, Copy)]
pub struct Frames {
    pub view: RwSignal<Option<ViewFrame>>,
    pub filter: RwSignal<Option<FilterFrame>>,
    pub playing: RwSignal<bool>,
    pub speed: RwSignal<SpeedTier>,
    pub slider: RwSignal<Option<SliderScale>>,
}

impl Default for Frames {
    fn default() -> Self {
        Self {
            view: RwSignal::new(None),
            filter: RwSignal::new(None),
            playing: RwSignal::new(false),
            speed: RwSignal::new(SpeedTier::default()),
            slider: RwSignal::new(None),
        }
    }
}

struct Engine {
    sync: Pipeline,
    frames: Frames,
}

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
}

/// Hand a ready pipeline to the page and publish its first frames.
pub fn install(sync: Pipeline, frames: Frames) {
    let view = *sync.view();
    let slider = sync.slider_scale();
    ENGINE.with(|slot| {
        *slot.borrow_mut() = Some(Engine { sync, frames });
    });
    frames.slider.set(Some(slider));
    set_view(view);
    let frame = ENGINE.with(|slot| slot.borrow_mut().as_mut().map(|e| e.sync.current_frame()));
    if let Some(frame) = frame {
        frames.filter.set(Some(frame));
    }
}

/// Drops the pipeline and with it any pending playback timer.
pub fn uninstall() {
    let old = ENGINE.with(|slot| slot.borrow_mut().take());
    drop(old);
}

pub fn dispatch(event: SyncEvent) {
    let update = ENGINE.with(|slot| {
        let mut slot = slot.borrow_mut();
        let engine = slot.as_mut()?;
        let frame = engine.sync.apply(event);
        let playing = engine.sync.playback_state() == PlaybackState::Running;
        Some((engine.frames, frame, playing, engine.sync.filter().speed))
    });
    let Some((frames, frame, playing, speed)) = update else {
        return;
    };
    if frames.playing.get_untracked() != playing {
        frames.playing.set(playing);
    }
    if frames.speed.get_untracked() != speed {
        frames.speed.set(speed);
    }
    if let Some(frame) = frame {
        frames.filter.set(Some(frame));
    }
}

/// One calendar day back or forward, wrapping at the ends of the range.
pub fn step_cursor(forward: bool) {
    let next = with_sync(|sync| {
        let bounds = sync.date_bounds();
        let cursor = sync.filter().cursor;
        if forward {
            bounds.next_wrapping(cursor)
        } else {
            bounds.prev_wrapping(cursor)
        }
    });
    if let Some(date) = next {
        dispatch(SyncEvent::CursorChanged(date));
    }
}

pub fn set_view(view: ViewState) {
    let update = ENGINE.with(|slot| {
        let mut slot = slot.borrow_mut();
        let engine = slot.as_mut()?;
        Some((engine.frames, engine.sync.on_view_change(view)))
    });
    if let Some((frames, frame)) = update {
        frames.view.set(Some(frame));
    }
}

/// Read-only access to the installed pipeline.
pub fn with_sync<R>(f: impl FnOnce(&Pipeline) -> R) -> Option<R> {
    ENGINE.with(|slot| slot.borrow().as_ref().map(|e| f(&e.sync)))
}
