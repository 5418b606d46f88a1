use std::cell::Cell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use hazardmap_shared::{SyncEvent, TickScheduler};
use wasm_bindgen_futures::spawn_local;

use crate::engine;

/// Browser timers for `Playback`. Each handle owns one pending `Timeout`.
#[derive(Default)]
pub struct TimeoutScheduler {
    generation: Rc<Cell<u64>>,
}

pub struct TickHandle {
    _timeout: Timeout,
}

impl TickScheduler for TimeoutScheduler {
    type Handle = TickHandle;

    fn schedule(&mut self, after_ms: u32) -> TickHandle {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        let current = Rc::clone(&self.generation);
        let timeout = Timeout::new(after_ms, move || {
            // The engine drops this Timeout while handling the tick, so the
            // tick runs after the callback has returned.
            spawn_local(async move {
                if current.get() == generation {
                    engine::dispatch(SyncEvent::Tick);
                }
            });
        });
        TickHandle { _timeout: timeout }
    }

    fn cancel(&mut self, handle: TickHandle) {
        // A fired-but-undelivered tick from this handle is now stale.
        self.generation.set(self.generation.get().wrapping_add(1));
        drop(handle);
    }
}
