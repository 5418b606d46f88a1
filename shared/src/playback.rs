use serde::{Deserialize, Serialize};

/// Discrete playback speeds offered by the speed selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTier {
    Slow,
    #[default]
    Normal,
    Fast,
    Fastest,
}

impl SpeedTier {
    pub const ALL: [SpeedTier; 4] = [
        SpeedTier::Slow,
        SpeedTier::Normal,
        SpeedTier::Fast,
        SpeedTier::Fastest,
    ];

    /// Milliseconds between ticks, one calendar day per tick.
    pub fn interval_ms(self) -> u32 {
        match self {
            SpeedTier::Slow => 1000,
            SpeedTier::Normal => 500,
            SpeedTier::Fast => 250,
            SpeedTier::Fastest => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedTier::Slow => "1x",
            SpeedTier::Normal => "2x",
            SpeedTier::Fast => "4x",
            SpeedTier::Fastest => "10x",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.label() == label)
    }

    /// The next tier up, cycling back to the slowest.
    pub fn cycle(self) -> Self {
        match self {
            SpeedTier::Slow => SpeedTier::Normal,
            SpeedTier::Normal => SpeedTier::Fast,
            SpeedTier::Fast => SpeedTier::Fastest,
            SpeedTier::Fastest => SpeedTier::Slow,
        }
    }
}

/// One-shot timer facility. Dropping or cancelling a handle must prevent its
/// callback from running.
pub trait TickScheduler {
    type Handle;

    fn schedule(&mut self, after_ms: u32) -> Self::Handle;
    fn cancel(&mut self, handle: Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Stopped,
    Running,
}

/// Play/pause state machine owning at most one pending tick.
pub struct Playback<S: TickScheduler> {
    scheduler: S,
    pending: Option<S::Handle>,
    speed: SpeedTier,
}

impl<S: TickScheduler> Playback<S> {
    pub fn new(scheduler: S, speed: SpeedTier) -> Self {
        Self {
            scheduler,
            pending: None,
            speed,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.pending.is_some() {
            PlaybackState::Running
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn speed(&self) -> SpeedTier {
        self.speed
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn arm(&mut self) {
        self.cancel_pending();
        let handle = self.scheduler.schedule(self.speed.interval_ms());
        self.pending = Some(handle);
    }

    /// Stopped -> Running. Already running is a no-op; only a tick re-arms.
    pub fn play(&mut self) {
        if self.is_running() {
            return;
        }
        self.arm();
    }

    /// Running -> Stopped. Returns whether a timer was cancelled.
    pub fn pause(&mut self) -> bool {
        let was_running = self.is_running();
        self.cancel_pending();
        was_running
    }

    /// A timer fired. While running, schedules the next tick and returns
    /// `true`; a late tick after a pause is ignored.
    pub fn on_tick(&mut self) -> bool {
        let Some(fired) = self.pending.take() else {
            return false;
        };
        drop(fired);
        let handle = self.scheduler.schedule(self.speed.interval_ms());
        self.pending = Some(handle);
        true
    }

    /// Change speed. A running timer is rescheduled at the new interval.
    pub fn set_speed(&mut self, speed: SpeedTier) {
        self.speed = speed;
        if self.is_running() {
            self.arm();
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    use super::TickScheduler;

    /// Scheduler that records which handles are live.
    #[derive(Debug, Default)]
    pub struct ManualScheduler {
        next: u64,
        live: Rc<RefCell<BTreeSet<u64>>>,
        pub intervals: Vec<u32>,
    }

    impl ManualScheduler {
        pub fn live_count(&self) -> usize {
            self.live.borrow().len()
        }
    }

    pub struct ManualHandle {
        id: u64,
        live: Rc<RefCell<BTreeSet<u64>>>,
    }

    // A dropped handle is a dead timer, the same as gloo's Timeout.
    impl Drop for ManualHandle {
        fn drop(&mut self) {
            self.live.borrow_mut().remove(&self.id);
        }
    }

    impl TickScheduler for ManualScheduler {
        type Handle = ManualHandle;

        fn schedule(&mut self, after_ms: u32) -> ManualHandle {
            self.next += 1;
            self.live.borrow_mut().insert(self.next);
            self.intervals.push(after_ms);
            ManualHandle {
                id: self.next,
                live: Rc::clone(&self.live),
            }
        }

        fn cancel(&mut self, handle: ManualHandle) {
            drop(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualScheduler;
    use super::*;

    #[test]
    fn play_pause_transitions() {
        let mut playback = Playback::new(ManualScheduler::default(), SpeedTier::Normal);
        assert_eq!(playback.state(), PlaybackState::Stopped);
        playback.play();
        assert_eq!(playback.state(), PlaybackState::Running);
        assert!(playback.pause());
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert!(!playback.pause());
    }

    #[test]
    fn never_more_than_one_live_timer() {
        let mut playback = Playback::new(ManualScheduler::default(), SpeedTier::Fast);
        playback.play();
        playback.play();
        assert!(playback.on_tick());
        playback.set_speed(SpeedTier::Fastest);
        assert_eq!(playback.scheduler().live_count(), 1);
        playback.pause();
        assert_eq!(playback.scheduler().live_count(), 0);
        assert_eq!(playback.scheduler().intervals, vec![250, 250, 100]);
    }

    #[test]
    fn play_while_running_keeps_the_pending_timer() {
        let mut playback = Playback::new(ManualScheduler::default(), SpeedTier::Normal);
        playback.play();
        playback.play();
        playback.play();
        assert_eq!(playback.scheduler().intervals.len(), 1);
        assert_eq!(playback.scheduler().live_count(), 1);
        assert!(playback.on_tick());
        assert_eq!(playback.scheduler().intervals.len(), 2);
    }

    #[test]
    fn late_tick_after_pause_is_ignored() {
        let mut playback = Playback::new(ManualScheduler::default(), SpeedTier::Slow);
        playback.play();
        playback.pause();
        assert!(!playback.on_tick());
        assert_eq!(playback.scheduler().live_count(), 0);
    }

    #[test]
    fn speed_change_while_stopped_does_not_start() {
        let mut playback = Playback::new(ManualScheduler::default(), SpeedTier::Slow);
        playback.set_speed(SpeedTier::Fastest);
        assert!(!playback.is_running());
        assert_eq!(playback.speed(), SpeedTier::Fastest);
    }

    #[test]
    fn speed_labels_round_trip() {
        for tier in SpeedTier::ALL {
            assert_eq!(SpeedTier::from_label(tier.label()), Some(tier));
        }
        assert_eq!(SpeedTier::Fastest.cycle(), SpeedTier::Slow);
    }
}
