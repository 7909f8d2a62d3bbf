//! Testing utilities for the feed state machines.
//!
//! [`FeedRobot`] drives a [`TwoLayerFeedState`] the way a finger would:
//! pointer down, a burst of move events, release, with a manual clock
//! advancing a frame's worth of time per step. [`EventLog`] records every
//! outbound event for assertion, and [`fixture_snapshot`] builds the usual
//! `v0..vN` item lists.

use std::cell::RefCell;
use std::rc::Rc;

use swipereel_core::{FeedCallbacks, FeedItem, FeedSnapshot};
use swipereel_foundation::TwoLayerFeedState;

pub use swipereel_core::ManualClock;

/// Alternating fixture clips, standing in for real media URLs.
pub const FIXTURE_CLIP_A: &str = "clip://fixtures/joyrides";
pub const FIXTURE_CLIP_B: &str = "clip://fixtures/bunny";

/// Milliseconds the robot advances per injected move event (one 60Hz frame).
pub const FRAME_MS: u64 = 16;

/// Every outbound event, in arrival order where it matters.
#[derive(Default)]
pub struct EventLog {
    /// Payloads of `active_change`, `None` for an emptied feed.
    pub active: Vec<Option<String>>,
    pub active_ids: Vec<String>,
    pub reloads: usize,
    pub refreshes: usize,
    pub likes: Vec<(String, u32)>,
}

pub type SharedEventLog = Rc<RefCell<EventLog>>;

pub fn event_log() -> SharedEventLog {
    Rc::new(RefCell::new(EventLog::default()))
}

/// Callbacks that record everything into the given log.
pub fn recording_callbacks(log: &SharedEventLog) -> FeedCallbacks {
    let active = log.clone();
    let ids = log.clone();
    let reloads = log.clone();
    let refreshes = log.clone();
    let likes = log.clone();
    FeedCallbacks::new()
        .on_active_change(move |item| {
            active
                .borrow_mut()
                .active
                .push(item.map(|item| item.id.to_string()));
        })
        .set_active_id(move |id| ids.borrow_mut().active_ids.push(id.to_string()))
        .on_reload(move || reloads.borrow_mut().reloads += 1)
        .on_refresh(move || refreshes.borrow_mut().refreshes += 1)
        .on_like(move |item, delta| likes.borrow_mut().likes.push((item.id.to_string(), delta)))
}

/// Items `v0..v{count}`, alternating between the two fixture clips.
pub fn fixture_items(count: usize) -> Vec<FeedItem> {
    (0..count)
        .map(|i| {
            let clip = if i % 2 == 0 {
                FIXTURE_CLIP_A
            } else {
                FIXTURE_CLIP_B
            };
            FeedItem::new(format!("v{i}"), Some(clip))
                .with_description(format!("fixture post {i}"))
                .with_creator(format!("agent_{}", i % 10))
        })
        .collect()
}

pub fn fixture_snapshot(count: usize) -> FeedSnapshot {
    FeedSnapshot {
        items: Rc::new(fixture_items(count)),
        has_more: true,
        is_fetching_more: false,
        is_refreshing: false,
        reset_token: 0,
    }
}

/// Drives a two-layer feed with synthetic touch input.
pub struct FeedRobot {
    state: TwoLayerFeedState,
    clock: ManualClock,
}

impl FeedRobot {
    pub fn new(state: TwoLayerFeedState, clock: ManualClock) -> Self {
        Self { state, clock }
    }

    pub fn state(&self) -> &TwoLayerFeedState {
        &self.state
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn down(&self) {
        self.state.pointer_down();
    }

    pub fn move_by(&self, dy: f32) {
        self.clock.advance(FRAME_MS);
        self.state.drag_by(dy);
    }

    pub fn up(&self) {
        self.state.pointer_up();
    }

    /// Finger travels up by `distance` over ten move events, then releases.
    /// Upward travel reveals the next item.
    pub fn swipe_up(&self, distance: f32) {
        self.down();
        let step = distance / 10.0;
        for _ in 0..10 {
            self.move_by(-step);
        }
        self.up();
    }

    /// Finger travels down by `distance`; reveals the previous item.
    pub fn swipe_down(&self, distance: f32) {
        self.down();
        let step = distance / 10.0;
        for _ in 0..10 {
            self.move_by(step);
        }
        self.up();
    }

    pub fn tap(&self) {
        self.down();
        self.up();
    }

    /// Lets `ms` pass and samples a frame, the way an idle render loop
    /// would.
    pub fn idle(&self, ms: u64) {
        self.clock.advance(ms);
        let _ = self.state.frames();
    }
}
