//! The two-layer swipe feed.
//!
//! [`TwoLayerFeedState`] keeps exactly two video layers mounted. The active
//! one tracks the finger during a vertical drag while the covered one is
//! already pointed at the neighbor the drag is heading for, so the upcoming
//! clip is decoding before the swap happens. Releasing past a distance
//! threshold flips which layer is on top; anything less settles back.
//!
//! The item list itself is owned elsewhere: this state machine reads
//! [`FeedSnapshot`]s, reconciles its layer-to-index mapping when the list
//! changes shape, and asks for more data through the reload callback when
//! the active item approaches the known end.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use swipereel_animation::{AnimatedOffset, SETTLE_DURATION_MS};
use swipereel_core::{FeedCallbacks, FeedItem, FeedSnapshot, SharedClock, SystemClock};

use crate::{
    GestureSession, LayerFrame, LayerId, LayerPair, TapRecognizer, TAP_DEAD_ZONE, TAP_DEBOUNCE_MS,
};

/// Drag distance that commits a swap, in logical pixels. Distance, not
/// velocity, decides.
pub const COMMIT_THRESHOLD: f32 = 400.0;

/// How close the active item may get to the end of the known list before the
/// reload callback is asked for another page.
pub const RELOAD_LOOKAHEAD: usize = 3;

/// Emission suppression period after a wholesale list reset, in milliseconds.
pub const QUIET_WINDOW_MS: u64 = 200;

/// Configuration for the two-layer feed.
#[derive(Clone, Debug)]
pub struct FeedSpec {
    pub commit_threshold: f32,
    pub tap_dead_zone: f32,
    pub tap_debounce_ms: u64,
    pub reload_lookahead: usize,
    pub quiet_window_ms: u64,
    pub settle_duration_ms: u64,
}

impl Default for FeedSpec {
    fn default() -> Self {
        Self {
            commit_threshold: COMMIT_THRESHOLD,
            tap_dead_zone: TAP_DEAD_ZONE,
            tap_debounce_ms: TAP_DEBOUNCE_MS,
            reload_lookahead: RELOAD_LOOKAHEAD,
            quiet_window_ms: QUIET_WINDOW_MS,
            settle_duration_ms: SETTLE_DURATION_MS,
        }
    }
}

impl FeedSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_threshold(mut self, threshold: f32) -> Self {
        self.commit_threshold = threshold;
        self
    }

    pub fn reload_lookahead(mut self, lookahead: usize) -> Self {
        self.reload_lookahead = lookahead;
        self
    }

    pub fn tap_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.tap_debounce_ms = debounce_ms;
        self
    }

    pub fn quiet_window_ms(mut self, quiet_ms: u64) -> Self {
        self.quiet_window_ms = quiet_ms;
        self
    }
}

/// Gesture lifecycle of the feed.
///
/// Commits resolve synchronously at release, so there is no observable
/// in-between state: a release either lands back in `Idle` (after a swap),
/// or passes through `Settling` while a cancelled drag animates home.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Dragging,
    Settling,
}

enum Emission {
    ActiveChange(Option<FeedItem>),
    ActiveId(Rc<str>),
    Reload,
}

type Emissions = SmallVec<[Emission; 4]>;

/// Returns the neighbor index a drag with this translation is heading for.
/// Positive translation means the finger moved down, revealing the previous
/// item; negative reveals the next.
fn candidate(active_index: usize, len: usize, translation: f32) -> Option<usize> {
    if translation > 0.0 {
        active_index.checked_sub(1)
    } else if translation < 0.0 {
        let next = active_index + 1;
        (next < len).then_some(next)
    } else {
        None
    }
}

/// Index the covered layer should rest at while idle next to `index`.
fn neighbor(index: usize, len: usize) -> Option<usize> {
    if index + 1 < len {
        Some(index + 1)
    } else if index >= 1 {
        Some(index - 1)
    } else {
        None
    }
}

struct Inner {
    spec: FeedSpec,
    clock: SharedClock,
    items: Rc<Vec<FeedItem>>,
    layers: LayerPair,
    offsets: [AnimatedOffset; 2],
    session: Option<GestureSession>,
    tap: TapRecognizer,
    user_paused: bool,
    external_paused: bool,
    last_reset_token: Option<u64>,
    quiet_until_ms: u64,
    /// Visually active id as last reported. Inner `None` means "reported an
    /// empty feed"; outer `None` means nothing has been reported yet.
    last_emitted: Option<Option<Rc<str>>>,
    callbacks: FeedCallbacks,
}

impl Inner {
    fn active_id(&self) -> Option<Rc<str>> {
        self.layers
            .active_item_index()
            .and_then(|index| self.items.get(index))
            .map(|item| item.id.clone())
    }

    fn in_quiet_window(&self) -> bool {
        self.clock.now_ms() < self.quiet_until_ms
    }

    /// Records the current active item and queues an emission if it actually
    /// changed. At most one emission per visual change, none during the
    /// quiet window.
    fn maybe_emit_active(&mut self, out: &mut Emissions) {
        let current = self.active_id();
        if self.in_quiet_window() {
            self.last_emitted = Some(current);
            return;
        }
        if self.last_emitted.as_ref() != Some(&current) {
            let item = self
                .layers
                .active_item_index()
                .and_then(|index| self.items.get(index))
                .cloned();
            out.push(Emission::ActiveChange(item));
            if let Some(id) = &current {
                out.push(Emission::ActiveId(id.clone()));
            }
            self.last_emitted = Some(current);
        }
    }

    /// Asks the adapter for more whenever the active item is inside the
    /// lookahead window. Always asks; the adapter coalesces.
    fn maybe_ask_reload(&self, out: &mut Emissions) {
        if self.in_quiet_window() {
            return;
        }
        let len = self.items.len();
        if len == 0 {
            return;
        }
        if let Some(active) = self.layers.active_item_index() {
            if active + self.spec.reload_lookahead >= len {
                out.push(Emission::Reload);
            }
        }
    }

    fn settle_active(&mut self) {
        let active = self.layers.active();
        let duration = self.spec.settle_duration_ms;
        self.offsets[active.index()].animate_to(0.0, duration);
    }
}

/// State object for the two-layer feed. Clones share the same state.
#[derive(Clone)]
pub struct TwoLayerFeedState {
    inner: Rc<RefCell<Inner>>,
}

impl TwoLayerFeedState {
    pub fn new(spec: FeedSpec) -> Self {
        Self::with_clock(spec, SystemClock::shared())
    }

    pub fn with_clock(spec: FeedSpec, clock: SharedClock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                spec,
                clock: clock.clone(),
                items: Rc::new(Vec::new()),
                layers: LayerPair::new(None, None),
                offsets: [
                    AnimatedOffset::new(clock.clone()),
                    AnimatedOffset::new(clock),
                ],
                session: None,
                tap: TapRecognizer::default(),
                user_paused: false,
                external_paused: false,
                last_reset_token: None,
                quiet_until_ms: 0,
                last_emitted: None,
                callbacks: FeedCallbacks::default(),
            })),
        }
    }

    pub fn set_callbacks(&self, callbacks: FeedCallbacks) {
        self.inner.borrow_mut().callbacks = callbacks;
    }

    /// Applies a new adapter snapshot, keeping the visually active item
    /// stable where possible.
    ///
    /// `active_id` is the externally tracked current item and is
    /// authoritative when present: if it still exists in the new list the
    /// active layer is remapped to its new position without any emission; if
    /// it is gone the feed falls back to the top and says so once. A bumped
    /// reset token overrides all of that: jump to the top and keep quiet for
    /// a moment so transient churn is not mistaken for navigation.
    pub fn sync(&self, snapshot: &FeedSnapshot, active_id: Option<&str>) {
        let mut emissions = Emissions::new();
        {
            let mut inner = self.inner.borrow_mut();
            inner.items = snapshot.items.clone();
            let len = inner.items.len();

            let token = snapshot.reset_token;
            let token_changed = matches!(inner.last_reset_token, Some(prev) if prev != token);
            inner.last_reset_token = Some(token);
            if token_changed {
                let now = inner.clock.now_ms();
                inner.quiet_until_ms = now + inner.spec.quiet_window_ms;
                inner.session = None;
                let active = inner.layers.active();
                let inactive = inner.layers.inactive();
                inner
                    .layers
                    .set_item_index(active, (len > 0).then_some(0));
                inner
                    .layers
                    .set_item_index(inactive, (len > 1).then_some(1));
                inner.offsets[0].set(0.0);
                inner.offsets[1].set(0.0);
                // The consumer initiated this reset; note the new position
                // without announcing it.
                inner.last_emitted = Some(inner.items.first().map(|item| item.id.clone()));
                log::debug!(
                    "reset token {token}: back to top, quiet for {}ms",
                    inner.spec.quiet_window_ms
                );
                return;
            }

            let resolved = active_id.and_then(|id| {
                let index_by_id: FxHashMap<&str, usize> = inner
                    .items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| (&*item.id, index))
                    .collect();
                index_by_id.get(id).copied()
            });

            let active_index = match (resolved, active_id) {
                (Some(index), _) => Some(index),
                (None, Some(id)) if len > 0 => {
                    log::warn!("active id {id} no longer in list; falling back to start");
                    Some(0)
                }
                (None, None) if len > 0 => {
                    // No external authority: keep position, clamped.
                    Some(
                        inner
                            .layers
                            .active_item_index()
                            .map(|index| index.min(len - 1))
                            .unwrap_or(0),
                    )
                }
                _ => None,
            };

            let active = inner.layers.active();
            let inactive = inner.layers.inactive();
            inner.layers.set_item_index(active, active_index);
            inner
                .layers
                .set_item_index(inactive, active_index.and_then(|index| neighbor(index, len)));

            inner.maybe_emit_active(&mut emissions);
            inner.maybe_ask_reload(&mut emissions);
        }
        self.dispatch(emissions);
    }

    /// Pointer went down. Takes over a still-settling offset so the layer
    /// stays under the finger.
    pub fn pointer_down(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.session.is_some() {
            return;
        }
        let active = inner.layers.active();
        let carry = inner.offsets[active.index()].value();
        inner.session = Some(if carry == 0.0 {
            GestureSession::default()
        } else {
            GestureSession::with_carryover(carry)
        });
        inner.offsets[active.index()].set(carry);
    }

    /// Pointer moved by `dy`. Hot path: O(1), no allocation, no emissions.
    pub fn drag_by(&self, dy: f32) {
        let mut inner = self.inner.borrow_mut();
        let Some(mut session) = inner.session else {
            log::debug!("drag without pointer down; ignored");
            return;
        };
        if session.committed {
            return;
        }
        session.move_by(dy);
        inner.session = Some(session);

        let Some(active_index) = inner.layers.active_item_index() else {
            return;
        };
        let translation = session.translation;
        let len = inner.items.len();
        let active = inner.layers.active();
        let inactive = inner.layers.inactive();
        match candidate(active_index, len, translation) {
            Some(next) => {
                // Keep the covered layer pointed at where this drag is
                // heading, so its clip is already mounted at commit time.
                if inner.layers.item_index(inactive) != Some(next) {
                    inner.layers.set_item_index(inactive, Some(next));
                }
                inner.offsets[active.index()].set(translation);
            }
            None => {
                // Dragging into a list edge: the layer stays put.
                inner.offsets[active.index()].set(0.0);
            }
        }
    }

    /// Pointer released: resolve the session into a tap, a cancel, or a
    /// commit.
    pub fn pointer_up(&self) {
        let mut emissions = Emissions::new();
        {
            let mut inner = self.inner.borrow_mut();
            let Some(mut session) = inner.session else {
                return;
            };
            if session.committed {
                inner.session = None;
                return;
            }

            if session.is_tap(inner.spec.tap_dead_zone) {
                let now = inner.clock.now_ms();
                let debounce = inner.spec.tap_debounce_ms;
                if inner.tap.try_fire(now, debounce) {
                    inner.user_paused = !inner.user_paused;
                    log::debug!("tap: paused = {}", inner.user_paused);
                }
                inner.session = None;
                inner.settle_active();
                return;
            }

            if session.translation.abs() <= inner.spec.commit_threshold {
                inner.session = None;
                inner.settle_active();
                return;
            }

            let target = inner.layers.active_item_index().and_then(|index| {
                candidate(index, inner.items.len(), session.translation)
            });
            match target {
                None => {
                    // Past either end: settle back and ask the adapter once.
                    inner.session = None;
                    inner.settle_active();
                    if !inner.in_quiet_window() {
                        emissions.push(Emission::Reload);
                    }
                }
                Some(target_index) => {
                    // Commit. Indices, active flag and offsets change in one
                    // state update; no frame can observe a half-swap.
                    session.committed = true;
                    inner.session = Some(session);
                    let inactive = inner.layers.inactive();
                    inner.layers.set_item_index(inactive, Some(target_index));
                    inner.layers.swap_active();
                    inner.offsets[0].set(0.0);
                    inner.offsets[1].set(0.0);
                    // A swap always resumes playback.
                    inner.user_paused = false;
                    inner.maybe_emit_active(&mut emissions);
                    inner.maybe_ask_reload(&mut emissions);
                    log::debug!("commit: active index -> {target_index}");
                }
            }
        }
        self.dispatch(emissions);
        // The session outlives dispatch so late-arriving move events from
        // the same drag hit the committed guard instead of a fresh session.
        self.inner.borrow_mut().session = None;
    }

    /// Discards an in-flight gesture without committing. Used when the view
    /// unmounts or the screen loses focus mid-drag.
    pub fn abort_gesture(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.session.take().is_some() {
            inner.offsets[0].set(0.0);
            inner.offsets[1].set(0.0);
            log::debug!("gesture aborted");
        }
    }

    /// Screen-focus pause. Independent from the tap toggle: both must agree
    /// for playback to run.
    pub fn set_external_paused(&self, paused: bool) {
        self.inner.borrow_mut().external_paused = paused;
    }

    /// Direct pause toggle (no debounce); the tap path goes through the
    /// debounced recognizer instead.
    pub fn toggle_pause(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.user_paused = !inner.user_paused;
    }

    pub fn is_paused(&self) -> bool {
        let inner = self.inner.borrow();
        inner.user_paused || inner.external_paused
    }

    pub fn user_paused(&self) -> bool {
        self.inner.borrow().user_paused
    }

    pub fn phase(&self) -> FeedPhase {
        let inner = self.inner.borrow();
        if inner.session.is_some() {
            FeedPhase::Dragging
        } else if inner.offsets.iter().any(|offset| offset.is_animating()) {
            FeedPhase::Settling
        } else {
            FeedPhase::Idle
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.inner.borrow().layers.active_item_index()
    }

    pub fn active_item(&self) -> Option<FeedItem> {
        let inner = self.inner.borrow();
        inner
            .layers
            .active_item_index()
            .and_then(|index| inner.items.get(index))
            .cloned()
    }

    /// Item currently assigned to one layer, for wiring that layer's surface
    /// and overlay.
    pub fn item_for(&self, layer: LayerId) -> Option<FeedItem> {
        let inner = self.inner.borrow();
        inner
            .layers
            .item_index(layer)
            .and_then(|index| inner.items.get(index))
            .cloned()
    }

    /// Samples both layers for rendering.
    pub fn frames(&self) -> [LayerFrame; 2] {
        let mut inner = self.inner.borrow_mut();
        let paused = inner.user_paused || inner.external_paused;
        let len = inner.items.len();
        [LayerId::A, LayerId::B].map(|layer| {
            let item_index = inner.layers.item_index(layer).filter(|&index| index < len);
            let offset_y = inner.offsets[layer.index()].value();
            LayerFrame {
                item_index,
                offset_y,
                stack_order: inner.layers.stack_order(layer),
                playing: inner.layers.is_active(layer) && !paused && item_index.is_some(),
            }
        })
    }

    /// Runs queued emissions with the callbacks moved out of the state, so a
    /// handler can safely call back into this object.
    fn dispatch(&self, emissions: Emissions) {
        if emissions.is_empty() {
            return;
        }
        let mut callbacks = std::mem::take(&mut self.inner.borrow_mut().callbacks);
        for emission in emissions {
            match emission {
                Emission::ActiveChange(item) => callbacks.active_change(item.as_ref()),
                Emission::ActiveId(id) => callbacks.active_id_changed(&id),
                Emission::Reload => callbacks.reload(),
            }
        }
        self.inner.borrow_mut().callbacks = callbacks;
    }
}
