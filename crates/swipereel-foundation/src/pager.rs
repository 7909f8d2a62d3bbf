//! Single-surface snap pager.
//!
//! The alternative feed presentation: one item fully on or off screen at a
//! time over a virtualized vertical pager. Scroll offsets stream in while
//! the finger or fling owns the view; when momentum ends the pager rounds to
//! the nearest page boundary, snaps to that exact offset (correcting any
//! sub-pixel drift), and only then reports the new active item. It shares
//! the adapter snapshot contract with the two-layer feed.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use swipereel_core::{FeedCallbacks, FeedItem, FeedSnapshot, SharedClock, SystemClock};

use crate::{QUIET_WINDOW_MS, RELOAD_LOOKAHEAD};

/// Downward overscroll at the top that releases into a refresh.
pub const PULL_REFRESH_THRESHOLD: f32 = 80.0;

/// Configuration for the snap pager.
#[derive(Clone, Debug)]
pub struct PagerSpec {
    pub reload_lookahead: usize,
    pub quiet_window_ms: u64,
    pub pull_refresh_threshold: f32,
}

impl Default for PagerSpec {
    fn default() -> Self {
        Self {
            reload_lookahead: RELOAD_LOOKAHEAD,
            quiet_window_ms: QUIET_WINDOW_MS,
            pull_refresh_threshold: PULL_REFRESH_THRESHOLD,
        }
    }
}

impl PagerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reload_lookahead(mut self, lookahead: usize) -> Self {
        self.reload_lookahead = lookahead;
        self
    }

    pub fn pull_refresh_threshold(mut self, threshold: f32) -> Self {
        self.pull_refresh_threshold = threshold;
        self
    }
}

/// What the pager should render right now.
///
/// `Empty` is only reported for a feed that genuinely has nothing: the store
/// is empty, nothing is being fetched, and the adapter says there is no more
/// to get. An empty store that is still waiting on data reads as `Loading`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PagerContent {
    Loading,
    Empty,
    Ready,
}

enum Emission {
    ActiveChange(Option<FeedItem>),
    ActiveId(Rc<str>),
    Reload,
    Refresh,
}

type Emissions = SmallVec<[Emission; 4]>;

struct Inner {
    spec: PagerSpec,
    clock: SharedClock,
    items: Rc<Vec<FeedItem>>,
    has_more: bool,
    fetch_pending: bool,
    active_index: usize,
    scroll_offset: f32,
    page_height: f32,
    last_reset_token: Option<u64>,
    quiet_until_ms: u64,
    external_paused: bool,
    last_emitted: Option<Option<Rc<str>>>,
    callbacks: FeedCallbacks,
}

impl Inner {
    fn in_quiet_window(&self) -> bool {
        self.clock.now_ms() < self.quiet_until_ms
    }

    fn active_id(&self) -> Option<Rc<str>> {
        self.items.get(self.active_index).map(|item| item.id.clone())
    }

    fn maybe_emit_active(&mut self, out: &mut Emissions) {
        let current = self.active_id();
        if self.in_quiet_window() {
            self.last_emitted = Some(current);
            return;
        }
        if self.last_emitted.as_ref() != Some(&current) {
            out.push(Emission::ActiveChange(
                self.items.get(self.active_index).cloned(),
            ));
            if let Some(id) = &current {
                out.push(Emission::ActiveId(id.clone()));
            }
            self.last_emitted = Some(current);
        }
    }

    fn maybe_ask_reload(&self, out: &mut Emissions) {
        if self.in_quiet_window() || self.items.is_empty() {
            return;
        }
        if self.active_index + self.spec.reload_lookahead >= self.items.len() {
            out.push(Emission::Reload);
        }
    }
}

/// State object for the snap pager. Clones share the same state.
#[derive(Clone)]
pub struct SnapPagerState {
    inner: Rc<RefCell<Inner>>,
}

impl SnapPagerState {
    pub fn new(spec: PagerSpec) -> Self {
        Self::with_clock(spec, SystemClock::shared())
    }

    pub fn with_clock(spec: PagerSpec, clock: SharedClock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                spec,
                clock,
                items: Rc::new(Vec::new()),
                has_more: true,
                fetch_pending: false,
                active_index: 0,
                scroll_offset: 0.0,
                page_height: 0.0,
                last_reset_token: None,
                quiet_until_ms: 0,
                external_paused: false,
                last_emitted: None,
                callbacks: FeedCallbacks::default(),
            })),
        }
    }

    pub fn set_callbacks(&self, callbacks: FeedCallbacks) {
        self.inner.borrow_mut().callbacks = callbacks;
    }

    /// Viewport height; one page is exactly one viewport.
    pub fn set_viewport(&self, page_height: f32) {
        self.inner.borrow_mut().page_height = page_height.max(0.0);
    }

    /// Applies a new adapter snapshot. A bumped reset token jumps back to
    /// the top and opens the quiet window; otherwise the active index is
    /// clamped to the new length.
    pub fn sync(&self, snapshot: &FeedSnapshot) {
        let mut emissions = Emissions::new();
        {
            let mut inner = self.inner.borrow_mut();
            inner.items = snapshot.items.clone();
            inner.has_more = snapshot.has_more;
            inner.fetch_pending = snapshot.is_fetching_more || snapshot.is_refreshing;
            let len = inner.items.len();

            let token = snapshot.reset_token;
            let token_changed = matches!(inner.last_reset_token, Some(prev) if prev != token);
            inner.last_reset_token = Some(token);
            if token_changed {
                let now = inner.clock.now_ms();
                inner.quiet_until_ms = now + inner.spec.quiet_window_ms;
                inner.active_index = 0;
                inner.scroll_offset = 0.0;
                inner.last_emitted = Some(inner.items.first().map(|item| item.id.clone()));
                log::debug!(
                    "reset token {token}: pager back to top, quiet for {}ms",
                    inner.spec.quiet_window_ms
                );
                return;
            }

            if len == 0 {
                inner.active_index = 0;
                inner.scroll_offset = 0.0;
            } else if inner.active_index >= len {
                inner.active_index = len - 1;
                inner.scroll_offset = inner.active_index as f32 * inner.page_height;
            }
            inner.maybe_emit_active(&mut emissions);
        }
        self.dispatch(emissions);
    }

    /// Raw scroll position while the finger or fling owns the view.
    /// Transient: never emits, whatever offsets stream through.
    pub fn scroll_to(&self, offset: f32) {
        self.inner.borrow_mut().scroll_offset = offset;
    }

    /// Momentum ended: resolve the offset into a page.
    ///
    /// A release deep enough into top overscroll becomes a refresh instead.
    /// Otherwise the nearest page boundary wins, the offset snaps to it
    /// exactly, and the new active item is reported, unless the quiet
    /// window is open.
    pub fn settle(&self) {
        let mut emissions = Emissions::new();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.items.is_empty() || inner.page_height <= 0.0 {
                inner.scroll_offset = 0.0;
                return;
            }
            if inner.scroll_offset <= -inner.spec.pull_refresh_threshold {
                inner.scroll_offset = 0.0;
                emissions.push(Emission::Refresh);
                log::debug!("pull released into refresh");
            } else {
                let last = inner.items.len() - 1;
                let page = (inner.scroll_offset / inner.page_height).round();
                let page = (page.max(0.0) as usize).min(last);
                // Exact snap kills any sub-pixel drift from the scroll view.
                inner.scroll_offset = page as f32 * inner.page_height;
                if page != inner.active_index {
                    inner.active_index = page;
                    inner.maybe_emit_active(&mut emissions);
                    inner.maybe_ask_reload(&mut emissions);
                }
            }
        }
        self.dispatch(emissions);
    }

    pub fn content(&self) -> PagerContent {
        let inner = self.inner.borrow();
        if !inner.items.is_empty() {
            PagerContent::Ready
        } else if inner.fetch_pending || inner.has_more {
            PagerContent::Loading
        } else {
            PagerContent::Empty
        }
    }

    /// Screen-focus pause; the pager has no tap toggle of its own.
    pub fn set_external_paused(&self, paused: bool) {
        self.inner.borrow_mut().external_paused = paused;
    }

    pub fn is_playing(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.external_paused && !inner.items.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.inner.borrow().active_index
    }

    pub fn active_item(&self) -> Option<FeedItem> {
        let inner = self.inner.borrow();
        inner.items.get(inner.active_index).cloned()
    }

    pub fn scroll_offset(&self) -> f32 {
        self.inner.borrow().scroll_offset
    }

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
                Emission::Refresh => callbacks.refresh(),
            }
        }
        self.inner.borrow_mut().callbacks = callbacks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use swipereel_core::ManualClock;

    const PAGE: f32 = 780.0;

    fn snapshot_of(count: usize) -> FeedSnapshot {
        let items = (0..count)
            .map(|i| FeedItem::new(format!("v{i}"), Some("clip://sample")))
            .collect();
        FeedSnapshot {
            items: Rc::new(items),
            has_more: true,
            is_fetching_more: false,
            is_refreshing: false,
            reset_token: 0,
        }
    }

    #[derive(Default)]
    struct Recorded {
        active: Vec<Option<String>>,
        reloads: usize,
        refreshes: usize,
    }

    fn recording_pager(count: usize) -> (SnapPagerState, Rc<RefCell<Recorded>>, ManualClock) {
        let clock = ManualClock::new();
        let pager = SnapPagerState::with_clock(PagerSpec::default(), Rc::new(clock.clone()));
        pager.set_viewport(PAGE);
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let active_log = recorded.clone();
        let reload_log = recorded.clone();
        let refresh_log = recorded.clone();
        pager.set_callbacks(
            FeedCallbacks::new()
                .on_active_change(move |item| {
                    active_log
                        .borrow_mut()
                        .active
                        .push(item.map(|item| item.id.to_string()));
                })
                .on_reload(move || reload_log.borrow_mut().reloads += 1)
                .on_refresh(move || refresh_log.borrow_mut().refreshes += 1),
        );
        pager.sync(&snapshot_of(count));
        (pager, recorded, clock)
    }

    #[test]
    fn settle_rounds_to_nearest_page() {
        let (pager, recorded, _clock) = recording_pager(10);
        pager.scroll_to(1.5 * PAGE);
        pager.settle();
        assert_eq!(pager.active_index(), 2);
        assert_eq!(pager.scroll_offset(), 2.0 * PAGE);
        assert_eq!(
            recorded.borrow().active.last(),
            Some(&Some("v2".to_string()))
        );
    }

    #[test]
    fn settle_corrects_subpixel_drift() {
        let (pager, _recorded, _clock) = recording_pager(10);
        pager.scroll_to(PAGE - 0.4);
        pager.settle();
        assert_eq!(pager.active_index(), 1);
        assert_eq!(pager.scroll_offset(), PAGE);
    }

    #[test]
    fn transient_offsets_do_not_emit() {
        let (pager, recorded, _clock) = recording_pager(10);
        let emissions_before = recorded.borrow().active.len();
        pager.scroll_to(0.4 * PAGE);
        pager.scroll_to(0.9 * PAGE);
        assert_eq!(recorded.borrow().active.len(), emissions_before);
        pager.settle();
        assert_eq!(recorded.borrow().active.len(), emissions_before + 1);
    }

    #[test]
    fn settle_clamps_past_the_last_page() {
        let (pager, _recorded, _clock) = recording_pager(3);
        pager.scroll_to(10.0 * PAGE);
        pager.settle();
        assert_eq!(pager.active_index(), 2);
        assert_eq!(pager.scroll_offset(), 2.0 * PAGE);
    }

    #[test]
    fn settle_near_end_asks_for_more() {
        let (pager, recorded, _clock) = recording_pager(20);
        pager.scroll_to(17.0 * PAGE);
        pager.settle();
        assert_eq!(pager.active_index(), 17);
        assert_eq!(recorded.borrow().reloads, 1);

        let (pager, recorded, _clock) = recording_pager(20);
        pager.scroll_to(16.0 * PAGE);
        pager.settle();
        assert_eq!(recorded.borrow().reloads, 0);
    }

    #[test]
    fn pull_release_refreshes() {
        let (pager, recorded, _clock) = recording_pager(10);
        pager.scroll_to(-(PULL_REFRESH_THRESHOLD + 10.0));
        pager.settle();
        assert_eq!(recorded.borrow().refreshes, 1);
        assert_eq!(pager.scroll_offset(), 0.0);
        assert_eq!(pager.active_index(), 0);

        // A shallow pull just snaps back.
        pager.scroll_to(-20.0);
        pager.settle();
        assert_eq!(recorded.borrow().refreshes, 1);
        assert_eq!(pager.scroll_offset(), 0.0);
    }

    #[test]
    fn reset_token_scrolls_to_top_and_goes_quiet() {
        let (pager, recorded, clock) = recording_pager(50);
        pager.scroll_to(12.0 * PAGE);
        pager.settle();
        assert_eq!(pager.active_index(), 12);
        let emissions_before = recorded.borrow().active.len();
        let reloads_before = recorded.borrow().reloads;

        let reset = FeedSnapshot {
            reset_token: 1,
            ..snapshot_of(50)
        };
        pager.sync(&reset);
        assert_eq!(pager.active_index(), 0);
        assert_eq!(pager.scroll_offset(), 0.0);

        // The programmatic scroll home reports transient offsets; none of it
        // may leak out during the quiet window.
        clock.advance(100);
        pager.scroll_to(3.0 * PAGE);
        pager.settle();
        pager.scroll_to(0.0);
        pager.settle();
        assert_eq!(recorded.borrow().active.len(), emissions_before);
        assert_eq!(recorded.borrow().reloads, reloads_before);

        // After the window closes, paging speaks again.
        clock.advance(QUIET_WINDOW_MS);
        pager.scroll_to(PAGE);
        pager.settle();
        assert_eq!(pager.active_index(), 1);
        assert_eq!(recorded.borrow().active.len(), emissions_before + 1);
    }

    #[test]
    fn content_distinguishes_loading_from_empty() {
        let (pager, _recorded, _clock) = recording_pager(0);
        // Nothing yet, but the adapter still expects more: loading.
        assert_eq!(pager.content(), PagerContent::Loading);

        let fetching = FeedSnapshot {
            is_fetching_more: true,
            has_more: true,
            ..snapshot_of(0)
        };
        pager.sync(&fetching);
        assert_eq!(pager.content(), PagerContent::Loading);

        // Fetch completed with nothing to show: genuinely empty.
        let exhausted = FeedSnapshot {
            has_more: false,
            ..snapshot_of(0)
        };
        pager.sync(&exhausted);
        assert_eq!(pager.content(), PagerContent::Empty);

        pager.sync(&snapshot_of(3));
        assert_eq!(pager.content(), PagerContent::Ready);
    }

    #[test]
    fn shrinking_list_clamps_the_active_page() {
        let (pager, _recorded, _clock) = recording_pager(10);
        pager.scroll_to(8.0 * PAGE);
        pager.settle();
        assert_eq!(pager.active_index(), 8);

        pager.sync(&snapshot_of(4));
        assert_eq!(pager.active_index(), 3);
        assert_eq!(pager.scroll_offset(), 3.0 * PAGE);
    }

    #[test]
    fn focus_pause_stops_playback() {
        let (pager, _recorded, _clock) = recording_pager(3);
        assert!(pager.is_playing());
        pager.set_external_paused(true);
        assert!(!pager.is_playing());
    }
}
