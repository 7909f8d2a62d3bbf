//! Outbound event dispatch.
//!
//! Every consumer-supplied handler crosses this boundary. A panicking
//! handler is contained and logged here so it can never leave a feed state
//! machine mid-transition.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::FeedItem;

/// Callbacks into the embedding application.
///
/// All fields are optional; unset handlers make the corresponding dispatch a
/// no-op. Handlers are `FnMut` so consumers can accumulate state (counters,
/// recorded events) without interior mutability.
#[derive(Default)]
pub struct FeedCallbacks {
    on_active_change: Option<Box<dyn FnMut(Option<&FeedItem>)>>,
    on_reload: Option<Box<dyn FnMut()>>,
    on_refresh: Option<Box<dyn FnMut()>>,
    on_like: Option<Box<dyn FnMut(&FeedItem, u32)>>,
    on_profile_press: Option<Box<dyn FnMut(&FeedItem)>>,
    on_open_comments: Option<Box<dyn FnMut(&FeedItem)>>,
    on_share: Option<Box<dyn FnMut(&FeedItem)>>,
    on_follow: Option<Box<dyn FnMut(&FeedItem)>>,
    set_active_id: Option<Box<dyn FnMut(&str)>>,
    on_back: Option<Box<dyn FnMut()>>,
}

/// Runs one handler, containing any panic.
fn guard(name: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        log::error!("{name} handler panicked; event dropped");
    }
}

impl FeedCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_active_change(mut self, f: impl FnMut(Option<&FeedItem>) + 'static) -> Self {
        self.on_active_change = Some(Box::new(f));
        self
    }

    pub fn on_reload(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_reload = Some(Box::new(f));
        self
    }

    pub fn on_refresh(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_refresh = Some(Box::new(f));
        self
    }

    pub fn on_like(mut self, f: impl FnMut(&FeedItem, u32) + 'static) -> Self {
        self.on_like = Some(Box::new(f));
        self
    }

    pub fn on_profile_press(mut self, f: impl FnMut(&FeedItem) + 'static) -> Self {
        self.on_profile_press = Some(Box::new(f));
        self
    }

    pub fn on_open_comments(mut self, f: impl FnMut(&FeedItem) + 'static) -> Self {
        self.on_open_comments = Some(Box::new(f));
        self
    }

    pub fn on_share(mut self, f: impl FnMut(&FeedItem) + 'static) -> Self {
        self.on_share = Some(Box::new(f));
        self
    }

    pub fn on_follow(mut self, f: impl FnMut(&FeedItem) + 'static) -> Self {
        self.on_follow = Some(Box::new(f));
        self
    }

    pub fn set_active_id(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.set_active_id = Some(Box::new(f));
        self
    }

    pub fn on_back(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_back = Some(Box::new(f));
        self
    }

    // Dispatch. Each method is a guarded call into consumer code.

    pub fn active_change(&mut self, item: Option<&FeedItem>) {
        if let Some(f) = self.on_active_change.as_mut() {
            guard("active_change", || f(item));
        }
    }

    pub fn reload(&mut self) {
        if let Some(f) = self.on_reload.as_mut() {
            guard("reload", || f());
        }
    }

    pub fn refresh(&mut self) {
        if let Some(f) = self.on_refresh.as_mut() {
            guard("refresh", || f());
        }
    }

    /// Like requests always carry a positive delta; hearts are spent, never
    /// returned. The daily-allowance check belongs to the consumer.
    pub fn like(&mut self, item: &FeedItem, delta: u32) {
        debug_assert!(delta > 0);
        if let Some(f) = self.on_like.as_mut() {
            guard("like", || f(item, delta));
        }
    }

    pub fn profile_press(&mut self, item: &FeedItem) {
        if let Some(f) = self.on_profile_press.as_mut() {
            guard("profile_press", || f(item));
        }
    }

    pub fn open_comments(&mut self, item: &FeedItem) {
        if let Some(f) = self.on_open_comments.as_mut() {
            guard("open_comments", || f(item));
        }
    }

    pub fn share(&mut self, item: &FeedItem) {
        if let Some(f) = self.on_share.as_mut() {
            guard("share", || f(item));
        }
    }

    pub fn follow(&mut self, item: &FeedItem) {
        if let Some(f) = self.on_follow.as_mut() {
            guard("follow", || f(item));
        }
    }

    pub fn active_id_changed(&mut self, id: &str) {
        if let Some(f) = self.set_active_id.as_mut() {
            guard("set_active_id", || f(id));
        }
    }

    pub fn back(&mut self) {
        if let Some(f) = self.on_back.as_mut() {
            guard("back", || f());
        }
    }
}

impl std::fmt::Debug for FeedCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCallbacks")
            .field("on_active_change", &self.on_active_change.is_some())
            .field("on_reload", &self.on_reload.is_some())
            .field("on_like", &self.on_like.is_some())
            .finish_non_exhaustive()
    }
}
