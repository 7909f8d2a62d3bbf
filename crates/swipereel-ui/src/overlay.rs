//! Per-item overlay chrome.
//!
//! The overlay is stateless with respect to feed position: it renders
//! whatever item it is handed plus the current like state, and forwards
//! every press outward through the guarded callback boundary. It never owns
//! list or playback state, and a pure re-render predicate keeps it out of
//! the way of the layer offset animation next door.

use swipereel_core::{FeedCallbacks, FeedItem};

/// Hearts are spent one at a time and never returned.
pub const LIKE_DELTA: u32 = 1;

/// Like state as the overlay shows it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u32,
}

/// Inputs for one overlay render.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayProps {
    pub item: FeedItem,
    pub like: LikeState,
    pub comment_count: u32,
    /// Category badge text, shown with the back button in category-scoped
    /// feeds.
    pub category_label: Option<String>,
    pub show_back_button: bool,
}

impl OverlayProps {
    pub fn for_item(item: &FeedItem) -> Self {
        Self {
            like: LikeState {
                liked: item.liked,
                count: item.like_count,
            },
            comment_count: item.comment_count,
            category_label: item.category.clone(),
            show_back_button: false,
            item: item.clone(),
        }
    }

    pub fn with_back_button(mut self, category_label: impl Into<String>) -> Self {
        self.category_label = Some(category_label.into());
        self.show_back_button = true;
        self
    }

    /// Pure re-render predicate: only a different item or a changed like
    /// counter warrants a relayout.
    pub fn should_rerender(previous: &OverlayProps, next: &OverlayProps) -> bool {
        previous.item.id != next.item.id || previous.like != next.like
    }
}

/// Flattened view the platform layer draws.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayView {
    pub creator: String,
    pub description: String,
    pub like_icon_filled: bool,
    pub like_count: u32,
    pub comment_count: u32,
    pub category_badge: Option<String>,
    pub show_back_button: bool,
}

pub fn overlay_view(props: &OverlayProps) -> OverlayView {
    OverlayView {
        creator: props.item.creator_id.clone(),
        description: props.item.description.clone(),
        like_icon_filled: props.like.liked,
        like_count: props.like.count,
        comment_count: props.comment_count,
        category_badge: props.category_label.clone(),
        show_back_button: props.show_back_button,
    }
}

// Press entry points. Each one is a plain forward through the guarded
// dispatch; the overlay itself decides nothing.

pub fn press_like(props: &OverlayProps, callbacks: &mut FeedCallbacks) {
    callbacks.like(&props.item, LIKE_DELTA);
}

pub fn press_profile(props: &OverlayProps, callbacks: &mut FeedCallbacks) {
    callbacks.profile_press(&props.item);
}

pub fn press_comments(props: &OverlayProps, callbacks: &mut FeedCallbacks) {
    callbacks.open_comments(&props.item);
}

pub fn press_share(props: &OverlayProps, callbacks: &mut FeedCallbacks) {
    callbacks.share(&props.item);
}

pub fn press_follow(props: &OverlayProps, callbacks: &mut FeedCallbacks) {
    callbacks.follow(&props.item);
}

pub fn press_back(callbacks: &mut FeedCallbacks) {
    callbacks.back();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn item(id: &str) -> FeedItem {
        FeedItem::new(id, Some("clip://sample"))
            .with_creator("agent_1")
            .with_description("a post")
            .with_counts(3, 2)
    }

    #[test]
    fn rerenders_only_on_id_or_like_change() {
        let props = OverlayProps::for_item(&item("a"));

        let same = props.clone();
        assert!(!OverlayProps::should_rerender(&props, &same));

        let mut liked = props.clone();
        liked.like.count += 1;
        assert!(OverlayProps::should_rerender(&props, &liked));

        let other_item = OverlayProps::for_item(&item("b"));
        assert!(OverlayProps::should_rerender(&props, &other_item));

        // Unrelated churn (a new comment) does not force a relayout.
        let mut commented = props.clone();
        commented.comment_count += 1;
        assert!(!OverlayProps::should_rerender(&props, &commented));
    }

    #[test]
    fn like_press_forwards_a_positive_delta() {
        let recorded = Rc::new(RefCell::new(Vec::new()));
        let log = recorded.clone();
        let mut callbacks = FeedCallbacks::new()
            .on_like(move |item, delta| log.borrow_mut().push((item.id.to_string(), delta)));

        let props = OverlayProps::for_item(&item("a"));
        press_like(&props, &mut callbacks);
        assert_eq!(&*recorded.borrow(), &[("a".to_string(), 1)]);
    }

    #[test]
    fn back_button_block_is_opt_in() {
        let plain = OverlayProps::for_item(&item("a"));
        assert!(!plain.show_back_button);

        let scoped = OverlayProps::for_item(&item("a")).with_back_button("s/food");
        let view = overlay_view(&scoped);
        assert!(view.show_back_button);
        assert_eq!(view.category_badge.as_deref(), Some("s/food"));
    }
}
