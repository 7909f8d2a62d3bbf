//! Feed item data model.

use std::rc::Rc;

/// A single post in the feed.
///
/// Items are produced by the data layer and treated as immutable by the
/// presentation state machines. The only local mutation is the optimistic
/// like bump applied through [`crate::PagedFeed::apply_like`].
#[derive(Clone, Debug, PartialEq)]
pub struct FeedItem {
    /// Stable unique id, used as the reconciliation key.
    pub id: Rc<str>,

    /// Playable video source. `None` renders the placeholder.
    pub media_uri: Option<Rc<str>>,

    /// Display caption.
    pub description: String,

    /// Creator handle or id; routing to the profile screen happens outside.
    pub creator_id: String,

    /// Category label, e.g. `s/food`. Items without one show no badge.
    pub category: Option<String>,

    pub like_count: u32,

    /// Local-only optimism flag; never comes from the server.
    pub liked: bool,

    pub comment_count: u32,

    /// Creation time in epoch milliseconds. Sort key for the data layer,
    /// opaque to the feed state machines.
    pub created_at: i64,
}

impl FeedItem {
    pub fn new(id: impl Into<Rc<str>>, media_uri: Option<&str>) -> Self {
        Self {
            id: id.into(),
            media_uri: media_uri.map(Rc::from),
            description: String::new(),
            creator_id: String::new(),
            category: None,
            like_count: 0,
            liked: false,
            comment_count: 0,
            created_at: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_creator(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = creator_id.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_counts(mut self, like_count: u32, comment_count: u32) -> Self {
        self.like_count = like_count;
        self.comment_count = comment_count;
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Feed ordering requested from the data layer.
///
/// Ranking itself happens server-side; the state machines treat the order of
/// the delivered list as opaque.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Hot,
    New,
    Top,
}

/// Time window for [`SortMode::Top`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TopRange {
    Days15,
    Days30,
    Months3,
    #[default]
    All,
}

impl TopRange {
    /// Window length in milliseconds, `None` for the unbounded range.
    pub fn window_ms(self) -> Option<i64> {
        const DAY_MS: i64 = 24 * 60 * 60 * 1000;
        match self {
            TopRange::Days15 => Some(15 * DAY_MS),
            TopRange::Days30 => Some(30 * DAY_MS),
            TopRange::Months3 => Some(90 * DAY_MS),
            TopRange::All => None,
        }
    }
}

/// What the data layer should deliver: sort mode, top window, and an
/// optional category restriction (applied client-side).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedFilter {
    pub sort: SortMode,
    pub top_range: TopRange,
    pub category: Option<String>,
}

impl FeedFilter {
    /// Lower bound on `created_at` implied by the top window, if any.
    pub fn created_after(&self, now_ms: i64) -> Option<i64> {
        if self.sort != SortMode::Top {
            return None;
        }
        self.top_range.window_ms().map(|w| now_ms - w)
    }
}
