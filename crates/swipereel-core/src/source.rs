//! The externally owned item list.
//!
//! [`PagedFeed`] holds the canonical, insertion-ordered item store plus the
//! paging and filtering state around it. The feed state machines never touch
//! it directly: they read immutable [`FeedSnapshot`]s and ask for more data
//! through the reload callback, which the embedding application turns into a
//! [`PageRequest`] here. Only one logical fetch is ever in flight; repeated
//! requests while one is outstanding coalesce to nothing.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{FeedFilter, FeedItem};

/// Default number of items per page, matching the backend query limit.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One cursor-paged fetch the application should run against its data layer.
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    /// Fetch items after this id; `None` means the first page.
    pub after: Option<Rc<str>>,
    pub limit: usize,
    pub filter: FeedFilter,
}

/// Result of a completed [`PageRequest`].
#[derive(Clone, Debug, Default)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub end_cursor: Option<Rc<str>>,
    pub has_more: bool,
}

impl FeedPage {
    /// Builds a page from raw items: the cursor is the last id, and a full
    /// page means there is probably more.
    pub fn from_items(items: Vec<FeedItem>, limit: usize) -> Self {
        let end_cursor = items.last().map(|item| item.id.clone());
        let has_more = items.len() >= limit;
        Self {
            items,
            end_cursor,
            has_more,
        }
    }
}

/// Immutable view of the adapter handed to the feed state machines.
///
/// `items` is a shared vector so taking a snapshot per event is cheap; the
/// state machines hold the `Rc` and never mutate through it.
#[derive(Clone, Debug)]
pub struct FeedSnapshot {
    pub items: Rc<Vec<FeedItem>>,
    pub has_more: bool,
    pub is_fetching_more: bool,
    pub is_refreshing: bool,
    /// Bumped when the list is replaced wholesale (sort or category change).
    /// Presentation jumps back to the top and opens a quiet window.
    pub reset_token: u64,
}

impl FeedSnapshot {
    pub fn empty() -> Self {
        Self {
            items: Rc::new(Vec::new()),
            has_more: true,
            is_fetching_more: false,
            is_refreshing: false,
            reset_token: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FeedItem> {
        self.items.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| &*item.id == id)
    }
}

/// The canonical paged item list.
pub struct PagedFeed {
    /// Insertion-ordered, id-keyed store. Re-fetched duplicates collapse
    /// onto their existing position.
    items: IndexMap<Rc<str>, FeedItem>,
    filter: FeedFilter,
    end_cursor: Option<Rc<str>>,
    has_more: bool,
    is_fetching_more: bool,
    is_refreshing: bool,
    reset_token: u64,
    page_size: usize,
    /// Cached snapshot vector, invalidated on every mutation.
    cached: Option<Rc<Vec<FeedItem>>>,
}

impl PagedFeed {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: IndexMap::new(),
            filter: FeedFilter::default(),
            end_cursor: None,
            has_more: true,
            is_fetching_more: false,
            is_refreshing: false,
            reset_token: 0,
            page_size: page_size.max(1),
            cached: None,
        }
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn is_fetching_more(&self) -> bool {
        self.is_fetching_more
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Starts the next-page fetch, or coalesces it.
    ///
    /// Returns the request to run, or `None` when a fetch is already in
    /// flight or the feed is exhausted. The presentation layer asks on every
    /// approach to the list end; this guard is what keeps that idempotent.
    pub fn fetch_next_page(&mut self) -> Option<PageRequest> {
        if self.is_fetching_more {
            log::debug!("fetch_next_page coalesced; fetch already in flight");
            return None;
        }
        if !self.has_more {
            return None;
        }
        self.is_fetching_more = true;
        Some(PageRequest {
            after: self.end_cursor.clone(),
            limit: self.page_size,
            filter: self.filter.clone(),
        })
    }

    /// Appends a completed page.
    pub fn complete_fetch(&mut self, page: FeedPage) {
        for item in page.items {
            self.items.insert(item.id.clone(), item);
        }
        if page.end_cursor.is_some() {
            self.end_cursor = page.end_cursor;
        }
        self.has_more = page.has_more;
        self.is_fetching_more = false;
        self.cached = None;
    }

    /// Starts a pull-to-refresh, independent from next-page fetching.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        if self.is_refreshing {
            return None;
        }
        self.is_refreshing = true;
        Some(PageRequest {
            after: None,
            limit: self.page_size,
            filter: self.filter.clone(),
        })
    }

    /// Replaces the store with a fresh first page.
    pub fn complete_refresh(&mut self, page: FeedPage) {
        self.items.clear();
        for item in page.items {
            self.items.insert(item.id.clone(), item);
        }
        self.end_cursor = page.end_cursor;
        self.has_more = page.has_more;
        self.is_refreshing = false;
        self.cached = None;
    }

    /// Switches sort mode / top range. On an actual change the store is
    /// cleared, the reset token bumps, and the first-page request for the
    /// new ordering is returned.
    pub fn set_sort(
        &mut self,
        sort: crate::SortMode,
        top_range: crate::TopRange,
    ) -> Option<PageRequest> {
        if self.filter.sort == sort && self.filter.top_range == top_range {
            return None;
        }
        self.filter.sort = sort;
        self.filter.top_range = top_range;
        self.items.clear();
        self.end_cursor = None;
        self.has_more = true;
        self.is_fetching_more = true;
        self.reset_token += 1;
        self.cached = None;
        Some(PageRequest {
            after: None,
            limit: self.page_size,
            filter: self.filter.clone(),
        })
    }

    /// Applies or clears the client-side category restriction. Bumps the
    /// reset token so presentation snaps back to the top, but triggers no
    /// refetch: the category filter is applied when building snapshots.
    pub fn set_category(&mut self, category: Option<String>) {
        if self.filter.category == category {
            return;
        }
        self.filter.category = category;
        self.reset_token += 1;
        self.cached = None;
    }

    /// Optimistic like: mark the item liked and bump its count locally.
    /// Hearts are spent, never returned, so `delta` is strictly positive.
    pub fn apply_like(&mut self, id: &str, delta: u32) {
        debug_assert!(delta > 0);
        if let Some(item) = self.items.get_mut(id) {
            item.liked = true;
            item.like_count = item.like_count.saturating_add(delta);
            self.cached = None;
        } else {
            log::warn!("apply_like: unknown item id {id}");
        }
    }

    pub fn get(&self, id: &str) -> Option<&FeedItem> {
        self.items.get(id)
    }

    /// Number of items in the store, before category filtering.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Builds (or reuses) the snapshot the state machines consume, with the
    /// category restriction applied.
    pub fn snapshot(&mut self) -> FeedSnapshot {
        let items = match &self.cached {
            Some(cached) => cached.clone(),
            None => {
                let filtered: Vec<FeedItem> = match &self.filter.category {
                    Some(category) => self
                        .items
                        .values()
                        .filter(|item| item.category.as_deref() == Some(category.as_str()))
                        .cloned()
                        .collect(),
                    None => self.items.values().cloned().collect(),
                };
                let shared = Rc::new(filtered);
                self.cached = Some(shared.clone());
                shared
            }
        };
        FeedSnapshot {
            items,
            has_more: self.has_more,
            is_fetching_more: self.is_fetching_more,
            is_refreshing: self.is_refreshing,
            reset_token: self.reset_token,
        }
    }
}

impl Default for PagedFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SortMode, TopRange};

    fn page(range: std::ops::Range<usize>, limit: usize) -> FeedPage {
        let items = range
            .map(|i| FeedItem::new(format!("p{i}"), Some("clip://a")).with_category("s/food"))
            .collect();
        FeedPage::from_items(items, limit)
    }

    #[test]
    fn full_page_implies_has_more() {
        let page = page(0..20, 20);
        assert!(page.has_more);
        assert_eq!(page.end_cursor.as_deref(), Some("p19"));

        let short = super::FeedPage::from_items(
            (0..5).map(|i| FeedItem::new(format!("p{i}"), None)).collect(),
            20,
        );
        assert!(!short.has_more);
    }

    #[test]
    fn concurrent_fetches_coalesce() {
        let mut feed = PagedFeed::with_page_size(20);
        let first = feed.fetch_next_page();
        assert!(first.is_some());
        // Second ask while the first is outstanding is suppressed.
        assert!(feed.fetch_next_page().is_none());

        feed.complete_fetch(page(0..20, 20));
        let second = feed.fetch_next_page().expect("fetch after completion");
        assert_eq!(second.after.as_deref(), Some("p19"));
    }

    #[test]
    fn exhausted_feed_stops_fetching() {
        let mut feed = PagedFeed::with_page_size(20);
        feed.fetch_next_page();
        feed.complete_fetch(page(0..5, 20));
        assert!(!feed.has_more());
        assert!(feed.fetch_next_page().is_none());
    }

    #[test]
    fn refetched_duplicates_collapse() {
        let mut feed = PagedFeed::with_page_size(20);
        feed.fetch_next_page();
        feed.complete_fetch(page(0..20, 20));
        feed.fetch_next_page();
        feed.complete_fetch(page(10..30, 20));
        assert_eq!(feed.len(), 30);
    }

    #[test]
    fn sort_change_resets_and_bumps_token() {
        let mut feed = PagedFeed::with_page_size(20);
        feed.fetch_next_page();
        feed.complete_fetch(page(0..20, 20));
        let before = feed.snapshot();
        assert_eq!(before.reset_token, 0);

        let request = feed
            .set_sort(SortMode::Top, TopRange::Days30)
            .expect("changed sort returns first-page request");
        assert_eq!(request.after, None);

        let after = feed.snapshot();
        assert_eq!(after.reset_token, 1);
        assert!(after.is_empty());
        assert!(after.is_fetching_more);

        // Same sort again is a no-op.
        assert!(feed.set_sort(SortMode::Top, TopRange::Days30).is_none());
    }

    #[test]
    fn category_filter_applies_to_snapshot_only() {
        let mut feed = PagedFeed::with_page_size(20);
        feed.fetch_next_page();
        let mut items: Vec<FeedItem> = (0..4)
            .map(|i| FeedItem::new(format!("p{i}"), None).with_category("s/food"))
            .collect();
        items.push(FeedItem::new("x", None).with_category("s/auto"));
        feed.complete_fetch(FeedPage::from_items(items, 20));

        feed.set_category(Some("s/auto".into()));
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(&*snapshot.items[0].id, "x");
        assert_eq!(snapshot.reset_token, 1);
        // The store itself is untouched.
        assert_eq!(feed.len(), 5);
    }

    #[test]
    fn apply_like_is_optimistic() {
        let mut feed = PagedFeed::with_page_size(20);
        feed.fetch_next_page();
        feed.complete_fetch(page(0..3, 20));

        feed.apply_like("p1", 1);
        let item = feed.get("p1").unwrap();
        assert!(item.liked);
        assert_eq!(item.like_count, 1);
    }

    #[test]
    fn snapshot_is_cached_until_mutation() {
        let mut feed = PagedFeed::with_page_size(20);
        feed.fetch_next_page();
        feed.complete_fetch(page(0..3, 20));

        let a = feed.snapshot();
        let b = feed.snapshot();
        assert!(Rc::ptr_eq(&a.items, &b.items));

        feed.apply_like("p0", 1);
        let c = feed.snapshot();
        assert!(!Rc::ptr_eq(&a.items, &c.items));
    }
}
