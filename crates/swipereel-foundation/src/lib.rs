//! Feed state machines.
//!
//! Two presentations of the same vertically paged video feed share this
//! crate, both driven by [`swipereel_core::FeedSnapshot`]s from the list
//! adapter:
//!
//! - [`TwoLayerFeedState`] is the primary implementation. Exactly two
//!   mounted playback layers; a vertical drag slides the top one while the
//!   other is pre-pointed at the neighbor, and releasing past a distance
//!   threshold swaps which layer is on top.
//! - [`SnapPagerState`] is a single-surface alternative with hard
//!   snap-to-page scrolling, pull-to-refresh and an empty state.

mod gesture;
mod layer;
mod pager;
mod two_layer;

pub use gesture::*;
pub use layer::*;
pub use pager::*;
pub use two_layer::*;
