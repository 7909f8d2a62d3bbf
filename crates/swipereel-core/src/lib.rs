//! Core building blocks for the swipereel feed.
//!
//! This crate owns everything the presentation state machines consume but do
//! not control: the [`FeedItem`] data model, the externally owned paged list
//! ([`PagedFeed`]) and its snapshot contract, the guarded outbound event
//! boundary ([`FeedCallbacks`]), and a small monotonic [`Clock`] abstraction.

mod clock;
mod events;
mod item;
mod source;

pub use clock::*;
pub use events::*;
pub use item::*;
pub use source::*;
