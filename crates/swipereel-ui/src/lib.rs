//! Presentation glue for the swipereel feed.
//!
//! Nothing here decodes video or draws pixels. [`VideoSurface`] owns the
//! contract a platform player binds to (identity-stable source, pause state,
//! position readout, resume cache); the overlay module owns the per-item
//! chrome model and forwards presses through the guarded callback boundary.

mod overlay;
mod surface;

pub use overlay::*;
pub use surface::*;
