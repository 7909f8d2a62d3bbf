//! Monotonic time behind a trait.
//!
//! Tap debounce and the post-reset quiet window both depend on elapsed time;
//! routing reads through [`Clock`] keeps that logic deterministic under test.

use std::rc::Rc;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

pub type SharedClock = Rc<dyn Clock>;

/// Wall clock backed by `web_time::Instant` (WASM-safe, same source winit
/// uses internally).
pub struct SystemClock {
    origin: web_time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }

    pub fn shared() -> SharedClock {
        Rc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock for tests and deterministic replay.
///
/// Clones share the underlying cell, so a copy handed to a state object and
/// one kept by the driver stay in step.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<std::cell::Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
