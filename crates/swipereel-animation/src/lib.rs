//! Offset settle animations.
//!
//! Drag gestures drive layer offsets directly; this crate covers the other
//! half of their lifetime, the animated return to rest after a cancel or a
//! programmatic snap. A [`Tween`] is a plain sampled curve; [`AnimatedOffset`]
//! binds one to a clock and a current value.

use swipereel_core::SharedClock;

/// Fixed-duration tween with smoothstep easing.
#[derive(Clone, Copy, Debug)]
pub struct Tween {
    from: f32,
    to: f32,
    start_ms: u64,
    duration_ms: u64,
}

impl Tween {
    pub fn new(from: f32, to: f32, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration_ms.max(1),
        }
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }

    pub fn sample(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = (elapsed as f32 / self.duration_ms as f32).clamp(0.0, 1.0);
        let eased = smoothstep(t);
        self.from + (self.to - self.from) * eased
    }

    /// Redirects an in-flight tween toward a new target, starting from the
    /// current sampled position so there is no visible jump.
    pub fn retarget(&mut self, now_ms: u64, new_to: f32, duration_ms: u64) {
        let current = self.sample(now_ms);
        *self = Self::new(current, new_to, now_ms, duration_ms);
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Default settle duration for a cancelled drag, in milliseconds.
pub const SETTLE_DURATION_MS: u64 = 180;

/// A scalar offset that is either driven directly (finger down) or settling
/// along a tween (finger up).
pub struct AnimatedOffset {
    value: f32,
    tween: Option<Tween>,
    clock: SharedClock,
}

impl AnimatedOffset {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            value: 0.0,
            tween: None,
            clock,
        }
    }

    /// Drives the value directly, cancelling any settle in progress.
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.tween = None;
    }

    /// Starts (or retargets) a settle toward `target`.
    pub fn animate_to(&mut self, target: f32, duration_ms: u64) {
        let now = self.clock.now_ms();
        match self.tween.as_mut() {
            Some(tween) => tween.retarget(now, target, duration_ms),
            None => self.tween = Some(Tween::new(self.value, target, now, duration_ms)),
        }
    }

    /// Samples the current value, finalizing a finished tween.
    pub fn value(&mut self) -> f32 {
        if let Some(tween) = self.tween {
            let now = self.clock.now_ms();
            self.value = tween.sample(now);
            if tween.is_done(now) {
                self.tween = None;
            }
        }
        self.value
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }
}

impl std::fmt::Debug for AnimatedOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedOffset")
            .field("value", &self.value)
            .field("tween", &self.tween)
            .finish()
    }
}
