//! Drag and tap recognition.
//!
//! Two recognizers share the pointer stream: a vertical pan and a debounced
//! tap that toggles playback. Their interaction is decided by explicit
//! predicate checks rather than recognizer priorities: once cumulative
//! travel leaves a small dead zone, the eventual release can no longer count
//! as a tap.

/// Travel below this still counts as a tap, in logical pixels.
pub const TAP_DEAD_ZONE: f32 = 5.0;

/// Minimum time between pause toggles, in milliseconds.
pub const TAP_DEBOUNCE_MS: u64 = 300;

/// Bookkeeping for one in-progress drag.
///
/// Created on pointer down, cleared when the release has been resolved into
/// a tap, a cancel or a commit.
#[derive(Clone, Copy, Debug, Default)]
pub struct GestureSession {
    /// Cumulative vertical displacement since the gesture started.
    pub translation: f32,
    /// Largest absolute displacement seen; drives the tap dead-zone check.
    pub max_travel: f32,
    /// Set when this session has produced a layer swap, so one drag can
    /// never commit twice however its events are delivered.
    pub committed: bool,
}

impl GestureSession {
    /// Starts a session that takes over a not-yet-settled offset. The
    /// carried translation keeps the layer under the finger, and a nonzero
    /// carry disqualifies the session from ever being a tap.
    pub fn with_carryover(translation: f32) -> Self {
        Self {
            translation,
            max_travel: translation.abs(),
            committed: false,
        }
    }

    pub fn move_by(&mut self, dy: f32) {
        self.translation += dy;
        self.max_travel = self.max_travel.max(self.translation.abs());
    }

    pub fn is_tap(&self, dead_zone: f32) -> bool {
        self.max_travel < dead_zone
    }
}

/// Debounced tap recognizer for the pause toggle.
#[derive(Debug, Default)]
pub struct TapRecognizer {
    last_fire_ms: Option<u64>,
}

impl TapRecognizer {
    /// Returns whether a tap at `now_ms` should take effect. Firing records
    /// the time; a second tap within the debounce interval is swallowed.
    pub fn try_fire(&mut self, now_ms: u64, debounce_ms: u64) -> bool {
        match self.last_fire_ms {
            Some(last) if now_ms.saturating_sub(last) < debounce_ms => false,
            _ => {
                self.last_fire_ms = Some(now_ms);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_travel_is_a_tap() {
        let mut session = GestureSession::default();
        session.move_by(2.0);
        session.move_by(-3.0);
        assert!(session.is_tap(TAP_DEAD_ZONE));
    }

    #[test]
    fn travel_beyond_dead_zone_disqualifies_tap() {
        let mut session = GestureSession::default();
        session.move_by(8.0);
        // Returning under the dead zone does not restore tapness.
        session.move_by(-8.0);
        assert!(!session.is_tap(TAP_DEAD_ZONE));
    }

    #[test]
    fn carryover_is_never_a_tap() {
        let session = GestureSession::with_carryover(-40.0);
        assert!(!session.is_tap(TAP_DEAD_ZONE));
        assert_eq!(session.translation, -40.0);
    }

    #[test]
    fn tap_debounce() {
        let mut tap = TapRecognizer::default();
        assert!(tap.try_fire(1_000, TAP_DEBOUNCE_MS));
        assert!(!tap.try_fire(1_200, TAP_DEBOUNCE_MS));
        assert!(tap.try_fire(1_301, TAP_DEBOUNCE_MS));
    }
}
