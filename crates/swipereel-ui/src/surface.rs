//! Video surface glue.
//!
//! The surface renders one looping, muted, cover-fit video for whatever item
//! its layer currently holds. The platform player keys its decode pipeline
//! on the *identity* of the source handle, so re-rendering with an unchanged
//! URI must hand out the same handle; only an actual source change rebuilds
//! it. Leaving an item remembers its playback position, and coming back to a
//! recently-left item resumes near where it was instead of restarting.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use swipereel_core::FeedItem;

/// Identity-stable handle to a playable source.
///
/// Platform players compare handles by identity (`Rc::ptr_eq`) to decide
/// whether the decode pipeline survives a re-render.
#[derive(Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub uri: Rc<str>,
    pub looping: bool,
    pub muted: bool,
}

impl SourceDescriptor {
    fn new(uri: Rc<str>) -> Self {
        // Feed presentation is fixed: looping, muted, cover-fit.
        Self {
            uri,
            looping: true,
            muted: true,
        }
    }
}

/// Playback readout passed to the status listener.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl PlaybackStatus {
    /// The "elapsed / total" pill text.
    pub fn readout(&self) -> String {
        format!(
            "{} / {}",
            format_timestamp(self.position_ms),
            format_timestamp(self.duration_ms)
        )
    }
}

/// Formats milliseconds as `m:ss`; zero and unknown both read `0:00`.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
}

/// What the surface shows this frame.
#[derive(Clone, Debug)]
pub enum SurfaceFrame {
    /// No resolvable source; render the "no media" placeholder.
    Placeholder,
    Video {
        source: Rc<SourceDescriptor>,
        playing: bool,
    },
}

/// One layer's video surface.
pub struct VideoSurface {
    source: Option<Rc<SourceDescriptor>>,
    item_id: Option<Rc<str>>,
    paused: bool,
    status: PlaybackStatus,
    decoder_resets: u32,
    /// Last known position per item id, for resume on return.
    resume_positions: FxHashMap<Rc<str>, u64>,
    status_listener: Option<Box<dyn FnMut(PlaybackStatus)>>,
}

impl VideoSurface {
    pub fn new() -> Self {
        Self {
            source: None,
            item_id: None,
            paused: false,
            status: PlaybackStatus::default(),
            decoder_resets: 0,
            resume_positions: FxHashMap::default(),
            status_listener: None,
        }
    }

    /// Points the surface at an item (or at nothing).
    ///
    /// Re-pointing at the same URI is free: the existing source handle and
    /// decode state are kept. An actual change stores the outgoing item's
    /// position and restores the incoming item's cached one, if any.
    pub fn set_item(&mut self, item: Option<&FeedItem>) {
        let next_uri = item.and_then(|item| item.media_uri.clone());
        let next_id = item.map(|item| item.id.clone());

        if let (Some(current), Some(next)) = (&self.source, &next_uri) {
            if current.uri == *next {
                self.item_id = next_id;
                return;
            }
        }
        if self.source.is_none() && next_uri.is_none() {
            self.item_id = next_id;
            return;
        }

        self.remember_position();
        match next_uri {
            Some(uri) => {
                self.source = Some(Rc::new(SourceDescriptor::new(uri)));
                self.decoder_resets += 1;
                let resume = next_id
                    .as_ref()
                    .and_then(|id| self.resume_positions.get(id).copied())
                    .unwrap_or(0);
                self.status = PlaybackStatus {
                    position_ms: resume,
                    duration_ms: 0,
                };
                if resume > 0 {
                    log::debug!("resuming {:?} at {resume}ms", next_id);
                }
            }
            None => {
                self.source = None;
                self.status = PlaybackStatus::default();
            }
        }
        self.item_id = next_id;
    }

    fn remember_position(&mut self) {
        if let Some(id) = &self.item_id {
            if self.status.position_ms > 0 {
                self.resume_positions
                    .insert(id.clone(), self.status.position_ms);
            }
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Player progress report. Forwards to the status listener, which only
    /// ever drives the elapsed/total readout.
    pub fn report_status(&mut self, status: PlaybackStatus) {
        self.status = status;
        if let Some(listener) = self.status_listener.as_mut() {
            listener(status);
        }
    }

    pub fn set_status_listener(&mut self, listener: impl FnMut(PlaybackStatus) + 'static) {
        self.status_listener = Some(Box::new(listener));
    }

    pub fn frame(&self) -> SurfaceFrame {
        match &self.source {
            None => SurfaceFrame::Placeholder,
            Some(source) => SurfaceFrame::Video {
                source: source.clone(),
                playing: !self.paused,
            },
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// How many times the decode pipeline has been rebuilt.
    pub fn decoder_resets(&self) -> u32 {
        self.decoder_resets
    }
}

impl Default for VideoSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, uri: Option<&str>) -> FeedItem {
        FeedItem::new(id, uri)
    }

    #[test]
    fn same_uri_keeps_the_source_handle() {
        let mut surface = VideoSurface::new();
        let post = item("a", Some("clip://one"));
        surface.set_item(Some(&post));
        assert_eq!(surface.decoder_resets(), 1);

        let first = match surface.frame() {
            SurfaceFrame::Video { source, .. } => source,
            _ => panic!("expected video"),
        };
        // Re-render with the same item: identical handle, no rebuild.
        surface.set_item(Some(&post));
        let second = match surface.frame() {
            SurfaceFrame::Video { source, .. } => source,
            _ => panic!("expected video"),
        };
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(surface.decoder_resets(), 1);
    }

    #[test]
    fn source_change_rebuilds_once() {
        let mut surface = VideoSurface::new();
        surface.set_item(Some(&item("a", Some("clip://one"))));
        surface.set_item(Some(&item("b", Some("clip://two"))));
        assert_eq!(surface.decoder_resets(), 2);
    }

    #[test]
    fn missing_source_renders_placeholder() {
        let mut surface = VideoSurface::new();
        surface.set_item(Some(&item("a", None)));
        assert!(matches!(surface.frame(), SurfaceFrame::Placeholder));
        surface.set_item(None);
        assert!(matches!(surface.frame(), SurfaceFrame::Placeholder));
    }

    #[test]
    fn returning_to_an_item_resumes_position() {
        let mut surface = VideoSurface::new();
        surface.set_item(Some(&item("a", Some("clip://one"))));
        surface.report_status(PlaybackStatus {
            position_ms: 7_500,
            duration_ms: 30_000,
        });

        surface.set_item(Some(&item("b", Some("clip://two"))));
        assert_eq!(surface.status().position_ms, 0);

        surface.set_item(Some(&item("a", Some("clip://one"))));
        assert_eq!(surface.status().position_ms, 7_500);
    }

    #[test]
    fn fresh_item_starts_at_zero() {
        let mut surface = VideoSurface::new();
        surface.set_item(Some(&item("a", Some("clip://one"))));
        surface.report_status(PlaybackStatus {
            position_ms: 4_000,
            duration_ms: 10_000,
        });
        surface.set_item(Some(&item("c", Some("clip://three"))));
        assert_eq!(surface.status().position_ms, 0);
    }

    #[test]
    fn readout_formats_elapsed_over_total() {
        let status = PlaybackStatus {
            position_ms: 65_000,
            duration_ms: 600_000,
        };
        assert_eq!(status.readout(), "1:05 / 10:00");
        assert_eq!(format_timestamp(0), "0:00");
        assert_eq!(format_timestamp(999), "0:00");
    }

    #[test]
    fn pause_reflects_in_the_frame() {
        let mut surface = VideoSurface::new();
        surface.set_item(Some(&item("a", Some("clip://one"))));
        surface.set_paused(true);
        match surface.frame() {
            SurfaceFrame::Video { playing, .. } => assert!(!playing),
            _ => panic!("expected video"),
        }
    }
}
