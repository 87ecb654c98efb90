use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::surface::Placeholder;
use super::types::{PlaybackQuality, PlayerError, PlayerState};

/// Receives player events. Every method is optional; implement only what you need.
pub trait PlayerDelegate {
    /// The player finished bootstrapping and accepts commands.
    fn player_ready(&mut self) {}
    fn state_changed(&mut self, _state: PlayerState) {}
    fn quality_changed(&mut self, _quality: PlaybackQuality) {}
    fn error_received(&mut self, _error: PlayerError) {}
    /// Reported periodically while playing.
    fn play_time(&mut self, _seconds: f64) {}
    fn playback_rate_changed(&mut self, _rate: f64) {}
    fn api_changed(&mut self) {}
    /// The IFrame API never arrived or the load timed out. The player will not become ready.
    fn load_failed(&mut self) {}
    fn placeholder_visibility(&mut self, _placeholder: Placeholder, _visible: bool) {}
    /// A notification this crate could not interpret, passed on as received.
    fn unrecognized_event(&mut self, _event: &str, _data: Option<&str>) {}
}

impl<D: PlayerDelegate + ?Sized> PlayerDelegate for Box<D> {
    fn player_ready(&mut self) {
        (**self).player_ready()
    }
    fn state_changed(&mut self, state: PlayerState) {
        (**self).state_changed(state)
    }
    fn quality_changed(&mut self, quality: PlaybackQuality) {
        (**self).quality_changed(quality)
    }
    fn error_received(&mut self, error: PlayerError) {
        (**self).error_received(error)
    }
    fn play_time(&mut self, seconds: f64) {
        (**self).play_time(seconds)
    }
    fn playback_rate_changed(&mut self, rate: f64) {
        (**self).playback_rate_changed(rate)
    }
    fn api_changed(&mut self) {
        (**self).api_changed()
    }
    fn load_failed(&mut self) {
        (**self).load_failed()
    }
    fn placeholder_visibility(&mut self, placeholder: Placeholder, visible: bool) {
        (**self).placeholder_visibility(placeholder, visible)
    }
    fn unrecognized_event(&mut self, event: &str, data: Option<&str>) {
        (**self).unrecognized_event(event, data)
    }
}

// --- Status Board ---

/// Last values seen by a [`StatusBoard`].
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DelegateStatus {
    pub ready: bool,
    pub state: Option<PlayerState>,
    pub quality: Option<PlaybackQuality>,
    pub error: Option<PlayerError>,
    pub play_time: Option<f64>,
    pub load_failed: bool,
}

/// A delegate that keeps the latest reported values and logs every change.
/// Clones share the same status, so one clone can be handed to the bridge
/// while another is read by the UI.
#[derive(Clone, Default)]
pub struct StatusBoard {
    status: Arc<Mutex<DelegateStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DelegateStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut DelegateStatus)) {
        match self.status.lock() {
            Ok(mut status) => apply(&mut status),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }
}

impl PlayerDelegate for StatusBoard {
    fn player_ready(&mut self) {
        log::info!("Status: player ready");
        self.update(|status| status.ready = true);
    }

    fn state_changed(&mut self, state: PlayerState) {
        log::info!("Status: state {:?}", state);
        self.update(|status| status.state = Some(state));
    }

    fn quality_changed(&mut self, quality: PlaybackQuality) {
        log::info!("Status: quality {}", quality.token());
        self.update(|status| status.quality = Some(quality));
    }

    fn error_received(&mut self, error: PlayerError) {
        log::warn!("Status: player error: {}", error);
        self.update(|status| status.error = Some(error));
    }

    fn play_time(&mut self, seconds: f64) {
        log::trace!("Status: play time {:.2}s", seconds);
        self.update(|status| status.play_time = Some(seconds));
    }

    fn load_failed(&mut self) {
        log::warn!("Status: player failed to load");
        self.update(|status| status.load_failed = true);
    }

    fn unrecognized_event(&mut self, event: &str, data: Option<&str>) {
        log::info!("Status: unrecognized event {} ({:?})", event, data);
    }
}
