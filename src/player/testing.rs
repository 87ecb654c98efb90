//! Recording doubles for driving the bridge without a real web view.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::codec::decode_command_script;
use super::config::WebViewConfig;
use super::delegate::PlayerDelegate;
use super::errors::SurfaceError;
use super::surface::{EmbeddedSurface, Placeholder, ScriptSink, SurfaceFactory, SurfaceToken};
use super::types::{PlaybackQuality, PlayerError, PlayerState};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Everything the recording surfaces were asked to do, in order.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    pub created: Vec<SurfaceToken>,
    pub documents: Vec<(SurfaceToken, String)>,
    pub base_urls: Vec<String>,
    pub scripts: Vec<(SurfaceToken, String)>,
    pub opened_externally: Vec<String>,
    pub detached: Vec<SurfaceToken>,
}

#[derive(Clone, Default)]
pub struct RecordingFactory {
    log: Arc<Mutex<SurfaceLog>>,
    pub fail_creation: bool,
    pub fail_document_load: bool,
    pub fail_scripts: bool,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SurfaceLog {
        lock(&self.log).clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        lock(&self.log)
            .scripts
            .iter()
            .map(|(_, script)| script.clone())
            .collect()
    }

    /// Recorded scripts decoded back into function name and arguments.
    pub fn commands(&self) -> Vec<(String, Vec<Value>)> {
        self.scripts()
            .iter()
            .filter_map(|script| decode_command_script(script))
            .collect()
    }
}

impl SurfaceFactory for RecordingFactory {
    type Surface = RecordingSurface;

    fn create_surface(
        &mut self,
        token: SurfaceToken,
        _config: &WebViewConfig,
    ) -> Result<RecordingSurface, SurfaceError> {
        if self.fail_creation {
            return Err(SurfaceError::Creation("recording factory told to fail".into()));
        }
        lock(&self.log).created.push(token);
        Ok(RecordingSurface {
            token,
            log: self.log.clone(),
            attached: true,
            fail_document_load: self.fail_document_load,
            fail_scripts: self.fail_scripts,
        })
    }
}

pub struct RecordingSurface {
    token: SurfaceToken,
    log: Arc<Mutex<SurfaceLog>>,
    attached: bool,
    fail_document_load: bool,
    fail_scripts: bool,
}

impl ScriptSink for RecordingSurface {
    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::Detached);
        }
        if self.fail_scripts {
            return Err(SurfaceError::Script("recording surface told to fail".into()));
        }
        lock(&self.log).scripts.push((self.token, script.to_string()));
        Ok(())
    }
}

impl EmbeddedSurface for RecordingSurface {
    fn load_document(&mut self, html: &str, base_url: &str) -> Result<(), SurfaceError> {
        if self.fail_document_load {
            return Err(SurfaceError::DocumentLoad("recording surface told to fail".into()));
        }
        let mut log = lock(&self.log);
        log.documents.push((self.token, html.to_string()));
        log.base_urls.push(base_url.to_string());
        Ok(())
    }

    fn open_external(&mut self, url: &str) -> Result<(), SurfaceError> {
        lock(&self.log).opened_externally.push(url.to_string());
        Ok(())
    }

    fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            lock(&self.log).detached.push(self.token);
        }
    }
}

// --- Recording Delegate ---

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateEvent {
    Ready,
    StateChanged(PlayerState),
    QualityChanged(PlaybackQuality),
    Error(PlayerError),
    PlayTime(f64),
    PlaybackRateChanged(f64),
    ApiChanged,
    LoadFailed,
    Placeholder(Placeholder, bool),
    Unrecognized(String, Option<String>),
}

/// Records every callback. Clones share the same event list.
#[derive(Clone, Default)]
pub struct RecordingDelegate {
    events: Arc<Mutex<Vec<DelegateEvent>>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DelegateEvent> {
        lock(&self.events).clone()
    }

    /// Events other than placeholder visibility changes.
    pub fn player_events(&self) -> Vec<DelegateEvent> {
        self.events()
            .into_iter()
            .filter(|event| !matches!(event, DelegateEvent::Placeholder(..)))
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    fn push(&self, event: DelegateEvent) {
        lock(&self.events).push(event);
    }
}

impl PlayerDelegate for RecordingDelegate {
    fn player_ready(&mut self) {
        self.push(DelegateEvent::Ready);
    }
    fn state_changed(&mut self, state: PlayerState) {
        self.push(DelegateEvent::StateChanged(state));
    }
    fn quality_changed(&mut self, quality: PlaybackQuality) {
        self.push(DelegateEvent::QualityChanged(quality));
    }
    fn error_received(&mut self, error: PlayerError) {
        self.push(DelegateEvent::Error(error));
    }
    fn play_time(&mut self, seconds: f64) {
        self.push(DelegateEvent::PlayTime(seconds));
    }
    fn playback_rate_changed(&mut self, rate: f64) {
        self.push(DelegateEvent::PlaybackRateChanged(rate));
    }
    fn api_changed(&mut self) {
        self.push(DelegateEvent::ApiChanged);
    }
    fn load_failed(&mut self) {
        self.push(DelegateEvent::LoadFailed);
    }
    fn placeholder_visibility(&mut self, placeholder: Placeholder, visible: bool) {
        self.push(DelegateEvent::Placeholder(placeholder, visible));
    }
    fn unrecognized_event(&mut self, event: &str, data: Option<&str>) {
        self.push(DelegateEvent::Unrecognized(event.to_string(), data.map(str::to_string)));
    }
}
