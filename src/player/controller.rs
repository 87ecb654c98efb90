use std::time::Instant;

use serde::Serialize;

use super::codec::{BridgeMessage, decode_notification};
use super::config::BridgeConfig;
use super::delegate::PlayerDelegate;
use super::dispatcher::{CommandDispatcher, PlayerCommand};
use super::document::{player_params_for, render_document};
use super::errors::{CommandError, LoadError};
use super::interceptor::{NavigationAction, NavigationInterceptor};
use super::readiness::{ReadinessMachine, ReadinessState, ReadinessTransition};
use super::surface::{EmbeddedSurface, NavigationPolicy, Placeholder, SurfaceFactory, SurfaceToken};
use super::types::{LoadRequest, PlaybackQuality, PlayerState, PlayerVars, PlaylistSource};

// --- Cached Player Values ---

/// Last values the player reported. Never queried live; only notifications update it.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub readiness: ReadinessState,
    pub player_state: PlayerState,
    pub quality: Option<PlaybackQuality>,
    pub playback_rate: f64,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub playlist: Vec<String>,
    pub playlist_index: Option<i64>,
    pub available_playback_rates: Vec<f64>,
    pub available_quality_levels: Vec<PlaybackQuality>,
    pub video_loaded_fraction: f64,
    pub video_url: Option<String>,
    pub video_embed_code: Option<String>,
}

#[derive(Debug, Clone)]
struct PlaybackCache {
    quality: Option<PlaybackQuality>,
    playback_rate: f64,
    current_time: f64,
    duration: Option<f64>,
    playlist: Vec<String>,
    playlist_index: Option<i64>,
    available_playback_rates: Vec<f64>,
    available_quality_levels: Vec<PlaybackQuality>,
    loaded_fraction: f64,
    video_url: Option<String>,
    embed_code: Option<String>,
}

impl Default for PlaybackCache {
    fn default() -> Self {
        PlaybackCache {
            quality: None,
            playback_rate: 1.0,
            current_time: 0.0,
            duration: None,
            playlist: Vec::new(),
            playlist_index: None,
            available_playback_rates: Vec::new(),
            available_quality_levels: Vec::new(),
            loaded_fraction: 0.0,
            video_url: None,
            embed_code: None,
        }
    }
}

// --- Bridge Controller ---

/// Owns the embedded surface and everything needed to talk to the player inside it.
pub struct PlayerBridge<F: SurfaceFactory> {
    factory: F,
    config: BridgeConfig,
    surface: Option<F::Surface>,
    token: Option<SurfaceToken>,
    last_token: SurfaceToken,
    interceptor: NavigationInterceptor,
    readiness: ReadinessMachine,
    dispatcher: CommandDispatcher,
    delegate: Option<Box<dyn PlayerDelegate>>,
    cache: PlaybackCache,
    loading_started: Option<Instant>,
}

impl<F: SurfaceFactory> PlayerBridge<F> {
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, BridgeConfig::default())
    }

    pub fn with_config(factory: F, config: BridgeConfig) -> Self {
        PlayerBridge {
            factory,
            config,
            surface: None,
            token: None,
            last_token: SurfaceToken::new(0),
            interceptor: NavigationInterceptor::default(),
            readiness: ReadinessMachine::new(),
            dispatcher: CommandDispatcher::new(),
            delegate: None,
            cache: PlaybackCache::default(),
            loading_started: None,
        }
    }

    pub fn set_delegate<D: PlayerDelegate + 'static>(&mut self, delegate: D) {
        self.delegate = Some(Box::new(delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // --- Initial Loading ---

    pub fn load_player_with_video_id(
        &mut self,
        video_id: &str,
        player_vars: Option<PlayerVars>,
    ) -> Result<(), LoadError> {
        self.load_player(LoadRequest::video(video_id).with_player_vars(player_vars.unwrap_or_default()))
    }

    pub fn load_player_with_playlist_id(
        &mut self,
        playlist_id: &str,
        player_vars: Option<PlayerVars>,
    ) -> Result<(), LoadError> {
        self.load_player(
            LoadRequest::playlist(playlist_id).with_player_vars(player_vars.unwrap_or_default()),
        )
    }

    /// One-shot: fails with `AlreadyLoaded` until `teardown` is called.
    pub fn load_player(&mut self, request: LoadRequest) -> Result<(), LoadError> {
        log::info!(
            "Bridge: load requested (video: {:?}, playlist: {:?})",
            request.video_id,
            request.playlist_id
        );
        self.ensure_not_loaded()?;
        let params = player_params_for(&request).map_err(|e| {
            log::warn!("Bridge: rejected load request: {}", e);
            e
        })?;
        self.load_with_params(params)
    }

    /// Loads the player with caller-built top-level parameters. No id validation is done.
    pub fn load_player_with_params(&mut self, additional_params: PlayerVars) -> Result<(), LoadError> {
        log::info!("Bridge: load requested with raw player params");
        self.ensure_not_loaded()?;
        self.load_with_params(additional_params)
    }

    fn ensure_not_loaded(&self) -> Result<(), LoadError> {
        match self.readiness.state() {
            ReadinessState::NotLoaded => Ok(()),
            state => {
                log::warn!("Bridge: load refused, player is {:?}", state);
                Err(LoadError::AlreadyLoaded(state))
            }
        }
    }

    fn load_with_params(&mut self, params: PlayerVars) -> Result<(), LoadError> {
        let document = render_document(
            params,
            &self.config.origin,
            self.config.play_time_interval_ms,
            &self.config.webview,
        )?;

        let token = self.last_token.next();
        self.last_token = token;
        let mut surface = self.factory.create_surface(token, &self.config.webview)?;
        if let Err(e) = surface.load_document(&document.html, &document.origin) {
            log::error!("Bridge: {} failed to load the player document: {}", token, e);
            surface.detach();
            return Err(e.into());
        }

        let mut interceptor = NavigationInterceptor::new(&document.origin);
        for host in surface.document_hosts() {
            interceptor = interceptor.allow_host(&host);
        }
        self.interceptor = interceptor;
        self.surface = Some(surface);
        self.token = Some(token);
        self.cache = PlaybackCache::default();
        self.readiness.begin_loading()?;
        self.loading_started = Some(Instant::now());
        log::info!("Bridge: player document handed to {} (origin {})", token, document.origin);

        self.notify(|delegate| {
            delegate.placeholder_visibility(Placeholder::BeforeLoading, false);
            delegate.placeholder_visibility(Placeholder::InitialLoading, true);
        });
        Ok(())
    }

    // --- Playback Controls ---

    /// Runs one command against the player. Before Ready this returns
    /// `CommandError::NotReady` and nothing is evaluated.
    pub fn send_command(&mut self, command: PlayerCommand) -> Result<(), CommandError> {
        let readiness = self.readiness.state();
        match self.surface.as_mut() {
            Some(surface) => self.dispatcher.dispatch(readiness, surface, &command),
            None => {
                log::debug!("Bridge: no surface, skipping '{}'", command.function_name());
                Err(CommandError::NotReady(readiness))
            }
        }
    }

    pub fn play_video(&mut self) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::Play)
    }

    pub fn pause_video(&mut self) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::Pause)
    }

    pub fn stop_video(&mut self) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::Stop)
    }

    pub fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::SeekTo {
            seconds,
            allow_seek_ahead,
        })
    }

    pub fn cue_video_by_id(
        &mut self,
        video_id: &str,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    ) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::CueVideoById {
            video_id: video_id.to_string(),
            start_seconds,
            end_seconds,
            quality,
        })
    }

    pub fn load_video_by_id(
        &mut self,
        video_id: &str,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    ) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::LoadVideoById {
            video_id: video_id.to_string(),
            start_seconds,
            end_seconds,
            quality,
        })
    }

    pub fn cue_video_by_url(
        &mut self,
        video_url: &str,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    ) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::CueVideoByUrl {
            video_url: video_url.to_string(),
            start_seconds,
            end_seconds,
            quality,
        })
    }

    pub fn load_video_by_url(
        &mut self,
        video_url: &str,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    ) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::LoadVideoByUrl {
            video_url: video_url.to_string(),
            start_seconds,
            end_seconds,
            quality,
        })
    }

    pub fn cue_playlist(
        &mut self,
        playlist: PlaylistSource,
        index: i64,
        start_seconds: f64,
        quality: PlaybackQuality,
    ) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::CuePlaylist {
            playlist,
            index,
            start_seconds,
            quality,
        })
    }

    pub fn load_playlist(
        &mut self,
        playlist: PlaylistSource,
        index: i64,
        start_seconds: f64,
        quality: PlaybackQuality,
    ) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::LoadPlaylist {
            playlist,
            index,
            start_seconds,
            quality,
        })
    }

    pub fn next_video(&mut self) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::NextVideo)
    }

    pub fn previous_video(&mut self) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::PreviousVideo)
    }

    pub fn play_video_at(&mut self, index: i64) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::PlayVideoAt(index))
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::SetPlaybackRate(rate))
    }

    pub fn set_loop(&mut self, enabled: bool) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::SetLoop(enabled))
    }

    pub fn set_shuffle(&mut self, enabled: bool) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::SetShuffle(enabled))
    }

    pub fn set_playback_quality(&mut self, quality: PlaybackQuality) -> Result<(), CommandError> {
        self.send_command(PlayerCommand::SetPlaybackQuality(quality))
    }

    // --- Inbound Navigation ---

    /// Decides an outgoing navigation from the surface identified by `token`.
    pub fn handle_navigation(&mut self, token: SurfaceToken, url: &str) -> NavigationPolicy {
        if self.token != Some(token) || self.surface.is_none() {
            log::debug!("Bridge: ignoring navigation from stale {}: {}", token, url);
            return NavigationPolicy::Cancel;
        }

        match self.interceptor.classify(url) {
            NavigationAction::Notification => {
                match decode_notification(url) {
                    Ok(message) => self.apply_message(message),
                    Err(e) => log::warn!("Bridge: dropping notification '{}': {}", url, e),
                }
                NavigationPolicy::Cancel
            }
            NavigationAction::OpenExternal => {
                log::info!("Bridge: opening {} outside the player", url);
                if let Some(surface) = self.surface.as_mut() {
                    if let Err(e) = surface.open_external(url) {
                        log::error!("Bridge: {}", e);
                    }
                }
                NavigationPolicy::Cancel
            }
            NavigationAction::Allow => NavigationPolicy::Allow,
        }
    }

    fn apply_message(&mut self, message: BridgeMessage) {
        let transition = self.readiness.observe(&message);
        match message {
            BridgeMessage::Ready => {
                if transition == ReadinessTransition::BecameReady {
                    log::info!("Bridge: player ready");
                    self.loading_started = None;
                    self.notify(|delegate| {
                        delegate.placeholder_visibility(Placeholder::InitialLoading, false);
                        delegate.player_ready();
                    });
                }
            }
            BridgeMessage::StateChange(state) => {
                log::debug!("Bridge: state -> {:?}", state);
                self.notify(|delegate| delegate.state_changed(state));
            }
            BridgeMessage::QualityChange(quality) => {
                self.cache.quality = Some(quality);
                self.notify(|delegate| delegate.quality_changed(quality));
            }
            BridgeMessage::Error(error) => {
                log::warn!("Bridge: player reported error: {}", error);
                self.notify(|delegate| delegate.error_received(error));
            }
            BridgeMessage::TimeUpdate(seconds) => {
                self.cache.current_time = seconds;
                self.notify(|delegate| delegate.play_time(seconds));
            }
            BridgeMessage::ApiChange => {
                self.notify(|delegate| delegate.api_changed());
            }
            BridgeMessage::PlaybackRateChange(rate) => {
                self.cache.playback_rate = rate;
                self.notify(|delegate| delegate.playback_rate_changed(rate));
            }
            BridgeMessage::VideoData(data) => {
                if data.duration.is_some() {
                    self.cache.duration = data.duration;
                }
                if let Some(playlist) = data.playlist {
                    self.cache.playlist = playlist;
                }
                self.cache.playlist_index = data.playlist_index;
                if let Some(rates) = data.available_playback_rates {
                    self.cache.available_playback_rates = rates;
                }
                if let Some(levels) = data.available_quality_levels {
                    self.cache.available_quality_levels = levels;
                }
                if let Some(fraction) = data.loaded_fraction {
                    self.cache.loaded_fraction = fraction;
                }
                if data.video_url.is_some() {
                    self.cache.video_url = data.video_url;
                }
                if data.embed_code.is_some() {
                    self.cache.embed_code = data.embed_code;
                }
            }
            BridgeMessage::Unrecognized { event, data } => {
                self.notify(|delegate| delegate.unrecognized_event(&event, data.as_deref()));
            }
            BridgeMessage::IframeApiFailedToLoad => {
                log::error!("Bridge: the IFrame API failed to load");
                self.loading_started = None;
                self.notify(|delegate| {
                    delegate.placeholder_visibility(Placeholder::InitialLoading, false);
                    delegate.load_failed();
                });
            }
        }
    }

    fn notify(&mut self, deliver: impl FnOnce(&mut dyn PlayerDelegate)) {
        if let Some(delegate) = self.delegate.as_mut() {
            deliver(delegate.as_mut());
        }
    }

    /// Gives up on a load that has not reached Ready within the configured timeout.
    /// Returns true when the player was torn down.
    pub fn poll_loading_timeout(&mut self, now: Instant) -> bool {
        let (Some(timeout), Some(started)) = (self.config.loading_timeout(), self.loading_started) else {
            return false;
        };
        if self.readiness.state() != ReadinessState::Loading
            || now.saturating_duration_since(started) < timeout
        {
            return false;
        }

        log::warn!("Bridge: player not ready after {:?}, tearing down", timeout);
        self.notify(|delegate| {
            delegate.placeholder_visibility(Placeholder::InitialLoading, false);
            delegate.load_failed();
        });
        self.teardown();
        true
    }

    // --- Teardown ---

    /// Detaches the surface and resets readiness. Later navigations from the old
    /// surface are ignored and commands fail the readiness check.
    pub fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.detach();
            if let Some(token) = self.token {
                log::info!("Bridge: {} torn down", token);
            }
        }
        self.token = None;
        self.interceptor = NavigationInterceptor::default();
        self.readiness.reset();
        self.cache = PlaybackCache::default();
        self.loading_started = None;
    }

    // --- Getters ---

    pub fn readiness(&self) -> ReadinessState {
        self.readiness.state()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn player_state(&self) -> PlayerState {
        self.readiness.player_state()
    }

    pub fn playback_quality(&self) -> Option<PlaybackQuality> {
        self.cache.quality
    }

    pub fn playback_rate(&self) -> f64 {
        self.cache.playback_rate
    }

    pub fn current_time(&self) -> f64 {
        self.cache.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.cache.duration
    }

    pub fn playlist(&self) -> &[String] {
        &self.cache.playlist
    }

    pub fn playlist_index(&self) -> Option<i64> {
        self.cache.playlist_index
    }

    pub fn available_playback_rates(&self) -> &[f64] {
        &self.cache.available_playback_rates
    }

    pub fn available_quality_levels(&self) -> &[PlaybackQuality] {
        &self.cache.available_quality_levels
    }

    /// Fraction of the video buffered so far, 0.0 to 1.0.
    pub fn video_loaded_fraction(&self) -> f64 {
        self.cache.loaded_fraction
    }

    pub fn video_url(&self) -> Option<&str> {
        self.cache.video_url.as_deref()
    }

    pub fn video_embed_code(&self) -> Option<&str> {
        self.cache.embed_code.as_deref()
    }

    pub fn surface_token(&self) -> Option<SurfaceToken> {
        self.token
    }

    pub fn surface(&self) -> Option<&F::Surface> {
        self.surface.as_ref()
    }

    pub fn dispatched_count(&self) -> u64 {
        self.dispatcher.dispatched_count()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            readiness: self.readiness.state(),
            player_state: self.readiness.player_state(),
            quality: self.cache.quality,
            playback_rate: self.cache.playback_rate,
            current_time: self.cache.current_time,
            duration: self.cache.duration,
            playlist: self.cache.playlist.clone(),
            playlist_index: self.cache.playlist_index,
            available_playback_rates: self.cache.available_playback_rates.clone(),
            available_quality_levels: self.cache.available_quality_levels.clone(),
            video_loaded_fraction: self.cache.loaded_fraction,
            video_url: self.cache.video_url.clone(),
            video_embed_code: self.cache.embed_code.clone(),
        }
    }
}

impl<F: SurfaceFactory> Drop for PlayerBridge<F> {
    fn drop(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.detach();
        }
    }
}
