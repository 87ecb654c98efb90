use serde::Deserialize;
use std::time::Duration;

use super::errors::ConfigError;

// --- Bridge Channel Constants ---
// Scheme the glue script navigates to when it has something to report.
pub const BRIDGE_SCHEME: &str = "ytplayer";
// Scheme the Tauri host serves player documents from.
pub const DOCUMENT_SCHEME: &str = "ytembed";
// Global the glue script assigns the YT.Player instance to.
pub const PLAYER_OBJECT: &str = "player";

// --- Player Document Constants ---
pub const DEFAULT_ORIGIN: &str = "https://www.youtube.com";
pub const IFRAME_API_URL: &str = "https://www.youtube.com/iframe_api";
pub const DEFAULT_PLAY_TIME_INTERVAL_MS: u64 = 500;

// --- Player-Internal Navigation Patterns ---
// http(s) navigations matching one of these stay inside the surface.
pub const EMBED_URL_PATTERN: &str = r"^https?://(www\.)?youtube\.com/embed/(.*)$";
pub const AD_URL_PATTERN: &str = r"^https?://pubads\.g\.doubleclick\.net/pagead/conversion/";
pub const OAUTH_URL_PATTERN: &str = r"^https?://accounts\.google\.com/o/oauth2/(.*)$";
pub const STATIC_PROXY_URL_PATTERN: &str = r"^https://content\.googleapis\.com/static/proxy\.html(.*)$";
pub const SYNDICATION_URL_PATTERN: &str = r"^https://tpc\.googlesyndication\.com/sodar/(.*)\.html$";

// --- Bridge Thread Constants ---
pub const BRIDGE_CHANNEL_CAPACITY: usize = 32;
// How often the bridge thread checks for a stalled initial load, in milliseconds.
pub const LOADING_TIMEOUT_CHECK_INTERVAL_MS: u64 = 250;

/// Media settings for the embedded surface, applied through the player vars.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WebViewConfig {
    /// Rendered as `playsinline` unless the caller set it.
    pub allows_inline_media_playback: bool,
    /// Forces `autoplay` to 0.
    pub requires_user_action_for_playback: bool,
}

impl Default for WebViewConfig {
    fn default() -> Self {
        WebViewConfig {
            allows_inline_media_playback: true,
            requires_user_action_for_playback: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Origin the player document claims. A `origin` player var overrides it per load.
    pub origin: String,
    pub webview: WebViewConfig,
    pub play_time_interval_ms: u64,
    /// Off unless set. See `PlayerBridge::poll_loading_timeout`.
    pub loading_timeout_ms: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            origin: DEFAULT_ORIGIN.to_string(),
            webview: WebViewConfig::default(),
            play_time_interval_ms: DEFAULT_PLAY_TIME_INTERVAL_MS,
            loading_timeout_ms: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        if config.play_time_interval_ms == 0 {
            return Err(ConfigError::InvalidPlayTimeInterval);
        }
        if config.origin.trim().is_empty() {
            return Err(ConfigError::EmptyOrigin);
        }
        Ok(config)
    }

    pub fn loading_timeout(&self) -> Option<Duration> {
        self.loading_timeout_ms.map(Duration::from_millis)
    }
}
