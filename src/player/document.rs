//! Initial player document: the IFrame API bootstrap plus the glue script that
//! turns player events into `ytplayer://` navigations.

use serde_json::{Value, json};

use super::codec::script_literal;
use super::config::{BRIDGE_SCHEME, IFRAME_API_URL, WebViewConfig};
use super::errors::LoadError;
use super::types::{LoadRequest, PlaybackQuality, PlayerState, PlayerVars};

const PLAYER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1, user-scalable=no">
<style>
  html, body { margin: 0; padding: 0; width: 100%; height: 100%; background-color: #000000; overflow: hidden; }
  .embed-container iframe, .embed-container object, .embed-container embed {
    position: absolute; top: 0; left: 0; width: 100% !important; height: 100% !important;
  }
</style>
</head>
<body>
<div class="embed-container"><div id="player"></div></div>
<script>
  var player;
  var playTimeTimer = null;
  var BRIDGE_SCHEME = __BRIDGE_SCHEME__;
  var STATE_ORDINALS = __STATE_ORDINALS__;
  var QUALITY_TOKENS = __QUALITY_TOKENS__;
  var PLAY_TIME_INTERVAL_MS = __PLAY_TIME_INTERVAL_MS__;
  var PLAYING_CODE = __PLAYING_CODE__;

  function notifyBridge(event, params) {
    var query = "";
    if (params) {
      query = "?" + Object.keys(params).map(function (key) {
        return encodeURIComponent(key) + "=" + encodeURIComponent(params[key]);
      }).join("&");
    }
    window.location.href = BRIDGE_SCHEME + "://" + event + query;
  }

  function reportVideoData() {
    if (!player || typeof player.getDuration !== "function") { return; }
    var playlist = player.getPlaylist() || [];
    var rates = player.getAvailablePlaybackRates() || [];
    var levels = player.getAvailableQualityLevels() || [];
    notifyBridge("onVideoData", {
      duration: player.getDuration(),
      playlist: playlist.join(","),
      playlistIndex: player.getPlaylistIndex(),
      playbackRates: rates.join(","),
      qualityLevels: levels.join(","),
      loadedFraction: player.getVideoLoadedFraction(),
      videoUrl: player.getVideoUrl() || "",
      embedCode: player.getVideoEmbedCode() || ""
    });
  }

  function stopPlayTimeUpdates() {
    if (playTimeTimer !== null) { clearInterval(playTimeTimer); playTimeTimer = null; }
  }

  function startPlayTimeUpdates() {
    stopPlayTimeUpdates();
    playTimeTimer = setInterval(function () {
      notifyBridge("onPlayTime", { data: player.getCurrentTime() });
    }, PLAY_TIME_INTERVAL_MS);
  }

  function onReady(event) { notifyBridge("onReady"); }

  function onStateChange(event) {
    var code = String(event.data);
    var ordinal = STATE_ORDINALS.hasOwnProperty(code) ? STATE_ORDINALS[code] : "unknown";
    notifyBridge("onStateChange", { data: ordinal });
    if (event.data === PLAYING_CODE) { startPlayTimeUpdates(); } else { stopPlayTimeUpdates(); }
    setTimeout(reportVideoData, 0);
  }

  function onPlaybackQualityChange(event) {
    notifyBridge("onPlaybackQualityChange", { data: QUALITY_TOKENS.indexOf(event.data) });
  }

  function onPlaybackRateChange(event) { notifyBridge("onPlaybackRateChange", { data: event.data }); }

  function onPlayerError(event) { notifyBridge("onError", { data: event.data }); }

  function onApiChange(event) { notifyBridge("onApiChange"); }

  window.onYouTubeIframeAPIReady = function () {
    var params = __PLAYER_PARAMS__;
    params.events = {
      onReady: onReady,
      onStateChange: onStateChange,
      onPlaybackQualityChange: onPlaybackQualityChange,
      onPlaybackRateChange: onPlaybackRateChange,
      onError: onPlayerError,
      onApiChange: onApiChange
    };
    player = new YT.Player("player", params);
  };
</script>
<script src=__IFRAME_API_URL__ onerror="notifyBridge('onYouTubeIframeAPIFailedToLoad')"></script>
</body>
</html>
"#;

/// A validated, fully rendered player document.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDocument {
    pub html: String,
    pub origin: String,
    pub player_params: Value,
}

/// Validates the request and builds the top-level `YT.Player` parameters.
/// Fails closed: nothing is rendered for an invalid request.
pub fn player_params_for(request: &LoadRequest) -> Result<PlayerVars, LoadError> {
    let video_id = present("video id", request.video_id.as_deref())?;
    let playlist_id = present("playlist id", request.playlist_id.as_deref())?;
    let vars_playlist = request.player_vars.get("list").and_then(Value::as_str);

    let mut player_vars = request.player_vars.clone();
    let mut params = PlayerVars::new();
    match (video_id, playlist_id.or(vars_playlist)) {
        (Some(_), Some(_)) => return Err(LoadError::ConflictingSources),
        (None, None) => return Err(LoadError::MissingSource),
        (Some(video_id), None) => {
            params.insert("videoId".to_string(), json!(video_id));
        }
        (None, Some(playlist_id)) => {
            player_vars.insert("listType".to_string(), json!("playlist"));
            player_vars.insert("list".to_string(), json!(playlist_id));
        }
    }
    params.insert("playerVars".to_string(), Value::Object(player_vars));
    Ok(params)
}

fn present<'a>(field: &'static str, value: Option<&'a str>) -> Result<Option<&'a str>, LoadError> {
    match value {
        Some(id) if id.trim().is_empty() => Err(LoadError::EmptyId { field }),
        other => Ok(other),
    }
}

/// Applies the web view media settings to the player vars. An explicit
/// `playsinline` from the caller wins; requiring a user action always turns
/// autoplay off.
fn apply_webview_config(player_vars: &mut PlayerVars, webview: &WebViewConfig) {
    if !player_vars.contains_key("playsinline") {
        let inline = if webview.allows_inline_media_playback { 1 } else { 0 };
        player_vars.insert("playsinline".to_string(), json!(inline));
    }
    if webview.requires_user_action_for_playback {
        if let Some(autoplay) = player_vars.insert("autoplay".to_string(), json!(0)) {
            if autoplay != json!(0) {
                log::debug!("Document: autoplay {} disabled, playback needs a user action", autoplay);
            }
        }
    }
}

/// Renders the document around caller-supplied top-level player parameters.
pub fn render_document(
    additional_params: PlayerVars,
    default_origin: &str,
    play_time_interval_ms: u64,
    webview: &WebViewConfig,
) -> Result<PlayerDocument, LoadError> {
    let mut params = PlayerVars::new();
    params.insert("width".to_string(), json!("100%"));
    params.insert("height".to_string(), json!("100%"));
    params.extend(additional_params);

    // playerVars.origin decides the document origin; fill it in when missing.
    let mut player_vars = match params.remove("playerVars") {
        Some(Value::Object(vars)) => vars,
        Some(other) => {
            log::warn!("Document: ignoring non-object playerVars {}", other);
            PlayerVars::new()
        }
        None => PlayerVars::new(),
    };
    let origin = match player_vars.get("origin").and_then(Value::as_str) {
        Some(origin) if !origin.trim().is_empty() => origin.to_string(),
        _ => {
            player_vars.insert("origin".to_string(), json!(default_origin));
            default_origin.to_string()
        }
    };
    apply_webview_config(&mut player_vars, webview);
    params.insert("playerVars".to_string(), Value::Object(player_vars));
    let player_params = Value::Object(params);

    let state_ordinals: serde_json::Map<String, Value> = PlayerState::ALL
        .iter()
        .filter_map(|state| state.iframe_code().map(|code| (code.to_string(), json!(state.ordinal()))))
        .collect();
    let quality_tokens: Vec<&str> = PlaybackQuality::ALL.iter().map(|q| q.token()).collect();
    let playing_code = PlayerState::Playing.iframe_code().unwrap_or(1);

    let html = PLAYER_TEMPLATE
        .replace("__BRIDGE_SCHEME__", &script_literal(&json!(BRIDGE_SCHEME))?)
        .replace("__STATE_ORDINALS__", &script_literal(&Value::Object(state_ordinals))?)
        .replace("__QUALITY_TOKENS__", &script_literal(&json!(quality_tokens))?)
        .replace("__PLAY_TIME_INTERVAL_MS__", &play_time_interval_ms.max(1).to_string())
        .replace("__PLAYING_CODE__", &playing_code.to_string())
        .replace("__IFRAME_API_URL__", &script_literal(&json!(IFRAME_API_URL))?)
        .replace("__PLAYER_PARAMS__", &script_literal(&player_params)?);

    Ok(PlayerDocument {
        html,
        origin,
        player_params,
    })
}
