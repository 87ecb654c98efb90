//! Translation between the player's two encodings and the native vocabulary.
//!
//! Inbound, the glue script reports events by navigating to
//! `ytplayer://<event>?data=<value>`. Outbound, commands become a single
//! `player.<function>(<json>, ...);` expression for the surface to evaluate.

use serde_json::Value;

use super::config::{BRIDGE_SCHEME, PLAYER_OBJECT};
use super::errors::DecodeError;
use super::types::{PlaybackQuality, PlayerError, PlayerState};

// --- Event Names ---
pub const EVENT_READY: &str = "onReady";
pub const EVENT_STATE_CHANGE: &str = "onStateChange";
pub const EVENT_QUALITY_CHANGE: &str = "onPlaybackQualityChange";
pub const EVENT_ERROR: &str = "onError";
pub const EVENT_PLAY_TIME: &str = "onPlayTime";
pub const EVENT_API_CHANGE: &str = "onApiChange";
pub const EVENT_RATE_CHANGE: &str = "onPlaybackRateChange";
pub const EVENT_VIDEO_DATA: &str = "onVideoData";
pub const EVENT_API_FAILED_TO_LOAD: &str = "onYouTubeIframeAPIFailedToLoad";

/// A decoded notification. Built per intercepted navigation and consumed immediately.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMessage {
    Ready,
    StateChange(PlayerState),
    QualityChange(PlaybackQuality),
    Error(PlayerError),
    TimeUpdate(f64),
    ApiChange,
    PlaybackRateChange(f64),
    VideoData(VideoData),
    IframeApiFailedToLoad,
    /// An event this side does not know, or a value it could not read. Still forwarded.
    Unrecognized { event: String, data: Option<String> },
}

/// Video details the glue script reports after each state change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoData {
    pub duration: Option<f64>,
    pub playlist: Option<Vec<String>>,
    pub playlist_index: Option<i64>,
    pub available_playback_rates: Option<Vec<f64>>,
    pub available_quality_levels: Option<Vec<PlaybackQuality>>,
    pub loaded_fraction: Option<f64>,
    pub video_url: Option<String>,
    pub embed_code: Option<String>,
}

struct Notification {
    event: String,
    params: Vec<(String, String)>,
}

impl Notification {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn data(&self) -> Option<&str> {
        self.param("data")
    }
}

fn split_notification_url(url: &str) -> Result<Notification, DecodeError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| DecodeError::NotBridgeUrl(url.to_string()))?;
    if !scheme.eq_ignore_ascii_case(BRIDGE_SCHEME) {
        return Err(DecodeError::NotBridgeUrl(url.to_string()));
    }

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };
    let query = query.split('#').next().unwrap_or_default();
    let event = path.trim_matches('/').split('/').next().unwrap_or_default();
    if event.is_empty() {
        return Err(DecodeError::MissingEvent(url.to_string()));
    }

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(name), percent_decode(value))
        })
        .collect();

    Ok(Notification {
        event: percent_decode(event),
        params,
    })
}

fn percent_decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn parse_integer(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }
    // Some player builds report integral values as "2.0".
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed.fract() == 0.0 => Some(parsed as i64),
        _ => None,
    }
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

fn comma_list(value: Option<&str>) -> Option<Vec<&str>> {
    value.map(|joined| joined.split(',').map(str::trim).filter(|item| !item.is_empty()).collect())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}

fn unrecognized(event: &str, data: Option<&str>) -> BridgeMessage {
    log::warn!("Codec: forwarding unrecognized '{}' with value {:?}", event, data);
    BridgeMessage::Unrecognized {
        event: event.to_string(),
        data: data.map(str::to_string),
    }
}

/// Decodes a notification url. Unknown ordinals and error codes fall back to the
/// `Unknown` variants, and unknown events or unreadable numbers become
/// `Unrecognized`. Only urls that are not bridge notifications fail.
pub fn decode_notification(url: &str) -> Result<BridgeMessage, DecodeError> {
    let notification = split_notification_url(url)?;
    let data = notification.data();

    let message = match notification.event.as_str() {
        EVENT_READY => BridgeMessage::Ready,
        EVENT_STATE_CHANGE => {
            let state = match parse_integer(data) {
                Some(ordinal) => PlayerState::from_ordinal(ordinal),
                None => {
                    log::warn!("Codec: onStateChange with unparsable ordinal {:?}", data);
                    PlayerState::Unknown
                }
            };
            BridgeMessage::StateChange(state)
        }
        EVENT_QUALITY_CHANGE => {
            let quality = match parse_integer(data) {
                Some(ordinal) => PlaybackQuality::from_ordinal(ordinal),
                None => PlaybackQuality::from_token(data.unwrap_or_default().trim()),
            };
            BridgeMessage::QualityChange(quality)
        }
        EVENT_ERROR => {
            let error = match parse_integer(data) {
                Some(code) => PlayerError::from_code(code),
                None => {
                    log::warn!("Codec: onError with unparsable code {:?}", data);
                    PlayerError::Unknown
                }
            };
            BridgeMessage::Error(error)
        }
        EVENT_PLAY_TIME => match parse_seconds(data) {
            Some(seconds) => BridgeMessage::TimeUpdate(seconds),
            None => unrecognized(&notification.event, data),
        },
        EVENT_RATE_CHANGE => match parse_seconds(data) {
            Some(rate) => BridgeMessage::PlaybackRateChange(rate),
            None => unrecognized(&notification.event, data),
        },
        EVENT_API_CHANGE => BridgeMessage::ApiChange,
        EVENT_VIDEO_DATA => BridgeMessage::VideoData(VideoData {
            duration: parse_seconds(notification.param("duration")),
            playlist: comma_list(notification.param("playlist"))
                .map(|ids| ids.into_iter().map(str::to_string).collect()),
            playlist_index: parse_integer(notification.param("playlistIndex"))
                .filter(|index| *index >= 0),
            available_playback_rates: comma_list(notification.param("playbackRates"))
                .map(|rates| rates.into_iter().filter_map(|rate| parse_seconds(Some(rate))).collect()),
            available_quality_levels: comma_list(notification.param("qualityLevels"))
                .map(|levels| levels.into_iter().map(PlaybackQuality::from_token).collect()),
            loaded_fraction: parse_seconds(notification.param("loadedFraction"))
                .map(|fraction| fraction.clamp(0.0, 1.0)),
            video_url: non_empty(notification.param("videoUrl")),
            embed_code: non_empty(notification.param("embedCode")),
        }),
        EVENT_API_FAILED_TO_LOAD => BridgeMessage::IframeApiFailedToLoad,
        other => unrecognized(other, data),
    };
    Ok(message)
}

// --- Encoding ---

/// JSON text that is also safe inside a script body or an inline `<script>`.
pub fn script_literal(value: &Value) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
        .replace("</", "<\\/"))
}

/// Builds `player.<function>(<args>);` with every argument JSON-encoded.
/// `function` must come from the fixed command vocabulary, never from input.
pub fn encode_command(function: &str, args: &[Value]) -> Result<String, serde_json::Error> {
    let encoded = args
        .iter()
        .map(script_literal)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{}.{}({});", PLAYER_OBJECT, function, encoded.join(", ")))
}

/// Inverse of [`encode_command`], used to inspect recorded scripts.
pub fn decode_command_script(script: &str) -> Option<(String, Vec<Value>)> {
    let call = script.trim().strip_prefix(PLAYER_OBJECT)?.strip_prefix('.')?;
    let call = call.strip_suffix(';').unwrap_or(call);
    let (function, rest) = call.split_once('(')?;
    let inner = rest.strip_suffix(')')?;
    let args: Vec<Value> = serde_json::from_str(&format!("[{}]", inner)).ok()?;
    Some((function.to_string(), args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_ready_without_value() {
        assert_eq!(decode_notification("ytplayer://onReady"), Ok(BridgeMessage::Ready));
        assert_eq!(
            decode_notification("ytplayer://onReady?data=null"),
            Ok(BridgeMessage::Ready)
        );
    }

    #[test]
    fn state_change_ordinal_two_is_playing() {
        assert_eq!(
            decode_notification("ytplayer://onStateChange?data=2"),
            Ok(BridgeMessage::StateChange(PlayerState::Playing))
        );
    }

    #[test]
    fn out_of_range_and_garbage_states_degrade_to_unknown() {
        assert_eq!(
            decode_notification("ytplayer://onStateChange?data=99"),
            Ok(BridgeMessage::StateChange(PlayerState::Unknown))
        );
        assert_eq!(
            decode_notification("ytplayer://onStateChange?data=banana"),
            Ok(BridgeMessage::StateChange(PlayerState::Unknown))
        );
        assert_eq!(
            decode_notification("ytplayer://onStateChange"),
            Ok(BridgeMessage::StateChange(PlayerState::Unknown))
        );
    }

    #[test]
    fn quality_accepts_ordinals_and_tokens() {
        assert_eq!(
            decode_notification("ytplayer://onPlaybackQualityChange?data=3"),
            Ok(BridgeMessage::QualityChange(PlaybackQuality::HD720))
        );
        assert_eq!(
            decode_notification("ytplayer://onPlaybackQualityChange?data=hd1080"),
            Ok(BridgeMessage::QualityChange(PlaybackQuality::HD1080))
        );
        assert_eq!(
            decode_notification("ytplayer://onPlaybackQualityChange?data=17"),
            Ok(BridgeMessage::QualityChange(PlaybackQuality::Unknown))
        );
    }

    #[test]
    fn error_codes_collapse_through_decode() {
        let decode = |code: &str| decode_notification(&format!("ytplayer://onError?data={}", code));
        assert_eq!(decode("100"), Ok(BridgeMessage::Error(PlayerError::VideoNotFound)));
        assert_eq!(decode("105"), Ok(BridgeMessage::Error(PlayerError::VideoNotFound)));
        assert_eq!(decode("101"), Ok(BridgeMessage::Error(PlayerError::NotEmbeddable)));
        assert_eq!(decode("150"), Ok(BridgeMessage::Error(PlayerError::NotEmbeddable)));
        assert_eq!(decode("999"), Ok(BridgeMessage::Error(PlayerError::Unknown)));
        assert_eq!(decode("oops"), Ok(BridgeMessage::Error(PlayerError::Unknown)));
    }

    #[test]
    fn play_time_and_rate_are_numeric() {
        assert_eq!(
            decode_notification("ytplayer://onPlayTime?data=12.5"),
            Ok(BridgeMessage::TimeUpdate(12.5))
        );
        assert_eq!(
            decode_notification("ytplayer://onPlaybackRateChange?data=1.5"),
            Ok(BridgeMessage::PlaybackRateChange(1.5))
        );
        assert_eq!(
            decode_notification("ytplayer://onPlayTime?data=NaN"),
            Ok(BridgeMessage::Unrecognized {
                event: "onPlayTime".into(),
                data: Some("NaN".into()),
            })
        );
    }

    #[test]
    fn video_data_reads_every_field() {
        let message =
            decode_notification("ytplayer://onVideoData?duration=212.3&playlist=a1%2Cb2,c3&playlistIndex=1")
                .unwrap();
        assert_eq!(
            message,
            BridgeMessage::VideoData(VideoData {
                duration: Some(212.3),
                playlist: Some(vec!["a1".into(), "b2".into(), "c3".into()]),
                playlist_index: Some(1),
                ..VideoData::default()
            })
        );

        let empty = decode_notification("ytplayer://onVideoData?playlistIndex=-1").unwrap();
        assert_eq!(empty, BridgeMessage::VideoData(VideoData::default()));
    }

    #[test]
    fn video_data_carries_rates_levels_and_urls() {
        let url = "ytplayer://onVideoData?duration=60\
            &playbackRates=0.25,1,2\
            &qualityLevels=hd1080,large,auto\
            &loadedFraction=0.4\
            &videoUrl=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc\
            &embedCode=%3Ciframe%20src%3D%22x%22%3E%3C%2Fiframe%3E";
        let BridgeMessage::VideoData(data) = decode_notification(url).unwrap() else {
            panic!("expected video data");
        };
        assert_eq!(data.available_playback_rates, Some(vec![0.25, 1.0, 2.0]));
        assert_eq!(
            data.available_quality_levels,
            Some(vec![PlaybackQuality::HD1080, PlaybackQuality::Large, PlaybackQuality::Auto])
        );
        assert_eq!(data.loaded_fraction, Some(0.4));
        assert_eq!(data.video_url.as_deref(), Some("https://www.youtube.com/watch?v=abc"));
        assert_eq!(data.embed_code.as_deref(), Some("<iframe src=\"x\"></iframe>"));

        let blank = decode_notification("ytplayer://onVideoData?videoUrl=&embedCode=&playbackRates=").unwrap();
        let BridgeMessage::VideoData(blank) = blank else {
            panic!("expected video data");
        };
        assert_eq!(blank.video_url, None);
        assert_eq!(blank.embed_code, None);
        assert_eq!(blank.available_playback_rates, Some(Vec::new()));
    }

    #[test]
    fn unknown_events_are_kept_and_foreign_urls_rejected() {
        assert_eq!(
            decode_notification("ytplayer://onSomethingNew?data=1"),
            Ok(BridgeMessage::Unrecognized {
                event: "onSomethingNew".into(),
                data: Some("1".into()),
            })
        );
        assert!(matches!(
            decode_notification("https://www.youtube.com/watch?v=x"),
            Err(DecodeError::NotBridgeUrl(_))
        ));
        assert!(matches!(
            decode_notification("ytplayer://?data=1"),
            Err(DecodeError::MissingEvent(_))
        ));
    }

    #[test]
    fn scheme_match_is_case_insensitive() {
        assert_eq!(decode_notification("YTPlayer://onApiChange"), Ok(BridgeMessage::ApiChange));
    }

    #[test]
    fn encodes_positional_json_arguments() {
        let script = encode_command("seekTo", &[json!(42.5), json!(true)]).unwrap();
        assert_eq!(script, "player.seekTo(42.5, true);");
        assert_eq!(encode_command("playVideo", &[]).unwrap(), "player.playVideo();");
    }

    #[test]
    fn hostile_strings_round_trip_exactly() {
        let nasty = "a'b\"c\\d</script><script>alert(1)</script>\u{2028}\u{2029}\n);player.stopVideo(";
        let script = encode_command("cueVideoById", &[json!({ "videoId": nasty })]).unwrap();

        assert!(!script.contains("</script>"));
        assert!(!script.contains('\u{2028}'));
        assert!(script.starts_with("player.cueVideoById({"));
        assert!(script.ends_with("});"));

        let (function, args) = decode_command_script(&script).unwrap();
        assert_eq!(function, "cueVideoById");
        assert_eq!(args, vec![json!({ "videoId": nasty })]);
    }

    #[test]
    fn decode_command_script_rejects_foreign_scripts() {
        assert_eq!(decode_command_script("window.close();"), None);
        assert_eq!(decode_command_script("player.playVideo("), None);
    }
}
