use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters handed to the IFrame player untouched, e.g. `{"playsinline": 1}`.
pub type PlayerVars = serde_json::Map<String, serde_json::Value>;

// --- Player State ---

/// State of the current video as last reported by the player.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    #[default]
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Queued,
    Unknown,
}

impl PlayerState {
    pub const ALL: [PlayerState; 7] = [
        PlayerState::Unstarted,
        PlayerState::Ended,
        PlayerState::Playing,
        PlayerState::Paused,
        PlayerState::Buffering,
        PlayerState::Queued,
        PlayerState::Unknown,
    ];

    /// Out-of-range ordinals map to `Unknown`.
    pub fn from_ordinal(ordinal: i64) -> Self {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or(PlayerState::Unknown)
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Code the IFrame API uses for this state in `onStateChange`.
    pub fn iframe_code(self) -> Option<i64> {
        match self {
            PlayerState::Unstarted => Some(-1),
            PlayerState::Ended => Some(0),
            PlayerState::Playing => Some(1),
            PlayerState::Paused => Some(2),
            PlayerState::Buffering => Some(3),
            PlayerState::Queued => Some(5),
            PlayerState::Unknown => None,
        }
    }
}

// --- Playback Quality ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackQuality {
    Small,
    Medium,
    Large,
    #[serde(rename = "hd720")]
    HD720,
    #[serde(rename = "hd1080")]
    HD1080,
    HighRes,
    Auto,
    #[default]
    Default,
    Unknown,
}

impl PlaybackQuality {
    pub const ALL: [PlaybackQuality; 9] = [
        PlaybackQuality::Small,
        PlaybackQuality::Medium,
        PlaybackQuality::Large,
        PlaybackQuality::HD720,
        PlaybackQuality::HD1080,
        PlaybackQuality::HighRes,
        PlaybackQuality::Auto,
        PlaybackQuality::Default,
        PlaybackQuality::Unknown,
    ];

    pub fn from_ordinal(ordinal: i64) -> Self {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or(PlaybackQuality::Unknown)
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Token the IFrame API uses for `suggestedQuality` and quality events.
    pub fn token(self) -> &'static str {
        match self {
            PlaybackQuality::Small => "small",
            PlaybackQuality::Medium => "medium",
            PlaybackQuality::Large => "large",
            PlaybackQuality::HD720 => "hd720",
            PlaybackQuality::HD1080 => "hd1080",
            PlaybackQuality::HighRes => "highres",
            PlaybackQuality::Auto => "auto",
            PlaybackQuality::Default => "default",
            PlaybackQuality::Unknown => "unknown",
        }
    }

    pub fn from_token(token: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|quality| quality.token() == token)
            .unwrap_or(PlaybackQuality::Unknown)
    }
}

// --- Player Errors ---

/// Errors reported by the player. Several upstream codes collapse into one kind.
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PlayerError {
    #[error("The request contains an invalid parameter value")]
    InvalidParam,
    #[error("The requested content cannot be played in an HTML5 player")]
    HTML5Error,
    #[error("The requested video was not found")]
    VideoNotFound,
    #[error("The owner of the requested video does not allow embedded playback")]
    NotEmbeddable,
    #[error("Unknown player error")]
    Unknown,
}

impl PlayerError {
    /// Every code maps to some kind; unrecognized codes become `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => PlayerError::InvalidParam,
            5 => PlayerError::HTML5Error,
            100 | 105 => PlayerError::VideoNotFound,
            101 | 150 => PlayerError::NotEmbeddable,
            _ => PlayerError::Unknown,
        }
    }
}

// --- Load Requests ---

/// What the initial document should play. Exactly one source is expected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadRequest {
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
    pub player_vars: PlayerVars,
}

impl LoadRequest {
    pub fn video(video_id: impl Into<String>) -> Self {
        LoadRequest {
            video_id: Some(video_id.into()),
            ..Default::default()
        }
    }

    pub fn playlist(playlist_id: impl Into<String>) -> Self {
        LoadRequest {
            playlist_id: Some(playlist_id.into()),
            ..Default::default()
        }
    }

    pub fn with_player_vars(mut self, player_vars: PlayerVars) -> Self {
        self.player_vars = player_vars;
        self
    }
}

/// Playlist to queue: either a YouTube playlist or an ad-hoc list of videos.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistSource {
    PlaylistId(String),
    VideoIds(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ordinals_follow_declaration_order() {
        assert_eq!(PlayerState::from_ordinal(0), PlayerState::Unstarted);
        assert_eq!(PlayerState::from_ordinal(2), PlayerState::Playing);
        assert_eq!(PlayerState::from_ordinal(5), PlayerState::Queued);
        for state in PlayerState::ALL {
            assert_eq!(PlayerState::from_ordinal(state.ordinal() as i64), state);
        }
    }

    #[test]
    fn out_of_range_state_ordinals_are_unknown() {
        assert_eq!(PlayerState::from_ordinal(99), PlayerState::Unknown);
        assert_eq!(PlayerState::from_ordinal(-1), PlayerState::Unknown);
    }

    #[test]
    fn quality_tokens_resolve_both_ways() {
        assert_eq!(PlaybackQuality::from_token("hd720"), PlaybackQuality::HD720);
        assert_eq!(PlaybackQuality::HighRes.token(), "highres");
        assert_eq!(PlaybackQuality::from_token("hd4320"), PlaybackQuality::Unknown);
        assert_eq!(PlaybackQuality::from_ordinal(42), PlaybackQuality::Unknown);
    }

    #[test]
    fn error_codes_collapse() {
        assert_eq!(PlayerError::from_code(2), PlayerError::InvalidParam);
        assert_eq!(PlayerError::from_code(5), PlayerError::HTML5Error);
        assert_eq!(PlayerError::from_code(100), PlayerError::VideoNotFound);
        assert_eq!(PlayerError::from_code(105), PlayerError::VideoNotFound);
        assert_eq!(PlayerError::from_code(101), PlayerError::NotEmbeddable);
        assert_eq!(PlayerError::from_code(150), PlayerError::NotEmbeddable);
        assert_eq!(PlayerError::from_code(999), PlayerError::Unknown);
        assert_eq!(PlayerError::from_code(-3), PlayerError::Unknown);
    }
}
