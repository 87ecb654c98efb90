use serde_json::{Map, Value, json};

use super::codec::encode_command;
use super::errors::CommandError;
use super::readiness::ReadinessState;
use super::surface::ScriptSink;
use super::types::{PlaybackQuality, PlaylistSource};

// --- Player Commands ---

/// Every playback control the bridge can send once the player is ready.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    SeekTo {
        seconds: f64,
        allow_seek_ahead: bool,
    },
    CueVideoById {
        video_id: String,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    },
    LoadVideoById {
        video_id: String,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    },
    CueVideoByUrl {
        video_url: String,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    },
    LoadVideoByUrl {
        video_url: String,
        start_seconds: f64,
        end_seconds: Option<f64>,
        quality: PlaybackQuality,
    },
    CuePlaylist {
        playlist: PlaylistSource,
        index: i64,
        start_seconds: f64,
        quality: PlaybackQuality,
    },
    LoadPlaylist {
        playlist: PlaylistSource,
        index: i64,
        start_seconds: f64,
        quality: PlaybackQuality,
    },
    NextVideo,
    PreviousVideo,
    PlayVideoAt(i64),
    SetPlaybackRate(f64),
    SetLoop(bool),
    SetShuffle(bool),
    SetPlaybackQuality(PlaybackQuality),
}

impl PlayerCommand {
    /// Name of the IFrame API function this command invokes.
    pub fn function_name(&self) -> &'static str {
        match self {
            PlayerCommand::Play => "playVideo",
            PlayerCommand::Pause => "pauseVideo",
            PlayerCommand::Stop => "stopVideo",
            PlayerCommand::SeekTo { .. } => "seekTo",
            PlayerCommand::CueVideoById { .. } => "cueVideoById",
            PlayerCommand::LoadVideoById { .. } => "loadVideoById",
            PlayerCommand::CueVideoByUrl { .. } => "cueVideoByUrl",
            PlayerCommand::LoadVideoByUrl { .. } => "loadVideoByUrl",
            PlayerCommand::CuePlaylist { .. } => "cuePlaylist",
            PlayerCommand::LoadPlaylist { .. } => "loadPlaylist",
            PlayerCommand::NextVideo => "nextVideo",
            PlayerCommand::PreviousVideo => "previousVideo",
            PlayerCommand::PlayVideoAt(_) => "playVideoAt",
            PlayerCommand::SetPlaybackRate(_) => "setPlaybackRate",
            PlayerCommand::SetLoop(_) => "setLoop",
            PlayerCommand::SetShuffle(_) => "setShuffle",
            PlayerCommand::SetPlaybackQuality(_) => "setPlaybackQuality",
        }
    }

    /// Positional arguments for the call. Numbers pass through unclamped.
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            PlayerCommand::Play
            | PlayerCommand::Pause
            | PlayerCommand::Stop
            | PlayerCommand::NextVideo
            | PlayerCommand::PreviousVideo => Vec::new(),
            PlayerCommand::SeekTo {
                seconds,
                allow_seek_ahead,
            } => vec![json!(seconds), json!(allow_seek_ahead)],
            PlayerCommand::CueVideoById {
                video_id,
                start_seconds,
                end_seconds,
                quality,
            }
            | PlayerCommand::LoadVideoById {
                video_id,
                start_seconds,
                end_seconds,
                quality,
            } => vec![video_object("videoId", video_id, *start_seconds, *end_seconds, *quality)],
            PlayerCommand::CueVideoByUrl {
                video_url,
                start_seconds,
                end_seconds,
                quality,
            }
            | PlayerCommand::LoadVideoByUrl {
                video_url,
                start_seconds,
                end_seconds,
                quality,
            } => vec![video_object(
                "mediaContentUrl",
                video_url,
                *start_seconds,
                *end_seconds,
                *quality,
            )],
            PlayerCommand::CuePlaylist {
                playlist,
                index,
                start_seconds,
                quality,
            }
            | PlayerCommand::LoadPlaylist {
                playlist,
                index,
                start_seconds,
                quality,
            } => playlist_arguments(playlist, *index, *start_seconds, *quality),
            PlayerCommand::PlayVideoAt(index) => vec![json!(index)],
            PlayerCommand::SetPlaybackRate(rate) => vec![json!(rate)],
            PlayerCommand::SetLoop(enabled) | PlayerCommand::SetShuffle(enabled) => {
                vec![json!(enabled)]
            }
            PlayerCommand::SetPlaybackQuality(quality) => vec![json!(quality.token())],
        }
    }
}

fn video_object(
    key: &str,
    source: &str,
    start_seconds: f64,
    end_seconds: Option<f64>,
    quality: PlaybackQuality,
) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), json!(source));
    object.insert("startSeconds".to_string(), json!(start_seconds));
    if let Some(end) = end_seconds {
        object.insert("endSeconds".to_string(), json!(end));
    }
    object.insert("suggestedQuality".to_string(), json!(quality.token()));
    Value::Object(object)
}

fn playlist_arguments(
    playlist: &PlaylistSource,
    index: i64,
    start_seconds: f64,
    quality: PlaybackQuality,
) -> Vec<Value> {
    match playlist {
        PlaylistSource::PlaylistId(list) => vec![json!({
            "list": list,
            "listType": "playlist",
            "index": index,
            "startSeconds": start_seconds,
            "suggestedQuality": quality.token(),
        })],
        PlaylistSource::VideoIds(ids) => vec![
            json!(ids),
            json!(index),
            json!(start_seconds),
            json!(quality.token()),
        ],
    }
}

// --- Dispatcher ---

/// Gates commands on readiness and turns each into exactly one script evaluation.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    dispatched: u64,
    skipped: u64,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch<S: ScriptSink + ?Sized>(
        &mut self,
        readiness: ReadinessState,
        sink: &mut S,
        command: &PlayerCommand,
    ) -> Result<(), CommandError> {
        let function = command.function_name();
        if readiness != ReadinessState::Ready {
            self.skipped += 1;
            log::debug!(
                "Dispatcher: skipping '{}' while {:?}",
                function,
                readiness
            );
            return Err(CommandError::NotReady(readiness));
        }

        let script = encode_command(function, &command.arguments())
            .map_err(|source| CommandError::Encode { function, source })?;
        log::debug!("Dispatcher: evaluating {}", script);
        sink.evaluate_script(&script).map_err(|e| {
            log::error!("Dispatcher: '{}' failed to evaluate: {}", function, e);
            CommandError::from(e)
        })?;
        self.dispatched += 1;
        Ok(())
    }

    pub fn dispatched_count(&self) -> u64 {
        self.dispatched
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }
}
