use thiserror::Error;

use super::readiness::ReadinessState;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Either a video id or a playlist id must be supplied")]
    MissingSource,
    #[error("A video id and a playlist id cannot both be supplied")]
    ConflictingSources,
    #[error("The {field} must not be empty")]
    EmptyId { field: &'static str },
    #[error("Player already loaded (readiness: {0:?}); tear it down before loading again")]
    AlreadyLoaded(ReadinessState),
    #[error("Failed to serialize player parameters: {0}")]
    ParamsSerialization(#[from] serde_json::Error),
    #[error("Embedded surface failed during load: {0}")]
    Surface(#[from] SurfaceError),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Player is not ready (readiness: {0:?}); command skipped")]
    NotReady(ReadinessState),
    #[error("Failed to encode command arguments for '{function}': {source}")]
    Encode {
        function: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Script evaluation failed: {0}")]
    Surface(#[from] SurfaceError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Embedded surface is detached")]
    Detached,
    #[error("Failed to create embedded surface: {0}")]
    Creation(String),
    #[error("Failed to load player document: {0}")]
    DocumentLoad(String),
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Failed to open '{url}' externally: {reason}")]
    ExternalOpen { url: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Notification url '{0}' is not a bridge url")]
    NotBridgeUrl(String),
    #[error("Notification url '{0}' carries no event name")]
    MissingEvent(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse bridge config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("playTimeIntervalMs must be greater than zero")]
    InvalidPlayTimeInterval,
    #[error("origin must not be empty")]
    EmptyOrigin,
}

#[derive(Error, Debug)]
pub enum BridgeThreadError {
    #[error("Bridge command send error: {0}")]
    CommandSend(String),
    #[error("Bridge thread dropped the reply channel")]
    ReplyDropped(#[from] tokio::sync::oneshot::error::RecvError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl From<tokio::sync::mpsc::error::SendError<crate::player::runtime::commands::BridgeThreadCommand>>
    for BridgeThreadError
{
    fn from(
        err: tokio::sync::mpsc::error::SendError<crate::player::runtime::commands::BridgeThreadCommand>,
    ) -> Self {
        BridgeThreadError::CommandSend(err.to_string())
    }
}

// Hosts exposing the bridge over string-typed IPC want plain messages.
impl From<LoadError> for String {
    fn from(err: LoadError) -> String {
        err.to_string()
    }
}
impl From<CommandError> for String {
    fn from(err: CommandError) -> String {
        err.to_string()
    }
}
impl From<BridgeThreadError> for String {
    fn from(err: BridgeThreadError) -> String {
        err.to_string()
    }
}
