use tokio::sync::{mpsc, oneshot};

use crate::player::controller::PlaybackSnapshot;
use crate::player::dispatcher::PlayerCommand;
use crate::player::errors::{BridgeThreadError, CommandError, LoadError};
use crate::player::surface::SurfaceToken;
use crate::player::types::{LoadRequest, PlaybackQuality, PlayerVars};

// --- Bridge Thread Commands ---
#[derive(Debug)]
pub enum BridgeThreadCommand {
    LoadPlayer {
        request: LoadRequest,
        reply: oneshot::Sender<Result<(), LoadError>>,
    },
    LoadPlayerWithParams {
        params: PlayerVars,
        reply: oneshot::Sender<Result<(), LoadError>>,
    },
    Command {
        command: PlayerCommand,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    Teardown(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// A navigation the host already cancelled, waiting to be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedNavigation {
    pub token: SurfaceToken,
    pub url: String,
}

/// Receiving ends owned by the bridge thread.
pub struct BridgeReceivers {
    pub commands: mpsc::Receiver<BridgeThreadCommand>,
    // Unbounded; notifications are never dropped.
    pub navigations: mpsc::UnboundedReceiver<ForwardedNavigation>,
}

// --- Handles ---

/// Cloneable front door to a bridge thread. Every call waits for the thread's reply.
#[derive(Clone)]
pub struct BridgeHandle {
    sender: mpsc::Sender<BridgeThreadCommand>,
    navigations: mpsc::UnboundedSender<ForwardedNavigation>,
}

impl BridgeHandle {
    pub fn new(
        sender: mpsc::Sender<BridgeThreadCommand>,
        navigations: mpsc::UnboundedSender<ForwardedNavigation>,
    ) -> Self {
        Self { sender, navigations }
    }

    pub fn navigation_forwarder(&self) -> NavigationForwarder {
        NavigationForwarder {
            sender: self.navigations.clone(),
        }
    }

    pub async fn load_player(&self, request: LoadRequest) -> Result<(), BridgeThreadError> {
        log::info!("CMD: Load player (video: {:?}, playlist: {:?})", request.video_id, request.playlist_id);
        let (reply, response) = oneshot::channel();
        self.sender
            .send(BridgeThreadCommand::LoadPlayer { request, reply })
            .await?;
        response.await??;
        Ok(())
    }

    pub async fn load_player_with_params(&self, params: PlayerVars) -> Result<(), BridgeThreadError> {
        log::info!("CMD: Load player with raw params");
        let (reply, response) = oneshot::channel();
        self.sender
            .send(BridgeThreadCommand::LoadPlayerWithParams { params, reply })
            .await?;
        response.await??;
        Ok(())
    }

    pub async fn send_command(&self, command: PlayerCommand) -> Result<(), BridgeThreadError> {
        log::debug!("CMD: {}", command.function_name());
        let (reply, response) = oneshot::channel();
        self.sender
            .send(BridgeThreadCommand::Command { command, reply })
            .await
            .map_err(|e| {
                log::error!("Failed to send player command: {}", e);
                BridgeThreadError::from(e)
            })?;
        response.await??;
        Ok(())
    }

    pub async fn play_video(&self) -> Result<(), BridgeThreadError> {
        self.send_command(PlayerCommand::Play).await
    }

    pub async fn pause_video(&self) -> Result<(), BridgeThreadError> {
        self.send_command(PlayerCommand::Pause).await
    }

    pub async fn stop_video(&self) -> Result<(), BridgeThreadError> {
        self.send_command(PlayerCommand::Stop).await
    }

    pub async fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) -> Result<(), BridgeThreadError> {
        self.send_command(PlayerCommand::SeekTo {
            seconds,
            allow_seek_ahead,
        })
        .await
    }

    pub async fn set_playback_quality(&self, quality: PlaybackQuality) -> Result<(), BridgeThreadError> {
        self.send_command(PlayerCommand::SetPlaybackQuality(quality)).await
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, BridgeThreadError> {
        let (reply, response) = oneshot::channel();
        self.sender.send(BridgeThreadCommand::Snapshot(reply)).await?;
        Ok(response.await?)
    }

    pub async fn teardown(&self) -> Result<(), BridgeThreadError> {
        log::info!("CMD: Tear down player");
        let (reply, response) = oneshot::channel();
        self.sender.send(BridgeThreadCommand::Teardown(reply)).await?;
        Ok(response.await?)
    }

    /// Stops the bridge thread after tearing down the player.
    pub async fn shutdown(&self) -> Result<(), BridgeThreadError> {
        log::info!("CMD: Shut down bridge thread");
        let (reply, response) = oneshot::channel();
        self.sender.send(BridgeThreadCommand::Shutdown(reply)).await?;
        Ok(response.await?)
    }
}

/// Passes navigations from webview callbacks to the bridge thread without blocking.
/// Delivery only fails once the bridge thread has stopped.
#[derive(Clone)]
pub struct NavigationForwarder {
    sender: mpsc::UnboundedSender<ForwardedNavigation>,
}

impl NavigationForwarder {
    pub fn forward(&self, token: SurfaceToken, url: &str) {
        let navigation = ForwardedNavigation {
            token,
            url: url.to_string(),
        };
        if self.sender.send(navigation).is_err() {
            log::warn!("Navigation from {} arrived after the bridge thread stopped: {}", token, url);
        }
    }
}
