use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::player::config::{BRIDGE_CHANNEL_CAPACITY, BridgeConfig, LOADING_TIMEOUT_CHECK_INTERVAL_MS};
use crate::player::controller::PlayerBridge;
use crate::player::delegate::PlayerDelegate;
use crate::player::surface::SurfaceFactory;

pub mod commands;
use commands::{BridgeHandle, BridgeReceivers, BridgeThreadCommand, ForwardedNavigation};

pub fn bridge_channel() -> (BridgeHandle, BridgeReceivers) {
    let (sender, commands) = mpsc::channel::<BridgeThreadCommand>(BRIDGE_CHANNEL_CAPACITY);
    let (navigation_sender, navigations) = mpsc::unbounded_channel::<ForwardedNavigation>();
    (
        BridgeHandle::new(sender, navigation_sender),
        BridgeReceivers { commands, navigations },
    )
}

/// Runs a [`PlayerBridge`] on its own thread. The surface never leaves that thread.
pub fn spawn_bridge_thread<F, D>(
    factory: F,
    delegate: D,
    receivers: BridgeReceivers,
    config: BridgeConfig,
) -> std::io::Result<JoinHandle<()>>
where
    F: SurfaceFactory + Send + 'static,
    D: PlayerDelegate + Send + 'static,
{
    std::thread::Builder::new()
        .name("player-bridge".to_string())
        .spawn(move || run_bridge_thread(factory, delegate, receivers, config))
}

// --- Bridge Thread Implementation ---

pub fn run_bridge_thread<F, D>(
    factory: F,
    delegate: D,
    receivers: BridgeReceivers,
    config: BridgeConfig,
) where
    F: SurfaceFactory,
    D: PlayerDelegate + 'static,
{
    log::info!("Bridge Thread: Starting...");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Bridge Thread: Failed to build Tokio runtime: {}", e);
            return;
        }
    };

    let BridgeReceivers {
        commands: mut receiver,
        mut navigations,
    } = receivers;

    rt.block_on(async move {
        let mut bridge = PlayerBridge::with_config(factory, config);
        bridge.set_delegate(delegate);

        log::info!("Bridge thread entering main loop.");
        let mut should_shutdown = false;
        let mut navigations_open = true;
        let mut timeout_check_interval =
            tokio::time::interval(Duration::from_millis(LOADING_TIMEOUT_CHECK_INTERVAL_MS));

        while !should_shutdown {
            // Notifications go first so a command never overtakes an earlier onReady.
            tokio::select! {
                biased;

                maybe_navigation = navigations.recv(), if navigations_open => {
                    match maybe_navigation {
                        Some(ForwardedNavigation { token, url }) => {
                            bridge.handle_navigation(token, &url);
                        }
                        None => {
                            log::debug!("Bridge Thread: Navigation channel closed.");
                            navigations_open = false;
                        }
                    }
                }
                maybe_command = receiver.recv() => {
                    match maybe_command {
                        Some(command) => {
                            should_shutdown = handle_command(&mut bridge, command);
                        }
                        None => {
                            log::info!("Bridge Thread: Command channel closed. Exiting loop.");
                            should_shutdown = true;
                        }
                    }
                }
                _ = timeout_check_interval.tick(), if !should_shutdown => {
                    bridge.poll_loading_timeout(Instant::now());
                }
            }
        }
        bridge.teardown();
        log::info!("Bridge thread loop finished.");
    });
    log::info!("Bridge thread has stopped.");
}

/// Returns true once the thread should stop.
fn handle_command<F: SurfaceFactory>(bridge: &mut PlayerBridge<F>, command: BridgeThreadCommand) -> bool {
    match command {
        BridgeThreadCommand::LoadPlayer { request, reply } => {
            if reply.send(bridge.load_player(request)).is_err() {
                log::warn!("Bridge Thread: LoadPlayer caller went away before the reply.");
            }
        }
        BridgeThreadCommand::LoadPlayerWithParams { params, reply } => {
            if reply.send(bridge.load_player_with_params(params)).is_err() {
                log::warn!("Bridge Thread: LoadPlayerWithParams caller went away before the reply.");
            }
        }
        BridgeThreadCommand::Command { command, reply } => {
            if reply.send(bridge.send_command(command)).is_err() {
                log::warn!("Bridge Thread: command caller went away before the reply.");
            }
        }
        BridgeThreadCommand::Snapshot(reply) => {
            if reply.send(bridge.snapshot()).is_err() {
                log::warn!("Bridge Thread: Snapshot caller went away before the reply.");
            }
        }
        BridgeThreadCommand::Teardown(reply) => {
            bridge.teardown();
            if reply.send(()).is_err() {
                log::warn!("Bridge Thread: Teardown caller went away before the reply.");
            }
        }
        BridgeThreadCommand::Shutdown(shutdown_complete_tx) => {
            log::info!("Bridge Thread: Shutdown received. Tearing down player.");
            bridge.teardown();
            if shutdown_complete_tx.send(()).is_err() {
                log::error!("Bridge Thread: Failed to send shutdown completion signal.");
            }
            return true;
        }
    }
    false
}
