pub mod player;

pub use player::runtime::commands::{BridgeHandle, BridgeReceivers, NavigationForwarder};
pub use player::runtime::{bridge_channel, spawn_bridge_thread};
pub use player::*;

/// Installs the env_logger backend. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
