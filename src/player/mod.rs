pub mod codec;
pub mod config;
pub mod controller;
pub mod delegate;
pub mod dispatcher;
pub mod document;
pub mod errors;
pub mod interceptor;
pub mod readiness;
pub mod runtime;
pub mod surface;
#[cfg(feature = "tauri")]
pub mod tauri_surface;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use config::{BridgeConfig, WebViewConfig};
pub use controller::{PlaybackSnapshot, PlayerBridge};
pub use delegate::{DelegateStatus, PlayerDelegate, StatusBoard};
pub use dispatcher::PlayerCommand;
pub use errors::{BridgeThreadError, CommandError, ConfigError, DecodeError, LoadError, SurfaceError};
pub use readiness::ReadinessState;
pub use surface::{EmbeddedSurface, NavigationPolicy, Placeholder, ScriptSink, SurfaceFactory, SurfaceToken};
pub use types::{LoadRequest, PlaybackQuality, PlayerError, PlayerState, PlayerVars, PlaylistSource};
