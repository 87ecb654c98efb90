use std::fmt;

use super::config::WebViewConfig;
use super::errors::SurfaceError;

/// Anything that can evaluate a script in the player document.
pub trait ScriptSink {
    /// Fire-and-forget: the result of the script itself is never awaited.
    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError>;
}

/// The hosted web view running the IFrame player.
///
/// Outgoing navigation is not pulled from the surface; the host forwards each
/// attempt to `PlayerBridge::handle_navigation` together with the surface's token.
pub trait EmbeddedSurface: ScriptSink {
    fn load_document(&mut self, html: &str, base_url: &str) -> Result<(), SurfaceError>;

    /// Hands a url to the host shell (system browser, app links).
    fn open_external(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Releases the view. No navigation may be reported after this returns.
    fn detach(&mut self);

    /// Extra hosts that serve the player document itself and must never be opened externally.
    fn document_hosts(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Creates a fresh surface for every initial load.
pub trait SurfaceFactory {
    type Surface: EmbeddedSurface;

    fn create_surface(
        &mut self,
        token: SurfaceToken,
        config: &WebViewConfig,
    ) -> Result<Self::Surface, SurfaceError>;
}

/// Identifies one surface instance. Navigations carrying a stale token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceToken(u64);

impl SurfaceToken {
    pub fn new(raw: u64) -> Self {
        SurfaceToken(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        SurfaceToken(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SurfaceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// What the host should do with a navigation it forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

impl NavigationPolicy {
    pub fn is_allowed(self) -> bool {
        self == NavigationPolicy::Allow
    }
}

/// Host views shown in place of the player while it is not up yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    BeforeLoading,
    InitialLoading,
}
