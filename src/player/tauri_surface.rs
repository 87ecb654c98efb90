//! Tauri webview windows as player surfaces.
//!
//! Register the plugin from [`init`] together with `tauri_plugin_opener::init()`,
//! then build a [`TauriSurfaceFactory`] and hand it to `spawn_bridge_thread`.

use std::collections::HashMap;
use std::sync::Mutex;

use tauri::http::{Response, StatusCode, header};
use tauri::plugin::{Builder as PluginBuilder, TauriPlugin};
use tauri::{AppHandle, Manager, Runtime, Url, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tauri_plugin_opener::OpenerExt;

use super::config::{DOCUMENT_SCHEME, WebViewConfig};
use super::errors::SurfaceError;
use super::interceptor::{NavigationAction, NavigationInterceptor};
use super::runtime::commands::NavigationForwarder;
use super::surface::{EmbeddedSurface, ScriptSink, SurfaceFactory, SurfaceToken};

const DOCUMENT_HOST: &str = "localhost";

// --- Document Protocol ---

/// Player documents waiting to be served, keyed by window label.
#[derive(Default)]
pub struct DocumentStore {
    documents: Mutex<HashMap<String, String>>,
}

impl DocumentStore {
    fn insert(&self, label: &str, html: &str) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(label.to_string(), html.to_string());
        }
    }

    fn get(&self, label: &str) -> Option<String> {
        self.documents.lock().ok()?.get(label).cloned()
    }

    fn remove(&self, label: &str) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.remove(label);
        }
    }
}

/// Serves player documents over the `ytembed` scheme.
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    PluginBuilder::new("yt-player-bridge")
        .setup(|app, _api| {
            app.manage(DocumentStore::default());
            Ok(())
        })
        .register_uri_scheme_protocol(DOCUMENT_SCHEME, |ctx, request| {
            let label = request.uri().path().trim_start_matches('/').to_string();
            let document = ctx
                .app_handle()
                .try_state::<DocumentStore>()
                .and_then(|store| store.get(&label));
            let (status, body) = match document {
                Some(html) => (StatusCode::OK, html.into_bytes()),
                None => {
                    log::warn!("Document Protocol: no player document for '{}'", label);
                    (StatusCode::NOT_FOUND, Vec::new())
                }
            };
            Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
                .body(body)
                .unwrap_or_else(|_| Response::new(Vec::new()))
        })
        .build()
}

fn document_url(label: &str) -> Result<Url, SurfaceError> {
    // WebView2 and the Android webview only accept custom schemes behind http://<scheme>.localhost.
    let raw = if cfg!(any(windows, target_os = "android")) {
        format!("http://{}.{}/{}", DOCUMENT_SCHEME, DOCUMENT_HOST, label)
    } else {
        format!("{}://{}/{}", DOCUMENT_SCHEME, DOCUMENT_HOST, label)
    };
    raw.parse()
        .map_err(|e| SurfaceError::DocumentLoad(format!("bad document url '{}': {}", raw, e)))
}

fn document_hosts() -> Vec<String> {
    vec![format!("{}.{}", DOCUMENT_SCHEME, DOCUMENT_HOST), DOCUMENT_HOST.to_string()]
}

// --- Surface Factory ---

pub struct TauriSurfaceFactory<R: Runtime> {
    app: AppHandle<R>,
    forwarder: NavigationForwarder,
    origin: String,
    label_prefix: String,
}

impl<R: Runtime> TauriSurfaceFactory<R> {
    /// `origin` should match the bridge config so in-player links stay in the window.
    pub fn new(app: AppHandle<R>, forwarder: NavigationForwarder, origin: &str) -> Self {
        Self {
            app,
            forwarder,
            origin: origin.to_string(),
            label_prefix: "yt-player".to_string(),
        }
    }

    pub fn with_label_prefix(mut self, prefix: &str) -> Self {
        self.label_prefix = prefix.to_string();
        self
    }
}

impl<R: Runtime> SurfaceFactory for TauriSurfaceFactory<R> {
    type Surface = TauriSurface<R>;

    fn create_surface(
        &mut self,
        token: SurfaceToken,
        config: &WebViewConfig,
    ) -> Result<TauriSurface<R>, SurfaceError> {
        let label = format!("{}-{}", self.label_prefix, token.get());
        log::info!("Tauri Surface: creating window '{}' ({:?})", label, config);

        let blank: Url = "about:blank"
            .parse()
            .map_err(|e| SurfaceError::Creation(format!("{}", e)))?;

        let mut interceptor = NavigationInterceptor::new(&self.origin);
        for host in document_hosts() {
            interceptor = interceptor.allow_host(&host);
        }
        let forwarder = self.forwarder.clone();

        let window = WebviewWindowBuilder::new(&self.app, label.clone(), WebviewUrl::External(blank))
            .title("YouTube Player")
            .on_navigation(move |url| match interceptor.classify(url.as_str()) {
                NavigationAction::Allow => true,
                NavigationAction::Notification | NavigationAction::OpenExternal => {
                    forwarder.forward(token, url.as_str());
                    false
                }
            })
            .build()
            .map_err(|e| SurfaceError::Creation(format!("{:?}", e)))?;

        Ok(TauriSurface {
            app: self.app.clone(),
            window: Some(window),
            label,
        })
    }
}

// --- Surface ---

pub struct TauriSurface<R: Runtime> {
    app: AppHandle<R>,
    window: Option<WebviewWindow<R>>,
    label: String,
}

impl<R: Runtime> TauriSurface<R> {
    fn window(&self) -> Result<&WebviewWindow<R>, SurfaceError> {
        self.window.as_ref().ok_or(SurfaceError::Detached)
    }
}

impl<R: Runtime> ScriptSink for TauriSurface<R> {
    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        self.window()?
            .eval(script)
            .map_err(|e| SurfaceError::Script(format!("{:?}", e)))
    }
}

impl<R: Runtime> EmbeddedSurface for TauriSurface<R> {
    fn load_document(&mut self, html: &str, base_url: &str) -> Result<(), SurfaceError> {
        let url = document_url(&self.label)?;
        log::debug!(
            "Tauri Surface: serving player document for '{}' at {} (player origin {})",
            self.label,
            url,
            base_url
        );
        let store = self
            .app
            .try_state::<DocumentStore>()
            .ok_or_else(|| SurfaceError::DocumentLoad("player bridge plugin is not registered".into()))?;
        store.insert(&self.label, html);
        self.window()?
            .navigate(url)
            .map_err(|e| SurfaceError::DocumentLoad(format!("{:?}", e)))
    }

    fn open_external(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| SurfaceError::ExternalOpen {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn detach(&mut self) {
        if let Some(store) = self.app.try_state::<DocumentStore>() {
            store.remove(&self.label);
        }
        if let Some(window) = self.window.take() {
            if let Err(e) = window.close() {
                log::error!("Tauri Surface: failed to close '{}': {:?}", self.label, e);
            }
        }
    }

    fn document_hosts(&self) -> Vec<String> {
        document_hosts()
    }
}
