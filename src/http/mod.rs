//! HTTP server: wiring and lifecycle.
//!
//! The server owns the rotation controller and the response cache, the only
//! state mutated during concurrent request handling. The registry and the
//! template store are read-only once [`Server::new`] has returned.

mod handlers;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::render::{RenderOptions, Renderer};
use crate::rotation::RotationController;

/// Shared state available to every request handler.
#[derive(Debug)]
pub struct AppState {
    /// Registry, template store and serving options
    pub config: Config,
    /// Per-server rotation state
    pub rotation: RotationController,
    /// Short-lived rendered-response cache
    pub cache: ResponseCache,
    /// Compiled renderer
    pub renderer: Renderer,
}

/// The HTTP server.
///
/// Constructed from a validated configuration, started with [`Server::start`]
/// and stopped with [`Server::stop`], which lets in-flight requests finish
/// within a bounded grace period.
#[derive(Debug)]
pub struct Server {
    state: Arc<AppState>,
    shutdown_tx: watch::Sender<bool>,
    done_tx: watch::Sender<bool>,
}

impl Server {
    /// Create a server from the given configuration.
    ///
    /// Fails fast on configuration problems: an empty template set, an
    /// unknown default template or a malformed override format template.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let available = config
            .templates
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let rotation = RotationController::new(
            config.rotation_mode,
            config.template_name.clone(),
            available,
        )?;

        let renderer = Renderer::new(RenderOptions {
            minify_html: !config.disable_minification,
            json_override: config.json_format.clone(),
            xml_override: config.xml_format.clone(),
        })?;

        let (shutdown_tx, _) = watch::channel(false);
        let (done_tx, _) = watch::channel(false);

        Ok(Self {
            state: Arc::new(AppState {
                config,
                rotation,
                cache: ResponseCache::default(),
                renderer,
            }),
            shutdown_tx,
            done_tx,
        })
    }

    /// The router served by this instance, exposed for in-process tests.
    pub fn router(&self) -> Router {
        handlers::router(Arc::clone(&self.state))
    }

    /// Bind and serve until [`Server::stop`] is called.
    ///
    /// Returns once the listener is closed and in-flight requests finished.
    pub async fn start(&self, addr: IpAddr, port: u16) -> Result<()> {
        let listener = TcpListener::bind(SocketAddr::new(addr, port)).await?;
        tracing::info!(%addr, port, "http server listening");

        let app = self
            .router()
            .layer(TraceLayer::new_for_http());

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // closed sender also ends the wait, shutting the server down
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await;

        // send_replace stores the value even when no stop() call is watching yet
        self.done_tx.send_replace(true);
        tracing::info!("http server stopped");

        result.map_err(Error::from)
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    ///
    /// Returns [`Error::Timeout`] when the grace period elapses first; the
    /// cache and registry stay consistent either way.
    pub async fn stop(&self, grace: Duration) -> Result<()> {
        self.shutdown_tx.send_replace(true);

        let mut done_rx = self.done_tx.subscribe();
        let result = match tokio::time::timeout(grace, done_rx.wait_for(|done| *done)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(Error::config("server task dropped before shutdown")),
            Err(_) => Err(Error::Timeout { duration: grace }),
        };
        result
    }
}
