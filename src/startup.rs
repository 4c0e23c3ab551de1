//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::{Adapter, AdapterOptions, HookSet};
use crate::config::Settings;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::logging;
use crate::presentation::websocket::demo;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<Adapter>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    adapter: Arc<Adapter>,
}

impl Application {
    /// Build the application with the demo hooks
    pub async fn build(settings: Settings) -> Result<Self> {
        Self::build_with_hooks(settings, demo::hooks()).await
    }

    /// Build the application around a caller-provided hook set
    pub async fn build_with_hooks(settings: Settings, hooks: HookSet) -> Result<Self> {
        let options = AdapterOptions::new(hooks).multicast(settings.websocket.multicast);
        Self::build_with_options(settings, options).await
    }

    pub async fn build_with_options(settings: Settings, options: AdapterOptions) -> Result<Self> {
        handlers::health::init_server_start();

        let adapter = Arc::new(Adapter::new(options));
        tracing::info!(
            path = %settings.websocket.path,
            multicast = ?adapter.multicast_mode(),
            "WebSocket adapter created"
        );

        let addr = settings.server.socket_addr()?;
        let state = AppState {
            adapter: adapter.clone(),
            settings: Arc::new(settings),
        };

        // Build router with middleware
        let router = routes::create_router(state).layer(logging::create_trace_layer());

        // Bind to address
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            adapter,
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run until `signal` resolves, then close every peer and drain
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let adapter = self.adapter.clone();
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!(peers = adapter.peers().len(), "Shutting down, closing peers");
            adapter.close_all(Some(1001), Some("server shutting down"));
        })
        .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn adapter(&self) -> &Arc<Adapter> {
        &self.adapter
    }
}
