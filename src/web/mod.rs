//! Web layer module
//!
//! Thin axum handlers over [`PlaylistService`]:
//! - **Public**: health, index, and cached playlists under `/<dir>/iptv.<ext>`
//! - **Auth**: login and logout, carrying the session id in a cookie
//! - **Admin API**: JSON management endpoints behind the session middleware

use anyhow::Result;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{config::Config, services::PlaylistService};

pub mod api;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::ApiResponse;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: PlaylistService,
    pub cookie_name: String,
}

impl AppState {
    pub fn new(service: PlaylistService, config: &Config) -> Self {
        Self {
            service,
            cookie_name: config.auth.cookie_name.clone(),
        }
    }
}

/// Build the complete router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route("/configs", get(api::list_configs).post(api::create_config))
        .route("/configs/:directory", delete(api::delete_config))
        .route("/configs/:directory/content", get(api::config_content))
        .route("/update/:directory", post(api::trigger_update))
        .route("/run", post(api::run_batch))
        .route("/logs", get(api::list_logs))
        .route("/interval", get(api::get_interval).put(api::set_interval))
        .route("/status", get(api::get_status))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index))
        .route("/admin/login", post(api::login))
        .route("/admin/logout", get(api::logout).post(api::logout))
        .nest("/admin/api", admin_api)
        // Cached playlists
        .route("/:directory/:file", get(handlers::serve_playlist))
        // Middleware (applied in reverse order)
        .layer(CatchPanicLayer::custom(responses::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        Ok(Self {
            app: router(state),
            addr,
        })
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Web server listening on {}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Web server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
