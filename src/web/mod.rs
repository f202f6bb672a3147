//! Web layer module
//!
//! Thin axum handlers over the geocoding proxy and the photo pipeline. The
//! page routes, templates and form handling of the full application live
//! elsewhere; this router only carries the JSON endpoints.

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{config::Config, geo::GeoProxy, photos::PhotoPipeline};

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::{ApiResponse, handle_error};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub geo: Arc<GeoProxy>,
    pub photos: Arc<PhotoPipeline>,
    /// Cancelled on shutdown; each request works under a child token
    pub shutdown: CancellationToken,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let shutdown = state.shutdown.clone();
        let app = Self::create_router(state);
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        Ok(Self {
            app,
            addr,
            shutdown,
        })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        let upload_limit = usize::try_from(state.photos.settings().max_upload_bytes)
            .unwrap_or(usize::MAX);

        Router::new()
            .route("/health", get(handlers::health::health_check))
            .route("/api/geo/search", get(handlers::geo::search))
            .route("/api/geo/reverse", get(handlers::geo::reverse))
            .route("/api/geo/cache/stats", get(handlers::geo::cache_stats))
            .route(
                "/api/photos/{owner_id}",
                post(handlers::photos::upload_photo).layer(DefaultBodyLimit::max(upload_limit)),
            )
            // Middleware (applied in reverse order)
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .with_state(state)
    }

    /// Serve until the shutdown token is cancelled
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Listening on http://{}", self.addr);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("Web server received cancellation signal, shutting down gracefully");
            })
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}
