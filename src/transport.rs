//! HTTP transport: listener, middleware and graceful shutdown.

use crate::constants::{DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_MAX_BODY_BYTES};
use crate::handlers::router;
use crate::server::GenaiSqlServer;
use crate::shutdown::SharedShutdownController;
use axum::http::HeaderValue;
use axum::Router;
use std::future::IntoFuture;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Allowed origins for CORS (empty or `*` means all).
    pub cors_origins: Vec<String>,

    /// Enable request tracing via tower-http TraceLayer.
    pub enable_tracing: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            cors_origins: Vec::new(),
            enable_tracing: true,
            max_body_size: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl HttpConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HTTP_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("HTTP_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Some(origins) = lookup("BACKEND_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(tracing) = lookup("HTTP_TRACING") {
            config.enable_tracing = tracing.to_lowercase() == "true" || tracing == "1";
        }

        if let Some(size) = lookup("HTTP_MAX_BODY_BYTES") {
            if let Ok(s) = size.parse() {
                config.max_body_size = s;
            }
        }

        config
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the CORS layer for the configured origins.
    ///
    /// Explicit origins allow credentials, so methods and headers are
    /// mirrored from the request instead of answered with `*`. Origins that
    /// are not valid header values are skipped.
    pub fn cors_layer(&self) -> CorsLayer {
        if self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*") {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

/// Assemble the router with middleware layers.
pub fn build_app(server: GenaiSqlServer, config: &HttpConfig) -> Router {
    let app = router(server)
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(config.cors_layer());

    if config.enable_tracing {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

/// Serve HTTP until the shutdown controller fires.
///
/// In-flight requests get the controller's drain timeout to finish.
pub async fn serve(
    server: GenaiSqlServer,
    config: &HttpConfig,
    controller: SharedShutdownController,
) -> Result<(), anyhow::Error> {
    let app = build_app(server, config);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server listening on http://{}", addr);
    info!("Query endpoint: http://{}/api/query", addr);
    info!("Health endpoint: http://{}/health", addr);

    let mut server_signal = controller.signal();
    let mut task = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_signal.recv().await;
                info!("HTTP server received shutdown signal");
            })
            .into_future(),
    );

    let mut wait = controller.signal();
    tokio::select! {
        joined = &mut task => return Ok(joined??),
        _ = wait.recv() => {}
    }

    match tokio::time::timeout(controller.drain_timeout(), &mut task).await {
        Ok(joined) => Ok(joined??),
        Err(_) => {
            warn!(
                "Drain timeout of {}s exceeded, aborting open connections",
                controller.drain_timeout().as_secs()
            );
            task.abort();
            Ok(())
        }
    }
}
