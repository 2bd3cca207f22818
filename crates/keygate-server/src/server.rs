//! HTTP server assembly and lifecycle.

use std::net::SocketAddr;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, routes, state::AppState};

/// Builds the full application router with its middleware stack.
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let body_limit = config.server.body_limit_bytes;
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        http.method = %req.method(),
                        http.uri = %req.uri(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

/// A bound-and-ready server, created from config plus the wired state.
pub struct KeygateServer {
    addr: SocketAddr,
    app: Router,
}

impl KeygateServer {
    pub fn new(state: AppState, config: &AppConfig) -> Self {
        Self {
            addr: config.addr(),
            app: build_app(state, config),
        }
    }

    /// Serves until Ctrl+C.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
