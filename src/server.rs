// ABOUTME: HTTP server assembly: API router, tower-http layers and graceful shutdown
// ABOUTME: Binds the configured address and serves until Ctrl-C or SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::Router;
use bubble_core::constants::limits::MAX_REQUEST_BODY_BYTES;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::context::ServerContext;
use crate::middleware::setup_cors;
use crate::routes::api_router;

const ENDPOINTS: &[&str] = &[
    "GET    /api/health",
    "POST   /api/auth/login",
    "POST   /api/auth/logout",
    "GET    /api/auth/me",
    "GET    /api/ai/chat",
    "POST   /api/ai/chat",
    "GET    /api/notes",
    "POST   /api/notes",
    "POST   /api/notes/with-ai-reply",
    "POST   /api/notes/generate-ai-reply",
    "GET    /api/notes/:id",
    "PATCH  /api/notes/:id",
    "DELETE /api/notes/:id",
    "GET    /api/chat/messages",
    "POST   /api/chat/messages",
    "DELETE /api/chat/messages",
    "DELETE /api/chat/messages/:id",
    "GET    /api/chat/history",
];

/// Full application: every route plus the shared middleware stack
pub fn build_app(ctx: &ServerContext) -> Router {
    api_router(ctx)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(setup_cors(ctx.config()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Serve the application until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if the address cannot be parsed or bound, or the server fails
pub async fn run(ctx: ServerContext) -> Result<()> {
    let config = ctx.config();
    let addr = bind_address(&config.host, config.http_port)?;

    let app = build_app(&ctx);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Emotion Bubble server listening");
    for endpoint in ENDPOINTS {
        info!("  {endpoint}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

/// Socket address for a literal IPv4 or IPv6 host
///
/// # Errors
///
/// Returns an error if `host` is not an IP address
pub fn bind_address(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .with_context(|| format!("Invalid bind host {host}"))?;
    Ok(SocketAddr::new(ip, port))
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received, draining connections");
}
