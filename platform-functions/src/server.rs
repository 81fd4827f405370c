//! Axum server setup for the file functions

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use platform_core::shutdown_signal;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::state::FunctionsState;
use crate::{events, upload};

/// Header Cloud Run uses to propagate trace context: `TRACE_ID/SPAN_ID;o=1`
const TRACE_HEADER: &str = "x-cloud-trace-context";

/// Build the router for both functions
pub fn build_router(state: FunctionsState) -> Router {
    Router::new()
        .merge(upload::router())
        .merge(events::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

fn request_span(request: &Request<Body>) -> Span {
    let trace_id = header(request, TRACE_HEADER)
        .split('/')
        .next()
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        event_type = %header(request, "ce-type"),
        trace_id = %trace_id,
    )
}

fn header<'a>(request: &'a Request<Body>, name: &str) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run_server(state: FunctionsState, bind_addr: SocketAddr) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
