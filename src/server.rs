//! Lead intake HTTP server powered by axum.
//!
//! Serves:
//! - `POST /api/sendLead`: lead intake (path configurable; other methods get 405)
//! - `GET  /health`:       health check

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::LeadError;
use crate::services::{InboundLead, LeadService};

/// Request bodies above this size are rejected as invalid.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state for the intake server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LeadService>,
}

/// Build the axum router with the intake endpoint mounted at `route`.
pub fn build_router(state: AppState, route: &str) -> Router {
    Router::new()
        .route(route, any(send_lead))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the intake server and run until Ctrl-C.
pub async fn start_server(config: &AppConfig) -> anyhow::Result<()> {
    let service = LeadService::new(config)?;
    let state = AppState {
        service: Arc::new(service),
    };

    let app = build_router(state, &config.server.route);
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    tracing::info!("Lead intake starting on http://{}", addr);
    tracing::info!("   Intake: POST http://{}{}", addr, config.server.route);
    tracing::info!("   Health: GET  http://{}/health", addr);
    if config.enrichment.enabled {
        tracing::info!(
            "   Enrichment: on ({} ms timeout, providers: {:?})",
            config.enrichment.timeout_ms,
            config.enrichment.providers
        );
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Lead intake stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Any method on the intake route. Non-POST requests are refused by intake.
async fn send_lead(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = if parts.method == Method::POST {
        match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Failed to read request body: {}", e);
                return LeadError::InvalidPayload.into_response();
            }
        }
    } else {
        Bytes::new()
    };

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let inbound = InboundLead {
        method: parts.method,
        headers: parts.headers,
        peer,
        body,
    };

    match state.service.submit(inbound).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response(),
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!("Lead submission failed: {} {}", e, e.body());
            } else {
                tracing::info!("Lead submission rejected: {}", e);
            }
            e.into_response()
        }
    }
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "relay_configured": state.service.is_configured(),
    }))
}
