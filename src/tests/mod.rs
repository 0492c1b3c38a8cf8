//! Router-level tests against mock Telegram and geolocation servers.


use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::server::{build_router, AppState};
use crate::services::LeadService;

pub(crate) const TEST_BOT_TOKEN: &str = "123456789:AAHtestTokenValue";
pub(crate) const TEST_CHAT_ID: &str = "42";
pub(crate) const ROUTE: &str = "/api/sendLead";

/// Telegram `sendMessage` path for the test token.
pub(crate) fn send_path() -> String {
    format!("/bot{}/sendMessage", TEST_BOT_TOKEN)
}

/// Default config with the relay pointed at `api_base`.
pub(crate) fn relay_config(api_base: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.telegram.bot_token = Some(TEST_BOT_TOKEN.to_string());
    config.telegram.chat_id = Some(TEST_CHAT_ID.to_string());
    config.telegram.api_base = api_base;
    config
}

pub(crate) fn app(service: LeadService) -> Router {
    build_router(
        AppState {
            service: Arc::new(service),
        },
        ROUTE,
    )
}

/// POST a raw body to the intake route with optional extra headers.
pub(crate) async fn post(
    app: Router,
    body: impl Into<Body>,
    headers: &[(&str, &str)],
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(ROUTE)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let req = builder.body(body.into()).expect("request");
    send(app, req).await
}

pub(crate) async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
