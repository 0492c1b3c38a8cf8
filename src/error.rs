//! Request error taxonomy.
//!
//! Every variant maps onto exactly one HTTP status and JSON body. Geolocation
//! failures are not part of this enum; see [`crate::enrich::geo::GeoError`].

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::config::ContactField;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    InvalidPayload,

    #[error("Missing name or {}", .0.as_str())]
    MissingFields(ContactField),

    #[error("Invalid {}", .0.as_str())]
    InvalidContact(ContactField),

    #[error("Server not configured (missing env vars)")]
    NotConfigured,

    /// The relay call never produced a usable response.
    #[error("Request failed")]
    RelayTransport(String),

    /// The relay answered but reported failure. Carries the downstream body.
    #[error("Telegram API error")]
    RelayRejected(serde_json::Value),
}

pub type Result<T> = std::result::Result<T, LeadError>;

impl LeadError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidPayload | Self::MissingFields(_) | Self::InvalidContact(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotConfigured | Self::RelayTransport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RelayRejected(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// JSON body returned to the submitting client.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::RelayTransport(detail) => json!({ "error": self.to_string(), "detail": detail }),
            Self::RelayRejected(detail) => json!({ "error": self.to_string(), "detail": detail }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(self.body());
        if matches!(self, Self::MethodNotAllowed) {
            return (status, [(header::ALLOW, "POST")], body).into_response();
        }
        (status, body).into_response()
    }
}
