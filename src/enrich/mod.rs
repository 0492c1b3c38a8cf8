//! Enrichment Module
//!
//! Derives request-scoped facts about the submitter: client IP, device class,
//! and best-effort geolocation. Nothing in here can fail a request.

pub mod client;
pub mod geo;
pub mod providers;

pub use client::{ClientContext, DeviceClass, UNKNOWN};
pub use geo::{GeoEnricher, GeoError, GeoFields, GeoInfo, GeoProvider};
pub use providers::{GeoProviderKind, HttpGeoProvider};

/// Everything derived about the submitter for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub client: ClientContext,
    pub geo: GeoInfo,
}
