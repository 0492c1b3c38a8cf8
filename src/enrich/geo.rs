//! Best-effort geolocation with timeout and provider fallback.
//!
//! Each provider call races a timer. The primary provider is asked first; the
//! secondary only after the primary's race ends unresolved. A provider future
//! that loses its race is dropped, so a late response can neither change the
//! result nor surface an error.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::EnrichmentConfig;
use crate::enrich::client::UNKNOWN;
use crate::enrich::providers::HttpGeoProvider;

/// Why a provider attempt did not resolve. Never shown to clients.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider reported failure: {0}")]
    Provider(String),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("response carried no usable fields")]
    Empty,
}

/// Raw fields as reported by one provider. Blank strings are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoFields {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub org: Option<String>,
    pub isp: Option<String>,
}

impl GeoFields {
    pub fn is_usable(&self) -> bool {
        [&self.city, &self.region, &self.country, &self.org, &self.isp]
            .iter()
            .any(|f| f.is_some())
    }
}

/// Resolved location and network owner, `"Unknown"` where unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoInfo {
    pub location: String,
    pub isp_org: String,
}

impl GeoInfo {
    pub fn unknown() -> Self {
        Self {
            location: UNKNOWN.to_string(),
            isp_org: UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.location == UNKNOWN && self.isp_org == UNKNOWN
    }
}

impl From<GeoFields> for GeoInfo {
    fn from(fields: GeoFields) -> Self {
        let parts: Vec<String> = [fields.city, fields.region, fields.country]
            .into_iter()
            .flatten()
            .collect();
        let location = if parts.is_empty() {
            UNKNOWN.to_string()
        } else {
            parts.join(", ")
        };
        let isp_org = fields
            .org
            .or(fields.isp)
            .unwrap_or_else(|| UNKNOWN.to_string());
        Self { location, isp_org }
    }
}

/// A single IP geolocation source.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, ip: IpAddr) -> Result<GeoFields, GeoError>;
}

/// Ordered providers plus the per-attempt deadline.
pub struct GeoEnricher {
    providers: Vec<Box<dyn GeoProvider>>,
    timeout: Duration,
}

impl GeoEnricher {
    pub fn new(providers: Vec<Box<dyn GeoProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn from_config(config: &EnrichmentConfig, client: reqwest::Client) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|kind| Box::new(HttpGeoProvider::new(*kind, client.clone())) as Box<dyn GeoProvider>)
            .collect();
        Self::new(providers, Duration::from_millis(config.timeout_ms))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve `ip`, or return [`GeoInfo::unknown`]. Never fails.
    pub async fn lookup(&self, ip: &str) -> GeoInfo {
        let Some(addr) = lookup_target(ip) else {
            tracing::debug!("Skipping geolocation for {}", ip);
            return GeoInfo::unknown();
        };

        for provider in &self.providers {
            match self.attempt(provider.as_ref(), addr).await {
                Ok(fields) => {
                    tracing::debug!("Geolocation for {} resolved by {}", addr, provider.name());
                    return fields.into();
                }
                Err(GeoError::Timeout(elapsed)) => {
                    tracing::warn!(
                        "Geolocation provider {} timed out after {:?}",
                        provider.name(),
                        elapsed
                    );
                }
                Err(e) => {
                    tracing::debug!("Geolocation provider {} unresolved: {}", provider.name(), e);
                }
            }
        }

        GeoInfo::unknown()
    }

    async fn attempt(&self, provider: &dyn GeoProvider, ip: IpAddr) -> Result<GeoFields, GeoError> {
        let fields = tokio::time::timeout(self.timeout, provider.lookup(ip))
            .await
            .map_err(|_| GeoError::Timeout(self.timeout))??;
        if fields.is_usable() {
            Ok(fields)
        } else {
            Err(GeoError::Empty)
        }
    }
}

/// Address worth looking up: parses, and is neither loopback nor unspecified.
pub fn lookup_target(ip: &str) -> Option<IpAddr> {
    if ip == UNKNOWN {
        return None;
    }
    let addr: IpAddr = ip.trim().parse().ok()?;
    if addr.is_loopback() || addr.is_unspecified() {
        return None;
    }
    Some(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    /// Provider that answers after a fixed delay and counts calls.
    struct StubProvider {
        name: &'static str,
        delay: Duration,
        result: fn() -> Result<GeoFields, GeoError>,
        calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        fn boxed(
            name: &'static str,
            delay_ms: u64,
            result: fn() -> Result<GeoFields, GeoError>,
        ) -> (Box<dyn GeoProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Self {
                name,
                delay: Duration::from_millis(delay_ms),
                result,
                calls: calls.clone(),
            };
            (Box::new(provider), calls)
        }
    }

    #[async_trait]
    impl GeoProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, _ip: IpAddr) -> Result<GeoFields, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            (self.result)()
        }
    }

    fn lisbon() -> Result<GeoFields, GeoError> {
        Ok(GeoFields {
            city: Some("Lisbon".into()),
            region: None,
            country: Some("Portugal".into()),
            org: Some("Primary Telecom".into()),
            isp: None,
        })
    }

    fn porto() -> Result<GeoFields, GeoError> {
        Ok(GeoFields {
            city: Some("Porto".into()),
            region: Some("Porto".into()),
            country: Some("Portugal".into()),
            org: None,
            isp: Some("Secondary ISP".into()),
        })
    }

    fn country_only() -> Result<GeoFields, GeoError> {
        Ok(GeoFields {
            country: Some("Portugal".into()),
            ..Default::default()
        })
    }

    fn empty() -> Result<GeoFields, GeoError> {
        Ok(GeoFields::default())
    }

    fn failing() -> Result<GeoFields, GeoError> {
        Err(GeoError::Provider("reserved range".into()))
    }

    const IP: &str = "203.0.113.7";

    #[tokio::test(start_paused = true)]
    async fn test_primary_resolves() {
        let (primary, _) = StubProvider::boxed("primary", 100, lisbon);
        let (secondary, secondary_calls) = StubProvider::boxed("secondary", 100, porto);
        let enricher = GeoEnricher::new(vec![primary, secondary], Duration::from_millis(2000));

        let info = enricher.lookup(IP).await;
        assert_eq!(info.location, "Lisbon, Portugal");
        assert_eq!(info.isp_org, "Primary Telecom");
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_primary_is_bounded_by_timeout() {
        let (primary, _) = StubProvider::boxed("primary", 10_000, lisbon);
        let enricher = GeoEnricher::new(vec![primary], Duration::from_millis(1500));

        let started = Instant::now();
        let info = enricher.lookup(IP).await;
        let elapsed = started.elapsed();

        assert!(info.is_unknown());
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed < Duration::from_millis(2000), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_after_primary_timeout() {
        let (primary, _) = StubProvider::boxed("primary", 5000, lisbon);
        let (secondary, secondary_calls) = StubProvider::boxed("secondary", 200, porto);
        let enricher = GeoEnricher::new(vec![primary, secondary], Duration::from_millis(2000));

        let info = enricher.lookup(IP).await;
        assert_eq!(info.location, "Porto, Porto, Portugal");
        assert_eq!(info.isp_org, "Secondary ISP");
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_after_empty_primary() {
        let (primary, _) = StubProvider::boxed("primary", 10, empty);
        let (secondary, _) = StubProvider::boxed("secondary", 10, porto);
        let enricher = GeoEnricher::new(vec![primary, secondary], Duration::from_millis(2000));

        assert_eq!(enricher.lookup(IP).await.isp_org, "Secondary ISP");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_after_primary_error() {
        let (primary, _) = StubProvider::boxed("primary", 10, failing);
        let (secondary, _) = StubProvider::boxed("secondary", 10, porto);
        let enricher = GeoEnricher::new(vec![primary, secondary], Duration::from_millis(2000));

        assert_eq!(enricher.lookup(IP).await.location, "Porto, Porto, Portugal");
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_primary_is_not_merged() {
        let (primary, _) = StubProvider::boxed("primary", 10, country_only);
        let (secondary, secondary_calls) = StubProvider::boxed("secondary", 10, porto);
        let enricher = GeoEnricher::new(vec![primary, secondary], Duration::from_millis(2000));

        let info = enricher.lookup(IP).await;
        assert_eq!(info.location, "Portugal");
        assert_eq!(info.isp_org, UNKNOWN);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_providers_fail() {
        let (primary, _) = StubProvider::boxed("primary", 10, failing);
        let (secondary, _) = StubProvider::boxed("secondary", 5000, porto);
        let enricher = GeoEnricher::new(vec![primary, secondary], Duration::from_millis(1000));

        assert!(enricher.lookup(IP).await.is_unknown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_addresses_make_no_calls() {
        for ip in [UNKNOWN, "127.0.0.1", "::1", "0.0.0.0", "garbage", ""] {
            let (primary, calls) = StubProvider::boxed("primary", 10, lisbon);
            let enricher = GeoEnricher::new(vec![primary], Duration::from_millis(1000));
            assert!(enricher.lookup(ip).await.is_unknown(), "{ip}");
            assert_eq!(calls.load(Ordering::SeqCst), 0, "{ip}");
        }
    }

    #[test]
    fn test_geo_info_from_fields() {
        let info: GeoInfo = GeoFields {
            city: Some("Berlin".into()),
            region: Some("Land Berlin".into()),
            country: Some("Germany".into()),
            org: None,
            isp: Some("Example GmbH".into()),
        }
        .into();
        assert_eq!(info.location, "Berlin, Land Berlin, Germany");
        assert_eq!(info.isp_org, "Example GmbH");

        let info: GeoInfo = GeoFields::default().into();
        assert!(info.is_unknown());
    }

    #[test]
    fn test_from_config_keeps_order() {
        let config = EnrichmentConfig {
            enabled: true,
            providers: vec![
                crate::enrich::providers::GeoProviderKind::IpWho,
                crate::enrich::providers::GeoProviderKind::IpApi,
            ],
            timeout_ms: 1500,
        };
        let enricher = GeoEnricher::from_config(&config, reqwest::Client::new());
        assert_eq!(enricher.provider_names(), vec!["ipwho", "ip-api"]);
    }
}
