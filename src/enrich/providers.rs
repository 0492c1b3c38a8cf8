//! HTTP geolocation providers.
//!
//! All three are queried by IP path parameter and answer JSON in their own
//! shape; each shape is mapped onto [`GeoFields`].

use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::enrich::geo::{GeoError, GeoFields, GeoProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoProviderKind {
    /// ip-api.com
    #[serde(rename = "ip-api")]
    IpApi,
    /// ipwho.is
    #[serde(rename = "ipwho")]
    IpWho,
    /// ipapi.co
    #[serde(rename = "ipapi-co")]
    IpApiCo,
}

impl GeoProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpApi => "ip-api",
            Self::IpWho => "ipwho",
            Self::IpApiCo => "ipapi-co",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::IpApi => "http://ip-api.com",
            Self::IpWho => "https://ipwho.is",
            Self::IpApiCo => "https://ipapi.co",
        }
    }
}

// ── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
    org: Option<String>,
    isp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpWhoResponse {
    #[serde(default = "default_true")]
    success: bool,
    message: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    #[serde(default)]
    connection: IpWhoConnection,
}

#[derive(Debug, Default, Deserialize)]
struct IpWhoConnection {
    org: Option<String>,
    isp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    org: Option<String>,
}

fn default_true() -> bool {
    true
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ── Provider ─────────────────────────────────────────────────────────────────

/// One of the supported HTTP providers.
pub struct HttpGeoProvider {
    kind: GeoProviderKind,
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeoProvider {
    pub fn new(kind: GeoProviderKind, client: reqwest::Client) -> Self {
        Self::with_base_url(kind, client, kind.default_base_url())
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(
        kind: GeoProviderKind,
        client: reqwest::Client,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            kind,
            client,
            base_url,
        }
    }

    pub fn url_for(&self, ip: IpAddr) -> String {
        match self.kind {
            GeoProviderKind::IpApi => format!(
                "{}/json/{}?fields=status,message,country,regionName,city,isp,org",
                self.base_url, ip
            ),
            GeoProviderKind::IpWho => format!("{}/{}", self.base_url, ip),
            GeoProviderKind::IpApiCo => format!("{}/{}/json/", self.base_url, ip),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, ip: IpAddr) -> Result<T, GeoError> {
        let body = self
            .client
            .get(self.url_for(ip))
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl GeoProvider for HttpGeoProvider {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoFields, GeoError> {
        match self.kind {
            GeoProviderKind::IpApi => {
                let resp: IpApiResponse = self.fetch(ip).await?;
                if resp.status.as_deref() != Some("success") {
                    return Err(GeoError::Provider(
                        resp.message.unwrap_or_else(|| "status not success".to_string()),
                    ));
                }
                Ok(GeoFields {
                    city: non_blank(resp.city),
                    region: non_blank(resp.region_name),
                    country: non_blank(resp.country),
                    org: non_blank(resp.org),
                    isp: non_blank(resp.isp),
                })
            }
            GeoProviderKind::IpWho => {
                let resp: IpWhoResponse = self.fetch(ip).await?;
                if !resp.success {
                    return Err(GeoError::Provider(
                        resp.message.unwrap_or_else(|| "success=false".to_string()),
                    ));
                }
                Ok(GeoFields {
                    city: non_blank(resp.city),
                    region: non_blank(resp.region),
                    country: non_blank(resp.country),
                    org: non_blank(resp.connection.org),
                    isp: non_blank(resp.connection.isp),
                })
            }
            GeoProviderKind::IpApiCo => {
                let resp: IpApiCoResponse = self.fetch(ip).await?;
                if resp.error {
                    return Err(GeoError::Provider(
                        resp.reason.unwrap_or_else(|| "error=true".to_string()),
                    ));
                }
                Ok(GeoFields {
                    city: non_blank(resp.city),
                    region: non_blank(resp.region),
                    country: non_blank(resp.country_name),
                    org: non_blank(resp.org),
                    isp: None,
                })
            }
        }
    }
}
