//! Client IP and device class from request metadata.

use std::fmt;
use std::net::IpAddr;

use axum::http::{header, HeaderMap};

/// Placeholder for any derived field that could not be determined.
pub const UNKNOWN: &str = "Unknown";

const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    /// `Mobile` when the user agent mentions "mobile" in any case.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.to_lowercase().contains("mobile") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Desktop => "Desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped facts about the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: String,
    pub device: DeviceClass,
}

impl ClientContext {
    pub fn from_request(headers: &HeaderMap, peer: Option<IpAddr>) -> Self {
        let user_agent = header_value(headers, header::USER_AGENT.as_str())
            .unwrap_or(UNKNOWN)
            .to_string();
        let device = DeviceClass::from_user_agent(&user_agent);
        Self {
            ip: client_ip(headers, peer),
            user_agent,
            device,
        }
    }

    pub fn unknown() -> Self {
        Self {
            ip: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
            device: DeviceClass::Desktop,
        }
    }
}

/// First non-empty of: `X-Real-IP`, first `X-Forwarded-For` entry, peer
/// address. `"Unknown"` when none is available.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(real_ip) = header_value(headers, X_REAL_IP) {
        return normalize_ip(real_ip);
    }

    let forwarded = header_value(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(forwarded) = forwarded {
        return normalize_ip(forwarded);
    }

    match peer {
        Some(addr) => normalize_ip(&addr.to_string()),
        None => UNKNOWN.to_string(),
    }
}

/// Rewrite IPv4-mapped IPv6 (`::ffff:a.b.c.d`) as plain IPv4. Anything that
/// does not parse as an address is returned trimmed and unchanged.
pub fn normalize_ip(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(IpAddr::V4(v4)) => v4.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
