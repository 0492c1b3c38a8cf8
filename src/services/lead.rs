//! Lead submission service: intake → config check → enrichment → relay.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use chrono::Utc;

use crate::config::{AppConfig, IntakeConfig};
use crate::enrich::{ClientContext, Enrichment, GeoEnricher};
use crate::error::{LeadError, Result};
use crate::lead::{format_lead, parse_submission, Intake};
use crate::relay::TelegramRelay;

/// One raw request as seen by the service.
#[derive(Debug, Clone)]
pub struct InboundLead {
    pub method: Method,
    pub headers: HeaderMap,
    /// Transport-level peer, when the server knows it.
    pub peer: Option<IpAddr>,
    pub body: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Relayed,
    /// Honeypot hit. Reported to the client exactly like `Relayed`.
    SpamDiscarded,
}

pub struct LeadService {
    intake: IntakeConfig,
    relay: Option<TelegramRelay>,
    enricher: Option<GeoEnricher>,
}

impl LeadService {
    /// Build the service and its shared HTTP client from configuration.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.telegram.request_timeout_secs))
            .user_agent(concat!("leadrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let relay = TelegramRelay::from_config(&config.telegram, client.clone());
        if relay.is_none() {
            tracing::warn!(
                "TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set; submissions will be answered with 500"
            );
        }

        let enricher = config
            .enrichment
            .enabled
            .then(|| GeoEnricher::from_config(&config.enrichment, client));

        Ok(Self::with_parts(config.intake.clone(), relay, enricher))
    }

    pub fn with_parts(
        intake: IntakeConfig,
        relay: Option<TelegramRelay>,
        enricher: Option<GeoEnricher>,
    ) -> Self {
        Self {
            intake,
            relay,
            enricher,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.relay.is_some()
    }

    /// Handle one submission end to end.
    pub async fn submit(&self, inbound: InboundLead) -> Result<Outcome> {
        let lead = match parse_submission(&inbound.method, &inbound.body, &self.intake)? {
            Intake::Spam => {
                tracing::info!("Honeypot triggered, discarding submission silently");
                return Ok(Outcome::SpamDiscarded);
            }
            Intake::Lead(lead) => lead,
        };

        let relay = self.relay.as_ref().ok_or(LeadError::NotConfigured)?;

        let enrichment = match &self.enricher {
            Some(enricher) => {
                let client = ClientContext::from_request(&inbound.headers, inbound.peer);
                let geo = enricher.lookup(&client.ip).await;
                Some(Enrichment { client, geo })
            }
            None => None,
        };

        let text = format_lead(&lead, enrichment.as_ref(), Utc::now());
        relay.send_message(&text).await?;

        tracing::info!(
            "Lead relayed ({} contact{})",
            lead.contact.kind.label().to_lowercase(),
            enrichment
                .as_ref()
                .map(|e| format!(", from {}", e.geo.location))
                .unwrap_or_default()
        );
        Ok(Outcome::Relayed)
    }
}
