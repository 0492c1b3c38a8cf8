//! Telegram message text for a lead.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::enrich::Enrichment;
use crate::lead::LeadSubmission;
use crate::utils::{escape_html, truncate_str};

/// User agents beyond this length are cut; Telegram caps messages at 4096 chars.
const MAX_USER_AGENT_CHARS: usize = 256;

/// Build the HTML message body. Every interpolated value is escaped.
pub fn format_lead(
    lead: &LeadSubmission,
    enrichment: Option<&Enrichment>,
    submitted_at: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        "<b>New lead</b>".to_string(),
        line("Name", &lead.name),
        line(lead.contact.kind.label(), &lead.contact.value),
    ];

    if let Some(enrichment) = enrichment {
        let client = &enrichment.client;
        lines.push(line("IP", &client.ip));
        lines.push(line("Location", &enrichment.geo.location));
        lines.push(line("ISP", &enrichment.geo.isp_org));
        lines.push(line("Device", client.device.as_str()));
        lines.push(line(
            "User-Agent",
            &truncate_str(&client.user_agent, MAX_USER_AGENT_CHARS),
        ));
    }

    lines.push(line(
        "Time",
        &submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    ));
    lines.join("\n")
}

fn line(label: &str, value: &str) -> String {
    format!("<b>{}:</b> {}", label, escape_html(value))
}
