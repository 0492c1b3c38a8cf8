//! Intake validation: raw request body in, [`LeadSubmission`] or rejection out.

use axum::http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config::{ContactField, IntakeConfig};
use crate::error::{LeadError, Result};

/// Hidden form field. Humans never fill it in.
pub const HONEYPOT_FIELD: &str = "hp";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s\-()]{7,20}$").expect("valid phone regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Phone,
    /// Neither format matched; only possible with format enforcement off.
    Other,
}

impl ContactKind {
    pub fn classify(value: &str) -> Self {
        if EMAIL_RE.is_match(value) {
            Self::Email
        } else if PHONE_RE.is_match(value) {
            Self::Phone
        } else {
            Self::Other
        }
    }

    /// Label used in the relayed message.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Other => "Contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub value: String,
    pub kind: ContactKind,
}

impl Contact {
    /// Trim and classify. Phone numbers get internal whitespace collapsed.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let kind = ContactKind::classify(trimmed);
        let value = match kind {
            ContactKind::Phone => trimmed.split_whitespace().collect::<Vec<_>>().join(" "),
            _ => trimmed.to_string(),
        };
        Self { value, kind }
    }
}

/// A validated, non-spam submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSubmission {
    pub name: String,
    pub contact: Contact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// Honeypot was filled. Respond as if accepted, do nothing else.
    Spam,
    Lead(LeadSubmission),
}

/// Validate one inbound request.
///
/// Order matters: method, then body syntax, then honeypot, then required
/// fields, then contact format. Spam is recognized before required fields so
/// bots never learn which fields are checked.
pub fn parse_submission(method: &Method, body: &[u8], config: &IntakeConfig) -> Result<Intake> {
    if *method != Method::POST {
        return Err(LeadError::MethodNotAllowed);
    }

    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(|e| {
            tracing::debug!("Rejecting unparsable body: {}", e);
            LeadError::InvalidPayload
        })?
    };

    if !field_text(&payload, HONEYPOT_FIELD).is_empty() {
        return Ok(Intake::Spam);
    }

    let field = config.contact_field;
    let name = field_text(&payload, "name");
    let mut contact = field_text(&payload, field.as_str());
    if contact.is_empty() {
        contact = field_text(&payload, field.fallback().as_str());
    }

    if name.is_empty() || contact.is_empty() {
        return Err(LeadError::MissingFields(field));
    }

    let contact = Contact::normalize(&contact);
    if config.enforce_format && !accepts(field, contact.kind) {
        return Err(LeadError::InvalidContact(field));
    }

    Ok(Intake::Lead(LeadSubmission { name, contact }))
}

fn accepts(field: ContactField, kind: ContactKind) -> bool {
    match field {
        ContactField::Email => kind == ContactKind::Email,
        ContactField::Contact => matches!(kind, ContactKind::Email | ContactKind::Phone),
    }
}

/// Loose string coercion of a form field. Missing, `null`, `false` and `0`
/// read as empty; other scalars use their textual form. Arrays read as their
/// elements joined with `,`, so `[]` is empty.
fn field_text(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(value) => value_text(value).trim().to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
