//! Service Layer
//!
//! Business logic that sits between the HTTP server and the intake,
//! enrichment and relay components.

pub mod lead;

pub use lead::{InboundLead, LeadService, Outcome};
