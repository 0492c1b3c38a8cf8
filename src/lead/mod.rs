//! Lead Module
//!
//! Intake validation of form submissions and formatting of the relayed
//! message.

pub mod intake;
pub mod message;

pub use intake::{parse_submission, Contact, ContactKind, Intake, LeadSubmission};
pub use message::format_lead;
