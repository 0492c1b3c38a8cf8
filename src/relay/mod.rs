//! Downstream delivery of formatted leads.

pub mod telegram;

pub use telegram::TelegramRelay;
