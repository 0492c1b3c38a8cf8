//! Utility modules for common functionality

pub mod markup;
mod string;

pub use markup::{escape_html, unescape_html};
pub use string::{mask_token, truncate_str};
