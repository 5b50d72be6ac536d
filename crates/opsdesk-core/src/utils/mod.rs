//! Utility functions for payloads, decimal amounts and display formatting.

pub mod decimal;
pub mod format;
pub mod payload;

// Re-export commonly used functions at module level
pub use decimal::normalize_decimal;
pub use format::{format_amount, format_date, format_optional, truncate_string};
pub use payload::trim_payload;
