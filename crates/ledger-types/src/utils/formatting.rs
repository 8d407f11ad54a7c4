//! String formatting utilities for hex values in logs and configuration.

/// Truncates a hex string for display, keeping the first 10 characters.
///
/// Nonces are 66-character hex strings; the prefix is enough to correlate log lines.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
