//! Helpers for working with skeleton text (the prompt template syntax
//! with bracketed placeholders and `::weight` annotations).

/// Maximum skeleton excerpt length used in generation context blocks.
pub const CONTEXT_EXCERPT_LEN: usize = 200;

/// Maximum skeleton length included in notification payloads.
pub const NOTIFICATION_EXCERPT_LEN: usize = 120;

/// Truncate `text` to at most `max` characters, appending an ellipsis
/// when anything was cut. Truncation is by character, never inside a
/// UTF-8 sequence.
pub fn excerpt(text: &str, max: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}
