//! Token estimation for pre-flight context-window checks.
//!
//! This is an admission heuristic only. Billing uses provider-reported usage.

use crate::traits::ChatMessage;

/// Characters per token estimation (average across models).
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the prompt tokens of a conversation.
///
/// Total character count of every message content divided by
/// [`CHARS_PER_TOKEN`], rounded up.
pub fn estimate_tokens(messages: &[ChatMessage]) -> usize {
    let chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the tokens of a single text.
pub fn estimate_text_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
