use crate::{Review, ReviewResult};

/// Diagnostic attached to replies that still fail to decode after cleanup.
pub(crate) const NON_JSON_ERROR: &str =
    "Invalid JSON format after cleaning. Model returned non-JSON text.";

/// Strip the Markdown wrapping models add despite instructions: the outer
/// backtick fence, an optional `json` marker, and stray fences further in.
/// Unfenced replies only get trimmed. Cleanup is textual and does not
/// understand JSON, so a fenced reply whose string values contain ```
/// runs loses them.
fn clean_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut cleaned = trimmed.trim_matches('`');
    if let Some(rest) = cleaned.strip_prefix("json") {
        cleaned = rest;
    }
    cleaned.replace("```", "").trim().to_string()
}

/// Decode a model reply into a review. Decode failures keep the reply
/// exactly as received in the fallback.
pub(crate) fn parse_review(raw: &str) -> ReviewResult {
    let cleaned = clean_reply(raw);
    match serde_json::from_str::<Review>(&cleaned) {
        Ok(review) => ReviewResult::Structured(review),
        Err(err) => {
            tracing::debug!(error = %err, "reply did not decode as a review");
            ReviewResult::RawFallback {
                raw_response: raw.to_string(),
                error: NON_JSON_ERROR.to_string(),
            }
        }
    }
}
