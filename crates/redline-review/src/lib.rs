pub mod engine;
mod parse;
mod prompt;
pub mod retry;

use serde::{Deserialize, Serialize};

use redline_core::ReviewRequest;

use crate::engine::{ChatRole, ChatTransport, ChatTurn, CompletionClient};

/// Token budget for one review reply.
pub const MAX_REVIEW_TOKENS: u32 = 800;

/// The structured critique the model is asked for. Decoded permissively:
/// absent fields become empty, unknown fields are ignored. "N/A"
/// substitution for missing pieces is the display layer's business.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performance: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refactor: Option<Refactor>,
}

/// The refactor suggestion arrives either as a bare string or as an object
/// wrapping the replacement code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Refactor {
    Code { code: String },
    Text(String),
}

/// Outcome of one review call, exactly one of three shapes. Serializes
/// untagged, so JSON output is the review object itself, a
/// `{raw_response, error}` object, or an `{error}` object.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ReviewResult {
    /// The reply decoded as the expected review object.
    Structured(Review),
    /// The reply survived the call but not JSON decoding. `raw_response`
    /// holds the model's text exactly as received, before any cleanup.
    RawFallback { raw_response: String, error: String },
    /// The completion call itself failed after all retry attempts.
    Failure { error: String },
}

/// Run one code review through the given client. Never returns an error:
/// call failures become [`ReviewResult::Failure`] and undecodable replies
/// become [`ReviewResult::RawFallback`].
pub async fn review<T: ChatTransport>(
    client: &CompletionClient<T>,
    request: &ReviewRequest,
) -> ReviewResult {
    let messages = [
        ChatTurn::new(ChatRole::System, prompt::SYSTEM_PROMPT),
        ChatTurn::new(ChatRole::User, prompt::user_message(request)),
    ];

    tracing::info!(
        model = %request.model,
        filename = %request.filename,
        language = %request.language,
        "requesting review"
    );

    match client
        .complete(&messages, &request.model, MAX_REVIEW_TOKENS)
        .await
    {
        Ok(raw) => {
            tracing::debug!(raw = %raw, "model reply");
            parse::parse_review(&raw)
        }
        Err(e) => {
            tracing::warn!(error = %e, "completion failed");
            ReviewResult::Failure {
                error: e.to_string(),
            }
        }
    }
}
