//! # Content generation request and response types
//!
//! Wire types for the `generateContent`, `streamGenerateContent` and `countTokens`
//! methods of a Vertex AI publisher model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    models::Content,
    safety::{HarmCategory, SafetyRating, SafetySetting},
};

/// Reason why generation stopped
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Default value. This value is unused.
    FinishReasonUnspecified,
    /// Natural stop point of the model or provided stop sequence.
    Stop,
    /// The maximum number of tokens as specified in the request was reached.
    MaxTokens,
    /// The response candidate content was flagged for safety reasons.
    Safety,
    /// The response candidate content was flagged for recitation reasons.
    Recitation,
    /// Unknown reason.
    Other,
    /// Token generation stopped because the content contains forbidden terms.
    Blocklist,
    /// Token generation stopped for potentially containing prohibited content.
    ProhibitedContent,
    /// Token generation stopped because the content potentially contains
    /// Sensitive Personally Identifiable Information (SPII).
    Spii,
    /// The function call generated by the model is invalid.
    MalformedFunctionCall,
    /// Generated image content was flagged for safety reasons.
    ImageSafety,
    /// A reason this crate does not know about yet.
    #[serde(other)]
    Unknown,
}

impl FinishReason {
    /// Whether the model stopped on its own rather than being cut off or blocked.
    pub fn is_normal(&self) -> bool {
        matches!(self, FinishReason::Stop)
    }

    /// Whether generation was stopped by a content policy.
    pub fn is_policy_block(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
                | FinishReason::ImageSafety
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::FinishReasonUnspecified => "FINISH_REASON_UNSPECIFIED",
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Safety => "SAFETY",
            FinishReason::Recitation => "RECITATION",
            FinishReason::Other => "OTHER",
            FinishReason::Blocklist => "BLOCKLIST",
            FinishReason::ProhibitedContent => "PROHIBITED_CONTENT",
            FinishReason::Spii => "SPII",
            FinishReason::MalformedFunctionCall => "MALFORMED_FUNCTION_CALL",
            FinishReason::ImageSafety => "IMAGE_SAFETY",
            FinishReason::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason the prompt itself was blocked
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    BlockedReasonUnspecified,
    Safety,
    Other,
    Blocklist,
    ProhibitedContent,
    #[serde(other)]
    Unknown,
}

/// Feedback about the prompt, present when the prompt was blocked
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

/// A candidate response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of the candidate; empty when the candidate was blocked
    #[serde(default)]
    pub content: Content,
    /// The safety ratings for the candidate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
    /// The reason generation stopped; absent on intermediate stream chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Human-readable detail about the finish reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_message: Option<String>,
    /// The index of the candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_logprobs: Option<f64>,
}

impl Candidate {
    /// Whether a content policy stopped this candidate.
    pub fn is_blocked(&self) -> bool {
        self.finish_reason.is_some_and(|reason| reason.is_policy_block())
            || self.safety_ratings.iter().any(|rating| rating.blocked)
    }

    /// Categories whose ratings caused a block.
    pub fn blocked_categories(&self) -> Vec<HarmCategory> {
        self.safety_ratings
            .iter()
            .filter(|rating| rating.blocked)
            .map(|rating| rating.category)
            .collect()
    }
}

/// Per-modality token accounting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModalityTokenCount {
    pub modality: String,
    #[serde(default)]
    pub token_count: i32,
}

/// Metadata about token usage
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// The number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<i32>,
    /// The number of response tokens across all candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<i32>,
    /// The total number of tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<i32>,
    /// The number of prompt tokens served from a context cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content_token_count: Option<i32>,
    /// The number of thinking tokens (thinking models only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompt_tokens_details: Vec<ModalityTokenCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates_tokens_details: Vec<ModalityTokenCount>,
}

impl fmt::Display for UsageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("prompt_token_count", self.prompt_token_count),
            ("candidates_token_count", self.candidates_token_count),
            ("total_token_count", self.total_token_count),
            ("cached_content_token_count", self.cached_content_token_count),
            ("thoughts_token_count", self.thoughts_token_count),
        ];
        let mut first = true;
        for (name, value) in fields {
            let Some(value) = value else { continue };
            if !first {
                f.write_str("\n")?;
            }
            write!(f, "{name}: {value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Response from a generation call, or one chunk of a streamed response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// The candidates generated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Candidate>,
    /// Feedback on the prompt; set when the prompt was blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Usage metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    /// Model version that produced the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GenerationResponse {
    /// Answer text of the first candidate, without thought summaries.
    ///
    /// Empty when there is no candidate, e.g. because the prompt was blocked.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .map(|candidate| candidate.content.text_parts())
            .unwrap_or_default()
    }

    /// Finish reason of the first candidate.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason)
    }

    /// Whether the prompt was rejected before any candidate was generated.
    pub fn is_prompt_blocked(&self) -> bool {
        self.prompt_feedback
            .as_ref()
            .is_some_and(|feedback| feedback.block_reason.is_some())
    }
}

/// Configuration for generation
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Randomness of the output; lower is more deterministic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Sample only from the `k` most likely tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    /// Number of candidate responses to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<i32>,
    /// Maximum number of tokens per candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,
    /// Sequences that stop generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    /// Output MIME type, e.g. `application/json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

/// Request body for `generateContent` and `streamGenerateContent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation, in order
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    /// Instructions applied ahead of every turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

/// Request body for `countTokens`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl From<GenerateContentRequest> for CountTokensRequest {
    fn from(request: GenerateContentRequest) -> Self {
        Self {
            contents: request.contents,
            system_instruction: request.system_instruction,
        }
    }
}

/// Response from `countTokens`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    /// Tokens the prompt would consume
    #[serde(default)]
    pub total_tokens: i32,
    /// Billable characters in the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_billable_characters: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompt_tokens_details: Vec<ModalityTokenCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blocked_candidate_without_content_deserializes() {
        let response: GenerationResponse = serde_json::from_value(json!({
            "candidates": [{
                "finishReason": "SAFETY",
                "safetyRatings": [{
                    "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
                    "probability": "HIGH",
                    "blocked": true
                }]
            }],
            "usageMetadata": {"promptTokenCount": 9, "totalTokenCount": 9}
        }))
        .unwrap();

        let candidate = &response.candidates[0];
        assert!(candidate.is_blocked());
        assert_eq!(
            candidate.blocked_categories(),
            vec![HarmCategory::DangerousContent]
        );
        assert_eq!(response.text(), "");
        assert_eq!(response.finish_reason(), Some(FinishReason::Safety));
    }

    #[test]
    fn prompt_feedback_block() {
        let response: GenerationResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}
        }))
        .unwrap();
        assert!(response.is_prompt_blocked());
        assert!(response.candidates.is_empty());
    }

    #[test]
    fn unknown_finish_reason_is_tolerated() {
        let candidate: Candidate =
            serde_json::from_value(json!({"finishReason": "SOMETHING_NEW"})).unwrap();
        assert_eq!(candidate.finish_reason, Some(FinishReason::Unknown));
        assert!(!candidate.is_blocked());
    }

    #[test]
    fn generation_config_omits_unset_fields() {
        let config = GenerationConfig {
            temperature: Some(0.9),
            top_k: Some(32),
            max_output_tokens: Some(8192),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"temperature": 0.9f32, "topK": 32, "maxOutputTokens": 8192})
        );
    }

    #[test]
    fn usage_metadata_display_skips_missing_counts() {
        let usage = UsageMetadata {
            prompt_token_count: Some(11),
            candidates_token_count: Some(4),
            total_token_count: Some(15),
            ..Default::default()
        };
        assert_eq!(
            usage.to_string(),
            "prompt_token_count: 11\ncandidates_token_count: 4\ntotal_token_count: 15"
        );
    }

    #[test]
    fn count_tokens_request_keeps_contents_and_system_instruction() {
        let request = GenerateContentRequest {
            contents: vec![Content::text("hi")],
            generation_config: Some(GenerationConfig::default()),
            safety_settings: None,
            system_instruction: Some(Content::text("be brief")),
        };
        let count: CountTokensRequest = request.clone().into();
        assert_eq!(count.contents, request.contents);
        assert_eq!(count.system_instruction, request.system_instruction);
    }
}
