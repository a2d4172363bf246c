//! OpenAI chat completions SSE parser

use serde_json::Value;

use crate::ai::sse::{SseEvent, SseParser};
use crate::error::{ProviderError, ProviderResult};

/// Parses the chat completions streaming format:
/// ```json
/// {"id": "chatcmpl-..", "choices": [{"delta": {"content": "..."}, "finish_reason": null}]}
/// ```
#[derive(Debug, Default)]
pub struct OpenAIParser;

impl SseParser for OpenAIParser {
    fn parse_event(&self, json: &Value) -> ProviderResult<SseEvent> {
        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderError::InvalidResponse(message));
        }

        let id = json.get("id").and_then(|i| i.as_str()).map(str::to_string);
        let Some(choice) = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
        else {
            return Ok(SseEvent::Skip);
        };

        if let Some(delta) = choice
            .get("delta")
            .and_then(|d| d.get("content"))
            .and_then(|c| c.as_str())
        {
            return Ok(SseEvent::TextDelta {
                id,
                delta: delta.to_string(),
            });
        }

        if let Some(reason) = choice.get("finish_reason").and_then(|r| r.as_str()) {
            return Ok(SseEvent::Finish {
                reason: reason.to_string(),
            });
        }

        // Role-only first chunk still carries the completion id
        Ok(match id {
            Some(id) => SseEvent::TextDelta {
                id: Some(id),
                delta: String::new(),
            },
            None => SseEvent::Skip,
        })
    }
}
