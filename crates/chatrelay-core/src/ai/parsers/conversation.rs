//! Conversation backend SSE parser
//!
//! Each event carries the whole reply so far rather than a delta.

use serde_json::Value;

use crate::ai::sse::{SseEvent, SseParser};
use crate::error::{ProviderError, ProviderResult};

/// Parses the conversation streaming format:
/// ```json
/// {"message": {"id": "..", "content": {"parts": ["full text so far"]}}, "conversation_id": ".."}
/// ```
#[derive(Debug, Default)]
pub struct ConversationParser;

impl SseParser for ConversationParser {
    fn parse_event(&self, json: &Value) -> ProviderResult<SseEvent> {
        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderError::InvalidResponse(message));
        }

        let Some(message) = json.get("message") else {
            return Ok(SseEvent::Skip);
        };

        // Only assistant output counts; echoes of the user turn are ignored
        let role = message
            .get("author")
            .and_then(|a| a.get("role"))
            .and_then(|r| r.as_str());
        if role.is_some_and(|r| r != "assistant") {
            return Ok(SseEvent::Skip);
        }

        let text = message
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .and_then(|arr| arr.first())
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(SseEvent::Snapshot {
            id: message.get("id").and_then(|i| i.as_str()).map(str::to_string),
            conversation_id: json
                .get("conversation_id")
                .and_then(|c| c.as_str())
                .map(str::to_string),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot() {
        let event = ConversationParser
            .parse_event(&json!({
                "message": {
                    "id": "m1",
                    "author": {"role": "assistant"},
                    "content": {"content_type": "text", "parts": ["Hello wor"]}
                },
                "conversation_id": "c1",
                "error": null
            }))
            .unwrap();
        assert_eq!(
            event,
            SseEvent::Snapshot {
                id: Some("m1".to_string()),
                conversation_id: Some("c1".to_string()),
                text: "Hello wor".to_string()
            }
        );
    }

    #[test]
    fn test_user_echo_skipped() {
        let event = ConversationParser
            .parse_event(&json!({
                "message": {"id": "u1", "author": {"role": "user"}, "content": {"parts": ["q"]}}
            }))
            .unwrap();
        assert_eq!(event, SseEvent::Skip);
    }

    #[test]
    fn test_error_string() {
        let err = ConversationParser
            .parse_event(&json!({"error": "Too many requests"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Too many requests");
    }
}
