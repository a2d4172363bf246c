//! Shared message and option types

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Raw provider payload of the final response, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ChatMessage {
    /// Empty assistant reply that streaming fills in
    pub fn assistant(parent_message_id: &str, conversation_id: Option<String>) -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            role: Role::Assistant,
            parent_message_id: Some(parent_message_id.to_string()),
            conversation_id,
            detail: None,
        }
    }

    pub fn user(id: String, text: String, parent_message_id: Option<String>) -> Self {
        Self {
            id,
            text,
            role: Role::User,
            parent_message_id,
            conversation_id: None,
            detail: None,
        }
    }
}

/// Where a new message attaches in a prior conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub parent_message_id: Option<String>,
}

/// Receives partial replies while a response streams in
pub type ProgressCallback = Arc<dyn Fn(&ChatMessage) + Send + Sync>;

/// Options for a single send
#[derive(Clone, Default)]
pub struct SendMessageOptions {
    /// Upper bound on the whole exchange, including the stream
    pub timeout_ms: Option<u64>,
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
    /// Id for the outgoing user message; generated when absent
    pub message_id: Option<String>,
    pub on_progress: Option<ProgressCallback>,
}

impl SendMessageOptions {
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
            ..Default::default()
        }
    }

    /// Options carrying only the context fields
    pub fn from_context(context: &ChatContext) -> Self {
        Self {
            conversation_id: context.conversation_id.clone(),
            parent_message_id: context.parent_message_id.clone(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Whether the caller wants partial replies
    pub fn is_streaming(&self) -> bool {
        self.on_progress.is_some()
    }
}

impl fmt::Debug for SendMessageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendMessageOptions")
            .field("timeout_ms", &self.timeout_ms)
            .field("conversation_id", &self.conversation_id)
            .field("parent_message_id", &self.parent_message_id)
            .field("message_id", &self.message_id)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Result of the draw branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Payload of a streaming relay call: a chat reply or a generated image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyData {
    Chat(ChatMessage),
    Image(ImageResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_camel_case() {
        let mut msg = ChatMessage::assistant("user-1", Some("conv-1".to_string()));
        msg.id = "reply-1".to_string();
        msg.text = "hi".to_string();
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "id": "reply-1",
                "text": "hi",
                "role": "assistant",
                "parentMessageId": "user-1",
                "conversationId": "conv-1"
            })
        );
    }

    #[test]
    fn test_context_deserializes_partial() {
        let ctx: ChatContext = serde_json::from_value(json!({"parentMessageId": "p"})).unwrap();
        assert_eq!(ctx.parent_message_id.as_deref(), Some("p"));
        assert!(ctx.conversation_id.is_none());
    }

    #[test]
    fn test_from_context_drops_timeout() {
        let ctx = ChatContext {
            conversation_id: Some("c".to_string()),
            parent_message_id: Some("p".to_string()),
        };
        let opts = SendMessageOptions::from_context(&ctx);
        assert!(opts.timeout().is_none());
        assert_eq!(opts.conversation_id.as_deref(), Some("c"));
        assert!(!opts.is_streaming());
    }

    #[test]
    fn test_image_reply_is_single_url_field() {
        let data = ReplyData::Image(ImageResult {
            url: Some("https://img".to_string()),
        });
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({"url": "https://img"}));
    }

    #[test]
    fn test_image_without_url_omits_key() {
        let data = ReplyData::Image(ImageResult { url: None });
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({}));
    }
}
