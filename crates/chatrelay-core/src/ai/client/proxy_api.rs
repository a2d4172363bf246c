//! Access-token client for the ChatGPT conversation backend
//!
//! Requests go to a reverse proxy in front of the web conversation endpoint.
//! The backend keeps conversation state itself; we only pass the ids along.

use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;
use tracing::{info, warn};
use uuid::Uuid;

use super::core::{build_request, handle_error_response, with_timeout};
use crate::ai::parsers::ConversationParser;
use crate::ai::sse::SseStreamProcessor;
use crate::ai::types::{ChatMessage, SendMessageOptions};
use crate::constants;
use crate::error::{ProviderError, ProviderResult};

/// Conversation backend client authenticated with an access token
pub struct ChatGptUnofficialProxyApi {
    http: Client,
    access_token: String,
    api_reverse_proxy_url: String,
    model: String,
}

impl ChatGptUnofficialProxyApi {
    pub fn new(
        http: Client,
        access_token: String,
        api_reverse_proxy_url: Option<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            http,
            access_token,
            api_reverse_proxy_url: api_reverse_proxy_url
                .unwrap_or_else(|| constants::ai::DEFAULT_REVERSE_PROXY_URL.to_string()),
            model: model.unwrap_or_else(|| constants::ai::DEFAULT_PROXY_MODEL.to_string()),
        }
    }

    pub fn api_reverse_proxy_url(&self) -> &str {
        &self.api_reverse_proxy_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `text`; the backend always streams, progress is reported when asked for
    pub async fn send_message(
        &self,
        text: &str,
        options: SendMessageOptions,
    ) -> ProviderResult<ChatMessage> {
        let call_start = Instant::now();
        let message_id = options
            .message_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let parent_message_id = options
            .parent_message_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut body = serde_json::json!({
            "action": "next",
            "messages": [{
                "id": message_id,
                "role": "user",
                "content": {
                    "content_type": "text",
                    "parts": [text]
                }
            }],
            "model": self.model,
            "parent_message_id": parent_message_id,
        });
        if let Some(conversation_id) = &options.conversation_id {
            body["conversation_id"] = serde_json::json!(conversation_id);
        }

        info!(
            "=== CONVERSATION CALL START === model={}, continuing={}, timeout={:?}",
            self.model,
            options.conversation_id.is_some(),
            options.timeout()
        );

        let reply = ChatMessage::assistant(&message_id, options.conversation_id.clone());
        let reply = with_timeout(options.timeout(), self.stream_reply(&body, reply, &options)).await?;

        if reply.text.is_empty() {
            warn!("Conversation backend finished without any reply text");
        }
        info!(
            "=== CONVERSATION CALL END === {} chars in {:?}",
            reply.text.len(),
            call_start.elapsed()
        );
        Ok(reply)
    }

    async fn stream_reply(
        &self,
        body: &serde_json::Value,
        reply: ChatMessage,
        options: &SendMessageOptions,
    ) -> ProviderResult<ChatMessage> {
        let response = build_request(&self.http, &self.api_reverse_proxy_url, &self.access_token)
            .header("accept", "text/event-stream")
            .json(body)
            .send()
            .await?;
        let response = handle_error_response(response, |status, body| {
            ProviderError::Conversation { status, body }
        })
        .await?;

        let mut processor = SseStreamProcessor::new(reply, options.on_progress.clone());
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            processor.process_chunk(&chunk?, &ConversationParser)?;
            if processor.is_done() {
                break;
            }
        }
        processor.finish(&ConversationParser)
    }
}
