//! API-key client for the official chat completions endpoint
//!
//! The endpoint is stateless, so conversation continuity comes from the
//! in-memory [`MessageStore`]: every exchange is stored and the thread is
//! rebuilt from `parent_message_id` links on the next call.

use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::core::{build_request, handle_error_response, with_timeout};
use crate::ai::parsers::OpenAIParser;
use crate::ai::sse::SseStreamProcessor;
use crate::ai::store::{estimate_tokens, MessageStore};
use crate::ai::types::{ChatMessage, Role, SendMessageOptions};
use crate::constants;
use crate::error::{ProviderError, ProviderResult};

/// Chat completions client authenticated with an API key
pub struct ChatGptApi {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    store: MessageStore,
}

impl ChatGptApi {
    pub fn new(http: Client, api_key: String, base_url: String, model: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url,
            model: model.unwrap_or_else(|| constants::ai::DEFAULT_CHAT_MODEL.to_string()),
            store: MessageStore::new(constants::ai::MESSAGE_STORE_CAPACITY),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    fn system_message() -> String {
        format!(
            "You are ChatGPT, a large language model trained by OpenAI. Answer as concisely as possible.\nKnowledge cutoff: 2021-09-01\nCurrent date: {}",
            chrono::Local::now().format("%Y-%m-%d")
        )
    }

    /// Build the prompt: system message, prior thread within budget, new message
    ///
    /// Returns the messages and the `max_tokens` left for the reply.
    fn build_messages(&self, text: &str, parent_message_id: Option<&str>) -> (Vec<Value>, usize) {
        let system = Self::system_message();
        let prompt_budget =
            constants::ai::MAX_MODEL_TOKENS.saturating_sub(constants::ai::MAX_RESPONSE_TOKENS);
        let fixed = estimate_tokens(&system) + estimate_tokens(text);
        let thread = self
            .store
            .thread(parent_message_id, prompt_budget.saturating_sub(fixed));
        let used = fixed
            + thread
                .iter()
                .map(|m| estimate_tokens(&m.text))
                .sum::<usize>();

        let mut messages = Vec::with_capacity(thread.len() + 2);
        messages.push(serde_json::json!({"role": Role::System, "content": system}));
        for message in &thread {
            messages.push(serde_json::json!({"role": message.role, "content": message.text}));
        }
        messages.push(serde_json::json!({"role": Role::User, "content": text}));

        // At least one token, even when the prompt overflows the window
        let max_tokens = constants::ai::MAX_MODEL_TOKENS
            .saturating_sub(used)
            .min(constants::ai::MAX_RESPONSE_TOKENS)
            .max(1);
        (messages, max_tokens)
    }

    /// Send `text` and wait for the full reply
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
        let question = ChatMessage::user(
            message_id.clone(),
            text.to_string(),
            options.parent_message_id.clone(),
        );

        let (messages, max_tokens) = self.build_messages(text, options.parent_message_id.as_deref());
        info!(
            "=== API CALL START === model={}, messages={}, stream={}, timeout={:?}",
            self.model,
            messages.len(),
            options.is_streaming(),
            options.timeout()
        );

        let body = serde_json::json!({
            "model": self.model,
            "temperature": constants::ai::TEMPERATURE,
            "top_p": constants::ai::TOP_P,
            "presence_penalty": constants::ai::PRESENCE_PENALTY,
            "max_tokens": max_tokens,
            "messages": messages,
            "stream": options.is_streaming(),
        });

        // Placeholder id until the provider assigns one
        let mut placeholder = ChatMessage::assistant(&message_id, options.conversation_id.clone());
        placeholder.id = Uuid::new_v4().to_string();
        let reply =
            with_timeout(options.timeout(), self.request_reply(&body, placeholder, &options))
                .await?;

        self.store.upsert(question);
        self.store.upsert(reply.clone());
        info!(
            "=== API CALL END === {} chars in {:?}",
            reply.text.len(),
            call_start.elapsed()
        );
        Ok(reply)
    }

    async fn request_reply(
        &self,
        body: &Value,
        mut reply: ChatMessage,
        options: &SendMessageOptions,
    ) -> ProviderResult<ChatMessage> {
        let response = build_request(&self.http, &self.api_url(), &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = handle_error_response(response, |status, body| ProviderError::Api {
            status,
            body,
        })
        .await?;

        if options.is_streaming() {
            let mut processor = SseStreamProcessor::new(reply, options.on_progress.clone());
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                processor.process_chunk(&chunk?, &OpenAIParser)?;
                if processor.is_done() {
                    break;
                }
            }
            let mut reply = processor.finish(&OpenAIParser)?;
            reply.text = reply.text.trim().to_string();
            return Ok(reply);
        }

        let json: Value = response.json().await?;
        debug!("Chat completion response: {}", json);

        if let Some(id) = json.get("id").and_then(|i| i.as_str()) {
            reply.id = id.to_string();
        }
        let message = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!("OpenAI error: unexpected response {}", json))
            })?;
        reply.text = message
            .get("content")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        reply.detail = Some(json);

        Ok(reply)
    }
}
