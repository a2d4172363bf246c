//! Relay service
//!
//! The three entry points consumed by the outer request layer. Every call
//! answers with an [`Envelope`]; validation and provider failures both end up
//! as [`Envelope::Fail`] carrying the error text.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::ai::client::{create_http_client, ChatApi, ChatBackend, ImageApi, ImageClient};
use crate::ai::types::{
    ChatContext, ChatMessage, ProgressCallback, ReplyData, SendMessageOptions,
};
use crate::config::{Credentials, ModelConfig, RelayConfig};
use crate::envelope::Envelope;
use crate::error::{ConfigError, ProviderError, RelayError};

/// Ready-to-use relay, built once at startup and shared across calls
pub struct ChatService {
    config: RelayConfig,
    api: Arc<dyn ChatApi>,
    images: Option<Arc<dyn ImageApi>>,
}

impl ChatService {
    /// Initialize from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(RelayConfig::from_env()?)
    }

    /// Select the chat client for `config`; API-key mode also gets an image client
    pub fn from_config(config: RelayConfig) -> Result<Self, ConfigError> {
        let backend = ChatBackend::from_config(&config)?;
        let images: Option<Arc<dyn ImageApi>> = match &config.credentials {
            Credentials::ApiKey(key) => Some(Arc::new(ImageClient::new(
                create_http_client(None)?,
                key.clone(),
                config.api_base_url.clone(),
            ))),
            Credentials::AccessToken(_) => None,
        };
        info!(
            "Chat service ready: mode={}, timeout={}ms, images={}",
            config.api_model(),
            config.timeout_ms,
            images.is_some()
        );
        Ok(Self::with_clients(config, Arc::new(backend), images))
    }

    /// Assemble a service from already-built clients
    pub fn with_clients(
        config: RelayConfig,
        api: Arc<dyn ChatApi>,
        images: Option<Arc<dyn ImageApi>>,
    ) -> Self {
        Self {
            config,
            api,
            images,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Options for a send: the timeout alone, or the context alone
    ///
    /// A supplied context replaces the timeout instead of merging with it.
    fn request_options(&self, context: Option<&ChatContext>) -> SendMessageOptions {
        match context {
            Some(context) => SendMessageOptions::from_context(context),
            None => SendMessageOptions::with_timeout(self.config.timeout_ms),
        }
    }

    /// Forward `message` and wait for the full reply
    pub async fn chat_reply(
        &self,
        message: &str,
        context: Option<&ChatContext>,
    ) -> Envelope<ChatMessage> {
        self.reply(message, context).await.into()
    }

    async fn reply(
        &self,
        message: &str,
        context: Option<&ChatContext>,
    ) -> Result<ChatMessage, RelayError> {
        if message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }
        let start = Instant::now();
        let options = self.request_options(context);
        let result = self.api.send_message(message, options).await;
        log_outcome("chat_reply", start, &result);
        Ok(result?)
    }

    /// Forward `message`, reporting partial replies, or generate an image when `is_draw`
    pub async fn chat_reply_process(
        &self,
        message: &str,
        context: Option<&ChatContext>,
        is_draw: bool,
        on_progress: Option<ProgressCallback>,
    ) -> Envelope<ReplyData> {
        self.reply_process(message, context, is_draw, on_progress)
            .await
            .into()
    }

    async fn reply_process(
        &self,
        message: &str,
        context: Option<&ChatContext>,
        is_draw: bool,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ReplyData, RelayError> {
        if message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }
        let start = Instant::now();

        if is_draw {
            let images = self.images.as_ref().ok_or_else(|| {
                ProviderError::Unsupported(format!(
                    "Image generation is not available with {}",
                    self.config.api_model()
                ))
            })?;
            let result = images.create_image(message).await;
            log_outcome("chat_reply_process(draw)", start, &result);
            return Ok(ReplyData::Image(result?));
        }

        let mut options = self.request_options(context);
        options.on_progress = on_progress;
        let result = self.api.send_message(message, options).await;
        log_outcome("chat_reply_process", start, &result);
        Ok(ReplyData::Chat(result?))
    }

    /// Current mode, proxies, and timeout
    pub fn chat_config(&self) -> Envelope<ModelConfig> {
        Envelope::success(self.config.model_config())
    }
}

fn log_outcome<T>(call: &str, start: Instant, result: &Result<T, ProviderError>) {
    match result {
        Ok(_) => info!("{} succeeded in {:?}", call, start.elapsed()),
        Err(e) => warn!("{} failed after {:?}: {}", call, start.elapsed(), e),
    }
}
