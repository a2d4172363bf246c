//! Provider clients
//!
//! Two chat clients behind one capability trait, plus the image client:
//! - API key: official chat completions ([`ChatGptApi`])
//! - Access token: conversation backend via reverse proxy ([`ChatGptUnofficialProxyApi`])
//!
//! The variant is picked once at startup by [`ChatBackend::from_config`].

pub mod chatgpt_api;
pub mod core;
pub mod images;
pub mod proxy_api;

use async_trait::async_trait;
use tracing::info;

pub use chatgpt_api::ChatGptApi;
pub use self::core::create_http_client;
pub use images::ImageClient;
pub use proxy_api::ChatGptUnofficialProxyApi;

use crate::ai::types::{ChatMessage, ImageResult, SendMessageOptions};
use crate::config::{ApiModel, Credentials, RelayConfig};
use crate::error::{ConfigError, ProviderResult};

/// Anything that can answer a chat message
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(
        &self,
        text: &str,
        options: SendMessageOptions,
    ) -> ProviderResult<ChatMessage>;
}

/// Anything that can turn a prompt into an image
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn create_image(&self, prompt: &str) -> ProviderResult<ImageResult>;
}

/// The chat client selected at startup
pub enum ChatBackend {
    Api(ChatGptApi),
    UnofficialProxy(ChatGptUnofficialProxyApi),
}

impl ChatBackend {
    /// Select and build the chat client for `config`
    ///
    /// The SOCKS tunnel and reverse proxy only apply to the access-token client.
    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        let backend = match &config.credentials {
            Credentials::ApiKey(key) => ChatBackend::Api(ChatGptApi::new(
                create_http_client(None)?,
                key.clone(),
                config.api_base_url.clone(),
                config.model.clone(),
            )),
            Credentials::AccessToken(token) => {
                ChatBackend::UnofficialProxy(ChatGptUnofficialProxyApi::new(
                    create_http_client(config.socks_proxy.as_ref())?,
                    token.clone(),
                    config.reverse_proxy.clone(),
                    config.model.clone(),
                ))
            }
        };
        info!("Selected chat client: {}", backend.api_model());
        Ok(backend)
    }

    pub fn api_model(&self) -> ApiModel {
        match self {
            ChatBackend::Api(_) => ApiModel::ChatGptApi,
            ChatBackend::UnofficialProxy(_) => ApiModel::ChatGptUnofficialProxyApi,
        }
    }
}

#[async_trait]
impl ChatApi for ChatBackend {
    async fn send_message(
        &self,
        text: &str,
        options: SendMessageOptions,
    ) -> ProviderResult<ChatMessage> {
        match self {
            ChatBackend::Api(api) => api.send_message(text, options).await,
            ChatBackend::UnofficialProxy(api) => api.send_message(text, options).await,
        }
    }
}

#[async_trait]
impl ImageApi for ImageClient {
    async fn create_image(&self, prompt: &str) -> ProviderResult<ImageResult> {
        ImageClient::create_image(self, prompt).await
    }
}
