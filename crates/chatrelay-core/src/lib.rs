//! chatrelay core - ChatGPT behind a uniform response envelope
//!
//! This crate provides:
//! - Client selection from environment credentials (API key or access token)
//! - SOCKS and reverse-proxy routing for the access-token client
//! - Message relay with conversation continuity and streamed partial replies
//! - Image generation through the same streaming entry point
//! - Config introspection

pub mod ai;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod relay;

// Re-exports for convenience
pub use ai::types::{
    ChatContext, ChatMessage, ImageResult, ProgressCallback, ReplyData, Role, SendMessageOptions,
};
pub use config::{ApiModel, ModelConfig, RelayConfig};
pub use envelope::{Envelope, ResponseStatus};
pub use error::{ConfigError, ProviderError, RelayError};
pub use relay::ChatService;
