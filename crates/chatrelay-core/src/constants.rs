//! Application constants and configuration defaults
//!
//! Centralized location for endpoints, models, and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// User agent sent with every request
    pub const USER_AGENT: &str = "chatrelay/0.1";
}

/// Environment variable names
pub mod env {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_ACCESS_TOKEN: &str = "OPENAI_ACCESS_TOKEN";
    pub const OPENAI_API_BASE_URL: &str = "OPENAI_API_BASE_URL";
    pub const OPENAI_API_MODEL: &str = "OPENAI_API_MODEL";
    pub const TIMEOUT_MS: &str = "TIMEOUT_MS";
    pub const SOCKS_PROXY_HOST: &str = "SOCKS_PROXY_HOST";
    pub const SOCKS_PROXY_PORT: &str = "SOCKS_PROXY_PORT";
    pub const API_REVERSE_PROXY: &str = "API_REVERSE_PROXY";
}

/// ChatGPT provider configuration
pub mod ai {
    /// Default request timeout when TIMEOUT_MS is unset or not a number
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// Base URL of the official OpenAI API
    pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com";

    /// Default model for API-key authenticated chat completions
    pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

    /// Default model for the access-token conversation backend
    pub const DEFAULT_PROXY_MODEL: &str = "text-davinci-002-render-sha";

    /// Conversation endpoint used by the access-token client when no reverse proxy is set
    pub const DEFAULT_REVERSE_PROXY_URL: &str = "https://bypass.churchless.tech/api/conversation";

    /// Sampling parameters sent with chat completions
    pub const TEMPERATURE: f32 = 0.8;
    pub const TOP_P: f32 = 1.0;
    pub const PRESENCE_PENALTY: f32 = 1.0;

    /// Context window of the default chat model
    pub const MAX_MODEL_TOKENS: usize = 4096;

    /// Tokens reserved for the reply out of the context window
    pub const MAX_RESPONSE_TOKENS: usize = 1000;

    /// Upper bound on messages kept in the in-memory conversation store
    pub const MESSAGE_STORE_CAPACITY: u64 = 10_000;

    /// Image generation parameters for the draw branch
    pub const IMAGE_SIZE: &str = "512x512";
    pub const IMAGE_COUNT: u32 = 1;
}

/// Placeholder reported by the config snapshot when no SOCKS proxy is set
pub const NO_SOCKS_PROXY: &str = "-";
