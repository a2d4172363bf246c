//! Provider layer
//!
//! Talks to ChatGPT through one of two clients:
//! - official chat completions with an API key
//! - the conversation backend behind a reverse proxy with an access token

pub mod client;
pub mod parsers;
pub mod sse;
pub mod store;
pub mod types;

pub use client::{ChatApi, ChatBackend, ImageApi};
