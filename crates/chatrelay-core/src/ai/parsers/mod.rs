//! SSE parser implementations for the two provider modes

mod conversation;
mod openai;

pub use conversation::ConversationParser;
pub use openai::OpenAIParser;
