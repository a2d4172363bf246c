//! SSE (Server-Sent Events) stream processing utilities
//!
//! Handles parsing of SSE streams from both provider modes and folds them
//! into a single growing reply.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{ChatMessage, ProgressCallback};
use crate::error::ProviderResult;

/// Events that can be parsed from SSE data
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// Incremental text to append to the reply
    TextDelta { id: Option<String>, delta: String },
    /// Full reply text so far, replacing what we had
    Snapshot {
        id: Option<String>,
        conversation_id: Option<String>,
        text: String,
    },
    Finish { reason: String },
    Skip,
}

/// Trait for provider-specific SSE parsing logic
pub trait SseParser: Send + Sync {
    /// Parse a JSON event into an SSE event
    fn parse_event(&self, json: &Value) -> ProviderResult<SseEvent>;
}

/// Accumulates an SSE stream into a [`ChatMessage`]
///
/// Lines may arrive split across chunks (including inside a multi-byte
/// character), so raw bytes are buffered until a newline shows up.
pub struct SseStreamProcessor {
    /// Bytes of an unterminated line from previous chunks
    partial_line: Vec<u8>,
    reply: ChatMessage,
    on_progress: Option<ProgressCallback>,
    /// Last successfully parsed payload, kept as the reply's detail
    last_payload: Option<Value>,
    done: bool,
    stream_start: Instant,
    event_count: usize,
    bytes_received: usize,
}

impl SseStreamProcessor {
    pub fn new(reply: ChatMessage, on_progress: Option<ProgressCallback>) -> Self {
        debug!("SSE stream processor created");
        Self {
            partial_line: Vec::new(),
            reply,
            on_progress,
            last_payload: None,
            done: false,
            stream_start: Instant::now(),
            event_count: 0,
            bytes_received: 0,
        }
    }

    /// True once the `[DONE]` marker was seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Current state of the reply
    pub fn reply(&self) -> &ChatMessage {
        &self.reply
    }

    /// Process a chunk of bytes from the SSE stream
    pub fn process_chunk<P: SseParser>(&mut self, bytes: &[u8], parser: &P) -> ProviderResult<()> {
        self.bytes_received += bytes.len();
        self.partial_line.extend_from_slice(bytes);

        debug!(
            "SSE chunk received: {} bytes (total: {} bytes)",
            bytes.len(),
            self.bytes_received
        );

        while let Some(pos) = self.partial_line.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial_line.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.process_line(line.trim_end_matches(['\r', '\n']), parser)?;
        }

        Ok(())
    }

    fn process_line<P: SseParser>(&mut self, line: &str, parser: &P) -> ProviderResult<()> {
        // Skip empty lines and SSE comments
        if line.is_empty() || line.starts_with(':') {
            return Ok(());
        }

        if let Some(data) = line.strip_prefix("data:") {
            self.process_sse_data(data.trim_start(), parser)?;
        }
        Ok(())
    }

    /// Process SSE data using the provider-specific parser
    pub fn process_sse_data<P: SseParser>(&mut self, data: &str, parser: &P) -> ProviderResult<()> {
        self.event_count += 1;
        let elapsed = self.stream_start.elapsed();

        // Handle end-of-stream marker
        if data == "[DONE]" {
            info!(
                "SSE stream [DONE] marker received after {:?}, {} events, {} bytes",
                elapsed, self.event_count, self.bytes_received
            );
            self.done = true;
            return Ok(());
        }

        let Ok(json) = serde_json::from_str::<Value>(data) else {
            if !data.trim().is_empty() {
                warn!(
                    "Failed to parse SSE JSON (event #{}): {}",
                    self.event_count, data
                );
            }
            return Ok(());
        };

        match parser.parse_event(&json)? {
            SseEvent::TextDelta { id, delta } => {
                debug!("  -> TextDelta: {} chars", delta.len());
                if let Some(id) = id {
                    self.reply.id = id;
                }
                if !delta.is_empty() {
                    self.reply.text.push_str(&delta);
                    self.emit_progress();
                }
            }
            SseEvent::Snapshot {
                id,
                conversation_id,
                text,
            } => {
                debug!("  -> Snapshot: {} chars", text.len());
                if let Some(id) = id {
                    self.reply.id = id;
                }
                if conversation_id.is_some() {
                    self.reply.conversation_id = conversation_id;
                }
                if !text.is_empty() {
                    self.reply.text = text;
                    self.emit_progress();
                }
            }
            SseEvent::Finish { reason } => {
                info!("SSE Finish: reason={} at {:?}", reason, elapsed);
            }
            SseEvent::Skip => {
                debug!("  -> Skip event");
            }
        }
        self.last_payload = Some(json);

        Ok(())
    }

    fn emit_progress(&self) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(&self.reply);
        }
    }

    /// Finish processing, flushing any unterminated last line
    pub fn finish<P: SseParser>(mut self, parser: &P) -> ProviderResult<ChatMessage> {
        if !self.partial_line.is_empty() {
            let line = String::from_utf8_lossy(&std::mem::take(&mut self.partial_line)).into_owned();
            self.process_line(line.trim_end_matches('\r'), parser)?;
        }
        info!(
            "SSE stream processor finishing: {:?} elapsed, {} events, {} bytes total",
            self.stream_start.elapsed(),
            self.event_count,
            self.bytes_received
        );
        let mut reply = self.reply;
        reply.detail = self.last_payload;
        Ok(reply)
    }
}
