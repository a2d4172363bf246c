//! chatrelay - ChatGPT behind a uniform response envelope
//!
//! A command-line front end over the relay:
//! - `chat` forwards a message (optionally streaming partial replies or drawing an image)
//! - `config` prints the active mode, proxies, and timeout
//!
//! Every command prints a JSON envelope on stdout; logs go to stderr.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use chatrelay_core::{ChatContext, ChatMessage, ChatService, Envelope, ProgressCallback};

/// chatrelay - ChatGPT relay
#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "Relay messages to ChatGPT and print response envelopes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message
    Chat {
        message: String,

        /// Conversation to continue (from a previous reply)
        #[arg(long)]
        conversation_id: Option<String>,

        /// Message to attach the new one to (from a previous reply)
        #[arg(long)]
        parent_message_id: Option<String>,

        /// Print each partial reply as a JSON line while it streams
        #[arg(long)]
        stream: bool,

        /// Generate an image for the message instead of chatting
        #[arg(long, conflicts_with = "stream")]
        draw: bool,
    },

    /// Show the active configuration
    Config,
}

/// Write one JSON line to stdout
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

fn exit_code<T>(envelope: &Envelope<T>) -> ExitCode {
    if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let service = match ChatService::from_env() {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            eprintln!("chatrelay: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    match cli.command {
        Commands::Config => {
            let envelope = service.chat_config();
            print_json(&envelope)?;
            Ok(exit_code(&envelope))
        }
        Commands::Chat {
            message,
            conversation_id,
            parent_message_id,
            stream,
            draw,
        } => {
            let context = (conversation_id.is_some() || parent_message_id.is_some()).then(|| {
                ChatContext {
                    conversation_id,
                    parent_message_id,
                }
            });

            if !stream && !draw {
                let envelope = service.chat_reply(&message, context.as_ref()).await;
                print_json(&envelope)?;
                return Ok(exit_code(&envelope));
            }

            let on_progress: Option<ProgressCallback> = stream.then(|| {
                Arc::new(|partial: &ChatMessage| {
                    if let Err(e) = print_json(partial) {
                        tracing::warn!("Failed to print partial reply: {}", e);
                    }
                }) as ProgressCallback
            });

            let envelope = service
                .chat_reply_process(&message, context.as_ref(), draw, on_progress)
                .await;
            print_json(&envelope)?;
            Ok(exit_code(&envelope))
        }
    }
}
