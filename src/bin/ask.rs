//! One-shot client: sends a single message through a fresh session.
//!
//! Run with: `cargo run --bin chat-relay-ask -- "How do I keep chat history?"`

use std::process::ExitCode;

use chat_relay::chat::ChatConfig;
use chat_relay::start_chat_relay::{ask_once, init_tracing};

fn main() -> ExitCode {
    init_tracing();

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if message.trim().is_empty() {
        eprintln!("usage: chat-relay-ask <message>");
        return ExitCode::from(2);
    }

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(ask_once(&config, &message)) {
        Ok((session_id, reply)) => {
            println!("Session: {session_id}");
            println!("Response: {reply}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
