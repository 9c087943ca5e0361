//! Chat relay server binary.
//! Run with: cargo run --bin chat-relay-server

use std::process::ExitCode;

use chat_relay::start_chat_relay;

fn main() -> ExitCode {
    start_chat_relay::run()
}
