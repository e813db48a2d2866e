//! Chat broadcast relay.
//!
//! Receives chat events from clients and broadcasts them to every connected client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin madang-server -- --port 5000
//! ```

use clap::Parser;
use madang_server::ServerConfig;
use madang_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    // Run the server
    if let Err(e) = madang_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
