//! Terminal chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin madang-client -- --username Alice
//! ```

use clap::Parser;
use madang_client::ClientConfig;
use madang_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ClientConfig::parse();

    // Keep logs quiet so they don't interleave with the prompt
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    if let Err(e) = madang_client::run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
