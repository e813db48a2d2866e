use clap::Parser;

/// Madang chat client
#[derive(Debug, Clone, Parser)]
#[command(name = "madang-client", version, about)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay
    #[arg(long, env = "MADANG_URL", default_value = "ws://127.0.0.1:5000/ws")]
    pub url: String,

    /// Display name announced when joining
    #[arg(short, long)]
    pub username: String,
}
