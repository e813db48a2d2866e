//! Server configuration from command-line flags and environment variables.

use std::time::Duration;

use clap::Parser;

use crate::domain::DEFAULT_MAX_CONNECTIONS;

/// Madang chat relay
#[derive(Debug, Clone, Parser)]
#[command(name = "madang-server", version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// The only origin allowed to open the socket or call the HTTP API
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,

    /// Maximum number of simultaneously open connections
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// Frames buffered per connection before further frames are dropped
    #[arg(long, env = "OUTBOX_CAPACITY", default_value_t = 64)]
    pub outbox_capacity: usize,

    /// Close connections that answer no ping for this many seconds (0 disables)
    #[arg(long, env = "IDLE_TIMEOUT_SECS", default_value_t = 300)]
    pub idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    /// Outbox capacity, at least 1 (`mpsc::channel` panics on 0)
    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity.max(1)
    }

    /// Configuration for tests: loopback, ephemeral port.
    pub fn local() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origin: "http://localhost:3000".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            outbox_capacity: 64,
            idle_timeout_secs: 300,
        }
    }
}
