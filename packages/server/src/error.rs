//! Server startup errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid allowed origin '{0}'")]
    InvalidOrigin(String),

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}
