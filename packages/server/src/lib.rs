//! Real-time chat broadcast relay.
//!
//! Browser clients open a WebSocket, join with a display name, and every
//! chat message is fanned out to all open connections. Membership changes
//! are announced with system messages.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::{run, serve};
