//! Handler modules for HTTP and WebSocket endpoints.

mod heartbeat;
pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{health_check, list_participants};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
