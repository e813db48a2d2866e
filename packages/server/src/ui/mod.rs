//! WebSocket relay server implementation.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use handler::websocket::origin_allowed;
pub use runner::{build_router, run, serve};
pub use signal::shutdown_signal;
