//! Terminal client for the Madang chat relay.

pub mod config;
pub mod error;
pub mod formatter;
pub mod session;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::run;
