//! Shared utilities for the Madang relay and its CLI client.

pub mod logger;
pub mod time;
