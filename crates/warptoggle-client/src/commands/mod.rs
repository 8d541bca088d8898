//! Command implementations.

pub mod server;
