//! Core types: connection state, status parsing, output formats

pub mod output;
pub mod status;
pub mod tracing;

pub use output::{OutputFormat, StateText, WaybarOutput, format_state};
pub use status::ConnectionState;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
