//! Shared utilities for the Puddel workspace.

pub mod format;
pub mod logging;

pub use format::{format_amount, format_duration};
pub use logging::{init_tracing, LogFormat};
