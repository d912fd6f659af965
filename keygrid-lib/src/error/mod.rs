//! Error types

mod config;
mod host;
mod parse;

pub use config::*;
pub use host::*;
pub use parse::*;

/// Error type returned by application-supplied collaborator callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
