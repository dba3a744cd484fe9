//! Protocol error types

use thiserror::Error;

/// Errors that can occur while producing or consuming the handoff line
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Cookie is empty or contains non-hex characters
    #[error("Invalid cookie: {0:?}")]
    InvalidCookie(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
