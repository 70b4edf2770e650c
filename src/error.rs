//! Error types for tunwire

use thiserror::Error;

/// Main error type for tunwire
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed option, unknown plugin type
    #[error("Configuration error: {0}")]
    Config(String),

    /// An address string did not resolve
    #[error("Resolution error: {0}")]
    Resolve(String),

    /// Bind or dial failure while opening a transport
    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Transport is not open")]
    NotOpen,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Payload too large: {len} bytes (max {max})")]
    Oversized { len: usize, max: usize },
}

/// Result type alias for tunwire
pub type Result<T> = std::result::Result<T, Error>;
