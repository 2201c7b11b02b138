//! Common error types for JalSevak

use thiserror::Error;

/// Common result type for JalSevak operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the JalSevak crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML document could not be serialized
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
