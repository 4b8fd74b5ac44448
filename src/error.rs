//! Structured error types for configuration operations.

use thiserror::Error;

/// Errors produced while constructing or overlaying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An overlay key (or builder path component) has no counterpart in the
    /// base tree and the containing node is not extensible.
    #[error("unknown configuration key: '{0}'")]
    UnknownKey(String),

    /// A mapping was required but something else was found: a non-object
    /// base or overlay root, a builder path landing on a leaf, or an object
    /// overlay source that serializes to a scalar.
    #[error("'{0}' is not a mapping")]
    NotAMapping(String),

    /// Serialization or deserialization failure while converting an object
    /// overlay source or extracting a typed configuration.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
