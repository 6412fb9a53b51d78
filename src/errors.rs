//! Error taxonomy: construction failures are returned, call and transport
//! failures are delivered through the `error` observer channel.

use std::io;

use thiserror::Error;

/// Errors raised synchronously while constructing a [`Logger`](crate::Logger).
///
/// These are fatal to the construction attempt and never recoverable by the
/// library itself.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The token was missing or empty.
    #[error("an access token is required")]
    MissingToken,
    /// A custom level entry could not be coerced to a non-empty name.
    #[error("the custom level name `{0}` is invalid")]
    InvalidLevelName(String),
    /// Two of the eight resulting level names matched.
    #[error("the custom levels included duplicate level names")]
    DuplicateLevels,
    /// A level name shadows an existing logger method or field.
    #[error("the custom level name `{0}` conflicts with an existing property")]
    LevelConflict(String),
}

/// Failures reported through the `error` observer channel, never raised.
///
/// Call errors drop the offending call; transport errors are recovered
/// internally by the fixed-delay reconnection policy while queued entries
/// remain.
#[derive(Debug, Error)]
pub enum ErrorEvent {
    /// `log` was called without a payload (null or empty sequence).
    #[error("log was called without a payload")]
    MissingPayload,
    /// The level argument resolved to neither a name nor an index 0-7.
    #[error("unknown log level: {0}")]
    UnknownLevel(String),
    /// Connection failure, TLS authorization failure, or socket timeout.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}
