//! Client library that streams application log entries to a remote,
//! token-authenticated ingestion endpoint over a long-lived TCP (optionally
//! TLS) connection.
//!
//! The [`Logger`] facade normalises an eight-slot severity table, serialises
//! arbitrary payloads into a transport-safe textual form, buffers framed
//! lines while no connection is available, and reconnects automatically with
//! a fixed delay. Calls to [`Logger::log`] never block and never panic the
//! host process; call and transport failures are reported through the
//! `error` observer channel instead of being raised.

mod config;
mod connection;
mod errors;
mod events;
mod levels;
mod logger;
mod payload;
pub mod serialise;

pub use config::{
    EndpointProfile, LoggerBuilder, LoggerConfig, Replacer, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST,
    DEFAULT_IDLE_TIMEOUT, DEFAULT_PORT, DEFAULT_PORT_TLS, DEFAULT_RECONNECT_DELAY, WEB_HOST,
    WEB_PORT, WEB_PORT_TLS,
};
pub use connection::ConnectionState;
pub use errors::{ConfigError, ErrorEvent};
pub use levels::{CustomLevels, LevelSlot, LevelSpec, LevelTable, DEFAULT_LEVELS};
pub use logger::Logger;
pub use payload::{ErrorInfo, Payload};
